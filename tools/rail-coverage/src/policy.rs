use rail_sim_transit::{FrequencyTier, RoutePolicy};

use crate::routes::TrainRoute;

const PREMIUM: &[&str] = &["RAJDHANI", "SHATABDI", "VANDE BHARAT"];
const FAST_PREMIUM: &[&str] = &["DURONTO", "GARIB RATH"];
const SUBURBAN: &[&str] = &["EMU", "DEMU", "MEMU"];
const PASSENGER: &[&str] = &["PASSENGER", "LOCAL"];

const MAJOR_CITIES: &[&str] = &[
    "DELHI", "MUMBAI", "KOLKATA", "CHENNAI", "BANGALORE", "HYDERABAD", "PUNE", "AHMEDABAD",
    "KANPUR", "LUCKNOW", "NAGPUR", "BHOPAL", "JAIPUR", "SURAT", "PATNA", "INDORE", "VADODARA",
    "GUWAHATI",
];

/// Scores trains by name keywords, length and the cities they connect.
///
/// Trains whose name matches no service class score 0 and are never selected.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordPolicy;

impl KeywordPolicy {
    fn service_score(name: &str, route: &TrainRoute) -> Option<f64> {
        let has = |words: &[&str]| words.iter().any(|w| name.contains(w));

        if has(PREMIUM) {
            Some(150.0)
        } else if has(FAST_PREMIUM) {
            Some(120.0)
        } else if name.contains("SUPERFAST") || name.split_whitespace().any(|w| w == "SF") {
            Some(100.0)
        } else if name.contains("EXPRESS") {
            Some(80.0)
        } else if has(SUBURBAN) && route.stations.len() > 8 {
            Some(70.0)
        } else if has(PASSENGER) && route.distance > 300.0 {
            Some(60.0)
        } else {
            None
        }
    }

    fn distance_bonus(distance: f64) -> f64 {
        match distance {
            d if d > 1500.0 => 50.0,
            d if d > 1000.0 => 30.0,
            d if d > 500.0 => 15.0,
            _ => 0.0,
        }
    }

    fn station_bonus(stations: usize) -> f64 {
        match stations {
            n if n > 20 => 40.0,
            n if n > 15 => 25.0,
            n if n > 10 => 15.0,
            _ => 0.0,
        }
    }

    fn city_bonus(from: &str, to: &str) -> f64 {
        let from = from.to_uppercase();
        let to = to.to_uppercase();
        let connections = MAJOR_CITIES
            .iter()
            .map(|city| from.contains(city) as usize + to.contains(city) as usize)
            .sum::<usize>();
        connections as f64 * 20.0
    }
}

impl RoutePolicy<TrainRoute> for KeywordPolicy {
    fn priority_score(&self, route: &TrainRoute) -> f64 {
        let name = route.train_name.to_uppercase();
        let Some(base) = Self::service_score(&name, route) else {
            return 0.0;
        };

        base + Self::distance_bonus(route.distance)
            + Self::station_bonus(route.stations.len())
            + Self::city_bonus(&route.from, &route.to)
    }

    fn frequency_tier(&self, route: &TrainRoute) -> FrequencyTier {
        match self.priority_score(route) {
            s if s >= 250.0 => FrequencyTier::Maximum,
            s if s >= 200.0 => FrequencyTier::High,
            s if s >= 140.0 => FrequencyTier::Medium,
            s if s >= 100.0 => FrequencyTier::Standard,
            _ => FrequencyTier::Daily,
        }
    }
}
