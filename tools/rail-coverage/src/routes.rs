use geo::Point;
use hashbrown::HashMap;
use rail_sim_transit::{ScheduleBase, TimeOfDay, TrainIdentifier};

use crate::input::TrainRecord;

/// One train with its metadata merged from every record that named it.
#[derive(Clone, Debug)]
pub struct TrainRoute {
    pub train: TrainIdentifier,
    pub train_name: String,
    pub train_type: String,
    pub zone: String,
    pub distance: f64,
    pub from: String,
    pub to: String,
    pub base: ScheduleBase,
    pub coordinates: Vec<Point>,
    pub stations: Vec<serde_json::Value>,
}

/// Counts of records that were skipped or repaired while grouping.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GroupingStats {
    pub records_read: usize,
    pub routes: usize,
    pub missing_train_number: usize,
    pub duplicate_records: usize,
    pub missing_times: usize,
    pub bad_times: usize,
    pub bad_coordinates: usize,
}

// Raw text collected for a route until the whole input has been seen.
#[derive(Default)]
struct PendingRoute {
    train_name: Option<String>,
    train_type: Option<String>,
    zone: Option<String>,
    distance: Option<f64>,
    from: Option<String>,
    to: Option<String>,
    departure: Option<String>,
    arrival: Option<String>,
    coordinates: Vec<Vec<f64>>,
    stations: Vec<serde_json::Value>,
}

fn keep_first<T>(slot: &mut Option<T>, value: Option<T>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl PendingRoute {
    fn merge(&mut self, record: TrainRecord) {
        keep_first(&mut self.train_name, non_empty(record.train_name));
        keep_first(&mut self.train_type, non_empty(record.train_type));
        keep_first(&mut self.zone, non_empty(record.zone));
        keep_first(&mut self.distance, record.distance);
        keep_first(&mut self.from, non_empty(record.from));
        keep_first(&mut self.to, non_empty(record.to));
        keep_first(&mut self.departure, non_empty(record.departure));
        keep_first(&mut self.arrival, non_empty(record.arrival));
        if self.coordinates.is_empty() {
            self.coordinates = record.route_coordinates;
        }
        if self.stations.is_empty() {
            self.stations = record.stations;
        }
    }
}

/// Collapse raw records into one route per train number, in first-seen order.
///
/// For every field the first record that carries a value wins. Records
/// without a train number are skipped.
pub fn group_routes(records: Vec<TrainRecord>) -> (Vec<TrainRoute>, GroupingStats) {
    let mut stats = GroupingStats {
        records_read: records.len(),
        ..Default::default()
    };

    let mut order: Vec<String> = Vec::new();
    let mut pending: HashMap<String, PendingRoute> = HashMap::new();

    for mut record in records {
        let Some(number) = record.train_number.take() else {
            stats.missing_train_number += 1;
            continue;
        };
        match pending.get_mut(&number) {
            Some(route) => {
                stats.duplicate_records += 1;
                route.merge(record);
            }
            None => {
                let mut route = PendingRoute::default();
                route.merge(record);
                order.push(number.clone());
                pending.insert(number, route);
            }
        }
    }

    let routes: Vec<TrainRoute> = order
        .into_iter()
        .filter_map(|number| {
            let route = pending.remove(&number)?;
            Some(finish_route(number, route, &mut stats))
        })
        .collect();
    stats.routes = routes.len();

    (routes, stats)
}

fn finish_route(number: String, route: PendingRoute, stats: &mut GroupingStats) -> TrainRoute {
    let departure = parse_time_or_default(
        route.departure.as_deref(),
        TimeOfDay::DEFAULT_DEPARTURE,
        &number,
        stats,
    );
    let arrival = parse_time_or_default(
        route.arrival.as_deref(),
        TimeOfDay::DEFAULT_ARRIVAL,
        &number,
        stats,
    );

    let total = route.coordinates.len();
    let coordinates: Vec<Point> = route
        .coordinates
        .iter()
        .filter_map(|c| match c.as_slice() {
            [lon, lat, ..] if lon.is_finite() && lat.is_finite() => Some(Point::new(*lon, *lat)),
            _ => None,
        })
        .collect();
    if coordinates.len() < total {
        log::debug!(
            "Train {}: dropped {} malformed coordinates",
            number,
            total - coordinates.len()
        );
        stats.bad_coordinates += total - coordinates.len();
    }

    TrainRoute {
        train: TrainIdentifier::new(&number),
        train_name: route.train_name.unwrap_or_default(),
        train_type: route.train_type.unwrap_or_default(),
        zone: route.zone.unwrap_or_default(),
        distance: route.distance.unwrap_or(0.0),
        from: route.from.unwrap_or_default(),
        to: route.to.unwrap_or_default(),
        base: ScheduleBase::new(departure, arrival),
        coordinates,
        stations: route.stations,
    }
}

/// A missing time takes `missing`; an unparsable one falls back to 06:00:00.
fn parse_time_or_default(
    value: Option<&str>,
    missing: TimeOfDay,
    train: &str,
    stats: &mut GroupingStats,
) -> TimeOfDay {
    let Some(value) = value else {
        stats.missing_times += 1;
        return missing;
    };
    match TimeOfDay::parse(value.trim()) {
        Ok(time) => time,
        Err(e) => {
            log::debug!("Train {}: {}, using {}", train, e, TimeOfDay::DEFAULT_DEPARTURE);
            stats.bad_times += 1;
            TimeOfDay::DEFAULT_DEPARTURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(number: Option<&str>, name: Option<&str>) -> TrainRecord {
        TrainRecord {
            train_number: number.map(String::from),
            train_name: name.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn test_first_seen_wins() {
        let mut second = record(Some("12951"), Some("MUMBAI RAJDHANI (LATER)"));
        second.zone = Some("WR".into());
        let records = vec![
            record(Some("12951"), Some("MUMBAI RAJDHANI")),
            record(Some("12002"), Some("SHATABDI")),
            second,
        ];

        let (routes, stats) = group_routes(records);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].train.as_str(), "12951");
        assert_eq!(routes[0].train_name, "MUMBAI RAJDHANI");
        // A field the first record lacked is filled by a later one.
        assert_eq!(routes[0].zone, "WR");
        assert_eq!(routes[1].train.as_str(), "12002");
        assert_eq!(stats.duplicate_records, 1);
    }

    #[test]
    fn test_records_without_number_are_skipped() {
        let records = vec![record(None, Some("GHOST")), record(Some("1"), None)];
        let (routes, stats) = group_routes(records);
        assert_eq!(routes.len(), 1);
        assert_eq!(stats.missing_train_number, 1);
        assert_eq!(stats.routes, 1);
    }

    #[test]
    fn test_time_defaults() {
        let mut bad = record(Some("2"), None);
        bad.departure = Some("25:99".into());
        bad.arrival = Some("10:30:00".into());

        let (routes, stats) = group_routes(vec![record(Some("1"), None), bad]);

        assert_eq!(routes[0].base.departure, TimeOfDay::DEFAULT_DEPARTURE);
        assert_eq!(routes[0].base.arrival, TimeOfDay::DEFAULT_ARRIVAL);
        assert_eq!(routes[1].base.departure.to_string(), "06:00:00");
        assert_eq!(routes[1].base.arrival.to_string(), "10:30:00");
        assert_eq!(stats.missing_times, 2);
        assert_eq!(stats.bad_times, 1);
    }

    #[test]
    fn test_numeric_time_counts_as_unparsable() {
        let input = crate::input::parse_schedule_value(serde_json::json!([{
            "train_number": "1",
            "train_name": "RAJDHANI",
            "departure": 600,
            "arrival": "10:00:00",
            "distance": "1384",
        }]))
        .unwrap();

        let (routes, stats) = group_routes(input.records);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].base.departure, TimeOfDay::DEFAULT_DEPARTURE);
        assert_eq!(routes[0].base.arrival.to_string(), "10:00:00");
        assert_eq!(routes[0].distance, 1384.0);
        assert_eq!(stats.bad_times, 1);
        assert_eq!(stats.missing_times, 0);
    }

    #[test]
    fn test_malformed_coordinates_dropped() {
        let mut r = record(Some("1"), None);
        r.route_coordinates = vec![
            vec![77.0, 28.0],
            vec![77.5],
            vec![f64::NAN, 28.0],
            vec![78.0, 28.5],
        ];

        let (routes, stats) = group_routes(vec![r]);
        assert_eq!(routes[0].coordinates, vec![Point::new(77.0, 28.0), Point::new(78.0, 28.5)]);
        assert_eq!(stats.bad_coordinates, 2);
    }
}
