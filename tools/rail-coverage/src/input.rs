use anyhow::{bail, Context, Result};
use geojson::{Feature, GeoJson};
use indicatif::{ProgressBar, ProgressStyle};
use rail_sim_transit::spatial::{NetworkBuildStats, RailNetworkIndex};
use serde::{Deserialize, Deserializer};
use std::path::Path;

/// One train as it appears in the schedule file.
///
/// Every field is optional so a sparse record still loads; gaps are filled
/// with defaults when routes are grouped.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrainRecord {
    #[serde(default, deserialize_with = "string_or_number")]
    pub train_number: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub train_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub train_type: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub zone: Option<String>,
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub distance: Option<f64>,
    #[serde(default, alias = "from_station_name", deserialize_with = "string_or_number")]
    pub from: Option<String>,
    #[serde(default, alias = "to_station_name", deserialize_with = "string_or_number")]
    pub to: Option<String>,
    #[serde(default, deserialize_with = "raw_time")]
    pub departure: Option<String>,
    #[serde(default, deserialize_with = "raw_time")]
    pub arrival: Option<String>,
    #[serde(default)]
    pub route_coordinates: Vec<Vec<f64>>,
    #[serde(default)]
    pub stations: Vec<serde_json::Value>,
}

/// Train numbers show up both as `"12951"` and `12951`.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Distances come as numbers or numeric strings; anything else is unknown.
fn number_or_numeric_string<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// Keeps whatever was written so grouping can count it as an unparsable time.
fn raw_time<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Records plus the number that could not be decoded.
#[derive(Debug, Default)]
pub struct ScheduleInput {
    pub records: Vec<TrainRecord>,
    pub malformed_records: usize,
}

/// Read the schedule list. Accepts either a bare array or `{"trains": [...]}`.
///
/// A missing or unparsable file is fatal; a single bad record is skipped.
pub fn read_schedule_records(path: &Path) -> Result<ScheduleInput> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read schedule file: {}", path.display()))?;

    let json: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse JSON from: {}", path.display()))?;

    parse_schedule_value(json)
        .with_context(|| format!("No train list found in: {}", path.display()))
}

pub(crate) fn parse_schedule_value(json: serde_json::Value) -> Result<ScheduleInput> {
    let items = match json {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("trains") {
            Some(serde_json::Value::Array(items)) => items,
            _ => bail!("Object has no \"trains\" array"),
        },
        _ => bail!("Expected an array of trains or an object with \"trains\""),
    };

    let mut input = ScheduleInput::default();
    for (i, item) in items.into_iter().enumerate() {
        match serde_json::from_value::<TrainRecord>(item) {
            Ok(record) => input.records.push(record),
            Err(e) => {
                log::debug!("Skipping record {}: {}", i, e);
                input.malformed_records += 1;
            }
        }
    }
    Ok(input)
}

/// Read the rail network GeoJSON and build the segment index.
///
/// Only a file that is not JSON at all is fatal. A feature that fails to
/// decode is skipped and counted like any other unusable feature.
pub fn read_network(
    path: &Path,
    cell_size_deg: f64,
) -> Result<(RailNetworkIndex, NetworkBuildStats)> {
    log::info!("Reading rail network: {}", path.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .context("Invalid progress template")?,
    );
    pb.set_message("Parsing GeoJSON...");

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read network file: {}", path.display()))?;

    let json: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse GeoJSON from: {}", path.display()))?;

    let (features, rejected) = decode_features(json)
        .with_context(|| format!("No GeoJSON object in: {}", path.display()))?;
    if rejected > 0 {
        log::warn!("  {} features could not be decoded", rejected);
    }

    pb.set_message(format!("Indexing {} features...", features.len()));
    let (index, mut stats) = RailNetworkIndex::from_features(&features, cell_size_deg);
    stats.features_read += rejected;
    stats.features_skipped += rejected;
    pb.finish_and_clear();

    Ok((index, stats))
}

/// Decode features one at a time, returning them with the number rejected.
fn decode_features(json: serde_json::Value) -> Result<(Vec<Feature>, usize)> {
    let serde_json::Value::Object(mut obj) = json else {
        bail!("Expected a GeoJSON object");
    };

    if obj.get("type").and_then(|t| t.as_str()) == Some("FeatureCollection") {
        let items = match obj.remove("features") {
            Some(serde_json::Value::Array(items)) => items,
            None => Vec::new(),
            Some(_) => bail!("FeatureCollection \"features\" is not an array"),
        };
        let mut features = Vec::with_capacity(items.len());
        let mut rejected = 0;
        for (i, item) in items.into_iter().enumerate() {
            match Feature::try_from(item) {
                Ok(feature) => features.push(feature),
                Err(e) => {
                    log::debug!("Skipping feature {}: {}", i, e);
                    rejected += 1;
                }
            }
        }
        return Ok((features, rejected));
    }

    match GeoJson::from_json_value(serde_json::Value::Object(obj)) {
        Ok(geojson) => Ok((features_of(geojson), 0)),
        Err(e) => {
            log::debug!("Skipping top-level object: {}", e);
            Ok((Vec::new(), 1))
        }
    }
}

fn features_of(geojson: GeoJson) -> Vec<Feature> {
    match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_wrapped_and_bare_lists() {
        let wrapped = json!({"metadata": {}, "trains": [{"train_number": "12951"}]});
        assert_eq!(parse_schedule_value(wrapped).unwrap().records.len(), 1);

        let bare = json!([{"train_number": 12002}, {"train_number": "22691"}]);
        let input = parse_schedule_value(bare).unwrap();
        assert_eq!(input.records[0].train_number.as_deref(), Some("12002"));
        assert_eq!(input.records.len(), 2);

        assert!(parse_schedule_value(json!({"routes": []})).is_err());
        assert!(parse_schedule_value(json!("trains")).is_err());
    }

    #[test]
    fn test_bad_record_is_skipped() {
        let input = parse_schedule_value(json!([
            {"train_number": "1", "route_coordinates": [[77.0, 28.0]]},
            {"train_number": "2", "route_coordinates": "not a list"},
            {"train_number": "3", "from_station_name": "NEW DELHI", "distance": 1384.0},
        ]))
        .unwrap();

        assert_eq!(input.records.len(), 2);
        assert_eq!(input.malformed_records, 1);
        assert_eq!(input.records[1].from.as_deref(), Some("NEW DELHI"));
        assert_eq!(input.records[1].distance, Some(1384.0));
    }

    #[test]
    fn test_loose_field_types_still_load() {
        let input = parse_schedule_value(json!([{
            "train_number": "1",
            "train_name": "RAJDHANI",
            "departure": 600,
            "arrival": "10:00:00",
            "distance": "1384",
        }]))
        .unwrap();

        assert_eq!(input.malformed_records, 0);
        assert_eq!(input.records.len(), 1);
        let record = &input.records[0];
        assert_eq!(record.departure.as_deref(), Some("600"));
        assert_eq!(record.arrival.as_deref(), Some("10:00:00"));
        assert_eq!(record.distance, Some(1384.0));

        let vague = json!([{"train_number": "2", "distance": "far"}]);
        let input = parse_schedule_value(vague).unwrap();
        assert_eq!(input.records[0].distance, None);
    }

    #[test]
    fn test_missing_schedule_file_is_fatal() {
        let err = read_schedule_records(Path::new("/nonexistent/schedules.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read schedule file"));
    }

    #[test]
    fn test_read_network_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {{}},
                  "geometry": {{"type": "LineString",
                               "coordinates": [[77.0, 28.0], [77.5, 28.0]]}}}},
                {{"type": "Feature", "properties": {{}},
                  "geometry": {{"type": "Point", "coordinates": [77.0, 28.0]}}}}
            ]}}"#
        )
        .unwrap();

        let (index, stats) = read_network(file.path(), 0.05).unwrap();
        assert_eq!(index.segments().len(), 1);
        assert_eq!(stats.features_skipped, 1);
    }

    #[test]
    fn test_undecodable_feature_is_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"type": "FeatureCollection", "features": [
                {{"type": "Feature", "properties": {{}},
                  "geometry": {{"type": "LineString",
                               "coordinates": [[77.0, 28.0], [77.5, 28.0]]}}}},
                {{"type": "LineString", "coordinates": "oops"}}
            ]}}"#
        )
        .unwrap();

        let (index, stats) = read_network(file.path(), 0.05).unwrap();
        assert_eq!(index.segments().len(), 1);
        assert_eq!(stats.features_read, 2);
        assert_eq!(stats.features_skipped, 1);
    }

    #[test]
    fn test_invalid_network_is_fatal() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not geojson").unwrap();
        assert!(read_network(file.path(), 0.05).is_err());
    }
}
