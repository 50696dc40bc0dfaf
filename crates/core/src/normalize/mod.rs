//! Raw record normalization.
//!
//! Turns a remote record into an [`Entity`]: resolves canonical field names
//! through the type's [`profile::FieldProfile`], parses coordinates and derives
//! the status via [`status::classify`].

pub mod profile;
pub mod status;

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::Error;
use crate::entity::{Entity, EntityType, value_text};
use crate::source::RawRecord;

pub use profile::{FieldProfile, profile};
pub use status::{StatusGating, StatusSignals, classify};

/// Normalizer settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizerConfig {
    pub gating: StatusGating,
}

/// Result of normalizing a batch of raw records.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub entities: Vec<Entity>,
    /// Records dropped because they could not be normalized.
    pub skipped: usize,
    /// Records dropped because an earlier record had the same id.
    pub duplicates: usize,
}

/// Normalize one raw record.
///
/// # Errors
///
/// Returns `Error::MalformedRecord` when the record has no usable id.
pub fn normalize(
    entity_type: EntityType, raw: &RawRecord, config: &NormalizerConfig, normalized_at: &str,
) -> Result<Entity, Error> {
    let profile = profile(entity_type);

    let id = first_text(raw, profile.id)
        .ok_or_else(|| Error::MalformedRecord(format!("{entity_type} record without an id")))?;

    let address = first_text(raw, profile.address);
    let raw_lat = first_value(raw, profile.latitude);
    let raw_lng = first_value(raw, profile.longitude);

    let signals = StatusSignals {
        has_location: address.is_some() && is_present(raw_lat) && is_present(raw_lng),
        cancelled: any_truthy(raw, profile.cancelled),
        cancellation_date: any_present(raw, profile.cancellation_date),
        suspended: any_present(raw, profile.suspended),
        transmitted: any_present(raw, profile.transmitted),
        suspension_released: any_present(raw, profile.suspension_released),
        completed: any_truthy(raw, profile.completed),
    };

    let mut fields = Map::new();
    if let Some(address) = address {
        fields.insert("address".into(), Value::String(address));
    }
    for (name, keys) in profile.text {
        if let Some(text) = first_text(raw, keys) {
            fields.insert((*name).to_string(), Value::String(text));
        }
    }

    let consumed: HashSet<&str> = profile.consumed_keys().collect();
    for (key, value) in raw {
        if consumed.contains(key.as_str()) || fields.contains_key(key) || value_text(value).is_none() {
            continue;
        }
        fields.insert(key.clone(), value.clone());
    }

    Ok(Entity {
        id,
        lat: parse_coordinate(raw_lat),
        lng: parse_coordinate(raw_lng),
        status: classify(&signals, config.gating),
        last_updated: normalized_at.to_string(),
        fields,
    })
}

/// Normalize a fetched snapshot, skipping records that fail and keeping the
/// first occurrence of each id.
pub fn normalize_batch(entity_type: EntityType, raw: Vec<RawRecord>, config: &NormalizerConfig) -> NormalizedBatch {
    let normalized_at = chrono::Utc::now().to_rfc3339();
    let mut batch = NormalizedBatch { entities: Vec::with_capacity(raw.len()), ..Default::default() };
    let mut seen = HashSet::new();

    for record in &raw {
        match normalize(entity_type, record, config, &normalized_at) {
            Ok(entity) if seen.insert(entity.id.clone()) => batch.entities.push(entity),
            Ok(entity) => {
                tracing::debug!(entity_type = %entity_type, id = %entity.id, "dropping duplicate record");
                batch.duplicates += 1;
            }
            Err(e) => {
                tracing::warn!(entity_type = %entity_type, "skipping record: {e}");
                batch.skipped += 1;
            }
        }
    }

    batch
}

/// Parse a raw coordinate. Empty, missing, unparsable and non-finite values
/// are `None`, never `0.0` or NaN.
pub fn parse_coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

fn first_value<'a>(raw: &'a RawRecord, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|key| raw.get(*key).filter(|v| !v.is_null()))
}

fn first_text(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        let text = value_text(raw.get(*key)?)?;
        let trimmed = text.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

/// Date/marker style fields: set when non-empty. A checkbox counts when true.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(v) => value_text(v).is_some_and(|t| !t.trim().is_empty()),
        None => false,
    }
}

fn any_present(raw: &RawRecord, keys: &[&str]) -> bool {
    keys.iter().any(|key| is_present(raw.get(*key)))
}

/// Flag style fields: JSON booleans, "true"/"yes"/"1", or non-zero numbers.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "y" | "1"),
        _ => false,
    }
}

fn any_truthy(raw: &RawRecord, keys: &[&str]) -> bool {
    keys.iter().any(|key| raw.get(*key).is_some_and(is_truthy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Status;
    use serde_json::json;

    const NOW: &str = "2024-05-01T12:00:00+00:00";

    fn raw(value: Value) -> RawRecord {
        value.as_object().cloned().unwrap()
    }

    fn project(value: Value) -> Entity {
        normalize(EntityType::Project, &raw(value), &NormalizerConfig::default(), NOW).unwrap()
    }

    #[test]
    fn test_normalize_project() {
        let entity = project(json!({
            "ID": "4000123",
            "Project_Name": "  Bayfront Tower ",
            "Project_Address": { "display_value": "100 Biscayne Blvd, Miami FL" },
            "Latitude": "25.77",
            "Longitude": "-80.19",
            "Account_Name": { "ID": "77", "display_value": "Acme Corp" },
            "Crew": 4,
            "Attachments": [],
        }));

        assert_eq!(entity.id, "4000123");
        assert_eq!(entity.lat, Some(25.77));
        assert_eq!(entity.lng, Some(-80.19));
        assert_eq!(entity.status, Status::Live);
        assert_eq!(entity.last_updated, NOW);
        assert_eq!(entity.fields["name"], json!("Bayfront Tower"));
        assert_eq!(entity.fields["address"], json!("100 Biscayne Blvd, Miami FL"));
        assert_eq!(entity.fields["account"], json!("Acme Corp"));
        assert_eq!(entity.fields["Crew"], json!(4));
        assert!(!entity.fields.contains_key("Attachments"));
        assert!(!entity.fields.contains_key("Latitude"));
    }

    #[test]
    fn test_empty_coordinates_are_none() {
        let entity = project(json!({ "ID": "1", "Latitude": "", "Longitude": "  " }));
        assert_eq!(entity.lat, None);
        assert_eq!(entity.lng, None);

        let entity = project(json!({ "ID": "1" }));
        assert_eq!(entity.lat, None);
    }

    #[test]
    fn test_zero_coordinates_are_kept_but_not_valid() {
        let entity = project(json!({ "ID": "1", "Latitude": "0", "Longitude": "0" }));
        assert_eq!(entity.lat, Some(0.0));
        assert!(!entity.has_valid_coordinates());
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate(Some(&json!(12.5))), Some(12.5));
        assert_eq!(parse_coordinate(Some(&json!(" 12.5 "))), Some(12.5));
        assert_eq!(parse_coordinate(Some(&json!("abc"))), None);
        assert_eq!(parse_coordinate(Some(&json!("NaN"))), None);
        assert_eq!(parse_coordinate(Some(&Value::Null)), None);
        assert_eq!(parse_coordinate(None), None);
    }

    #[test]
    fn test_completed_and_transmitted_is_archived() {
        let entity = project(json!({
            "ID": "1",
            "Completed": true,
            "Transmitted_to_Client": "2024-03-01",
            "Cancelled": false,
        }));
        assert_eq!(entity.status, Status::Archived);
    }

    #[test]
    fn test_string_flags() {
        let entity = project(json!({ "ID": "1", "Cancelled": "true", "Cancellation_Date": "2024-02-02" }));
        assert_eq!(entity.status, Status::Cancelled);

        let entity = project(json!({ "ID": "1", "Completed": "false" }));
        assert_eq!(entity.status, Status::Live);

        let entity = project(json!({ "ID": "1", "Completed": "Yes" }));
        assert_eq!(entity.status, Status::Completed);
    }

    #[test]
    fn test_suspended_project() {
        let entity = project(json!({ "ID": "1", "Suspended_Date": "2024-01-10", "Suspension_Released": "" }));
        assert_eq!(entity.status, Status::Suspended);
    }

    #[test]
    fn test_location_gating() {
        let config = NormalizerConfig { gating: StatusGating::RequireLocation };
        let no_address = raw(json!({ "ID": "1", "Latitude": "1", "Longitude": "2", "Completed": true }));
        let entity = normalize(EntityType::Project, &no_address, &config, NOW).unwrap();
        assert_eq!(entity.status, Status::Unknown);

        let located =
            raw(json!({ "ID": "1", "Address": "1 A St", "Latitude": "1", "Longitude": "2", "Completed": true }));
        let entity = normalize(EntityType::Project, &located, &config, NOW).unwrap();
        assert_eq!(entity.status, Status::Completed);
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let nameless = raw(json!({ "Project_Name": "x" }));
        let result = normalize(EntityType::Project, &nameless, &NormalizerConfig::default(), NOW);
        assert!(matches!(result, Err(Error::MalformedRecord(_))));
    }

    #[test]
    fn test_numeric_id() {
        let entity = project(json!({ "ID": 4000123 }));
        assert_eq!(entity.id, "4000123");
    }

    #[test]
    fn test_resource_fields() {
        let record = raw(json!({ "ID": "r1", "Full_Name": "Dana Lee", "Role": "Surveyor", "Home_Address": "9 Elm" }));
        let entity = normalize(EntityType::Resource, &record, &NormalizerConfig::default(), NOW).unwrap();
        assert_eq!(entity.fields["name"], json!("Dana Lee"));
        assert_eq!(entity.fields["role"], json!("Surveyor"));
        assert_eq!(entity.fields["address"], json!("9 Elm"));
        assert_eq!(entity.status, Status::Live);
    }

    #[test]
    fn test_batch_skips_malformed_and_duplicates() {
        let records = vec![
            raw(json!({ "ID": "1" })),
            raw(json!({ "Name": "no id" })),
            raw(json!({ "ID": "2" })),
            raw(json!({ "ID": "1", "Project_Name": "dupe" })),
        ];

        let batch = normalize_batch(EntityType::Project, records, &NormalizerConfig::default());

        assert_eq!(batch.entities.len(), 2);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.duplicates, 1);
        assert!(!batch.entities[0].fields.contains_key("name"));
    }
}
