//! Canonical entity model shared by the store, query layer and server.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// Kind of business record held in the cache. Each kind owns one store table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Project,
    Resource,
    BillingLocation,
}

impl EntityType {
    pub const ALL: [EntityType; 3] = [EntityType::Project, EntityType::Resource, EntityType::BillingLocation];

    /// Local store table holding this entity type's snapshot.
    pub fn table_name(self) -> &'static str {
        match self {
            EntityType::Project => "projects",
            EntityType::Resource => "resources",
            EntityType::BillingLocation => "billing_locations",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntityType::Project => "project",
            EntityType::Resource => "resource",
            EntityType::BillingLocation => "billing_location",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityType {
    type Err = Error;

    /// Accepts the singular tag, the table name, and a few UI spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "project" | "projects" => Ok(EntityType::Project),
            "resource" | "resources" => Ok(EntityType::Resource),
            "billing_location" | "billing_locations" | "billing" => Ok(EntityType::BillingLocation),
            other => Err(Error::InvalidInput(format!("unknown entity type: {other}"))),
        }
    }
}

/// Derived record status. See [`crate::normalize::status`] for the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
pub enum Status {
    Cancelled,
    Suspended,
    Archived,
    Completed,
    Live,
    Unknown,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Cancelled => "Cancelled",
            Status::Suspended => "Suspended",
            Status::Archived => "Archived",
            Status::Completed => "Completed",
            Status::Live => "Live",
            Status::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cancelled" => Ok(Status::Cancelled),
            "Suspended" => Ok(Status::Suspended),
            "Archived" => Ok(Status::Archived),
            "Completed" => Ok(Status::Completed),
            "Live" => Ok(Status::Live),
            "Unknown" => Ok(Status::Unknown),
            other => Err(Error::InvalidInput(format!("unknown status: {other}"))),
        }
    }
}

/// A normalized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Entity {
    pub id: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub status: Status,
    /// RFC 3339 time of normalization. Diagnostics only.
    pub last_updated: String,
    /// Type-specific fields under canonical names, plus any other scalar
    /// fields the remote record carried.
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Entity {
    /// Mappable coordinates, or `None` when missing, out of range or the
    /// (0,0) "never geocoded" sentinel.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) if has_valid_coordinates(lat, lng) => Some((lat, lng)),
            _ => None,
        }
    }

    pub fn has_valid_coordinates(&self) -> bool {
        self.coordinates().is_some()
    }

    /// String form of a field for filtering and display.
    ///
    /// `id`, `status`, `lat` and `lng` come from the struct; everything else
    /// from `fields`. Returns `None` for missing, null and non-scalar values.
    pub fn field_text(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "status" => Some(self.status.as_str().to_string()),
            "lat" => self.lat.map(|v| v.to_string()),
            "lng" => self.lng.map(|v| v.to_string()),
            _ => self.fields.get(name).and_then(value_text),
        }
    }
}

/// Whether a coordinate pair is plottable.
pub fn has_valid_coordinates(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
        && !(lat == 0.0 && lng == 0.0)
}

/// Text of a scalar JSON value. Objects carrying a `display_value` (lookup
/// fields) resolve to it.
pub fn value_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("display_value").and_then(value_text),
        Value::Null | Value::Array(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(lat: Option<f64>, lng: Option<f64>) -> Entity {
        Entity {
            id: "1".into(),
            lat,
            lng,
            status: Status::Live,
            last_updated: "2024-01-01T00:00:00+00:00".into(),
            fields: Map::new(),
        }
    }

    #[test]
    fn test_coordinate_validity() {
        assert!(!has_valid_coordinates(0.0, 0.0));
        assert!(!has_valid_coordinates(91.0, 10.0));
        assert!(!has_valid_coordinates(10.0, 181.0));
        assert!(!has_valid_coordinates(f64::NAN, 10.0));
        assert!(has_valid_coordinates(12.9, 77.6));
        assert!(has_valid_coordinates(0.0, 77.6));
        assert!(has_valid_coordinates(-90.0, 180.0));
    }

    #[test]
    fn test_entity_coordinates() {
        assert_eq!(entity(Some(12.9), Some(77.6)).coordinates(), Some((12.9, 77.6)));
        assert!(!entity(Some(0.0), Some(0.0)).has_valid_coordinates());
        assert!(!entity(Some(12.9), None).has_valid_coordinates());
        assert!(!entity(None, None).has_valid_coordinates());
    }

    #[test]
    fn test_entity_type_parse() {
        assert_eq!("projects".parse::<EntityType>().unwrap(), EntityType::Project);
        assert_eq!("Billing-Location".parse::<EntityType>().unwrap(), EntityType::BillingLocation);
        assert_eq!("resource".parse::<EntityType>().unwrap(), EntityType::Resource);
        assert!("invoices".parse::<EntityType>().is_err());
    }

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [Status::Cancelled, Status::Suspended, Status::Archived, Status::Completed, Status::Live] {
            assert_eq!(status.as_str().parse::<Status>().unwrap(), status);
        }
    }

    #[test]
    fn test_field_text() {
        let mut e = entity(Some(1.5), None);
        e.fields.insert("account".into(), json!({ "ID": "9", "display_value": "Acme" }));
        e.fields.insert("crew_size".into(), json!(4));
        e.fields.insert("notes".into(), Value::Null);

        assert_eq!(e.field_text("status").as_deref(), Some("Live"));
        assert_eq!(e.field_text("lat").as_deref(), Some("1.5"));
        assert_eq!(e.field_text("lng"), None);
        assert_eq!(e.field_text("account").as_deref(), Some("Acme"));
        assert_eq!(e.field_text("crew_size").as_deref(), Some("4"));
        assert_eq!(e.field_text("notes"), None);
        assert_eq!(e.field_text("missing"), None);
    }
}
