//! Filtered reads over an entity snapshot.
//!
//! Predicates are ANDed. Missing or null fields fail a predicate rather than
//! erroring, and the snapshot is never mutated.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::entity::{Entity, value_text};

/// Key suffix marking a substring filter in [`FilterSet::from_map`].
const CONTAINS_SUFFIX: &str = "Contains";

/// Key for free-text search in [`FilterSet::from_map`].
const SEARCH_KEY: &str = "q";

/// Key restricting results to plottable entities in [`FilterSet::from_map`].
const MAPPABLE_KEY: &str = "mappable";

/// One filter condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Exact, case-sensitive match on a field's text.
    Equals { field: String, value: String },
    /// Case-insensitive substring match on one field.
    Contains { field: String, needle: String },
    /// Case-insensitive substring match on the id, the status or any field.
    Search { needle: String },
    /// Entity has valid coordinates.
    Mappable,
}

impl Predicate {
    fn matches(&self, entity: &Entity) -> bool {
        match self {
            Predicate::Equals { value, .. } if value.is_empty() => true,
            Predicate::Equals { field, value } => entity.field_text(field).as_deref() == Some(value.as_str()),
            Predicate::Contains { needle, .. } if needle.is_empty() => true,
            Predicate::Contains { field, needle } => entity
                .field_text(field)
                .is_some_and(|text| text.to_lowercase().contains(needle)),
            Predicate::Search { needle } if needle.is_empty() => true,
            Predicate::Search { needle } => {
                entity.id.to_lowercase().contains(needle)
                    || entity.status.as_str().to_lowercase().contains(needle)
                    || entity
                        .fields
                        .values()
                        .filter_map(value_text)
                        .any(|text| text.to_lowercase().contains(needle))
            }
            Predicate::Mappable => entity.has_valid_coordinates(),
        }
    }
}

/// A conjunction of predicates. The empty set matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    predicates: Vec<Predicate>,
}

/// Filtered entities plus the size of the snapshot they came from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct QueryResult {
    pub data: Vec<Entity>,
    /// Pre-filter snapshot size, for "N of M" counts.
    pub total: usize,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.predicates.push(Predicate::Equals { field: field.into(), value: value.into() });
        self
    }

    pub fn contains(mut self, field: impl Into<String>, needle: impl AsRef<str>) -> Self {
        self.predicates
            .push(Predicate::Contains { field: field.into(), needle: needle.as_ref().to_lowercase() });
        self
    }

    pub fn search(mut self, needle: impl AsRef<str>) -> Self {
        self.predicates.push(Predicate::Search { needle: needle.as_ref().to_lowercase() });
        self
    }

    pub fn mappable(mut self) -> Self {
        self.predicates.push(Predicate::Mappable);
        self
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Build a filter set from a UI filter object.
    ///
    /// - `"<field>": value` is an exact match,
    /// - `"<field>Contains": value` is a case-insensitive substring match,
    /// - `"q": value` searches every field,
    /// - `"mappable": true` keeps entities with valid coordinates.
    ///
    /// Null and non-scalar values are ignored.
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut set = Self::new();
        for (key, value) in map {
            if key == MAPPABLE_KEY {
                if value.as_bool() == Some(true) {
                    set = set.mappable();
                }
                continue;
            }

            let Some(text) = value_text(value) else { continue };

            set = if key == SEARCH_KEY {
                set.search(text)
            } else if let Some(field) = key.strip_suffix(CONTAINS_SUFFIX).filter(|f| !f.is_empty()) {
                set.contains(field, text)
            } else {
                set.equals(key.clone(), text)
            };
        }
        set
    }

    pub fn matches(&self, entity: &Entity) -> bool {
        self.predicates.iter().all(|p| p.matches(entity))
    }

    /// Apply the filters to a snapshot.
    pub fn apply(&self, snapshot: &[Entity]) -> QueryResult {
        let data = snapshot.iter().filter(|e| self.matches(e)).cloned().collect();
        QueryResult { data, total: snapshot.len() }
    }
}

/// Sorted distinct non-empty values of a field, for populating the next
/// dropdown of a cascade from the current result.
pub fn distinct_values(entities: &[Entity], field: &str) -> Vec<String> {
    entities
        .iter()
        .filter_map(|e| e.field_text(field))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Entities that can be plotted on the map.
pub fn with_valid_coordinates(entities: &[Entity]) -> Vec<Entity> {
    entities.iter().filter(|e| e.has_valid_coordinates()).cloned().collect()
}
