//! Core types and sync logic for the fieldmap dashboard.
//!
//! This crate provides:
//! - Record normalization into map-ready entities
//! - A SQLite local store of entity snapshots
//! - Paginated fetching against any [`RecordSource`]
//! - The sync coordinator and filtered query layer
//! - Unified error types and layered configuration

pub mod config;
pub mod entity;
pub mod error;
pub mod normalize;
pub mod query;
pub mod source;
pub mod store;
pub mod sync;

pub use config::{AppConfig, ConfigError};
pub use entity::{Entity, EntityType, Status};
pub use error::Error;
pub use query::{FilterSet, QueryResult, distinct_values, with_valid_coordinates};
pub use source::{FetchError, PageRequest, RecordSource};
pub use store::{CacheDb, SyncMetadata};
pub use sync::{EntityResult, ResultSource, SyncCoordinator, SyncOutcome, SyncSettings};
