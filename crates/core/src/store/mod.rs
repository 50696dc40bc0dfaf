//! SQLite-backed local store for entity snapshots.
//!
//! One table per entity type plus a `sync_metadata` table, accessed through
//! tokio-rusqlite. It supports:
//!
//! - Whole-snapshot replacement in a single transaction
//! - Sync metadata with explicit invalidation
//! - Automatic schema migrations
//! - WAL mode so reads proceed during a commit

pub mod connection;
pub mod metadata;
pub mod migrations;
pub mod snapshots;

pub use crate::Error;

pub use connection::CacheDb;
pub use metadata::{ENTITY_SCHEMA_VERSION, SyncMetadata};
