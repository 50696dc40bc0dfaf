//! Sync metadata: one row per entity table recording the last full sync.
//!
//! A missing row means the table is stale. `invalidate` deletes the row but
//! leaves the snapshot in place so it can still answer queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::{params, rusqlite};

use super::connection::CacheDb;
use crate::Error;
use crate::entity::EntityType;

/// Version of the stored entity shape. Rows written under another version
/// are treated as stale.
pub const ENTITY_SCHEMA_VERSION: i64 = 1;

/// Last successful sync of one entity table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SyncMetadata {
    pub table_name: String,
    /// RFC 3339 time the snapshot was committed.
    pub last_sync: String,
    pub record_count: i64,
    pub schema_version: i64,
}

impl SyncMetadata {
    pub fn new(entity_type: EntityType, last_sync: DateTime<Utc>, record_count: usize) -> Self {
        Self {
            table_name: entity_type.table_name().to_string(),
            last_sync: last_sync.to_rfc3339(),
            record_count: record_count as i64,
            schema_version: ENTITY_SCHEMA_VERSION,
        }
    }

    /// Parsed `last_sync`, or `None` if the stored value is unreadable.
    pub fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_sync)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

pub(crate) fn read_metadata_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<SyncMetadata> {
    Ok(SyncMetadata {
        table_name: row.get(0)?,
        last_sync: row.get(1)?,
        record_count: row.get(2)?,
        schema_version: row.get(3)?,
    })
}

pub(crate) fn upsert_metadata(conn: &rusqlite::Connection, meta: &SyncMetadata) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT INTO sync_metadata (table_name, last_sync, record_count, schema_version)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(table_name) DO UPDATE SET
            last_sync = excluded.last_sync,
            record_count = excluded.record_count,
            schema_version = excluded.schema_version",
        params![meta.table_name, meta.last_sync, meta.record_count, meta.schema_version],
    )
}

impl CacheDb {
    /// Get the sync metadata for an entity type.
    ///
    /// Returns None if the table has never synced or was invalidated.
    pub async fn get_metadata(&self, entity_type: EntityType) -> Result<Option<SyncMetadata>, Error> {
        let table = entity_type.table_name();
        self.conn
            .call(move |conn| -> Result<Option<SyncMetadata>, Error> {
                let result = conn.query_row(
                    "SELECT table_name, last_sync, record_count, schema_version
                    FROM sync_metadata WHERE table_name = ?1",
                    params![table],
                    read_metadata_row,
                );

                match result {
                    Ok(meta) => Ok(Some(meta)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or update sync metadata.
    pub async fn set_metadata(&self, meta: &SyncMetadata) -> Result<(), Error> {
        let meta = meta.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                upsert_metadata(conn, &meta)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Clear the metadata for an entity type so the next query resyncs.
    ///
    /// Snapshot rows are kept. Returns whether a row was removed.
    pub async fn invalidate(&self, entity_type: EntityType) -> Result<bool, Error> {
        let table = entity_type.table_name();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM sync_metadata WHERE table_name = ?1", params![table])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Metadata rows for every synced table, ordered by table name.
    pub async fn all_metadata(&self) -> Result<Vec<SyncMetadata>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<SyncMetadata>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT table_name, last_sync, record_count, schema_version
                    FROM sync_metadata ORDER BY table_name",
                )?;
                let rows = stmt.query_map([], read_metadata_row)?;
                rows.collect::<Result<Vec<_>, _>>().map_err(Error::from)
            })
            .await
            .map_err(Error::from)
    }
}
