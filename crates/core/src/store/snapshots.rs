//! Snapshot tables.
//!
//! A snapshot is replaced wholesale: the old rows are deleted, the new rows
//! inserted and the metadata row written in one transaction, so readers see
//! either the previous snapshot or the new one.

use chrono::{DateTime, Utc};
use tokio_rusqlite::params;

use super::connection::CacheDb;
use super::metadata::{SyncMetadata, upsert_metadata};
use crate::Error;
use crate::entity::{Entity, EntityType, Status};
use crate::query::{FilterSet, QueryResult};

/// Entity flattened into column values.
struct Row {
    id: String,
    lat: Option<f64>,
    lng: Option<f64>,
    status: &'static str,
    last_updated: String,
    fields_json: String,
}

impl Row {
    fn encode(entity: &Entity) -> Result<Self, Error> {
        let fields_json = serde_json::to_string(&entity.fields)
            .map_err(|e| Error::InvalidInput(format!("entity {} fields: {e}", entity.id)))?;
        Ok(Self {
            id: entity.id.clone(),
            lat: entity.lat,
            lng: entity.lng,
            status: entity.status.as_str(),
            last_updated: entity.last_updated.clone(),
            fields_json,
        })
    }
}

type RawColumns = (String, Option<f64>, Option<f64>, String, String, String);

fn decode(table: &str, (id, lat, lng, status, last_updated, fields_json): RawColumns) -> Result<Entity, Error> {
    let corrupt = |reason: String| Error::CorruptRow { table: table.to_string(), reason };
    let status: Status = status.parse().map_err(|e: Error| corrupt(format!("id {id}: {e}")))?;
    let fields = serde_json::from_str(&fields_json).map_err(|e| corrupt(format!("id {id}: {e}")))?;
    Ok(Entity { id, lat, lng, status, last_updated, fields })
}

impl CacheDb {
    /// Replace an entity table with a new snapshot and record the sync.
    ///
    /// Delete, insert and metadata upsert share one transaction; on error
    /// nothing changes.
    pub async fn replace_all(
        &self, entity_type: EntityType, entities: &[Entity], synced_at: DateTime<Utc>,
    ) -> Result<SyncMetadata, Error> {
        let rows = entities.iter().map(Row::encode).collect::<Result<Vec<_>, _>>()?;
        let meta = SyncMetadata::new(entity_type, synced_at, rows.len());
        let table = entity_type.table_name();

        let committed = meta.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(&format!("DELETE FROM {table}"), [])?;
                {
                    let mut stmt = tx.prepare(&format!(
                        "INSERT INTO {table} (id, lat, lng, status, last_updated, fields_json)
                        VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                    ))?;
                    for row in &rows {
                        stmt.execute(params![row.id, row.lat, row.lng, row.status, row.last_updated, row.fields_json])?;
                    }
                }
                upsert_metadata(&tx, &committed)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        tracing::info!(entity_type = %entity_type, count = meta.record_count, "committed snapshot");
        Ok(meta)
    }

    /// Load the full snapshot for an entity type in insertion order.
    pub async fn load_snapshot(&self, entity_type: EntityType) -> Result<Vec<Entity>, Error> {
        let table = entity_type.table_name();
        self.conn
            .call(move |conn| -> Result<Vec<Entity>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT id, lat, lng, status, last_updated, fields_json FROM {table} ORDER BY rowid"
                ))?;
                let columns = stmt
                    .query_map([], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?))
                    })?
                    .collect::<Result<Vec<RawColumns>, _>>()?;

                columns.into_iter().map(|c| decode(table, c)).collect()
            })
            .await
            .map_err(Error::from)
    }

    /// Filter the stored snapshot. `total` is the snapshot size before filtering.
    pub async fn query_all(&self, entity_type: EntityType, filters: &FilterSet) -> Result<QueryResult, Error> {
        let snapshot = self.load_snapshot(entity_type).await?;
        Ok(filters.apply(&snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn make_entity(id: &str, status: Status, address: &str) -> Entity {
        let mut fields = Map::new();
        fields.insert("address".into(), json!(address));
        Entity {
            id: id.to_string(),
            lat: Some(25.7),
            lng: Some(-80.2),
            status,
            last_updated: Utc::now().to_rfc3339(),
            fields,
        }
    }

    #[tokio::test]
    async fn test_replace_and_load() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let entities =
            vec![make_entity("b", Status::Live, "1 Ocean Dr"), make_entity("a", Status::Archived, "2 Bay Rd")];

        let meta = db.replace_all(EntityType::Project, &entities, Utc::now()).await.unwrap();
        assert_eq!(meta.record_count, 2);

        let loaded = db.load_snapshot(EntityType::Project).await.unwrap();
        assert_eq!(loaded, entities);
        assert_eq!(db.get_metadata(EntityType::Project).await.unwrap(), Some(meta));
    }

    #[tokio::test]
    async fn test_replace_drops_previous_rows() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let first = [make_entity("1", Status::Live, "x"), make_entity("2", Status::Live, "y")];
        db.replace_all(EntityType::Resource, &first, Utc::now()).await.unwrap();
        db.replace_all(EntityType::Resource, &[make_entity("3", Status::Live, "z")], Utc::now())
            .await
            .unwrap();

        let loaded = db.load_snapshot(EntityType::Resource).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "3");
    }

    #[tokio::test]
    async fn test_failed_replace_keeps_previous_snapshot() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let before = db
            .replace_all(EntityType::Project, &[make_entity("1", Status::Live, "x")], Utc::now())
            .await
            .unwrap();

        let duplicate_ids = vec![make_entity("9", Status::Live, "x"), make_entity("9", Status::Live, "y")];
        let result = db.replace_all(EntityType::Project, &duplicate_ids, Utc::now()).await;
        assert!(result.is_err());

        let loaded = db.load_snapshot(EntityType::Project).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "1");
        assert_eq!(db.get_metadata(EntityType::Project).await.unwrap(), Some(before));
    }

    #[tokio::test]
    async fn test_tables_are_independent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.replace_all(EntityType::Project, &[make_entity("1", Status::Live, "x")], Utc::now())
            .await
            .unwrap();

        assert!(db.load_snapshot(EntityType::BillingLocation).await.unwrap().is_empty());
        assert!(db.get_metadata(EntityType::BillingLocation).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalidate_keeps_rows() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.replace_all(EntityType::Project, &[make_entity("1", Status::Live, "x")], Utc::now())
            .await
            .unwrap();

        db.invalidate(EntityType::Project).await.unwrap();

        assert!(db.get_metadata(EntityType::Project).await.unwrap().is_none());
        assert_eq!(db.load_snapshot(EntityType::Project).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_query_all() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.replace_all(
            EntityType::Project,
            &[make_entity("1", Status::Live, "1 Ocean Dr, Miami"), make_entity("2", Status::Completed, "Tampa")],
            Utc::now(),
        )
        .await
        .unwrap();

        let result = db
            .query_all(EntityType::Project, &FilterSet::new().contains("address", "MIAMI"))
            .await
            .unwrap();
        assert_eq!(result.total, 2);
        assert_eq!(result.data.len(), 1);
        assert_eq!(result.data[0].id, "1");
    }
}
