//! sync_status tool implementation.
//!
//! Reports, per entity type, when it last synced and whether the next query
//! will resync it.

use chrono::Utc;
use fieldmap_core::{EntityType, Error, SyncCoordinator, SyncMetadata};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::json_result;

/// Sync state of one entity table.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TableStatus {
    pub entity_type: EntityType,
    /// Metadata of the last committed sync; absent if never synced or invalidated.
    pub metadata: Option<SyncMetadata>,
    /// The next query for this type will resync first.
    pub stale: bool,
}

/// Output from the sync_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SyncStatusOutput {
    /// False when running without a local store.
    pub store_available: bool,
    pub tables: Vec<TableStatus>,
}

/// Implementation of the sync_status tool.
pub async fn status_impl(coordinator: &SyncCoordinator) -> Result<CallToolResult, McpError> {
    let metadata = match coordinator.sync_status().await {
        Ok(metadata) => Some(metadata),
        Err(Error::StoreUnavailable(_)) => None,
        Err(e) => return Err(e.into()),
    };

    let now = Utc::now();
    let output = match metadata {
        None => SyncStatusOutput {
            store_available: false,
            tables: EntityType::ALL
                .into_iter()
                .map(|entity_type| TableStatus { entity_type, metadata: None, stale: true })
                .collect(),
        },
        Some(metadata) => SyncStatusOutput {
            store_available: true,
            tables: EntityType::ALL
                .into_iter()
                .map(|entity_type| {
                    let meta = metadata.iter().find(|m| m.table_name == entity_type.table_name()).cloned();
                    let stale = coordinator.settings().is_stale(meta.as_ref(), now);
                    TableStatus { entity_type, metadata: meta, stale }
                })
                .collect(),
        },
    };

    json_result(&output)
}
