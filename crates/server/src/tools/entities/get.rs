//! entities_get tool implementation.
//!
//! Returns the filtered entities of one type, resyncing first if the local
//! snapshot is stale.

use fieldmap_core::{EntityResult, FilterSet, SyncCoordinator};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tools::{json_result, parse_entity_type};

/// Parameters for the entities_get tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntitiesGetParams {
    /// Entity type: "project", "resource" or "billing_location".
    pub entity_type: String,

    /// Filters, ANDed together:
    /// - `"<field>": value` exact match (e.g. `"status": "Live"`)
    /// - `"<field>Contains": value` case-insensitive substring match
    /// - `"q": value` search across all fields
    /// - `"mappable": true` only entities with valid coordinates
    #[serde(default)]
    pub filters: Option<Map<String, Value>>,

    /// Return at most this many entities. `total` is unaffected.
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Implementation of the entities_get tool.
pub async fn get_impl(coordinator: &SyncCoordinator, params: EntitiesGetParams) -> Result<CallToolResult, McpError> {
    let entity_type = parse_entity_type(&params.entity_type)?;
    let filters = params.filters.as_ref().map(FilterSet::from_map).unwrap_or_default();

    let mut result: EntityResult = coordinator.get_entities(entity_type, &filters).await;
    if let Some(limit) = params.limit {
        result.data.truncate(limit);
    }

    if let Some(warning) = &result.warning {
        tracing::warn!(entity_type = %entity_type, "{warning}");
    }

    json_result(&result)
}
