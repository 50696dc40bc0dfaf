//! entities_refresh tool implementation.
//!
//! Invalidates the sync metadata of one entity type and resyncs it.

use fieldmap_core::SyncCoordinator;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::tools::{json_result, parse_entity_type};

/// Parameters for the entities_refresh tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntitiesRefreshParams {
    /// Entity type: "project", "resource" or "billing_location".
    pub entity_type: String,
}

/// Output from the entities_refresh tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntitiesRefreshOutput {
    pub entity_type: String,
    /// Entities in the snapshot after the refresh.
    pub total: usize,
    /// The refresh failed and the previous snapshot was kept.
    pub stale: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Implementation of the entities_refresh tool.
pub async fn refresh_impl(
    coordinator: &SyncCoordinator, params: EntitiesRefreshParams,
) -> Result<CallToolResult, McpError> {
    let entity_type = parse_entity_type(&params.entity_type)?;
    tracing::info!(entity_type = %entity_type, "forced refresh requested");

    let result = coordinator.force_refresh(entity_type).await;

    let output = EntitiesRefreshOutput {
        entity_type: entity_type.to_string(),
        total: result.total,
        stale: result.stale,
        warning: result.warning,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StaticSource, coordinator, output, projects};
    use fieldmap_core::{EntityType, FilterSet};

    #[tokio::test]
    async fn test_refresh_resyncs_fresh_table() {
        let source = StaticSource::ok(projects());
        let coordinator = coordinator(source.clone()).await;
        coordinator.ensure_fresh(EntityType::Project, &FilterSet::new()).await;

        let result = refresh_impl(&coordinator, EntitiesRefreshParams { entity_type: "project".into() })
            .await
            .unwrap();
        let output: EntitiesRefreshOutput = output(&result);

        assert_eq!(source.calls(), 2);
        assert_eq!(output.total, 3);
        assert!(!output.stale);
        assert_eq!(output.entity_type, "project");
    }

    #[tokio::test]
    async fn test_refresh_rejects_unknown_type() {
        let coordinator = coordinator(StaticSource::ok(projects())).await;
        let result = refresh_impl(&coordinator, EntitiesRefreshParams { entity_type: "".into() }).await;
        assert!(result.is_err());
    }
}
