//! entities_values tool implementation.
//!
//! Distinct values of one field among the entities matching the current
//! filters, for populating cascading dropdowns.

use fieldmap_core::{Error, FilterSet, SyncCoordinator, distinct_values};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::tools::{json_result, parse_entity_type};

/// Parameters for the entities_values tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntitiesValuesParams {
    /// Entity type: "project", "resource" or "billing_location".
    pub entity_type: String,

    /// Field to collect values of, e.g. "status" or "account_type".
    pub field: String,

    /// Filters already applied upstream in the cascade (same syntax as entities_get).
    #[serde(default)]
    pub filters: Option<Map<String, Value>>,
}

/// Output from the entities_values tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EntitiesValuesOutput {
    pub entity_type: String,
    pub field: String,
    /// Sorted distinct non-empty values.
    pub values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Implementation of the entities_values tool.
pub async fn values_impl(
    coordinator: &SyncCoordinator, params: EntitiesValuesParams,
) -> Result<CallToolResult, McpError> {
    let entity_type = parse_entity_type(&params.entity_type)?;
    let field = params.field.trim();
    if field.is_empty() {
        return Err(Error::InvalidInput("field cannot be empty".into()).into());
    }

    let filters = params.filters.as_ref().map(FilterSet::from_map).unwrap_or_default();
    let result = coordinator.get_entities(entity_type, &filters).await;

    let output = EntitiesValuesOutput {
        entity_type: entity_type.to_string(),
        field: field.to_string(),
        values: distinct_values(&result.data, field),
        warning: result.warning,
    };
    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{StaticSource, coordinator, output, projects};
    use serde_json::json;

    #[tokio::test]
    async fn test_values_cascade() {
        let coordinator = coordinator(StaticSource::ok(projects())).await;

        let all = values_impl(
            &coordinator,
            EntitiesValuesParams { entity_type: "project".into(), field: "account_type".into(), filters: None },
        )
        .await
        .unwrap();
        let all: EntitiesValuesOutput = output(&all);
        assert_eq!(all.values, vec!["Commercial", "Residential"]);

        let miami = values_impl(
            &coordinator,
            EntitiesValuesParams {
                entity_type: "project".into(),
                field: "status".into(),
                filters: json!({ "addressContains": "Miami" }).as_object().cloned(),
            },
        )
        .await
        .unwrap();
        let miami: EntitiesValuesOutput = output(&miami);
        assert_eq!(miami.values, vec!["Completed", "Live"]);
    }

    #[tokio::test]
    async fn test_values_requires_field() {
        let coordinator = coordinator(StaticSource::ok(projects())).await;
        let result = values_impl(
            &coordinator,
            EntitiesValuesParams { entity_type: "project".into(), field: " ".into(), filters: None },
        )
        .await;
        assert_eq!(result.unwrap_err().code.0, -32602);
    }
}
