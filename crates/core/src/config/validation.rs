//! Post-load checks on `AppConfig`.

use crate::config::AppConfig;
use crate::entity::EntityType;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for the first rule that fails:
    /// - `page_size` outside 1-1000 (the report API's page limit)
    /// - `max_pages` outside 1-500
    /// - `timeout_ms` below 100ms or above 5 minutes
    /// - empty `user_agent` or report name
    /// - `api_base_url` set to something other than an http(s) URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=1000).contains(&self.page_size) {
            return Err(invalid("page_size", "must be between 1 and 1000"));
        }
        if !(1..=500).contains(&self.max_pages) {
            return Err(invalid("max_pages", "must be between 1 and 500"));
        }

        match self.timeout_ms {
            0..100 => return Err(invalid("timeout_ms", "must be at least 100ms")),
            100..=300_000 => {}
            _ => return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)")),
        }

        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if let Some(entity_type) = EntityType::ALL
            .into_iter()
            .find(|et| self.reports.for_type(*et).trim().is_empty())
        {
            return Err(invalid(format!("reports.{}", entity_type.table_name()), "must not be empty"));
        }

        let base_url_ok = self
            .api_base_url
            .as_deref()
            .is_none_or(|url| url.starts_with("https://") || url.starts_with("http://"));
        if !base_url_ok {
            return Err(invalid("api_base_url", "must be an http(s) URL"));
        }

        if self.sync_max_age_secs == Some(0) {
            tracing::warn!("sync_max_age_secs is 0; every query will resync");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportNames;

    #[test]
    fn test_validate_default_config() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_page_size_bounds() {
        let config = AppConfig { page_size: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "page_size"));

        let config = AppConfig { page_size: 1001, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "page_size"));
    }

    #[test]
    fn test_validate_max_pages_bounds() {
        let config = AppConfig { max_pages: 0, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "max_pages"));
    }

    #[test]
    fn test_validate_timeout_too_small() {
        let config = AppConfig { timeout_ms: 50, ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_timeout_exceeds_limit() {
        let config = AppConfig { timeout_ms: 301_000, ..Default::default() }; // 5min 1sec
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "timeout_ms"));
    }

    #[test]
    fn test_validate_empty_user_agent() {
        let config = AppConfig { user_agent: String::new(), ..Default::default() };
        let result = config.validate();
        assert!(matches!(result, Err(ConfigError::Invalid { field, .. }) if field == "user_agent"));
    }

    #[test]
    fn test_validate_empty_report_name() {
        let reports = ReportNames { resources: " ".into(), ..Default::default() };
        let config = AppConfig { reports, ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "reports.resources"));
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let config = AppConfig { api_base_url: Some("ftp://example.com".into()), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field, .. }) if field == "api_base_url"));
    }

    #[test]
    fn test_validate_edge_case_values() {
        let config = AppConfig { page_size: 1, max_pages: 500, timeout_ms: 100, ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
