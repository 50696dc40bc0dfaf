//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FIELDMAP_*)
//! 2. TOML config file (if FIELDMAP_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::entity::EntityType;
use crate::normalize::{NormalizerConfig, StatusGating};
use crate::source::PaginationOptions;

mod validation;

pub use validation::ConfigError;

/// Remote report name per entity type.
///
/// Set via FIELDMAP_REPORTS__PROJECTS, FIELDMAP_REPORTS__RESOURCES and
/// FIELDMAP_REPORTS__BILLING_LOCATIONS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportNames {
    #[serde(default = "default_projects_report")]
    pub projects: String,
    #[serde(default = "default_resources_report")]
    pub resources: String,
    #[serde(default = "default_billing_report")]
    pub billing_locations: String,
}

impl Default for ReportNames {
    fn default() -> Self {
        Self {
            projects: default_projects_report(),
            resources: default_resources_report(),
            billing_locations: default_billing_report(),
        }
    }
}

impl ReportNames {
    pub fn for_type(&self, entity_type: EntityType) -> &str {
        match entity_type {
            EntityType::Project => &self.projects,
            EntityType::Resource => &self.resources,
            EntityType::BillingLocation => &self.billing_locations,
        }
    }
}

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FIELDMAP_*)
/// 2. TOML config file (if FIELDMAP_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the remote record API, e.g. `https://host/api/v2/owner/app`.
    ///
    /// Set via FIELDMAP_API_BASE_URL. Required only when a sync runs.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Access token sent with every remote request.
    ///
    /// Set via FIELDMAP_API_TOKEN.
    #[serde(default)]
    pub api_token: Option<String>,

    /// Authorization scheme placed before the token.
    ///
    /// Set via FIELDMAP_AUTH_SCHEME.
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    /// Path to SQLite store database.
    ///
    /// Set via FIELDMAP_DB_PATH.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via FIELDMAP_USER_AGENT.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Per-page request timeout in milliseconds.
    ///
    /// Set via FIELDMAP_TIMEOUT_MS.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Records requested per page.
    ///
    /// Set via FIELDMAP_PAGE_SIZE.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Safety cap on pages walked per sync.
    ///
    /// Set via FIELDMAP_MAX_PAGES.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Maximum snapshot age in seconds before a query resyncs.
    ///
    /// Unset means snapshots stay fresh until explicitly invalidated.
    /// Set via FIELDMAP_SYNC_MAX_AGE_SECS.
    #[serde(default)]
    pub sync_max_age_secs: Option<u64>,

    /// Whether status classification requires a valid location.
    ///
    /// Set via FIELDMAP_REQUIRE_LOCATION_FOR_STATUS.
    #[serde(default)]
    pub require_location_for_status: bool,

    /// Remote report names.
    #[serde(default)]
    pub reports: ReportNames,
}

fn default_auth_scheme() -> String {
    "Zoho-oauthtoken".into()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./fieldmap-cache.sqlite")
}

fn default_user_agent() -> String {
    "fieldmap/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_page_size() -> u32 {
    1000
}

fn default_max_pages() -> usize {
    50
}

fn default_projects_report() -> String {
    "All_Projects".into()
}

fn default_resources_report() -> String {
    "All_Resources".into()
}

fn default_billing_report() -> String {
    "All_Billing_Locations".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            auth_scheme: default_auth_scheme(),
            db_path: default_db_path(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            sync_max_age_secs: None,
            require_location_for_status: false,
            reports: ReportNames::default(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Snapshot TTL, if one is configured.
    pub fn sync_max_age(&self) -> Option<Duration> {
        self.sync_max_age_secs.map(Duration::from_secs)
    }

    pub fn pagination(&self) -> PaginationOptions {
        PaginationOptions { page_size: self.page_size, max_pages: self.max_pages, page_timeout: self.timeout() }
    }

    pub fn normalizer(&self) -> NormalizerConfig {
        let gating =
            if self.require_location_for_status { StatusGating::RequireLocation } else { StatusGating::Ungated };
        NormalizerConfig { gating }
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FIELDMAP_`
    /// 2. TOML file from `FIELDMAP_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FIELDMAP_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FIELDMAP_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Remote API base URL (for deferred validation).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the base URL is not set.
    pub fn require_api_base_url(&self) -> Result<&str, ConfigError> {
        self.api_base_url.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "api_base_url".into(),
            hint: "Set FIELDMAP_API_BASE_URL environment variable".into(),
        })
    }
}
