//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Directory service endpoint and HTTP behavior
    #[serde(default)]
    pub api: ApiConfig,

    /// Domain listing query and presentation rules
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    /// Social connections listing
    #[serde(default)]
    pub connections: ConnectionsConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if url::Url::parse(&self.api.base_url).is_err() {
            return Err(AppError::validation(format!(
                "api.base_url is not a valid URL: {}",
                self.api.base_url
            )));
        }
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.discovery.page_cap == 0 {
            return Err(AppError::validation("discovery.page_cap must be > 0"));
        }
        if self.discovery.tags.iter().all(|t| t.trim().is_empty()) {
            return Err(AppError::validation("discovery.tags is empty"));
        }
        if self.connections.per_page == 0 {
            return Err(AppError::validation("connections.per_page must be > 0"));
        }
        Ok(())
    }
}

/// Directory service endpoint and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the directory service
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between page requests in milliseconds
    #[serde(default)]
    pub request_delay_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: 0,
        }
    }
}

/// Domain discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Story actions requested with each listing page
    #[serde(default = "defaults::include_actions")]
    pub include_actions: String,

    /// Access restriction filter
    #[serde(default = "defaults::restriction")]
    pub restriction: String,

    /// Only list domains that are currently online
    #[serde(default = "defaults::require_online")]
    pub require_online: bool,

    /// Protocol signature of the client engine; empty lists every version
    #[serde(default)]
    pub protocol: String,

    /// Tags marking curated entries shown for an empty query
    #[serde(default = "defaults::tags")]
    pub tags: Vec<String>,

    /// Maximum number of pages fetched per pass
    #[serde(default = "defaults::page_cap")]
    pub page_cap: u32,

    /// Local thumbnail used when a domain has none of its own
    #[serde(default = "defaults::placeholder_thumbnail")]
    pub placeholder_thumbnail: String,

    /// Substrings identifying the service's stock thumbnail
    #[serde(default = "defaults::default_thumbnail_markers")]
    pub default_thumbnail_markers: Vec<String>,

    /// Display name of the synthesized last-location entry
    #[serde(default = "defaults::last_location_label")]
    pub last_location_label: String,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            include_actions: defaults::include_actions(),
            restriction: defaults::restriction(),
            require_online: defaults::require_online(),
            protocol: String::new(),
            tags: defaults::tags(),
            page_cap: defaults::page_cap(),
            placeholder_thumbnail: defaults::placeholder_thumbnail(),
            default_thumbnail_markers: defaults::default_thumbnail_markers(),
            last_location_label: defaults::last_location_label(),
        }
    }
}

impl DiscoveryConfig {
    /// Tags joined the way the listing endpoint expects them.
    pub fn tags_param(&self) -> String {
        self.tags
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Social connections settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionsConfig {
    /// Page size requested from the users endpoint
    #[serde(default = "defaults::per_page")]
    pub per_page: u32,
}

impl Default for ConnectionsConfig {
    fn default() -> Self {
        Self {
            per_page: defaults::per_page(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log filter when RUST_LOG is unset
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // Api defaults
    pub fn base_url() -> String {
        "https://metaverse.highfidelity.com".into()
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; directory/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Discovery defaults
    pub fn include_actions() -> String {
        "concurrency".into()
    }
    pub fn restriction() -> String {
        "open".into()
    }
    pub fn require_online() -> bool {
        true
    }
    pub fn tags() -> Vec<String> {
        vec!["mobile".into()]
    }
    pub fn page_cap() -> u32 {
        10
    }
    pub fn placeholder_thumbnail() -> String {
        "asset://thumbnails/domain_placeholder.png".into()
    }
    pub fn default_thumbnail_markers() -> Vec<String> {
        vec!["/assets/places/thumbnail-default".into()]
    }
    pub fn last_location_label() -> String {
        "Your last location".into()
    }

    // Connections defaults
    pub fn per_page() -> u32 {
        400
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_page_cap() {
        let mut config = Config::default();
        config.discovery.page_cap = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_tags() {
        let mut config = Config::default();
        config.discovery.tags = vec!["  ".to_string()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [api]
            base_url = "http://localhost:3000"

            [discovery]
            tags = ["mobile", "featured"]
            "#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "http://localhost:3000");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.discovery.page_cap, 10);
        assert_eq!(config.discovery.tags_param(), "mobile,featured");
        assert_eq!(config.connections.per_page, 400);
    }
}
