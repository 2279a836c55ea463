//! Configuration management for the Bridgeline admin

use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::Validate;

/// Environment variable prefix, e.g. `BRIDGELINE__API__BASE_URL`
pub const ENV_PREFIX: &str = "BRIDGELINE";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Backend API configuration
    #[serde(default)]
    #[validate(nested)]
    pub api: ApiConfig,

    /// Credentials attached to every request
    #[serde(default)]
    pub auth: AuthConfig,

    /// List view behavior
    #[serde(default)]
    #[validate(nested)]
    pub list: ListConfig,

    /// Client-side upload constraints
    #[serde(default)]
    #[validate(nested)]
    pub uploads: UploadConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Backend API configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApiConfig {
    /// Base URL of the REST backend, including any version prefix
    #[serde(default = "default_base_url")]
    #[validate(url(message = "must be an absolute URL"))]
    pub base_url: String,

    /// Total request timeout in seconds
    #[serde(default = "default_request_timeout")]
    #[validate(range(min = 1, max = 600))]
    pub request_timeout: u64,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    #[validate(range(min = 1, max = 120))]
    pub connect_timeout: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Credentials configuration
///
/// A bearer token takes precedence over a cookie when both are set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Bearer token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Raw `Cookie` header value for session-based backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
}

/// List view configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ListConfig {
    /// Default rows per page
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 1000))]
    pub page_size: u32,

    /// Quiet window before a search term is sent, in milliseconds
    #[serde(default = "default_debounce_ms")]
    #[validate(range(max = 10_000))]
    pub debounce_ms: u64,
}

/// Upload constraints applied before submission
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadConfig {
    /// Maximum size of a single file in bytes
    #[serde(default = "default_max_file_size")]
    #[validate(range(min = 1))]
    pub max_file_size: u64,

    /// Allowed image extensions
    #[serde(default = "default_image_extensions")]
    #[validate(length(min = 1))]
    pub image_extensions: Vec<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_base_url() -> String {
    "http://localhost:5000/api/v1".to_string()
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_connect_timeout() -> u64 {
    5
}

fn default_user_agent() -> String {
    format!("bridgeline-admin/{}", env!("CARGO_PKG_VERSION"))
}

const fn default_page_size() -> u32 {
    10
}

const fn default_debounce_ms() -> u64 {
    500
}

const fn default_max_file_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_image_extensions() -> Vec<String> {
    ["jpg", "jpeg", "png", "webp", "gif"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
            image_extensions: default_image_extensions(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from `bridgeline.toml` (if present) and the environment
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load() -> crate::Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration, optionally from an explicit file
    ///
    /// An explicit file must exist; the default `bridgeline.toml` is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded, parsed or validated.
    pub fn load_from(path: Option<&Path>) -> crate::Result<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name("bridgeline").required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }

    /// Debounce window as a `Duration`
    pub const fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.list.debounce_ms)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.api.base_url, "http://localhost:5000/api/v1");
        assert_eq!(config.api.request_timeout, 30);
        assert_eq!(config.api.connect_timeout, 5);
        assert!(config.api.user_agent.starts_with("bridgeline-admin/"));

        assert!(config.auth.token.is_none());
        assert!(config.auth.cookie.is_none());

        assert_eq!(config.list.page_size, 10);
        assert_eq!(config.list.debounce_ms, 500);
        assert_eq!(config.debounce(), std::time::Duration::from_millis(500));

        assert_eq!(config.uploads.max_file_size, 5 * 1024 * 1024);
        assert!(config.uploads.image_extensions.contains(&"png".to_string()));

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let mut config = Config::default();
        config.list.page_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[api]
base_url = "https://admin.example.com/api/v1"

[auth]
token = "secret-token"

[list]
page_size = 25
debounce_ms = 300
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.api.base_url, "https://admin.example.com/api/v1");
        assert_eq!(config.auth.token.as_deref(), Some("secret-token"));
        assert_eq!(config.list.page_size, 25);
        assert_eq!(config.list.debounce_ms, 300);
        // untouched sections fall back to defaults
        assert_eq!(config.api.request_timeout, 30);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_file_validates() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[list]\npage_size = 0").unwrap();

        let err = Config::load_from(Some(file.path())).unwrap_err();
        assert!(matches!(err, crate::Error::Configuration { .. }));
        assert!(err.to_string().contains("list.page_size"));
    }

    #[test]
    fn test_invalid_base_url_is_configuration_error() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[api]\nbase_url = \"not a url\"").unwrap();

        let err = Config::load_from(Some(file.path())).unwrap_err();
        assert!(err.field_errors().is_none());
        assert_eq!(
            err.to_string(),
            "Configuration error: invalid configuration: api.base_url - must be an absolute URL"
        );
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let err = Config::load_from(Some(Path::new("/nonexistent/bridgeline.toml"))).unwrap_err();
        assert!(matches!(err, crate::Error::Configuration { .. }));
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.list.page_size, config.list.page_size);
        assert_eq!(parsed.api.base_url, config.api.base_url);
    }
}
