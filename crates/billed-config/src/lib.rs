//! Configuration management for billed
//!
//! This module handles loading, validation, and management of
//! billed configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,
    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Proof upload settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Accepted file extensions, lowercase and without the dot
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,
    /// Maximum accepted file size in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_file_size: default_max_file_size(),
        }
    }
}

fn default_allowed_extensions() -> Vec<String> {
    vec!["jpg".to_string(), "jpeg".to_string(), "png".to_string()]
}

fn default_max_file_size() -> usize {
    5 * 1024 * 1024
}

/// Bill store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base URL under which uploaded proofs are served
    #[serde(default = "default_file_base_url")]
    pub file_base_url: String,
    /// JSON file with bills to seed the store with
    #[serde(default)]
    pub fixtures: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            file_base_url: default_file_base_url(),
            fixtures: None,
        }
    }
}

fn default_file_base_url() -> String {
    "http://localhost:8080/files".to_string()
}

/// Proof preview modal settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Modal width in pixels; the image takes half of it
    #[serde(default = "default_modal_width")]
    pub modal_width: u32,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            modal_width: default_modal_width(),
        }
    }
}

fn default_modal_width() -> u32 {
    800
}

/// Session settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Cookie carrying the serialized user
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Upper bound on new bill forms kept open across requests
    #[serde(default = "default_max_open_forms")]
    pub max_open_forms: usize,
    /// Seconds after which an untouched form is dropped
    #[serde(default = "default_form_idle_timeout")]
    pub form_idle_timeout_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            max_open_forms: default_max_open_forms(),
            form_idle_timeout_secs: default_form_idle_timeout(),
        }
    }
}

fn default_cookie_name() -> String {
    "user".to_string()
}

fn default_max_open_forms() -> usize {
    1024
}

fn default_form_idle_timeout() -> u64 {
    1800
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,
    /// Upload settings
    #[serde(default)]
    pub upload: UploadConfig,
    /// Store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Preview modal settings
    #[serde(default)]
    pub preview: PreviewConfig,
    /// Session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::IoError)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content).map_err(|e| {
            log::debug!(target: "billed::config", "YAML error: {}", e);
            ConfigError::InvalidYaml
        })?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                reason: "Port must be greater than 0".to_string(),
            });
        }

        if self.upload.allowed_extensions.is_empty() {
            return Err(ConfigError::MissingField {
                field: "upload.allowed_extensions".to_string(),
            });
        }

        for ext in &self.upload.allowed_extensions {
            let valid = !ext.is_empty()
                && ext.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit());
            if !valid {
                return Err(ConfigError::InvalidValue {
                    field: "upload.allowed_extensions".to_string(),
                    reason: format!("'{}' must be lowercase alphanumeric without a dot", ext),
                });
            }
        }

        if self.upload.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upload.max_file_size".to_string(),
                reason: "Maximum file size must be greater than 0".to_string(),
            });
        }

        if self.preview.modal_width == 0 {
            return Err(ConfigError::InvalidValue {
                field: "preview.modal_width".to_string(),
                reason: "Modal width must be greater than 0".to_string(),
            });
        }

        if self.session.cookie_name.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                message: "session.cookie_name must not be empty".to_string(),
            });
        }

        if self.session.max_open_forms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "session.max_open_forms".to_string(),
                reason: "At least one form must be allowed".to_string(),
            });
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Socket address the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.upload.allowed_extensions, vec!["jpg", "jpeg", "png"]);
        assert_eq!(config.preview.modal_width, 800);
        assert_eq!(config.session.cookie_name, "user");
        assert_eq!(config.session.max_open_forms, 1024);
        assert_eq!(config.session.form_idle_timeout_secs, 1800);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_generated_default_parses() {
        let config = Config::from_yaml(Config::generate_default()).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml("server:\n  port: 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.upload.max_file_size, 5 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_yaml() {
        let err = Config::from_yaml("server: [").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidYaml));
    }

    #[test]
    fn test_zero_port_rejected() {
        let err = Config::from_yaml("server:\n  port: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "server.port"));
    }

    #[test]
    fn test_extension_with_dot_rejected() {
        let mut config = Config::default();
        config.upload.allowed_extensions = vec![".JPG".to_string()];
        assert!(config.validate().is_err());

        config.upload.allowed_extensions.clear();
        assert!(matches!(config.validate(), Err(ConfigError::MissingField { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load("/nonexistent/billed.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
