//! YAML configuration for the webhook pipeline.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! version: 1
//! max_payload_bytes: 1048576
//! max_batch_size: 500
//! logging:
//!   level: "debug"
//!   json: true
//! ```
//!
//! ```rust
//! use leadhook::PipelineConfig;
//!
//! let config = PipelineConfig::from_yaml("max_batch_size: 50").unwrap();
//! assert_eq!(config.max_batch_size, Some(50));
//! assert_eq!(config.logging.level, "info");
//! ```
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Only configuration format version understood by this crate.
pub const CONFIG_VERSION: u32 = 1;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(#[from] ConfigError),
}

/// Semantic problems in an otherwise well-formed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported config version {0}; expected 1")]
    UnsupportedVersion(u32),

    /// A limit was set to zero, which would reject every payload.
    #[error("{field} must be greater than zero when set")]
    ZeroLimit { field: &'static str },

    #[error("logging.level must not be empty")]
    EmptyLogLevel,
}

/// Runtime configuration for [`WebhookPipeline`](crate::WebhookPipeline).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Configuration format version.
    pub version: u32,

    /// Upper bound on the serialized size of a raw payload, in bytes.
    pub max_payload_bytes: Option<usize>,

    /// Upper bound on the number of elements in an array payload.
    pub max_batch_size: Option<usize>,

    pub logging: LoggingConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            max_payload_bytes: None,
            max_batch_size: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        // serde_yaml reads an empty document as null; treat it as all defaults.
        let config: PipelineConfig = if yaml.trim().is_empty() {
            PipelineConfig::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion(self.version));
        }
        if self.max_payload_bytes == Some(0) {
            return Err(ConfigError::ZeroLimit {
                field: "max_payload_bytes",
            });
        }
        if self.max_batch_size == Some(0) {
            return Err(ConfigError::ZeroLimit {
                field: "max_batch_size",
            });
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::EmptyLogLevel);
        }
        Ok(())
    }
}

/// Log output settings. Consumed by the CLI when installing a subscriber; the
/// library itself only emits `tracing` events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `"info"` or `"leadhook=debug"`.
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}
