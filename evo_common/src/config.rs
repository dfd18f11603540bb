//! Configuration loading traits and types.
//!
//! Every EVO binary reads a single TOML file whose `[shared]` table carries
//! the fields common to all services. Service-specific tables sit beside it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use evo_common::config::{ConfigLoader, SharedConfig, ConfigError};
//! use serde::Deserialize;
//! use std::path::Path;
//!
//! #[derive(Debug, Deserialize)]
//! struct MyAppConfig {
//!     shared: SharedConfig,
//!     capacity: usize,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = MyAppConfig::load(Path::new("motion_log.toml"))?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Lowercase name, usable directly as an `EnvFilter` directive.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Common configuration fields shared across all EVO applications.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "evo-motion-log"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Blanket-implemented for any `serde::de::DeserializeOwned` type.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if the file is unreadable or the TOML is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from an in-memory TOML document.
    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const ALL_LEVELS: [LogLevel; 5] = [
        LogLevel::Trace,
        LogLevel::Debug,
        LogLevel::Info,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_toml_names_match_as_str() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Wrapper {
            level: LogLevel,
        }

        for level in ALL_LEVELS {
            let text = toml::to_string(&Wrapper { level }).unwrap();
            assert!(text.contains(level.as_str()), "{text}");

            let parsed: Wrapper = toml::from_str(&format!("level = \"{}\"", level.as_str())).unwrap();
            assert_eq!(parsed.level, level);
        }
    }

    #[test]
    fn test_shared_config_validation() {
        let ok = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "evo-motion-log".to_string(),
        };
        assert!(ok.validate().is_ok());

        let empty = SharedConfig {
            log_level: LogLevel::Info,
            service_name: String::new(),
        };
        assert!(matches!(
            empty.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }

    #[test]
    fn test_config_loader_file_not_found() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct TestConfig {
            value: String,
        }

        let result = TestConfig::load(Path::new("/nonexistent/path/motion_log.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        #[allow(dead_code)]
        #[derive(Debug, Deserialize)]
        struct TestConfig {
            value: String,
        }

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = TestConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_from_toml_defaults_log_level() {
        #[derive(Debug, Deserialize)]
        struct TestConfig {
            shared: SharedConfig,
            capacity: usize,
        }

        let config = TestConfig::from_toml(
            r#"capacity = 250

[shared]
service_name = "evo-motion-log"
"#,
        )
        .unwrap();
        assert_eq!(config.shared.log_level, LogLevel::Info);
        assert_eq!(config.capacity, 250);
    }
}
