use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::translator::DEFAULT_MAX_SELECTION_DEPTH;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Translator settings
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslatorConfig {
    /// YAML or JSON schema model
    #[validate(custom(function = "validate_schema_path"))]
    pub schema_path: PathBuf,

    /// Pretty-print emitted JSON
    pub pretty: bool,

    /// Deepest selection tree accepted by the translator
    #[validate(range(
        min = 1,
        max = 256,
        message = "Max selection depth must be between 1 and 256"
    ))]
    pub max_selection_depth: usize,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            schema_path: PathBuf::from("schema.yaml"),
            pretty: false,
            max_selection_depth: DEFAULT_MAX_SELECTION_DEPTH,
        }
    }
}

impl TranslatorConfig {
    /// Configuration from `GRAPHCYPHER_*` environment variables, after loading
    /// a `.env` file if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();
        let config = Self {
            schema_path: env::var("GRAPHCYPHER_SCHEMA")
                .map(PathBuf::from)
                .unwrap_or(defaults.schema_path),
            pretty: parse_env_var("GRAPHCYPHER_PRETTY", "false")?,
            max_selection_depth: parse_env_var(
                "GRAPHCYPHER_MAX_SELECTION_DEPTH",
                &DEFAULT_MAX_SELECTION_DEPTH.to_string(),
            )?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation
    pub fn from_cli(cli: CliConfig) -> Result<Self, ConfigError> {
        let config = Self {
            schema_path: cli.schema_path,
            pretty: cli.pretty,
            max_selection_depth: cli.max_selection_depth,
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// CLI configuration (parsed from command line arguments)
#[derive(Clone, Debug)]
pub struct CliConfig {
    pub schema_path: PathBuf,
    pub pretty: bool,
    pub max_selection_depth: usize,
}

fn validate_schema_path(path: &PathBuf) -> Result<(), ValidationError> {
    if path.as_os_str().is_empty() {
        let mut error = ValidationError::new("schema_path");
        error.message = Some("Schema path cannot be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TranslatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_selection_depth, DEFAULT_MAX_SELECTION_DEPTH);
        assert!(!config.pretty);
    }

    #[test]
    fn test_invalid_selection_depth() {
        let config = TranslatorConfig {
            max_selection_depth: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_schema_path() {
        let config = TranslatorConfig {
            schema_path: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_cli() {
        let config = TranslatorConfig::from_cli(CliConfig {
            schema_path: PathBuf::from("movies.yaml"),
            pretty: true,
            max_selection_depth: 8,
        })
        .unwrap();
        assert_eq!(config.max_selection_depth, 8);
        assert!(config.pretty);
    }
}
