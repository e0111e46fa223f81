//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::ChainSubscriptionsConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ChainSubscriptionsConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: ChainSubscriptionsConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    tracing::debug!(path = ?path, "Configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_valid() {
        let file = write_config("[subscription]\nreconnect_interval_ms = 100\n");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.subscription.reconnect_interval_ms, 100);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/chain-subscriptions.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_parse_error() {
        let file = write_config("[subscription\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_invalid() {
        let file = write_config("[subscription]\nreconnect_interval_ms = 0\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().starts_with("Validation failed: subscription.reconnect_interval_ms"));
    }
}
