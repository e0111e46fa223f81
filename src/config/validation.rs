//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and reports every
//! problem found, not just the first.

use std::fmt;

use crate::config::schema::ChainSubscriptionsConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a configuration.
pub fn validate_config(config: &ChainSubscriptionsConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let sub = &config.subscription;

    if sub.reconnect_interval_ms == 0 {
        errors.push(ValidationError {
            field: "subscription.reconnect_interval_ms",
            message: "must be greater than zero".to_string(),
        });
    }

    if let Some(timeout) = sub.reconnect_timeout_ms {
        if timeout == 0 {
            errors.push(ValidationError {
                field: "subscription.reconnect_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        } else if timeout < sub.reconnect_interval_ms {
            errors.push(ValidationError {
                field: "subscription.reconnect_timeout_ms",
                message: format!(
                    "{} ms is shorter than the reconnect interval ({} ms)",
                    timeout, sub.reconnect_interval_ms
                ),
            });
        }
    }

    if sub.open_timeout_ms == Some(0) {
        errors.push(ValidationError {
            field: "subscription.open_timeout_ms",
            message: "must be greater than zero".to_string(),
        });
    }

    if config.signer.chain_id == Some(0) {
        errors.push(ValidationError {
            field: "signer.chain_id",
            message: "chain id 0 is not valid".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
