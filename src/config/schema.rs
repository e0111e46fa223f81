//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! every field has a default, so an empty file is a valid configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ChainSubscriptionsConfig {
    /// Subscription lifecycle settings.
    pub subscription: SubscriptionConfig,

    /// Transaction signing settings.
    pub signer: SignerConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Subscription lifecycle configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SubscriptionConfig {
    /// Interval between reconnect attempts while the transport is down.
    pub reconnect_interval_ms: u64,

    /// Give up reconnecting after this long. `None` polls until `connect`.
    pub reconnect_timeout_ms: Option<u64>,

    /// Deadline for the open request. `None` waits for the transport.
    pub open_timeout_ms: Option<u64>,
}

impl SubscriptionConfig {
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }

    pub fn reconnect_timeout(&self) -> Option<Duration> {
        self.reconnect_timeout_ms.map(Duration::from_millis)
    }

    pub fn open_timeout(&self) -> Option<Duration> {
        self.open_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for SubscriptionConfig {
    fn default() -> Self {
        Self {
            reconnect_interval_ms: 500,
            reconnect_timeout_ms: None,
            open_timeout_ms: None,
        }
    }
}

/// Signing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SignerConfig {
    /// Chain ID applied to transactions that do not carry one (EIP-155).
    pub chain_id: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,

    /// Emit JSON lines instead of human-readable output.
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_filter: "chain_subscriptions=info".to_string(),
            json_logs: false,
        }
    }
}
