//! Configuration management.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ChainSubscriptionsConfig (validated, immutable)
//! ```

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{ChainSubscriptionsConfig, ObservabilityConfig, SignerConfig, SubscriptionConfig};
pub use validation::ValidationError;
