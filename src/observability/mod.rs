//! Observability.
//!
//! # Data Flow
//! ```text
//! Subscription managers and signers produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters)
//! ```
//!
//! Key material is never logged.

pub mod logging;
pub mod metrics;
