//! Transaction signing.
//!
//! # Data Flow
//! ```text
//! TransactionRequest (from = sender)
//!     → signer.rs (look up sender in the wallet store, clear `from`)
//!     → store.rs (sign with the stored key)
//!     → SignedTransaction
//! ```
//!
//! # Security Constraints
//! - Missing or watch-only entries fail fast; the signer is never called
//! - Never log private keys

pub mod signer;
pub mod store;
pub mod types;

pub use signer::TransactionSigner;
pub use store::{LocalWalletStore, WalletStore, PRIVATE_KEY_ENV_VAR};
pub use types::{SignError, SignResult, SignedTransaction, WalletEntry};
