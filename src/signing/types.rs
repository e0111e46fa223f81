//! Signing types and error definitions.

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::signers::local::PrivateKeySigner;
use std::fmt;
use thiserror::Error;

/// Errors that can occur while signing a transaction.
#[derive(Debug, Error)]
pub enum SignError {
    /// The transaction names no sender to look up.
    #[error("Transaction has no `from` address to resolve a signing key")]
    MissingSender,

    /// The wallet store has no entry, or an entry without key material.
    #[error("Wallet or private key not set for address {0}")]
    MissingKey(Address),

    /// Invalid private key format.
    #[error("Invalid private key format: {0}")]
    InvalidKey(String),

    /// Key source (e.g. environment variable) unavailable.
    #[error("Key source unavailable: {0}")]
    KeySource(String),

    /// The underlying signer rejected the transaction.
    #[error("Signing failed: {0}")]
    Signer(String),
}

impl SignError {
    /// True for failures fixed by correcting the wallet setup, never by retrying.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SignError::MissingSender | SignError::MissingKey(_) | SignError::InvalidKey(_)
        )
    }
}

/// Result type for signing operations.
pub type SignResult<T> = Result<T, SignError>;

/// One address known to a wallet store.
#[derive(Clone)]
pub struct WalletEntry {
    pub address: Address,
    /// `None` for watch-only entries.
    pub private_key: Option<PrivateKeySigner>,
}

impl WalletEntry {
    pub fn from_signer(signer: PrivateKeySigner) -> Self {
        Self {
            address: signer.address(),
            private_key: Some(signer),
        }
    }

    pub fn watch_only(address: Address) -> Self {
        Self {
            address,
            private_key: None,
        }
    }

    pub fn can_sign(&self) -> bool {
        self.private_key.is_some()
    }
}

impl fmt::Debug for WalletEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletEntry")
            .field("address", &self.address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A signed, EIP-2718 encoded transaction ready for broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedTransaction {
    pub hash: TxHash,
    pub raw: Bytes,
}
