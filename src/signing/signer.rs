//! Transaction signing handoff to a wallet store.

use alloy::rpc::types::TransactionRequest;

use crate::observability::metrics;
use crate::signing::store::WalletStore;
use crate::signing::types::{SignError, SignResult};

/// Resolves the sender's key in a [`WalletStore`] and delegates signing to it.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionSigner;

impl TransactionSigner {
    pub fn new() -> Self {
        Self
    }

    /// Sign `transaction` with the key stored for its `from` address.
    ///
    /// The transaction is taken by value; the store receives it with `from`
    /// cleared, since the signer derives the sender from the key. Fails
    /// without touching the signer if no usable key exists.
    pub async fn sign<W>(&self, mut transaction: TransactionRequest, store: &W) -> SignResult<W::Signed>
    where
        W: WalletStore + ?Sized,
    {
        let Some(from) = transaction.from else {
            metrics::record_sign_request("missing_key");
            return Err(SignError::MissingSender);
        };

        let Some(key) = store.wallet(&from).and_then(|entry| entry.private_key) else {
            tracing::warn!(address = %from, "No usable signing key");
            metrics::record_sign_request("missing_key");
            return Err(SignError::MissingKey(from));
        };

        transaction.from = None;

        match store.sign_transaction(transaction, &key).await {
            Ok(signed) => {
                tracing::debug!(address = %from, "Transaction signed");
                metrics::record_sign_request("signed");
                Ok(signed)
            }
            Err(e) => {
                tracing::warn!(address = %from, error = %e, "Wallet store failed to sign");
                metrics::record_sign_request("failed");
                Err(e)
            }
        }
    }
}
