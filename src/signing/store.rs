//! Wallet stores: key custody for transaction signing.
//!
//! # Security
//! - Keys come from hex strings or environment variables
//! - Keys are never logged or serialized

use alloy::eips::eip2718::Encodable2718;
use alloy::network::{Ethereum, EthereumWallet, TransactionBuilder};
use alloy::primitives::Address;
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use dashmap::DashMap;

use crate::config::SignerConfig;
use crate::signing::types::{SignError, SignResult, SignedTransaction, WalletEntry};

/// Default environment variable for [`LocalWalletStore::add_from_env`].
pub const PRIVATE_KEY_ENV_VAR: &str = "CHAIN_SUBSCRIPTIONS_PRIVATE_KEY";

/// Resolves addresses to key material and signs with it.
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// What a successful signature produces.
    type Signed: Send;

    /// Look up the entry for `address`.
    fn wallet(&self, address: &Address) -> Option<WalletEntry>;

    /// Sign `transaction` with `key`.
    async fn sign_transaction(
        &self,
        transaction: TransactionRequest,
        key: &PrivateKeySigner,
    ) -> SignResult<Self::Signed>;
}

/// In-process wallet store backed by local private keys.
#[derive(Debug, Default)]
pub struct LocalWalletStore {
    wallets: DashMap<Address, WalletEntry>,
    /// Applied to transactions that carry no chain ID.
    chain_id: Option<u64>,
}

impl LocalWalletStore {
    pub fn new(chain_id: Option<u64>) -> Self {
        Self {
            wallets: DashMap::new(),
            chain_id,
        }
    }

    pub fn from_config(config: &SignerConfig) -> Self {
        Self::new(config.chain_id)
    }

    /// Add a key from a hex string (with or without 0x prefix).
    pub fn add_private_key(&self, private_key_hex: &str) -> SignResult<Address> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| SignError::InvalidKey(format!("{}", e)))?;

        Ok(self.add_signer(signer))
    }

    /// Add a key read from the environment variable `var`.
    pub fn add_from_env(&self, var: &str) -> SignResult<Address> {
        let private_key = std::env::var(var)
            .map_err(|_| SignError::KeySource(format!("Environment variable {} not set", var)))?;

        self.add_private_key(&private_key)
    }

    /// Add an existing signer.
    pub fn add_signer(&self, signer: PrivateKeySigner) -> Address {
        let address = signer.address();
        self.wallets.insert(address, WalletEntry::from_signer(signer));
        tracing::info!(address = %address, "Wallet added");
        address
    }

    /// Track an address without key material.
    pub fn watch(&self, address: Address) {
        self.wallets.insert(address, WalletEntry::watch_only(address));
        tracing::info!(address = %address, "Watch-only wallet added");
    }

    pub fn remove(&self, address: &Address) -> bool {
        self.wallets.remove(address).is_some()
    }

    pub fn addresses(&self) -> Vec<Address> {
        self.wallets.iter().map(|r| *r.key()).collect()
    }

    pub fn len(&self) -> usize {
        self.wallets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wallets.is_empty()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }
}

#[async_trait]
impl WalletStore for LocalWalletStore {
    type Signed = SignedTransaction;

    fn wallet(&self, address: &Address) -> Option<WalletEntry> {
        self.wallets.get(address).map(|r| r.value().clone())
    }

    async fn sign_transaction(
        &self,
        mut transaction: TransactionRequest,
        key: &PrivateKeySigner,
    ) -> SignResult<SignedTransaction> {
        if transaction.chain_id.is_none() {
            transaction.chain_id = self.chain_id;
        }

        let wallet = EthereumWallet::from(key.clone());
        let envelope = <TransactionRequest as TransactionBuilder<Ethereum>>::build(transaction, &wallet)
            .await
            .map_err(|e| SignError::Signer(e.to_string()))?;

        Ok(SignedTransaction {
            hash: envelope.trie_hash(),
            raw: envelope.encoded_2718().into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::U256;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    fn transfer() -> TransactionRequest {
        TransactionRequest::default()
            .with_to(Address::ZERO)
            .with_value(U256::from(1))
            .with_nonce(0)
            .with_gas_limit(21_000)
            .with_gas_price(1_000_000_000)
    }

    #[test]
    fn test_add_private_key() {
        let store = LocalWalletStore::new(Some(1));
        let address = store.add_private_key(TEST_PRIVATE_KEY).unwrap();
        assert_eq!(address.to_string().to_lowercase(), TEST_ADDRESS);

        let entry = store.wallet(&address).unwrap();
        assert!(entry.can_sign());
    }

    #[test]
    fn test_add_private_key_with_0x_prefix() {
        let store = LocalWalletStore::default();
        let address = store.add_private_key(&format!("0x{}", TEST_PRIVATE_KEY)).unwrap();
        assert_eq!(address.to_string().to_lowercase(), TEST_ADDRESS);
    }

    #[test]
    fn test_invalid_private_key() {
        let store = LocalWalletStore::default();
        let err = store.add_private_key("invalid_key").unwrap_err();
        assert!(err.to_string().contains("Invalid private key"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_missing_env_var() {
        let store = LocalWalletStore::default();
        let err = store.add_from_env("CHAIN_SUBSCRIPTIONS_TEST_UNSET_KEY").unwrap_err();
        assert!(matches!(err, SignError::KeySource(_)));
    }

    #[test]
    fn test_watch_only_and_remove() {
        let store = LocalWalletStore::default();
        store.watch(Address::ZERO);

        let entry = store.wallet(&Address::ZERO).unwrap();
        assert!(!entry.can_sign());
        assert_eq!(store.addresses(), vec![Address::ZERO]);

        assert!(store.remove(&Address::ZERO));
        assert!(store.wallet(&Address::ZERO).is_none());
    }

    #[tokio::test]
    async fn test_sign_transaction() {
        let store = LocalWalletStore::new(Some(31337));
        let address = store.add_private_key(TEST_PRIVATE_KEY).unwrap();
        let key = store.wallet(&address).unwrap().private_key.unwrap();

        let signed = store.sign_transaction(transfer(), &key).await.unwrap();
        assert!(!signed.raw.is_empty());

        let again = store.sign_transaction(transfer(), &key).await.unwrap();
        assert_eq!(signed.hash, again.hash);
    }

    #[tokio::test]
    async fn test_sign_incomplete_transaction_fails() {
        let store = LocalWalletStore::new(Some(1));
        let key: PrivateKeySigner = TEST_PRIVATE_KEY.parse().unwrap();

        let err = store
            .sign_transaction(TransactionRequest::default(), &key)
            .await
            .unwrap_err();
        assert!(matches!(err, SignError::Signer(_)));
    }
}
