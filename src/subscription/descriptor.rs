//! Subscription descriptors: what to open and how to format pushed items.

use serde_json::{json, Value};
use std::fmt;
use std::sync::Arc;

use crate::subscription::types::{SubscriptionError, SubscriptionResult};

/// RPC method used by Ethereum-style pub/sub endpoints.
pub const ETH_SUBSCRIBE: &str = "eth_subscribe";

/// Immutable description of one subscription.
pub trait SubscriptionDescriptor: Send + Sync + 'static {
    /// Application-level representation of one pushed item.
    type Item: Clone + Send + Sync + 'static;

    /// Subscription category, meaningful only to the transport.
    fn kind(&self) -> &str;

    /// RPC method name used to open the subscription.
    fn method(&self) -> &str;

    /// Ordered parameters for [`method`](Self::method).
    fn params(&self) -> Vec<Value>;

    /// Runs before every open request, including resubscribes after a
    /// reconnect. Returning an error aborts the open.
    fn before_subscription(&self) -> SubscriptionResult<()> {
        Ok(())
    }

    /// Turn one raw pushed item into its application-level form.
    fn format_item(&self, raw: Value) -> Self::Item;
}

type Formatter<T> = Arc<dyn Fn(Value) -> T + Send + Sync>;
type Validator = Arc<dyn Fn() -> Result<(), String> + Send + Sync>;

/// General-purpose descriptor built from plain values and closures.
pub struct RpcSubscription<T = Value> {
    kind: String,
    method: String,
    params: Vec<Value>,
    formatter: Formatter<T>,
    validator: Option<Validator>,
}

impl RpcSubscription<Value> {
    /// Descriptor that passes pushed items through unchanged.
    pub fn new(kind: impl Into<String>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            kind: kind.into(),
            method: method.into(),
            params,
            formatter: Arc::new(|raw| raw),
            validator: None,
        }
    }

    /// New block headers (`eth_subscribe("newHeads")`).
    pub fn new_heads() -> Self {
        Self::new("eth", ETH_SUBSCRIBE, vec![json!("newHeads")])
    }

    /// Logs matching `filter` (`eth_subscribe("logs", filter)`).
    pub fn logs(filter: Value) -> Self {
        Self::new("eth", ETH_SUBSCRIBE, vec![json!("logs"), filter])
    }

    /// Hashes of transactions entering the pending pool.
    pub fn pending_transactions() -> Self {
        Self::new("eth", ETH_SUBSCRIBE, vec![json!("newPendingTransactions")])
    }

    /// Sync status changes.
    pub fn syncing() -> Self {
        Self::new("eth", ETH_SUBSCRIBE, vec![json!("syncing")])
    }
}

impl<T> RpcSubscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Replace the formatting hook, changing the item type.
    pub fn with_formatter<U, F>(self, formatter: F) -> RpcSubscription<U>
    where
        F: Fn(Value) -> U + Send + Sync + 'static,
    {
        RpcSubscription {
            kind: self.kind,
            method: self.method,
            params: self.params,
            formatter: Arc::new(formatter),
            validator: self.validator,
        }
    }

    /// Attach a check run before each open request.
    pub fn with_validator<F>(mut self, validator: F) -> Self
    where
        F: Fn() -> Result<(), String> + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(validator));
        self
    }
}

impl<T> SubscriptionDescriptor for RpcSubscription<T>
where
    T: Clone + Send + Sync + 'static,
{
    type Item = T;

    fn kind(&self) -> &str {
        &self.kind
    }

    fn method(&self) -> &str {
        &self.method
    }

    fn params(&self) -> Vec<Value> {
        self.params.clone()
    }

    fn before_subscription(&self) -> SubscriptionResult<()> {
        match &self.validator {
            Some(validate) => validate().map_err(SubscriptionError::Rejected),
            None => Ok(()),
        }
    }

    fn format_item(&self, raw: Value) -> T {
        (self.formatter)(raw)
    }
}

impl<T> fmt::Debug for RpcSubscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RpcSubscription")
            .field("kind", &self.kind)
            .field("method", &self.method)
            .field("params", &self.params)
            .finish()
    }
}
