//! Transport capability contract.
//!
//! # Data Flow
//! ```text
//! SubscriptionManager
//!     → Transport::subscribe (open request, returns id)
//!     → Transport::listen(id) (push notifications for that id)
//!     → Transport::unsubscribe (close request)
//!
//! On a push error, reconnect-capable transports hand out a one-shot
//! `connect` signal and are polled through Transport::reconnect.
//! ```
//!
//! Framing, sockets and connection management live in implementations of
//! this trait, not in this crate.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::subscription::SubscriptionId;

/// Errors reported by a transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The remote end rejected the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The connection dropped.
    #[error("connection dropped: {0}")]
    Disconnected(String),

    /// No subscription is registered under the given id.
    #[error("unknown subscription id {0}")]
    UnknownSubscription(String),

    /// Anything else.
    #[error("transport error: {0}")]
    Other(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// One pushed message: a single item, an ordered batch (JSON array), or an error.
pub type Notification = Result<Value, TransportError>;

/// Receiving half of a subscription's notification channel.
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Request/response plus named-notification primitives consumed by the
/// subscription manager.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a subscription and return the id the transport assigned to it.
    async fn subscribe(
        &self,
        kind: &str,
        method: &str,
        params: Vec<Value>,
    ) -> TransportResult<SubscriptionId>;

    /// Close a subscription.
    ///
    /// Returns the transport's confirmation: `false` means the subscription
    /// was already gone.
    async fn unsubscribe(&self, id: &SubscriptionId, kind: &str) -> TransportResult<bool>;

    /// Register a notification listener under `id`.
    ///
    /// The stream ends when the transport drops the sender, e.g. after the
    /// subscription is closed.
    fn listen(&self, id: &SubscriptionId) -> NotificationReceiver;

    /// Register a one-shot `connect` listener.
    ///
    /// Transports that cannot signal reconnection return `None`, which also
    /// disables automatic reconnect.
    fn on_connect(&self) -> Option<oneshot::Receiver<()>> {
        None
    }

    /// Ask the transport to re-establish its connection. No-op by default.
    fn reconnect(&self) {}
}
