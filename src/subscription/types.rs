//! Subscription identifiers, lifecycle states, errors and events.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::transport::TransportError;

/// Opaque identifier assigned by the transport when a subscription opens.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub String);

impl SubscriptionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for SubscriptionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for SubscriptionId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Lifecycle state of a [`SubscriptionManager`](crate::SubscriptionManager).
///
/// ```text
/// Inactive --subscribe()--> Opening --open ok--> Active
/// Opening  --open failed--> Inactive
/// Active   --push error (reconnect-capable transport)--> Reconnecting
/// Reconnecting --connect--> Inactive --resubscribe--> Opening
/// Active   --unsubscribe()--> Inactive
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionState {
    /// No subscription is open.
    Inactive,
    /// An open request is in flight.
    Opening,
    /// The transport confirmed the subscription and a listener is attached.
    Active,
    /// Polling the transport until it signals `connect`.
    Reconnecting,
}

/// Errors surfaced by a subscription manager.
#[derive(Debug, Clone, Error)]
pub enum SubscriptionError {
    /// The transport rejected the open request.
    #[error("failed to open subscription: {0}")]
    Open(TransportError),

    /// The transport rejected the close request.
    #[error("failed to close subscription: {0}")]
    Close(TransportError),

    /// The transport delivered an error on an active subscription.
    #[error("subscription notification error: {0}")]
    Notification(TransportError),

    /// The descriptor's pre-subscription hook refused to open.
    #[error("subscription rejected before opening: {0}")]
    Rejected(String),

    /// The open request did not complete in time.
    #[error("open request timed out after {0} ms")]
    OpenTimeout(u64),

    /// The transport never signalled `connect` before the reconnect deadline.
    #[error("transport did not reconnect within {0} ms")]
    ReconnectTimeout(u64),

    /// The reconnect procedure was stopped before the transport came back.
    #[error("reconnect cancelled")]
    ReconnectCancelled,

    /// The unsubscribe/resubscribe cycle after a reconnect failed.
    #[error("resubscribe after reconnect failed: {0}")]
    Reconnect(Box<SubscriptionError>),

    /// No subscription is open and none is pending.
    #[error("subscription is not active")]
    NotActive,

    /// The background open task was aborted.
    #[error("subscription task aborted")]
    Aborted,
}

/// Result type for subscription operations.
pub type SubscriptionResult<T> = Result<T, SubscriptionError>;

/// An event observed on a manager's event surface.
#[derive(Debug, Clone)]
pub enum SubscriptionEvent<T> {
    /// A formatted pushed item.
    Data(T),
    /// A notification or reconnect failure.
    Error(SubscriptionError),
}

impl<T> SubscriptionEvent<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, SubscriptionEvent::Error(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscription_id_display() {
        let id = SubscriptionId::from("0xabc");
        assert_eq!(id.to_string(), "0xabc");
        assert_eq!(id.as_str(), "0xabc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"0xabc\"");
    }

    #[test]
    fn test_error_display() {
        let err = SubscriptionError::Open(TransportError::Rejected("method not found".into()));
        assert_eq!(
            err.to_string(),
            "failed to open subscription: request rejected: method not found"
        );

        let err = SubscriptionError::Reconnect(Box::new(SubscriptionError::NotActive));
        assert!(err.to_string().contains("not active"));

        let err = SubscriptionError::OpenTimeout(250);
        assert_eq!(err.to_string(), "open request timed out after 250 ms");
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&SubscriptionState::Reconnecting).unwrap();
        assert_eq!(json, "\"reconnecting\"");
    }
}
