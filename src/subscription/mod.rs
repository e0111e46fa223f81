//! Subscription subsystem.
//!
//! # Data Flow
//! ```text
//! SubscriptionDescriptor (kind, method, params, formatter)
//!     → manager.rs (open, listen, reconnect, close)
//!     → events.rs (data / error listeners, event stream)
//!     → caller
//! ```
//!
//! # Design Decisions
//! - The manager composes an event bus instead of being an emitter itself
//! - Reconnect polling is an owned, cancellable task per manager
//! - A push error both reports the error and starts a reconnect

pub mod descriptor;
pub mod events;
pub mod manager;
pub mod reconnect;
pub mod types;

pub use descriptor::{RpcSubscription, SubscriptionDescriptor, ETH_SUBSCRIBE};
pub use events::{EventBus, EventKind, ListenerId};
pub use manager::{ItemCallback, SubscriptionManager};
pub use reconnect::ReconnectTimer;
pub use types::{
    SubscriptionError, SubscriptionEvent, SubscriptionId, SubscriptionResult, SubscriptionState,
};
