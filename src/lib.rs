//! Push subscriptions and transaction signing over an abstract RPC transport.
//!
//! # Architecture Overview
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │               chain-subscriptions             │
//!                 │                                               │
//!   caller ──────▶│  SubscriptionManager ──▶ EventBus ──▶ data    │
//!                 │        │    ▲                    └──▶ error   │
//!                 │        ▼    │                                 │
//!                 │   dyn Transport (open / close / listen /      │
//!                 │                  on_connect / reconnect)      │
//!                 │                                               │
//!   caller ──────▶│  TransactionSigner ──▶ dyn WalletStore        │
//!                 └──────────────────────────────────────────────┘
//! ```
//!
//! The two halves share nothing but the crate's ambient stack (config,
//! logging, metrics).

pub mod config;
pub mod observability;
pub mod signing;
pub mod subscription;
pub mod transport;

pub use config::ChainSubscriptionsConfig;
pub use signing::{LocalWalletStore, SignError, TransactionSigner, WalletStore};
pub use subscription::{
    RpcSubscription, SubscriptionDescriptor, SubscriptionError, SubscriptionEvent,
    SubscriptionManager, SubscriptionState,
};
pub use transport::{Transport, TransportError};
