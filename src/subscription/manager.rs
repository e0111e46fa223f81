//! Subscription lifecycle management.
//!
//! # Responsibilities
//! - Open a subscription through the transport and attach its listener
//! - Format pushed items and fan them out to listeners and the item callback
//! - Reconnect and resubscribe after a push error
//! - Close the subscription and detach listeners
//!
//! # Data Flow
//! ```text
//! subscribe(callback)
//!     → descriptor.before_subscription()
//!     → transport.subscribe(kind, method, params) → id
//!     → transport.listen(id) → notification task
//!
//! notification task:
//!     Ok(item | [items]) → format_item → emit data → callback(Ok)
//!     Err(e)             → emit error → callback(Err) → reconnect (if supported)
//!
//! reconnect:
//!     poll transport.reconnect() every interval until `connect`
//!     → unsubscribe() → subscribe(callback)
//! ```

use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

use crate::config::SubscriptionConfig;
use crate::observability::metrics;
use crate::subscription::descriptor::SubscriptionDescriptor;
use crate::subscription::events::{EventBus, EventKind, ListenerId};
use crate::subscription::reconnect::{poll_until_connected, PollOutcome, ReconnectTimer};
use crate::subscription::types::{
    SubscriptionError, SubscriptionEvent, SubscriptionId, SubscriptionResult, SubscriptionState,
};
use crate::transport::{NotificationReceiver, Transport, TransportError};

/// Per-item callback. Receives `Ok(item)` for every formatted item and
/// `Err(error)` for push and reconnect failures.
pub type ItemCallback<T> = Arc<dyn Fn(SubscriptionResult<T>) + Send + Sync>;

/// Manages the lifecycle of one logical subscription.
///
/// Cloning yields another handle to the same subscription. Background work
/// runs on the tokio runtime, so methods that start it must be called from
/// within one.
pub struct SubscriptionManager<D: SubscriptionDescriptor> {
    inner: Arc<Inner<D>>,
}

struct Inner<D: SubscriptionDescriptor> {
    descriptor: Arc<D>,
    transport: Arc<dyn Transport>,
    config: SubscriptionConfig,
    events: EventBus<D::Item>,
    state: Mutex<ManagerState>,
}

struct ManagerState {
    subscription_id: Option<SubscriptionId>,
    status: SubscriptionState,
    pending_open: Option<JoinHandle<SubscriptionResult<SubscriptionId>>>,
    reconnect: Option<ReconnectTimer>,
}

impl<D: SubscriptionDescriptor> SubscriptionManager<D> {
    /// Create an inactive manager with default settings.
    pub fn new(descriptor: Arc<D>, transport: Arc<dyn Transport>) -> Self {
        Self::with_config(descriptor, transport, SubscriptionConfig::default())
    }

    /// Create an inactive manager.
    pub fn with_config(
        descriptor: Arc<D>,
        transport: Arc<dyn Transport>,
        config: SubscriptionConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                descriptor,
                transport,
                config,
                events: EventBus::new(),
                state: Mutex::new(ManagerState {
                    subscription_id: None,
                    status: SubscriptionState::Inactive,
                    pending_open: None,
                    reconnect: None,
                }),
            }),
        }
    }

    /// Start opening the subscription and return immediately.
    ///
    /// The outcome of the open request is available from [`ready`](Self::ready).
    /// While a previous open is still in flight this call is ignored. Calling
    /// it on an already active manager attaches a second, competing listener;
    /// avoiding that is up to the caller.
    pub fn subscribe(&self, callback: Option<ItemCallback<D::Item>>) -> &Self {
        let mut state = self.inner.lock_state();
        if state.status == SubscriptionState::Opening {
            tracing::warn!(
                kind = %self.inner.descriptor.kind(),
                "Open request already in flight, ignoring subscribe"
            );
            return self;
        }

        state.status = SubscriptionState::Opening;
        let inner = self.inner.clone();
        state.pending_open = Some(tokio::spawn(async move { inner.open(callback).await }));
        self
    }

    /// Wait for the most recent [`subscribe`](Self::subscribe) to finish.
    ///
    /// Returns the assigned id, or the open failure. With nothing pending it
    /// reports the id of the active subscription, or
    /// [`SubscriptionError::NotActive`].
    pub async fn ready(&self) -> SubscriptionResult<SubscriptionId> {
        let pending = self.inner.lock_state().pending_open.take();
        match pending {
            Some(handle) => handle.await.map_err(|_| SubscriptionError::Aborted)?,
            None => {
                let state = self.inner.lock_state();
                match (&state.subscription_id, state.status) {
                    (Some(id), SubscriptionState::Active) => Ok(id.clone()),
                    _ => Err(SubscriptionError::NotActive),
                }
            }
        }
    }

    /// Close the subscription.
    ///
    /// Resolves to `true` when the manager ended up without a subscription id
    /// (the transport reported it already gone, or none was open). When the
    /// transport confirms the close the id is kept and `false` is returned.
    /// Either way all `data` and `error` listeners are detached, and a
    /// running reconnect procedure is stopped.
    pub async fn unsubscribe(&self) -> SubscriptionResult<bool> {
        let stopped = self.inner.lock_state().stop_reconnect();
        if stopped {
            tracing::info!(kind = %self.inner.descriptor.kind(), "Reconnect stopped by unsubscribe");
        }
        self.inner.unsubscribe().await
    }

    /// Stop a running reconnect procedure. Returns true if one was running.
    ///
    /// The manager is left `Inactive` and accepts a new
    /// [`subscribe`](Self::subscribe).
    pub fn cancel_reconnect(&self) -> bool {
        self.inner.lock_state().stop_reconnect()
    }

    /// Register a `data` listener.
    pub fn on_data<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&D::Item) + Send + Sync + 'static,
    {
        self.inner.events.on_data(listener)
    }

    /// Register an `error` listener.
    pub fn on_error<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SubscriptionError) + Send + Sync + 'static,
    {
        self.inner.events.on_error(listener)
    }

    /// Remove a listener registered with [`on_data`](Self::on_data) or
    /// [`on_error`](Self::on_error).
    pub fn off(&self, id: ListenerId) -> bool {
        self.inner.events.off(id)
    }

    /// Stream of `data` and `error` events. Closes on unsubscribe.
    pub fn events(&self) -> mpsc::UnboundedReceiver<SubscriptionEvent<D::Item>> {
        self.inner.events.stream()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.inner.events.listener_count(kind)
    }

    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.inner.lock_state().subscription_id.clone()
    }

    pub fn state(&self) -> SubscriptionState {
        self.inner.lock_state().status
    }

    pub fn descriptor(&self) -> &D {
        &self.inner.descriptor
    }
}

impl ManagerState {
    fn stop_reconnect(&mut self) -> bool {
        let cancelled = self.reconnect.take().is_some_and(|timer| timer.cancel());
        if cancelled {
            match self.status {
                SubscriptionState::Reconnecting => self.status = SubscriptionState::Inactive,
                // The old subscription is already closed when the resubscribe open is cut short.
                SubscriptionState::Opening => {
                    self.subscription_id = None;
                    self.status = SubscriptionState::Inactive;
                }
                SubscriptionState::Active | SubscriptionState::Inactive => {}
            }
        }
        cancelled
    }
}

impl<D: SubscriptionDescriptor> Clone for SubscriptionManager<D> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<D: SubscriptionDescriptor> std::fmt::Debug for SubscriptionManager<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.inner.lock_state();
        f.debug_struct("SubscriptionManager")
            .field("kind", &self.inner.descriptor.kind())
            .field("method", &self.inner.descriptor.method())
            .field("subscription_id", &state.subscription_id)
            .field("status", &state.status)
            .finish()
    }
}

impl<D: SubscriptionDescriptor> Inner<D> {
    fn lock_state(&self) -> MutexGuard<'_, ManagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_status(&self, status: SubscriptionState) {
        self.lock_state().status = status;
    }

    async fn open(
        self: Arc<Self>,
        callback: Option<ItemCallback<D::Item>>,
    ) -> SubscriptionResult<SubscriptionId> {
        let kind = self.descriptor.kind();

        if let Err(e) = self.descriptor.before_subscription() {
            tracing::warn!(kind = %kind, error = %e, "Pre-subscription hook refused to open");
            self.set_status(SubscriptionState::Inactive);
            return Err(e);
        }

        let request =
            self.transport
                .subscribe(kind, self.descriptor.method(), self.descriptor.params());
        let outcome = match self.config.open_timeout() {
            Some(limit) => match timeout(limit, request).await {
                Ok(result) => result.map_err(SubscriptionError::Open),
                Err(_) => Err(SubscriptionError::OpenTimeout(
                    self.config.open_timeout_ms.unwrap_or_default(),
                )),
            },
            None => request.await.map_err(SubscriptionError::Open),
        };

        let id = match outcome {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(kind = %kind, error = %e, "Failed to open subscription");
                metrics::record_open_failure(kind);
                self.set_status(SubscriptionState::Inactive);
                return Err(e);
            }
        };

        let notifications = self.transport.listen(&id);
        {
            let mut state = self.lock_state();
            state.subscription_id = Some(id.clone());
            state.status = SubscriptionState::Active;
        }
        tokio::spawn(self.clone().listen(notifications, callback));

        tracing::info!(
            kind = %kind,
            method = %self.descriptor.method(),
            subscription_id = %id,
            "Subscription opened"
        );
        metrics::record_subscription_opened(kind);
        Ok(id)
    }

    async fn listen(
        self: Arc<Self>,
        mut notifications: NotificationReceiver,
        callback: Option<ItemCallback<D::Item>>,
    ) {
        while let Some(notification) = notifications.recv().await {
            match notification {
                Ok(payload) => self.handle_response(payload, callback.as_ref()),
                Err(e) => self.handle_error(e, &callback),
            }
        }
        tracing::debug!(kind = %self.descriptor.kind(), "Notification stream closed");
    }

    fn handle_response(&self, payload: Value, callback: Option<&ItemCallback<D::Item>>) {
        let items = match payload {
            Value::Array(items) => items,
            item => vec![item],
        };
        metrics::record_items(self.descriptor.kind(), items.len());

        for raw in items {
            let item = self.descriptor.format_item(raw);
            self.events.emit_data(&item);
            if let Some(callback) = callback {
                callback(Ok(item));
            }
        }
    }

    /// A push error is reported AND, on reconnect-capable transports, starts
    /// the reconnect procedure.
    fn handle_error(self: &Arc<Self>, error: TransportError, callback: &Option<ItemCallback<D::Item>>) {
        let kind = self.descriptor.kind();
        tracing::warn!(kind = %kind, error = %error, "Subscription notification error");
        metrics::record_subscription_error(kind);

        let error = SubscriptionError::Notification(error);
        self.events.emit_error(&error);
        if let Some(callback) = callback {
            callback(Err(error));
        }

        self.reconnect(callback.clone());
    }

    fn reconnect(self: &Arc<Self>, callback: Option<ItemCallback<D::Item>>) {
        let mut state = self.lock_state();
        // A timer that already brought the subscription back to `Active` is
        // only finishing up and gets replaced.
        if state.status != SubscriptionState::Active
            && state.reconnect.as_ref().is_some_and(ReconnectTimer::is_running)
        {
            tracing::debug!(kind = %self.descriptor.kind(), "Reconnect already in progress");
            return;
        }

        let Some(connected) = self.transport.on_connect() else {
            return;
        };

        state.status = SubscriptionState::Reconnecting;
        let inner = self.clone();
        let handle = tokio::spawn(async move { inner.run_reconnect(connected, callback).await });
        state.reconnect = Some(ReconnectTimer::new(handle));
    }

    async fn run_reconnect(
        self: Arc<Self>,
        connected: oneshot::Receiver<()>,
        callback: Option<ItemCallback<D::Item>>,
    ) {
        let kind = self.descriptor.kind();
        tracing::info!(
            kind = %kind,
            interval_ms = self.config.reconnect_interval_ms,
            "Waiting for transport to reconnect"
        );

        let outcome = poll_until_connected(
            self.transport.as_ref(),
            kind,
            connected,
            self.config.reconnect_interval(),
            self.config.reconnect_timeout(),
        )
        .await;

        let result = match outcome {
            PollOutcome::Connected => {
                tracing::info!(kind = %kind, "Transport reconnected, resubscribing");
                self.resubscribe(callback.clone()).await
            }
            PollOutcome::TimedOut => Err(SubscriptionError::ReconnectTimeout(
                self.config.reconnect_timeout_ms.unwrap_or_default(),
            )),
            PollOutcome::SignalDropped => Err(SubscriptionError::ReconnectCancelled),
        };

        if let Err(e) = result {
            tracing::error!(kind = %kind, error = %e, "Reconnect failed");
            {
                let mut state = self.lock_state();
                state.subscription_id = None;
                state.status = SubscriptionState::Inactive;
            }
            let error = SubscriptionError::Reconnect(Box::new(e));
            self.events.emit_error(&error);
            if let Some(callback) = &callback {
                callback(Err(error));
            }
        }
    }

    async fn resubscribe(
        self: &Arc<Self>,
        callback: Option<ItemCallback<D::Item>>,
    ) -> SubscriptionResult<SubscriptionId> {
        self.unsubscribe().await?;
        self.set_status(SubscriptionState::Opening);
        self.clone().open(callback).await
    }

    async fn unsubscribe(&self) -> SubscriptionResult<bool> {
        let kind = self.descriptor.kind();
        let current = self.lock_state().subscription_id.clone();

        let Some(id) = current else {
            self.detach_listeners();
            self.set_status(SubscriptionState::Inactive);
            return Ok(true);
        };

        let confirmed = self
            .transport
            .unsubscribe(&id, kind)
            .await
            .map_err(SubscriptionError::Close)?;

        self.detach_listeners();

        let mut state = self.lock_state();
        state.status = SubscriptionState::Inactive;
        tracing::info!(kind = %kind, subscription_id = %id, confirmed, "Subscription closed");

        if !confirmed {
            state.subscription_id = None;
            return Ok(true);
        }
        Ok(false)
    }

    fn detach_listeners(&self) {
        self.events.remove_all(EventKind::Data);
        self.events.remove_all(EventKind::Error);
    }
}
