//! Listener registry for a manager's `data` and `error` events.
//!
//! Listeners are invoked synchronously, in registration order, from the task
//! that delivers the notification. The registry lock is released before any
//! listener runs, so listeners may register or remove listeners themselves.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

use crate::subscription::types::{SubscriptionError, SubscriptionEvent};

/// Callback attached to the event surface.
pub type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Handle returned on registration, used to remove a single listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// The two event names a manager emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Data,
    Error,
}

type Registry<T> = Mutex<Vec<(ListenerId, Listener<T>)>>;

/// Event surface owned by a subscription manager.
pub struct EventBus<T> {
    data: Registry<T>,
    error: Registry<SubscriptionError>,
    next_id: AtomicU64,
}

impl<T> EventBus<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            data: Mutex::new(Vec::new()),
            error: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a `data` listener.
    pub fn on_data<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let id = self.next_id();
        lock(&self.data).push((id, Arc::new(listener)));
        id
    }

    /// Register an `error` listener.
    pub fn on_error<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SubscriptionError) + Send + Sync + 'static,
    {
        let id = self.next_id();
        lock(&self.error).push((id, Arc::new(listener)));
        id
    }

    /// Remove one listener. Returns false if it was not registered.
    pub fn off(&self, id: ListenerId) -> bool {
        let mut data = lock(&self.data);
        if let Some(pos) = data.iter().position(|(l, _)| *l == id) {
            data.remove(pos);
            return true;
        }
        drop(data);

        let mut error = lock(&self.error);
        if let Some(pos) = error.iter().position(|(l, _)| *l == id) {
            error.remove(pos);
            return true;
        }
        false
    }

    /// Forward both event kinds into a channel.
    ///
    /// The channel closes once both forwarding listeners are removed.
    pub fn stream(&self) -> mpsc::UnboundedReceiver<SubscriptionEvent<T>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let data_tx = tx.clone();
        self.on_data(move |item: &T| {
            let _ = data_tx.send(SubscriptionEvent::Data(item.clone()));
        });
        self.on_error(move |error: &SubscriptionError| {
            let _ = tx.send(SubscriptionEvent::Error(error.clone()));
        });
        rx
    }

    /// Deliver an item to every `data` listener. Returns the listener count.
    pub fn emit_data(&self, item: &T) -> usize {
        let listeners = snapshot(&self.data);
        for listener in &listeners {
            listener(item);
        }
        listeners.len()
    }

    /// Deliver an error to every `error` listener. Returns the listener count.
    pub fn emit_error(&self, error: &SubscriptionError) -> usize {
        let listeners = snapshot(&self.error);
        for listener in &listeners {
            listener(error);
        }
        listeners.len()
    }

    /// Drop every listener of one kind.
    pub fn remove_all(&self, kind: EventKind) {
        match kind {
            EventKind::Data => lock(&self.data).clear(),
            EventKind::Error => lock(&self.error).clear(),
        }
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        match kind {
            EventKind::Data => lock(&self.data).len(),
            EventKind::Error => lock(&self.error).len(),
        }
    }

    fn next_id(&self) -> ListenerId {
        ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl<T> Default for EventBus<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(registry: &Registry<T>) -> MutexGuard<'_, Vec<(ListenerId, Listener<T>)>> {
    registry.lock().unwrap_or_else(PoisonError::into_inner)
}

fn snapshot<T>(registry: &Registry<T>) -> Vec<Listener<T>> {
    lock(registry).iter().map(|(_, l)| l.clone()).collect()
}
