//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chain_subscriptions::subscription::{SubscriptionId, SubscriptionResult};
use chain_subscriptions::transport::{
    Notification, NotificationReceiver, Transport, TransportError, TransportResult,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

/// In-memory transport driven by the test.
#[derive(Default)]
pub struct ScriptedTransport {
    reconnect_capable: bool,
    next_id: AtomicU64,
    queued_ids: Mutex<VecDeque<String>>,
    listeners: Mutex<HashMap<SubscriptionId, Vec<mpsc::UnboundedSender<Notification>>>>,
    opens: Mutex<Vec<(String, String, Vec<Value>)>>,
    closes: Mutex<Vec<(SubscriptionId, String)>>,
    fail_next_open: Mutex<Option<TransportError>>,
    fail_next_close: Mutex<Option<TransportError>>,
    open_delay: Mutex<Option<Duration>>,
    close_unconfirmed: AtomicBool,
    connect_waiters: Mutex<Vec<oneshot::Sender<()>>>,
    reconnect_calls: AtomicU32,
}

impl ScriptedTransport {
    /// Transport without reconnect support.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Transport that hands out `connect` signals.
    pub fn reconnecting() -> Arc<Self> {
        Arc::new(Self {
            reconnect_capable: true,
            ..Self::default()
        })
    }

    /// Ids returned by the next opens, in order. Afterwards ids are generated.
    pub fn queue_ids(&self, ids: &[&str]) {
        self.queued_ids
            .lock()
            .unwrap()
            .extend(ids.iter().map(|id| id.to_string()));
    }

    pub fn fail_next_open(&self, error: TransportError) {
        *self.fail_next_open.lock().unwrap() = Some(error);
    }

    pub fn fail_next_close(&self, error: TransportError) {
        *self.fail_next_close.lock().unwrap() = Some(error);
    }

    pub fn delay_opens(&self, delay: Duration) {
        *self.open_delay.lock().unwrap() = Some(delay);
    }

    /// Make closes report the subscription as already gone.
    pub fn report_closes_unconfirmed(&self) {
        self.close_unconfirmed.store(true, Ordering::SeqCst);
    }

    /// Push a payload to every listener registered under `id`.
    pub fn push(&self, id: &SubscriptionId, payload: Value) -> usize {
        self.send(id, Ok(payload))
    }

    pub fn push_error(&self, id: &SubscriptionId, error: TransportError) -> usize {
        self.send(id, Err(error))
    }

    /// Fire every pending `connect` signal.
    pub fn emit_connect(&self) -> usize {
        let waiters: Vec<_> = self.connect_waiters.lock().unwrap().drain(..).collect();
        waiters
            .into_iter()
            .map(|tx| tx.send(()))
            .filter(Result::is_ok)
            .count()
    }

    pub fn listener_count(&self, id: &SubscriptionId) -> usize {
        self.listeners
            .lock()
            .unwrap()
            .get(id)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    pub fn opens(&self) -> Vec<(String, String, Vec<Value>)> {
        self.opens.lock().unwrap().clone()
    }

    pub fn closes(&self) -> Vec<(SubscriptionId, String)> {
        self.closes.lock().unwrap().clone()
    }

    pub fn reconnect_calls(&self) -> u32 {
        self.reconnect_calls.load(Ordering::SeqCst)
    }

    fn send(&self, id: &SubscriptionId, notification: Notification) -> usize {
        let listeners = self.listeners.lock().unwrap();
        listeners
            .get(id)
            .map(|senders| {
                senders
                    .iter()
                    .filter(|tx| tx.send(notification.clone()).is_ok())
                    .count()
            })
            .unwrap_or(0)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn subscribe(
        &self,
        kind: &str,
        method: &str,
        params: Vec<Value>,
    ) -> TransportResult<SubscriptionId> {
        self.opens
            .lock()
            .unwrap()
            .push((kind.to_string(), method.to_string(), params));

        let delay = *self.open_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.fail_next_open.lock().unwrap().take() {
            return Err(error);
        }

        let queued = self.queued_ids.lock().unwrap().pop_front();
        let id = queued.unwrap_or_else(|| {
            format!("0x{:x}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
        });
        Ok(SubscriptionId(id))
    }

    async fn unsubscribe(&self, id: &SubscriptionId, kind: &str) -> TransportResult<bool> {
        self.closes
            .lock()
            .unwrap()
            .push((id.clone(), kind.to_string()));

        if let Some(error) = self.fail_next_close.lock().unwrap().take() {
            return Err(error);
        }

        // Dropping the senders ends the manager's notification stream.
        self.listeners.lock().unwrap().remove(id);
        Ok(!self.close_unconfirmed.load(Ordering::SeqCst))
    }

    fn listen(&self, id: &SubscriptionId) -> NotificationReceiver {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners
            .lock()
            .unwrap()
            .entry(id.clone())
            .or_default()
            .push(tx);
        rx
    }

    fn on_connect(&self) -> Option<oneshot::Receiver<()>> {
        if !self.reconnect_capable {
            return None;
        }
        let (tx, rx) = oneshot::channel();
        self.connect_waiters.lock().unwrap().push(tx);
        Some(rx)
    }

    fn reconnect(&self) {
        self.reconnect_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Everything an item callback received, in order.
pub struct CallbackLog<T> {
    entries: Arc<Mutex<Vec<SubscriptionResult<T>>>>,
}

impl<T> CallbackLog<T> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + Send + 'static> CallbackLog<T> {
    pub fn callback(&self) -> Arc<dyn Fn(SubscriptionResult<T>) + Send + Sync> {
        let entries = self.entries.clone();
        Arc::new(move |result| entries.lock().unwrap().push(result))
    }

    pub fn entries(&self) -> Vec<SubscriptionResult<T>> {
        self.entries.lock().unwrap().clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.entries().into_iter().filter_map(Result::ok).collect()
    }

    pub fn error_count(&self) -> usize {
        self.entries().iter().filter(|r| r.is_err()).count()
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Run `fut` with a two second deadline.
pub async fn within<F: Future>(fut: F) -> F::Output {
    tokio::time::timeout(Duration::from_secs(2), fut)
        .await
        .expect("timed out")
}
