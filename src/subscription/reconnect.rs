//! Fixed-interval reconnect polling.
//!
//! While a manager waits for its transport to come back it asks the
//! transport to reconnect on every tick. The poll stops when the transport
//! fires its one-shot `connect` signal, when the optional deadline passes,
//! or when the owning manager cancels the timer.

use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use crate::observability::metrics;
use crate::transport::Transport;

/// How a reconnect poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The transport signalled `connect`.
    Connected,
    /// The deadline passed first.
    TimedOut,
    /// The transport dropped the `connect` signal without firing it.
    SignalDropped,
}

/// Poll `transport` every `period` until `connected` fires.
///
/// The first reconnect attempt happens one full period after the call.
pub async fn poll_until_connected(
    transport: &dyn Transport,
    kind: &str,
    connected: oneshot::Receiver<()>,
    period: Duration,
    deadline: Option<Duration>,
) -> PollOutcome {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut attempts: u64 = 0;

    let poll = async {
        tokio::pin!(connected);
        loop {
            tokio::select! {
                signal = &mut connected => {
                    return match signal {
                        Ok(()) => PollOutcome::Connected,
                        Err(_) => PollOutcome::SignalDropped,
                    };
                }
                _ = ticker.tick() => {
                    attempts += 1;
                    tracing::debug!(kind = %kind, attempt = attempts, "Asking transport to reconnect");
                    metrics::record_reconnect_attempt(kind);
                    transport.reconnect();
                }
            }
        }
    };

    match deadline {
        Some(limit) => timeout(limit, poll).await.unwrap_or(PollOutcome::TimedOut),
        None => poll.await,
    }
}

/// Handle to a running reconnect procedure, owned by one manager.
#[derive(Debug)]
pub struct ReconnectTimer {
    handle: JoinHandle<()>,
}

impl ReconnectTimer {
    pub fn new(handle: JoinHandle<()>) -> Self {
        Self { handle }
    }

    /// Whether the procedure is still polling or resubscribing.
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Stop the procedure. Returns true if it was still running.
    pub fn cancel(&self) -> bool {
        let running = self.is_running();
        self.handle.abort();
        running
    }
}

impl Drop for ReconnectTimer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
