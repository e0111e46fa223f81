//! Metrics collection.
//!
//! Counters go through the `metrics` facade; installing an exporter is up to
//! the embedding application. Without one every call is a no-op.
//!
//! # Metrics
//! - `subscription_opened_total` (counter): successful opens by kind
//! - `subscription_open_failures_total` (counter): rejected opens by kind
//! - `subscription_items_total` (counter): delivered items by kind
//! - `subscription_errors_total` (counter): push errors by kind
//! - `subscription_reconnect_attempts_total` (counter): reconnect polls by kind
//! - `sign_requests_total` (counter): sign calls by outcome

pub fn record_subscription_opened(kind: &str) {
    metrics::counter!("subscription_opened_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_open_failure(kind: &str) {
    metrics::counter!("subscription_open_failures_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_items(kind: &str, count: usize) {
    metrics::counter!("subscription_items_total", "kind" => kind.to_string())
        .increment(count as u64);
}

pub fn record_subscription_error(kind: &str) {
    metrics::counter!("subscription_errors_total", "kind" => kind.to_string()).increment(1);
}

pub fn record_reconnect_attempt(kind: &str) {
    metrics::counter!("subscription_reconnect_attempts_total", "kind" => kind.to_string())
        .increment(1);
}

/// `outcome` is one of `signed`, `missing_key`, `failed`.
pub fn record_sign_request(outcome: &'static str) {
    metrics::counter!("sign_requests_total", "outcome" => outcome).increment(1);
}
