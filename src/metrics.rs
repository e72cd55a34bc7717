use metrics::{counter, histogram};
use std::time::Duration;

use crate::models::Scores;

/// Metric names recorded by the service.
///
/// Recording goes through the `metrics` facade; nothing is exported unless
/// the embedding process installs a recorder.
#[derive(Debug, Clone, Copy)]
pub struct MetricsCollector {
    // Request metrics
    /// Requests by operation and outcome
    pub requests_total: &'static str,
    /// Request latency in seconds
    pub request_duration: &'static str,

    // Store metrics
    /// Store calls by operation and status
    pub store_operations_total: &'static str,
    /// Store call latency in seconds
    pub store_operation_duration: &'static str,

    // Scoring metrics
    /// Scored replies by label
    pub replies_scored_total: &'static str,
    /// Reply length in characters
    pub reply_length: &'static str,

    // Error metrics
    /// Failed requests by error kind
    pub errors_total: &'static str,
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self {
            requests_total: "ticket_triage_requests_total",
            request_duration: "ticket_triage_request_duration_seconds",

            store_operations_total: "ticket_triage_store_operations_total",
            store_operation_duration: "ticket_triage_store_operation_duration_seconds",

            replies_scored_total: "ticket_triage_replies_scored_total",
            reply_length: "ticket_triage_reply_length_chars",

            errors_total: "ticket_triage_errors_total",
        }
    }
}

impl MetricsCollector {
    /// Record the outcome of one API operation
    pub fn record_request(&self, operation: &'static str, duration: Duration, outcome: &'static str) {
        counter!(self.requests_total, "operation" => operation, "outcome" => outcome).increment(1);
        histogram!(self.request_duration, "operation" => operation).record(duration.as_secs_f64());
    }

    /// Record a gateway call.
    ///
    /// Failures are only labelled here; `errors_total` is counted once per
    /// request by [`Self::record_error`].
    pub fn record_store_operation(&self, operation: &'static str, duration: Duration, success: bool) {
        let status = if success { "success" } else { "error" };

        counter!(self.store_operations_total, "operation" => operation, "status" => status).increment(1);
        histogram!(self.store_operation_duration, "operation" => operation).record(duration.as_secs_f64());
    }

    /// Record the labels given to a reply
    pub fn record_scores(&self, scores: &Scores, message_chars: usize) {
        counter!(
            self.replies_scored_total,
            "urgency" => i64::from(scores.urgency).to_string(),
            "importance" => i64::from(scores.importance).to_string(),
            "sentiment" => scores.sentiment.as_str()
        )
        .increment(1);
        histogram!(self.reply_length).record(message_chars as f64);
    }

    /// Record error metrics
    pub fn record_error(&self, error_type: &'static str, operation: &'static str) {
        counter!(self.errors_total, "type" => error_type, "operation" => operation).increment(1);
    }
}

/// Performance timing wrapper for store calls
pub struct MetricsTimer {
    collector: MetricsCollector,
    operation: &'static str,
    start: std::time::Instant,
}

impl MetricsTimer {
    /// Start timing a store call
    #[must_use]
    pub fn new(collector: MetricsCollector, operation: &'static str) -> Self {
        Self {
            collector,
            operation,
            start: std::time::Instant::now(),
        }
    }

    /// Stop the timer and record the outcome
    pub fn finish(self, success: bool) {
        let duration = self.start.elapsed();
        self.collector.record_store_operation(self.operation, duration, success);
    }
}
