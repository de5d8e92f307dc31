//! Client metrics definitions
//!
//! OpenTelemetry instruments for monitoring client health. Recording goes
//! through the global meter provider; without a configured provider the
//! instruments are no-ops, so the client works identically with metrics
//! wired up or not.
//!
//! # Metrics Collected
//!
//! - **connection_state**: current connection status (gauge)
//! - **requests_total**: requests sent, by method and status (counter)
//! - **request_duration**: request latency distribution (histogram)
//! - **errors_total**: errors encountered, by type (counter)
//! - **reconnection_attempts / reconnection_success**: reconnect counters
//! - **notifications_received**: unsolicited pushes received (counter)

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};

/// Client metrics for monitoring
pub struct ClientMetrics {
    /// Connection state (0=disconnected, 1=connecting, 2=connected, 3=reconnecting, 4=failed)
    pub connection_state: Gauge<i64>,
    /// Total number of requests sent
    pub requests_total: Counter<u64>,
    /// Request duration in seconds
    pub request_duration: Histogram<f64>,
    /// Total number of errors
    pub errors_total: Counter<u64>,
    /// Total number of reconnection attempts
    pub reconnection_attempts: Counter<u64>,
    /// Total number of successful reconnections
    pub reconnection_success: Counter<u64>,
    /// Total number of notifications received
    pub notifications_received: Counter<u64>,
}

impl ClientMetrics {
    /// Create a new ClientMetrics instance on the global meter
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    /// Create a new ClientMetrics instance with a custom meter
    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("webrpc.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=connecting, 2=connected, 3=reconnecting, 4=failed)")
                .build(),
            requests_total: meter
                .u64_counter("webrpc.client.requests.total")
                .with_description("Total number of requests sent")
                .build(),
            request_duration: meter
                .f64_histogram("webrpc.client.request.duration")
                .with_description("Request duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("webrpc.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
            reconnection_attempts: meter
                .u64_counter("webrpc.client.reconnection.attempts")
                .with_description("Total number of reconnection attempts")
                .build(),
            reconnection_success: meter
                .u64_counter("webrpc.client.reconnection.success")
                .with_description("Total number of successful reconnections")
                .build(),
            notifications_received: meter
                .u64_counter("webrpc.client.notifications.received")
                .with_description("Total number of notifications received")
                .build(),
        }
    }

    /// Update connection state
    pub fn update_connection_state(&self, state: i64) {
        self.connection_state.record(state, &[]);
    }

    /// Record a request
    pub fn record_request(&self, method: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("method", method.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    /// Record an error
    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    /// Record a reconnection attempt
    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    /// Record a successful reconnection
    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }

    /// Record a notification received
    pub fn record_notification(&self, method: &str) {
        let attributes = &[KeyValue::new("method", method.to_string())];
        self.notifications_received.add(1, attributes);
    }
}
