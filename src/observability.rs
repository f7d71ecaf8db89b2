use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total HTTP requests handled. Labels: route, method, status.
pub const REQUESTS_TOTAL: &str = "bellhop_requests_total";

/// Histogram: HTTP request latency in seconds. Labels: route, method.
pub const REQUEST_DURATION_SECONDS: &str = "bellhop_request_duration_seconds";

/// Counter: bookings accepted.
pub const BOOKINGS_CREATED_TOTAL: &str = "bellhop_bookings_created_total";

/// Counter: bookings rejected because the stay overlapped an existing one.
pub const BOOKING_CONFLICTS_TOTAL: &str = "bellhop_booking_conflicts_total";

/// Counter: payments captured.
pub const PAYMENTS_COMPLETED_TOTAL: &str = "bellhop_payments_completed_total";

/// Counter: payments declined by the gateway.
pub const PAYMENTS_FAILED_TOTAL: &str = "bellhop_payments_failed_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: rooms currently in the catalog.
pub const ROOMS_ACTIVE: &str = "bellhop_rooms_active";

/// Counter: requests rejected for a missing or unknown bearer token.
pub const AUTH_FAILURES_TOTAL: &str = "bellhop_auth_failures_total";

/// Histogram: WAL group-commit flush duration in seconds.
pub const WAL_FLUSH_DURATION_SECONDS: &str = "bellhop_wal_flush_duration_seconds";

/// Histogram: WAL group-commit batch size (events per flush).
pub const WAL_FLUSH_BATCH_SIZE: &str = "bellhop_wal_flush_batch_size";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
