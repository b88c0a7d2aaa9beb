use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total HTTP requests served. Labels: route, method, status.
pub const REQUESTS_TOTAL: &str = "atrium_requests_total";

/// Histogram: request latency in seconds. Labels: route, method.
pub const REQUEST_DURATION_SECONDS: &str = "atrium_request_duration_seconds";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: live rooms.
pub const ROOMS_LIVE: &str = "atrium_rooms_live";

/// Counter: bookings admitted.
pub const BOOKINGS_CREATED_TOTAL: &str = "atrium_bookings_created_total";

/// Counter: bookings re-admitted with new fields.
pub const BOOKINGS_UPDATED_TOTAL: &str = "atrium_bookings_updated_total";

/// Counter: bookings cancelled.
pub const BOOKINGS_CANCELLED_TOTAL: &str = "atrium_bookings_cancelled_total";

/// Histogram: WAL append+fsync duration in seconds.
pub const WAL_APPEND_DURATION_SECONDS: &str = "atrium_wal_append_duration_seconds";

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
