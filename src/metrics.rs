//! Prometheus metrics for delivery and presence.
//!
//! Delivery misses are expected behavior (the peer is simply offline), so
//! they surface here and in debug logs rather than as errors.

use actix_web::HttpResponse;
use once_cell::sync::Lazy;
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, Encoder, IntCounter,
    IntCounterVec, IntGauge, TextEncoder,
};

/// Live WebSocket sessions (one per online user).
static WS_CONNECTIONS: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "chat_ws_connections",
        "Number of live WebSocket sessions"
    )
    .expect("failed to register chat_ws_connections")
});

static MESSAGES_SENT_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "chat_messages_sent_total",
        "Total messages accepted and persisted"
    )
    .expect("failed to register chat_messages_sent_total")
});

/// Realtime event emissions per event type and outcome (delivered/missed).
static DELIVERY_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "chat_delivery_total",
        "Realtime event deliveries by event type and outcome",
        &["event", "outcome"]
    )
    .expect("failed to register chat_delivery_total")
});

static PRESENCE_BROADCASTS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "chat_presence_broadcasts_total",
        "Full presence snapshots broadcast to all sessions"
    )
    .expect("failed to register chat_presence_broadcasts_total")
});

pub fn set_ws_connections(count: i64) {
    WS_CONNECTIONS.set(count);
}

pub fn record_message_sent() {
    MESSAGES_SENT_TOTAL.inc();
}

pub fn record_delivery(event: &str, outcome: &str) {
    DELIVERY_TOTAL.with_label_values(&[event, outcome]).inc();
}

pub fn record_presence_broadcast() {
    PRESENCE_BROADCASTS_TOTAL.inc();
}

pub async fn metrics_handler() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
