use axum::{extract::State, response::IntoResponse};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::Arc;

use crate::AppState;

pub struct MetricsState {
    pub handle: PrometheusHandle,
}

/// Install the process-global Prometheus recorder and hand back the render
/// handle. Latency buckets are skewed low; most endpoints only touch
/// Postgres, so anything past a second is already pathological.
pub fn setup_metrics_recorder() -> MetricsState {
    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("leavedesk_http_request_duration_seconds".to_string()),
            &[0.001, 0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 5.0],
        )
        .expect("failed to set histogram buckets")
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    MetricsState { handle }
}

/// GET /metrics - Prometheus exposition
pub async fn metrics_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.metrics.handle.render()
}
