use crate::http::handlers::{external_health, payments, summary};
use crate::http::middleware::request_log;
use crate::AppState;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(payments::health))
        .route("/payments", post(payments::create_payment))
        .route("/payments/:correlation_id", get(payments::get_payment))
        .route("/payments-summary", get(summary::payments_summary))
        .route("/external-services/health", get(external_health::processor_health))
        .layer(from_fn(request_log::log_request))
        .with_state(state)
}
