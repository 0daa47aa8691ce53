use crate::domain::payment::ErrorEnvelope;
use crate::error::PaymentError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

pub fn error_response(status: StatusCode, message: &str, error: Option<String>) -> Response {
    (status, Json(ErrorEnvelope::new(message, error))).into_response()
}

pub fn bad_request(message: &str, error: Option<String>) -> Response {
    error_response(StatusCode::BAD_REQUEST, message, error)
}

impl IntoResponse for PaymentError {
    fn into_response(self) -> Response {
        match self {
            PaymentError::Validation(_) => bad_request("invalid payment data", Some(self.to_string())),
            other => {
                tracing::error!("request failed: {}", other);
                error_response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error",
                    Some(other.to_string()),
                )
            }
        }
    }
}
