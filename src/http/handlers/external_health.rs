use crate::domain::health::ProcessorName;
use crate::http::errors::{bad_request, error_response};
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct HealthQuery {
    pub name: Option<String>,
}

pub async fn processor_health(
    State(state): State<AppState>,
    Query(query): Query<HealthQuery>,
) -> impl IntoResponse {
    let Some(raw) = query.name.filter(|n| !n.is_empty()) else {
        return bad_request("missing processor name", None);
    };
    let name = match raw.parse::<ProcessorName>() {
        Ok(name) => name,
        Err(e) => return bad_request("invalid processor name", Some(e.to_string())),
    };

    match state.payment_service.health_status(name).await {
        Ok(health) => (StatusCode::OK, Json(health)).into_response(),
        Err(err) => {
            tracing::error!("health probe for {} failed: {}", name, err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error",
                Some(err.to_string()),
            )
        }
    }
}
