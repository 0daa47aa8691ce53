use crate::domain::summary::SummaryRange;
use crate::http::errors::bad_request;
use crate::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SummaryQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

pub async fn payments_summary(
    State(state): State<AppState>,
    Query(query): Query<SummaryQuery>,
) -> impl IntoResponse {
    let range = match parse_range(&query) {
        Ok(range) => range,
        Err(resp) => return resp,
    };

    match state.payment_service.payments_summary(range).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// An empty `from=` or `to=` counts as absent.
fn parse_range(query: &SummaryQuery) -> Result<Option<SummaryRange>, Response> {
    let from = query.from.as_deref().filter(|s| !s.is_empty());
    let to = query.to.as_deref().filter(|s| !s.is_empty());
    let (from, to) = match (from, to) {
        (None, None) => return Ok(None),
        (Some(from), Some(to)) => (from, to),
        _ => {
            return Err(bad_request(
                "both 'from' and 'to' must be provided, or neither",
                None,
            ))
        }
    };

    let from = parse_timestamp(from).map_err(|e| bad_request("invalid 'from' date", Some(e)))?;
    let to = parse_timestamp(to).map_err(|e| bad_request("invalid 'to' date", Some(e)))?;
    Ok(Some(SummaryRange::new(from, to)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(from: Option<&str>, to: Option<&str>) -> SummaryQuery {
        SummaryQuery {
            from: from.map(str::to_string),
            to: to.map(str::to_string),
        }
    }

    #[test]
    fn range_is_both_or_neither() {
        assert!(parse_range(&query(None, None)).unwrap().is_none());
        assert!(parse_range(&query(Some("2025-07-10T12:00:00Z"), None)).is_err());
        assert!(parse_range(&query(None, Some("2025-07-10T12:00:00Z"))).is_err());

        let range = parse_range(&query(
            Some("2025-07-10T12:00:00.000Z"),
            Some("2025-07-10T13:00:00+01:00"),
        ))
        .unwrap()
        .unwrap();
        assert_eq!(range.from, range.to);
    }

    #[test]
    fn empty_bounds_mean_full_range() {
        assert!(parse_range(&query(Some(""), Some(""))).unwrap().is_none());
        assert!(parse_range(&query(Some(""), None)).unwrap().is_none());
        assert!(parse_range(&query(Some(""), Some("2025-07-10T12:00:00Z"))).is_err());
    }

    #[test]
    fn rejects_malformed_dates() {
        assert!(parse_range(&query(Some("yesterday"), Some("2025-07-10T12:00:00Z"))).is_err());
    }
}
