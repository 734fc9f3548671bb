//! HTTP query API.
//!
//! Read-only surface over the record store: a time-range (or latest-N)
//! listing endpoint, a liveness probe, and the embedded listing page.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::error::DatalogError;
use crate::store::{LogRecord, LogStore, LATEST_LIMIT, RANGE_LIMIT};

/// Fixed textual pattern for range bounds (no seconds).
const RANGE_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Shared API state.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn LogStore>,
}

/// Creates the API router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(listing_page))
        .route("/health", get(health_check))
        .route("/list", get(list_records))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn listing_page() -> Html<&'static str> {
    Html(include_str!("../assets/listing.html"))
}

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Unvalidated range parameters. An absent parameter is an empty string.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawRangeQuery {
    pub start: String,
    pub end: String,
}

impl RawRangeQuery {
    /// Empty means "no range supplied": both fields empty. Emptiness
    /// selects the latest-N path and never triggers validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.start.is_empty() && self.end.is_empty()
    }

    /// Validate both bounds against the fixed pattern.
    ///
    /// A partial range (one field set) is an error, not a half-open range.
    pub fn validate(&self) -> Result<ValidatedRange, ApiError> {
        let start = parse_local(&self.start, "start")?;
        let end = parse_local(&self.end, "end")?;
        Ok(ValidatedRange { start, end })
    }
}

/// A successfully validated, timezone-pinned range.
#[derive(Debug, Clone, Copy)]
pub struct ValidatedRange {
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

/// Parses a range bound. The parse is timezone-naive and must be pinned to
/// the server's local zone; skipping the pin would shift results by the
/// server's UTC offset.
fn parse_local(value: &str, field: &str) -> Result<DateTime<Local>, ApiError> {
    let naive = NaiveDateTime::parse_from_str(value, RANGE_FORMAT)
        .map_err(|e| ApiError::InvalidRequest(format!("invalid {field}: {e}")))?;

    naive.and_local_timezone(Local).earliest().ok_or_else(|| {
        ApiError::InvalidRequest(format!("invalid {field}: not representable in local time"))
    })
}

/// Handle GET /list.
///
/// No range → the most recent records; a valid range → records within it,
/// inclusive. Either way ordered by timestamp descending and serialised as
/// a JSON array, possibly empty, never null.
async fn list_records(
    State(state): State<ApiState>,
    Query(raw): Query<RawRangeQuery>,
) -> Result<Json<Vec<LogRecord>>, ApiError> {
    let records = if raw.is_empty() {
        state.store.latest(LATEST_LIMIT).await?
    } else {
        let range = raw.validate()?;
        state.store.range(range.start, range.end, RANGE_LIMIT).await?
    };

    Ok(Json(records))
}

/// Query API error type.
#[derive(Debug)]
pub enum ApiError {
    InvalidRequest(String),
    Store(DatalogError),
}

impl From<DatalogError> for ApiError {
    fn from(err: DatalogError) -> Self {
        Self::Store(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Store(err) => {
                // Log the full error server-side; return a sanitised
                // message to the client.
                error!(error = %err, "query failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "storage error".to_owned())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
