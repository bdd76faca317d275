//! REST API endpoints.
//!
//! Axum-based HTTP API over the live tournament, the archive dashboards and
//! the Deck Lab. Handlers only load records and call into
//! [`crate::calculate`]; every number is recomputed per request.

pub mod routes;
pub mod state;

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::archive::{ArchiveError, ArchiveWindow};
use crate::live::LiveError;

use self::state::AppState;

/// `last` when `mode=last` is given without a count.
const DEFAULT_LAST_N: usize = 5;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LiveError> for ApiError {
    fn from(e: LiveError) -> Self {
        let message = e.to_string();
        match e {
            LiveError::MatchNotFound(_) | LiveError::UnknownPlayer(_) => {
                ApiError::NotFound(message)
            }
            LiveError::SelfPairing(_)
            | LiveError::InvalidRoundCount
            | LiveError::InvalidResult(_)
            | LiveError::EmptyName => ApiError::BadRequest(message),
            LiveError::NoRound
            | LiveError::RoundLocked(_)
            | LiveError::ResultsMissing { .. }
            | LiveError::RoundLimitReached(_)
            | LiveError::PreviousRoundOpen(_)
            | LiveError::AlreadyStarted(_) => ApiError::Conflict(message),
            LiveError::Storage(_) => ApiError::Internal(message),
        }
    }
}

impl From<ArchiveError> for ApiError {
    fn from(e: ArchiveError) -> Self {
        match e {
            ArchiveError::NotFound(id) => ApiError::NotFound(format!("tournament {}", id)),
            other => {
                warn!("Archive request failed: {}", other);
                ApiError::Internal(other.to_string())
            }
        }
    }
}

/// Build an [`ArchiveWindow`] from the `mode`/`id`/`last`/`month` query
/// parameters shared by the archive and lab endpoints. No mode means all.
pub fn parse_window(
    mode: Option<&str>,
    id: Option<&str>,
    last: Option<usize>,
    month: Option<&str>,
) -> Result<ArchiveWindow, ApiError> {
    match mode.map(str::trim).unwrap_or("all") {
        "all" | "" => Ok(ArchiveWindow::All),
        "single" => id
            .filter(|id| !id.is_empty())
            .map(|id| ArchiveWindow::Single { id: id.to_string() })
            .ok_or_else(|| ApiError::BadRequest("mode=single needs an id".to_string())),
        "last" | "lastN" => Ok(ArchiveWindow::LastN {
            n: last.unwrap_or(DEFAULT_LAST_N).max(1),
        }),
        "month" => {
            let ym = month.unwrap_or_default();
            if chrono::NaiveDate::parse_from_str(&format!("{}-01", ym), "%Y-%m-%d").is_err() {
                return Err(ApiError::BadRequest(format!(
                    "month must be YYYY-MM, got '{}'",
                    ym
                )));
            }
            Ok(ArchiveWindow::Month { ym: ym.to_string() })
        }
        other => Err(ApiError::BadRequest(format!("unknown mode '{}'", other))),
    }
}

/// Assemble the application router with CORS and request tracing.
pub fn build_router(state: AppState) -> Router {
    let cors = match state.config.server.cors_origin.as_str() {
        "*" => CorsLayer::new().allow_origin(Any),
        origin => match origin.parse::<HeaderValue>() {
            Ok(value) => CorsLayer::new().allow_origin(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                CorsLayer::new()
            }
        },
    }
    .allow_methods(Any)
    .allow_headers(Any);

    Router::new()
        .route("/api/live", get(routes::live::show))
        .route("/api/live/standings", get(routes::live::standings))
        .route("/api/live/deck-stats", get(routes::live::deck_stats))
        .route("/api/live/matchups", get(routes::live::matchups))
        .route("/api/live/players", post(routes::live::add_player))
        .route("/api/live/entries", post(routes::live::set_entry))
        .route("/api/live/rounds", post(routes::live::start_round))
        .route("/api/live/rounds/close", post(routes::live::close_round))
        .route("/api/live/matches", post(routes::live::add_match))
        .route("/api/live/matches/:mid/result", post(routes::live::set_result))
        .route("/api/live/reset", post(routes::live::reset))
        .route("/api/archive/index", get(routes::archive::index))
        .route("/api/archive/months", get(routes::archive::months))
        .route("/api/archive/aggregate", get(routes::archive::aggregate))
        .route("/api/lab/:did", get(routes::lab::deck_lab))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
