//! REST API endpoints.
//!
//! Axum-based HTTP API for recording games, managing the roster and
//! reading weekly/yearly standings.

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
use tracing::{error, warn};

use crate::league::LeagueError;
use crate::storage::StorageError;
use state::AppState;

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

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            StorageError::Conflict(msg) => ApiError::Conflict(msg),
            StorageError::Invalid(msg) => ApiError::BadRequest(msg),
            StorageError::Io(_)
            | StorageError::Json(_)
            | StorageError::Corrupt { .. }
            | StorageError::Poisoned => {
                error!("Storage failure: {}", err);
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl From<LeagueError> for ApiError {
    fn from(err: LeagueError) -> Self {
        match err {
            LeagueError::Storage(e) => e.into(),
            LeagueError::Standings(e) => {
                error!("Standings failed: {}", e);
                ApiError::Internal(e.to_string())
            }
            LeagueError::NoGames(_) | LeagueError::NotTied(_) => ApiError::Conflict(err.to_string()),
            LeagueError::Tiebreak(_)
            | LeagueError::NotALeader { .. }
            | LeagueError::InvalidScopeKey { .. } => ApiError::BadRequest(err.to_string()),
        }
    }
}

/// Pagination parameters.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 50,
        }
    }
}

impl Pagination {
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(50).clamp(1, 100),
        }
    }

    /// Index of the first item on this page. Saturates for huge page numbers.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size as usize)
    }

    /// The slice of `items` on this page.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = self.offset().min(items.len());
        let end = (start + self.page_size as usize).min(items.len());
        &items[start..end]
    }
}

/// Pagination metadata in responses.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub page_size: u32,
    pub total_items: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationMeta {
    pub fn new(pagination: &Pagination, total_items: u32) -> Self {
        let total_pages = total_items.div_ceil(pagination.page_size);
        Self {
            page: pagination.page,
            page_size: pagination.page_size,
            total_items,
            total_pages,
            has_next: pagination.page < total_pages,
            has_prev: pagination.page > 1,
        }
    }
}

/// All routes with request tracing.
pub fn build_router(state: AppState) -> Router {
    use routes::{games, health, roster, standings};

    Router::new()
        .route("/healthz", get(health::healthz))
        .route("/readyz", get(health::readyz))
        .route("/api/games", get(games::list_games).post(games::create_game))
        .route(
            "/api/games/:id",
            get(games::get_game).delete(games::delete_game),
        )
        .route("/api/games/:id/active", post(games::set_game_active))
        .route(
            "/api/players",
            get(roster::list_players).post(roster::create_player),
        )
        .route(
            "/api/players/:id",
            get(roster::get_player)
                .put(roster::rename_player)
                .delete(roster::delete_player),
        )
        .route("/api/players/:id/active", post(roster::set_player_active))
        .route(
            "/api/titles",
            get(roster::list_titles).post(roster::create_title),
        )
        .route(
            "/api/titles/:id",
            get(roster::get_title)
                .put(roster::rename_title)
                .delete(roster::delete_title),
        )
        .route("/api/titles/:id/active", post(roster::set_title_active))
        .route("/api/weeks/current", get(standings::current_week))
        .route("/api/weeks/:year/:week", get(standings::week))
        .route(
            "/api/weeks/:year/:week/tiebreak",
            post(standings::week_tiebreak),
        )
        .route("/api/years/:year", get(standings::year))
        .route("/api/years/:year/tiebreak", post(standings::year_tiebreak))
        .route("/api/years/:year/race", get(standings::year_race))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origin; `*` allows any.
pub fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }

    match origin.trim().parse::<HeaderValue>() {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(e) => {
            warn!("Ignoring invalid CORS origin {:?}: {}", origin, e);
            CorsLayer::new()
        }
    }
}
