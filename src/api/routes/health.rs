use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::api::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub started_at: String,
}

/// Liveness: the process is up.
pub async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at.to_rfc3339(),
    })
}

#[derive(Debug, Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Readiness: the league store can be read.
pub async fn readyz(State(state): State<AppState>) -> Response {
    match state.store.check_readable() {
        Ok(()) => Json(ReadyResponse {
            status: "ready",
            error: None,
        })
        .into_response(),
        Err(e) => {
            warn!("Store not ready: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadyResponse {
                    status: "unavailable",
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use crate::storage::LeagueStore;

    #[tokio::test]
    async fn test_healthz() {
        let (app, _) = app_with(LeagueStore::in_memory());
        let (status, json) = get_json(&app, "/healthz").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_readyz_ok() {
        let (app, _) = app_with(LeagueStore::in_memory());
        let (status, json) = get_json(&app, "/readyz").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ready");
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn test_readyz_unavailable_when_store_unreadable() {
        let (app, state) = app_with(LeagueStore::in_memory());
        state.store.poison();

        let (status, json) = get_json(&app, "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["status"], "unavailable");
    }
}
