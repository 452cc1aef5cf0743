use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::SetActiveRequest;
use crate::api::state::AppState;
use crate::api::{ApiError, Pagination, PaginationMeta};
use crate::models::{Game, GameId, NewGame};

#[derive(Debug, Deserialize)]
pub struct ListGamesParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Serialize)]
pub struct GameListResponse {
    pub games: Vec<Game>,
    pub pagination: PaginationMeta,
}

/// Newest games first.
pub async fn list_games(
    State(state): State<AppState>,
    Query(params): Query<ListGamesParams>,
) -> Result<Json<GameListResponse>, ApiError> {
    let games = state.store.recent_games(0, params.include_inactive)?;

    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, games.len() as u32);

    Ok(Json(GameListResponse {
        games: pagination.slice(&games).to_vec(),
        pagination: meta,
    }))
}

pub async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<GameId>,
) -> Result<Json<Game>, ApiError> {
    Ok(Json(state.store.get_game(id)?))
}

pub async fn create_game(
    State(state): State<AppState>,
    Json(new): Json<NewGame>,
) -> Result<(StatusCode, Json<Game>), ApiError> {
    let game = state.store.add_game(new, state.league.weekdays_only)?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// Soft delete or restore.
pub async fn set_game_active(
    State(state): State<AppState>,
    Path(id): Path<GameId>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<Game>, ApiError> {
    Ok(Json(state.store.set_game_active(id, req.active)?))
}

pub async fn delete_game(
    State(state): State<AppState>,
    Path(id): Path<GameId>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_game(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::api::build_router;
    use crate::storage::{LeagueStore, StorageConfig};

    #[tokio::test]
    async fn test_create_and_list_games() {
        let (app, _) = app_with(seeded_store());

        let (status, created) =
            post_json(&app, "/api/games", game_body("2026-02-09", &[1, 2], &[1])).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["id"], 1);
        assert_eq!(created["title"], "Catan");
        assert_eq!(created["is_active"], true);

        post_json(&app, "/api/games", game_body("2026-02-10", &[1, 2], &[2])).await;

        let (status, json) = get_json(&app, "/api/games").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["games"].as_array().unwrap().len(), 2);
        assert_eq!(json["games"][0]["id"], 2);
        assert_eq!(json["pagination"]["total_items"], 2);
    }

    #[tokio::test]
    async fn test_list_games_paginates() {
        let (app, _) = app_with(seeded_store());
        for date in ["2026-02-09", "2026-02-10", "2026-02-11"] {
            post_json(&app, "/api/games", game_body(date, &[1, 2], &[1])).await;
        }

        let (_, json) = get_json(&app, "/api/games?page=2&page_size=2").await;
        let games = json["games"].as_array().unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0]["id"], 1);
        assert_eq!(json["pagination"]["has_prev"], true);
        assert_eq!(json["pagination"]["has_next"], false);

        let (status, json) = get_json(&app, "/api/games?page=4294967295&page_size=100").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["games"], json!([]));
    }

    #[tokio::test]
    async fn test_create_game_validation_errors() {
        let (app, _) = app_with(seeded_store());

        // Winner not among participants
        let (status, json) =
            post_json(&app, "/api/games", game_body("2026-02-09", &[1, 2], &[3])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");

        // Saturday
        let (status, _) =
            post_json(&app, "/api/games", game_body("2026-02-14", &[1, 2], &[1])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Unknown player
        let (status, json) =
            post_json(&app, "/api/games", game_body("2026-02-09", &[1, 8], &[1])).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_soft_delete_hides_game() {
        let (app, _) = app_with(seeded_store());
        post_json(&app, "/api/games", game_body("2026-02-09", &[1, 2], &[1])).await;

        let (status, json) =
            post_json(&app, "/api/games/1/active", json!({ "active": false })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["is_active"], false);

        let (_, json) = get_json(&app, "/api/games").await;
        assert!(json["games"].as_array().unwrap().is_empty());

        let (_, json) = get_json(&app, "/api/games?include_inactive=true").await;
        assert_eq!(json["games"].as_array().unwrap().len(), 1);

        let (_, week) = get_json(&app, "/api/weeks/2026/7").await;
        assert_eq!(week["total_games"], 0);
    }

    #[tokio::test]
    async fn test_delete_game() {
        let (app, _) = app_with(seeded_store());
        post_json(&app, "/api/games", game_body("2026-02-09", &[1, 2], &[1])).await;

        let (status, _) = send(&app, "DELETE", "/api/games/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = get_json(&app, "/api/games/1").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "DELETE", "/api/games/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_games_persist_across_restart() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = StorageConfig::new(tmp.path().to_path_buf());

        {
            let store = LeagueStore::open(storage.clone()).unwrap();
            store.add_player("Ada").unwrap();
            store.add_player("Grace").unwrap();
            store.add_title("Catan").unwrap();
            let (app, _) = app_with(store);
            let (status, _) =
                post_json(&app, "/api/games", game_body("2026-02-09", &[1, 2], &[2])).await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let app = build_router(test_state(LeagueStore::open(storage).unwrap()));
        let (status, json) = get_json(&app, "/api/games/1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["winner_ids"], json!([2]));
    }
}
