//! Players and game titles.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use super::{IncludeInactiveParams, SetActiveRequest};
use crate::api::state::AppState;
use crate::api::ApiError;
use crate::models::{Player, PlayerId, Title, TitleId};

#[derive(Debug, Deserialize)]
pub struct NameRequest {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct PlayerListResponse {
    pub players: Vec<Player>,
}

#[derive(Debug, Serialize)]
pub struct TitleListResponse {
    pub titles: Vec<Title>,
}

// ── Players ─────────────────────────────────────────────────────

pub async fn list_players(
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> Result<Json<PlayerListResponse>, ApiError> {
    let players = state.store.list_players(params.include_inactive)?;
    Ok(Json(PlayerListResponse { players }))
}

pub async fn get_player(
    State(state): State<AppState>,
    Path(id): Path<PlayerId>,
) -> Result<Json<Player>, ApiError> {
    Ok(Json(state.store.get_player(id)?))
}

pub async fn create_player(
    State(state): State<AppState>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<Player>), ApiError> {
    let player = state.store.add_player(&req.name)?;
    Ok((StatusCode::CREATED, Json(player)))
}

pub async fn rename_player(
    State(state): State<AppState>,
    Path(id): Path<PlayerId>,
    Json(req): Json<NameRequest>,
) -> Result<Json<Player>, ApiError> {
    Ok(Json(state.store.rename_player(id, &req.name)?))
}

pub async fn set_player_active(
    State(state): State<AppState>,
    Path(id): Path<PlayerId>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<Player>, ApiError> {
    Ok(Json(state.store.set_player_active(id, req.active)?))
}

pub async fn delete_player(
    State(state): State<AppState>,
    Path(id): Path<PlayerId>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_player(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Titles ──────────────────────────────────────────────────────

pub async fn list_titles(
    State(state): State<AppState>,
    Query(params): Query<IncludeInactiveParams>,
) -> Result<Json<TitleListResponse>, ApiError> {
    let titles = state.store.list_titles(params.include_inactive)?;
    Ok(Json(TitleListResponse { titles }))
}

pub async fn get_title(
    State(state): State<AppState>,
    Path(id): Path<TitleId>,
) -> Result<Json<Title>, ApiError> {
    Ok(Json(state.store.get_title(id)?))
}

pub async fn create_title(
    State(state): State<AppState>,
    Json(req): Json<NameRequest>,
) -> Result<(StatusCode, Json<Title>), ApiError> {
    let title = state.store.add_title(&req.name)?;
    Ok((StatusCode::CREATED, Json(title)))
}

pub async fn rename_title(
    State(state): State<AppState>,
    Path(id): Path<TitleId>,
    Json(req): Json<NameRequest>,
) -> Result<Json<Title>, ApiError> {
    Ok(Json(state.store.rename_title(id, &req.name)?))
}

pub async fn set_title_active(
    State(state): State<AppState>,
    Path(id): Path<TitleId>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<Title>, ApiError> {
    Ok(Json(state.store.set_title_active(id, req.active)?))
}

pub async fn delete_title(
    State(state): State<AppState>,
    Path(id): Path<TitleId>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_title(id)?;
    Ok(StatusCode::NO_CONTENT)
}
