//! Weekly and yearly standings, tiebreaks and the year race.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::league::{self, ScopeTarget, WeekReport, YearReport};
use crate::models::{PlayerId, RaceMetric, Tiebreaker, YearRace};

#[derive(Debug, Default, Deserialize)]
pub struct TiebreakRequest {
    /// Chosen winner; absent means draw one by chance.
    pub winner_id: Option<PlayerId>,
}

#[derive(Debug, Serialize)]
pub struct TiebreakResponse {
    pub tiebreaker: Tiebreaker,
    pub drawn: bool,
}

#[derive(Debug, Deserialize)]
pub struct RaceParams {
    pub metric: Option<String>,
    pub top: Option<i32>,
}

pub async fn current_week(State(state): State<AppState>) -> Result<Json<WeekReport>, ApiError> {
    let (year, week) = league::current_week(state.now_local());
    Ok(Json(league::week_standings(&state.store, year, week)?))
}

pub async fn week(
    State(state): State<AppState>,
    Path((year, week)): Path<(i32, u32)>,
) -> Result<Json<WeekReport>, ApiError> {
    Ok(Json(league::week_standings(&state.store, year, week)?))
}

pub async fn week_tiebreak(
    State(state): State<AppState>,
    Path((year, week)): Path<(i32, u32)>,
    body: Option<Json<TiebreakRequest>>,
) -> Result<Json<TiebreakResponse>, ApiError> {
    let target = ScopeTarget::week(year, week)?;
    settle(&state, target, body.map(|Json(req)| req).unwrap_or_default())
}

pub async fn year(
    State(state): State<AppState>,
    Path(year): Path<i32>,
) -> Result<Json<YearReport>, ApiError> {
    Ok(Json(league::year_standings(
        &state.store,
        year,
        state.league.qualification,
    )?))
}

pub async fn year_tiebreak(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    body: Option<Json<TiebreakRequest>>,
) -> Result<Json<TiebreakResponse>, ApiError> {
    settle(
        &state,
        ScopeTarget::Year(year),
        body.map(|Json(req)| req).unwrap_or_default(),
    )
}

pub async fn year_race(
    State(state): State<AppState>,
    Path(year): Path<i32>,
    Query(params): Query<RaceParams>,
) -> Result<Json<YearRace>, ApiError> {
    let metric = match params.metric.as_deref() {
        Some(raw) => raw
            .parse::<RaceMetric>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => RaceMetric::default(),
    };
    let top = params.top.unwrap_or(state.league.race_top_n);

    Ok(Json(league::year_race(&state.store, year, metric, top)?))
}

fn settle(
    state: &AppState,
    target: ScopeTarget,
    req: TiebreakRequest,
) -> Result<Json<TiebreakResponse>, ApiError> {
    let rule = state.league.qualification;
    let now = Utc::now();

    let response = match req.winner_id {
        Some(winner) => TiebreakResponse {
            tiebreaker: league::record_tiebreak(&state.store, rule, target, winner, now)?,
            drawn: false,
        },
        None => TiebreakResponse {
            tiebreaker: league::draw_tiebreak(
                &state.store,
                rule,
                target,
                &mut rand::thread_rng(),
                now,
            )?,
            drawn: true,
        },
    };

    Ok(Json(response))
}
