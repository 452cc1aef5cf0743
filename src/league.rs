//! League operations.
//!
//! Glue between [`LeagueStore`] and the standings engine. Every operation
//! works on one snapshot of the store, so standings and the tiebreak
//! decisions they consult always come from the same point in time.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::calculate::{
    compute_week_standings, compute_year_race, compute_year_standings_with, current_iso_week,
    parse_week_scope_key, week_scope_key, year_scope_key, NoTiebreakers, StandingsError,
};
use crate::models::{
    PlayerId, QualificationRule, RaceMetric, TiebreakError, TiebreakScope, Tiebreaker,
    WeekStandings, YearRace, YearStandings,
};
use crate::storage::{LeagueSnapshot, LeagueStore, StorageError};

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Standings(#[from] StandingsError),

    #[error(transparent)]
    Tiebreak(#[from] TiebreakError),

    #[error("No games were played in {0}; no tiebreaker needed")]
    NoGames(String),

    #[error("{0} is not tied; no tiebreaker needed")]
    NotTied(String),

    #[error("Player {winner} is not among the tied leaders of {scope_key}")]
    NotALeader { winner: PlayerId, scope_key: String },

    #[error("Invalid {scope} scope key: {key:?}")]
    InvalidScopeKey { scope: TiebreakScope, key: String },
}

/// A week or a year, validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeTarget {
    Week { year: i32, week: u32 },
    Year(i32),
}

impl ScopeTarget {
    /// An ISO week that exists in `year`.
    pub fn week(year: i32, week: u32) -> Result<Self, LeagueError> {
        Self::parse(TiebreakScope::Weekly, &week_scope_key(year, week))
    }

    /// Read a stored scope key (`2026-W07` or `2026`).
    pub fn parse(scope: TiebreakScope, key: &str) -> Result<Self, LeagueError> {
        let invalid = || LeagueError::InvalidScopeKey {
            scope,
            key: key.to_string(),
        };

        match scope {
            TiebreakScope::Weekly => parse_week_scope_key(key)
                .map(|(year, week)| ScopeTarget::Week { year, week })
                .ok_or_else(invalid),
            TiebreakScope::Yearly => key
                .trim()
                .parse::<i32>()
                .ok()
                .filter(|y| (1..=9999).contains(y))
                .map(ScopeTarget::Year)
                .ok_or_else(invalid),
        }
    }

    pub fn scope(&self) -> TiebreakScope {
        match self {
            ScopeTarget::Week { .. } => TiebreakScope::Weekly,
            ScopeTarget::Year(_) => TiebreakScope::Yearly,
        }
    }

    /// Canonical scope key.
    pub fn key(&self) -> String {
        match self {
            ScopeTarget::Week { year, week } => week_scope_key(*year, *week),
            ScopeTarget::Year(year) => year_scope_key(*year),
        }
    }
}

/// Weekly standings plus display names.
#[derive(Debug, Clone, Serialize)]
pub struct WeekReport {
    #[serde(flatten)]
    pub standings: WeekStandings,
    pub players: BTreeMap<PlayerId, String>,
}

/// Yearly standings plus display names.
#[derive(Debug, Clone, Serialize)]
pub struct YearReport {
    #[serde(flatten)]
    pub standings: YearStandings,
    pub players: BTreeMap<PlayerId, String>,
}

/// Local ISO (year, week) at `now`.
pub fn current_week(now: DateTime<FixedOffset>) -> (i32, u32) {
    current_iso_week(now.date_naive())
}

pub fn week_standings(store: &LeagueStore, year: i32, week: u32) -> Result<WeekReport, LeagueError> {
    ScopeTarget::week(year, week)?;

    let snapshot = store.snapshot()?;
    let games = snapshot.games_in_week(year, week);
    let standings = compute_week_standings(&games, year, week, &snapshot)?;

    Ok(WeekReport {
        standings,
        players: snapshot.player_names(),
    })
}

pub fn year_standings(
    store: &LeagueStore,
    year: i32,
    rule: QualificationRule,
) -> Result<YearReport, LeagueError> {
    let snapshot = store.snapshot()?;
    let games = snapshot.games_in_year(year);
    let standings = compute_year_standings_with(&games, year, rule, &snapshot)?;

    Ok(YearReport {
        standings,
        players: snapshot.player_names(),
    })
}

/// Cumulative race over the active roster.
pub fn year_race(
    store: &LeagueStore,
    year: i32,
    metric: RaceMetric,
    top_n: i32,
) -> Result<YearRace, LeagueError> {
    let snapshot = store.snapshot()?;
    let games = snapshot.games_in_year(year);
    Ok(compute_year_race(
        &games,
        year,
        metric,
        top_n,
        &snapshot.active_players(),
    ))
}

/// Current leaders of a scope that needs a tiebreak, recomputed from the
/// snapshot while ignoring any stored decision.
fn tied_leaders(
    snapshot: &LeagueSnapshot,
    target: ScopeTarget,
    rule: QualificationRule,
) -> Result<Vec<PlayerId>, LeagueError> {
    let (total_games, top_ids) = match target {
        ScopeTarget::Week { year, week } => {
            let games = snapshot.games_in_week(year, week);
            let ws = compute_week_standings(&games, year, week, &NoTiebreakers)?;
            (ws.total_games as usize, ws.top_ids)
        }
        ScopeTarget::Year(year) => {
            let games = snapshot.games_in_year(year);
            let ys = compute_year_standings_with(&games, year, rule, &NoTiebreakers)?;
            (games.len(), ys.top_ids)
        }
    };

    if total_games == 0 {
        return Err(LeagueError::NoGames(target.key()));
    }
    if top_ids.len() < 2 {
        return Err(LeagueError::NotTied(target.key()));
    }
    Ok(top_ids)
}

/// Store the decision for a tied scope. Replaces an earlier decision for
/// the same scope.
pub fn record_tiebreak(
    store: &LeagueStore,
    rule: QualificationRule,
    target: ScopeTarget,
    winner: PlayerId,
    now: DateTime<Utc>,
) -> Result<Tiebreaker, LeagueError> {
    let snapshot = store.snapshot()?;
    let top_ids = tied_leaders(&snapshot, target, rule)?;

    if !top_ids.contains(&winner) {
        return Err(LeagueError::NotALeader {
            winner,
            scope_key: target.key(),
        });
    }

    let tiebreaker = Tiebreaker::new(target.scope(), target.key(), &top_ids, winner, now)?;
    store.set_tiebreaker(tiebreaker.clone())?;
    Ok(tiebreaker)
}

/// Settle a tie by a game of chance: pick uniformly among the current
/// leaders and record the pick.
pub fn draw_tiebreak<R>(
    store: &LeagueStore,
    rule: QualificationRule,
    target: ScopeTarget,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Tiebreaker, LeagueError>
where
    R: Rng + ?Sized,
{
    let snapshot = store.snapshot()?;
    let top_ids = tied_leaders(&snapshot, target, rule)?;

    let winner = *top_ids
        .choose(rng)
        .ok_or_else(|| LeagueError::NotTied(target.key()))?;

    info!(
        "Drew {} tiebreak for {} among {:?}: {}",
        target.scope(),
        target.key(),
        top_ids,
        winner
    );
    record_tiebreak(store, rule, target, winner, now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::models::{NewGame, TitleId};

    fn pid(raw: i64) -> PlayerId {
        PlayerId::new(raw)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 16, 12, 0, 0).unwrap()
    }

    fn play(store: &LeagueStore, date: &str, participants: &[i64], winners: &[i64]) {
        let new = NewGame {
            played_at: DateTime::parse_from_rfc3339(&format!("{}T19:00:00-06:00", date)).unwrap(),
            title_id: TitleId::new(1),
            participant_ids: participants.iter().copied().map(PlayerId::new).collect(),
            winner_ids: winners.iter().copied().map(PlayerId::new).collect(),
            notes: String::new(),
        };
        store.add_game(new, true).unwrap();
    }

    fn league() -> LeagueStore {
        let store = LeagueStore::in_memory();
        for name in ["Ada", "Grace", "Linus"] {
            store.add_player(name).unwrap();
        }
        store.add_title("Catan").unwrap();
        store
    }

    /// Week 7 of 2026 with Ada and Grace tied on two wins.
    fn tied_week_league() -> LeagueStore {
        let store = league();
        play(&store, "2026-02-09", &[1, 2, 3], &[1]);
        play(&store, "2026-02-10", &[1, 2, 3], &[2]);
        play(&store, "2026-02-11", &[1, 2, 3], &[1]);
        play(&store, "2026-02-12", &[1, 2, 3], &[2]);
        store
    }

    #[test]
    fn test_scope_target_parse() {
        assert_eq!(
            ScopeTarget::parse(TiebreakScope::Weekly, "2026-W07").unwrap(),
            ScopeTarget::Week { year: 2026, week: 7 }
        );
        assert_eq!(
            ScopeTarget::parse(TiebreakScope::Yearly, " 2026 ").unwrap(),
            ScopeTarget::Year(2026)
        );
        assert!(matches!(
            ScopeTarget::parse(TiebreakScope::Weekly, "2026"),
            Err(LeagueError::InvalidScopeKey { .. })
        ));
        assert!(matches!(
            ScopeTarget::parse(TiebreakScope::Yearly, "2026-W07"),
            Err(LeagueError::InvalidScopeKey { .. })
        ));
        assert!(ScopeTarget::week(2026, 54).is_err());
        assert_eq!(ScopeTarget::Year(2026).key(), "2026");
        assert_eq!(ScopeTarget::week(2026, 7).unwrap().key(), "2026-W07");
    }

    #[test]
    fn test_current_week_uses_local_offset() {
        // Sunday 23:30 at UTC-6 is already Monday in UTC.
        let now = DateTime::parse_from_rfc3339("2026-02-15T23:30:00-06:00").unwrap();
        assert_eq!(current_week(now), (2026, 7));
        assert_eq!(current_week(now.with_timezone(&FixedOffset::east_opt(0).unwrap())), (2026, 8));
    }

    #[test]
    fn test_week_standings_with_names() {
        let store = tied_week_league();
        let report = week_standings(&store, 2026, 7).unwrap();

        assert_eq!(report.standings.top_ids, vec![pid(1), pid(2)]);
        assert!(report.standings.tie_unresolved);
        assert_eq!(report.players[&pid(1)], "Ada");
    }

    #[test]
    fn test_week_standings_rejects_missing_week() {
        let store = league();
        assert!(matches!(
            week_standings(&store, 2026, 0),
            Err(LeagueError::InvalidScopeKey { .. })
        ));
    }

    #[test]
    fn test_record_tiebreak_resolves_week() {
        let store = tied_week_league();
        let target = ScopeTarget::week(2026, 7).unwrap();

        let tb = record_tiebreak(&store, QualificationRule::TopHalf, target, pid(2), now()).unwrap();
        assert_eq!(tb.tied_player_ids, vec![pid(1), pid(2)]);
        assert_eq!(tb.scope_key, "2026-W07");

        let report = week_standings(&store, 2026, 7).unwrap();
        assert_eq!(report.standings.winner_id, Some(pid(2)));
        assert!(!report.standings.tie_unresolved);
    }

    #[test]
    fn test_record_tiebreak_refusals() {
        let store = tied_week_league();
        let rule = QualificationRule::TopHalf;

        let err = record_tiebreak(&store, rule, ScopeTarget::week(2026, 8).unwrap(), pid(1), now())
            .unwrap_err();
        assert!(matches!(err, LeagueError::NoGames(ref key) if key == "2026-W08"));

        let err = record_tiebreak(&store, rule, ScopeTarget::week(2026, 7).unwrap(), pid(3), now())
            .unwrap_err();
        assert!(matches!(err, LeagueError::NotALeader { winner, .. } if winner == pid(3)));

        play(&store, "2026-02-13", &[1, 2, 3], &[1]);
        let err = record_tiebreak(&store, rule, ScopeTarget::week(2026, 7).unwrap(), pid(1), now())
            .unwrap_err();
        assert!(matches!(err, LeagueError::NotTied(_)));

        assert!(store.list_tiebreakers().unwrap().is_empty());
    }

    #[test]
    fn test_record_tiebreak_overwrites_previous_choice() {
        let store = tied_week_league();
        let target = ScopeTarget::week(2026, 7).unwrap();
        let rule = QualificationRule::TopHalf;

        record_tiebreak(&store, rule, target, pid(1), now()).unwrap();
        record_tiebreak(&store, rule, target, pid(2), now()).unwrap();

        let stored = store.list_tiebreakers().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].winner_id, pid(2));
    }

    #[test]
    fn test_yearly_tiebreak() {
        let store = league();
        play(&store, "2026-03-02", &[1, 2], &[1]);
        play(&store, "2026-03-03", &[1, 2], &[2]);
        let rule = QualificationRule::TopHalf;

        let before = year_standings(&store, 2026, rule).unwrap();
        assert_eq!(before.standings.top_ids, vec![pid(1), pid(2)]);
        assert!(before.standings.tie_unresolved);

        record_tiebreak(&store, rule, ScopeTarget::Year(2026), pid(1), now()).unwrap();

        let after = year_standings(&store, 2026, rule).unwrap();
        assert_eq!(after.standings.winner_id, Some(pid(1)));

        let err = record_tiebreak(&store, rule, ScopeTarget::Year(2025), pid(1), now()).unwrap_err();
        assert!(matches!(err, LeagueError::NoGames(_)));
    }

    #[test]
    fn test_draw_tiebreak_picks_a_leader() {
        let store = tied_week_league();
        let target = ScopeTarget::week(2026, 7).unwrap();
        let mut rng = StdRng::seed_from_u64(7);

        let tb = draw_tiebreak(&store, QualificationRule::TopHalf, target, &mut rng, now()).unwrap();
        assert!(tb.winner_id == pid(1) || tb.winner_id == pid(2));

        let report = week_standings(&store, 2026, 7).unwrap();
        assert_eq!(report.standings.winner_id, Some(tb.winner_id));
    }

    #[test]
    fn test_draw_tiebreak_refuses_untied_scope() {
        let store = league();
        play(&store, "2026-02-09", &[1, 2], &[1]);
        let mut rng = StdRng::seed_from_u64(7);

        let err = draw_tiebreak(
            &store,
            QualificationRule::TopHalf,
            ScopeTarget::week(2026, 7).unwrap(),
            &mut rng,
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, LeagueError::NotTied(_)));
    }

    #[test]
    fn test_year_race_uses_active_roster() {
        let store = league();
        play(&store, "2026-01-13", &[1, 2, 3], &[3]);
        play(&store, "2026-01-20", &[1, 2, 3], &[1]);
        store.set_player_active(pid(3), false).unwrap();

        let race = year_race(&store, 2026, RaceMetric::Wins, 5).unwrap();
        let ids: Vec<PlayerId> = race.series.iter().map(|s| s.player_id).collect();
        assert_eq!(ids, vec![pid(1), pid(2)]);
        assert_eq!(race.weeks, vec![3, 4]);
    }

    #[test]
    fn test_storage_failure_surfaces() {
        let store = tied_week_league();
        store.poison();

        assert!(matches!(
            week_standings(&store, 2026, 7),
            Err(LeagueError::Storage(StorageError::Poisoned))
        ));
    }
}
