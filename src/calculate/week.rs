//! Weekly champion standings.

use std::collections::BTreeMap;

use super::{aggregate, filter_week, leaders_by, resolve_tie, week_scope_key};
use super::{StandingsError, TiebreakerLookup};
use crate::models::{Game, TiebreakScope, WeekStandings};

/// Count wins for one ISO week and settle the weekly champion.
///
/// `games` may be the full log or an already filtered list; games outside the
/// requested local ISO week are skipped either way.
pub fn compute_week_standings<L>(
    games: &[Game],
    year: i32,
    week: u32,
    tiebreakers: &L,
) -> Result<WeekStandings, StandingsError>
where
    L: TiebreakerLookup + ?Sized,
{
    let scope_key = week_scope_key(year, week);
    let in_scope = filter_week(games, year, week);

    let wins: BTreeMap<_, _> = aggregate(in_scope.iter().copied())
        .into_iter()
        .filter(|(_, tally)| tally.wins > 0)
        .map(|(pid, tally)| (pid, tally.wins))
        .collect();

    let top_ids = leaders_by(wins.iter().map(|(pid, w)| (*pid, *w)));
    let outcome = resolve_tie(&top_ids, TiebreakScope::Weekly, &scope_key, tiebreakers)?;

    Ok(WeekStandings {
        year,
        week,
        scope_key,
        total_games: in_scope.len() as u32,
        wins,
        top_ids,
        winner_id: outcome.winner(),
        tie_unresolved: outcome.is_unresolved(),
    })
}
