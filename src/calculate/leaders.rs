//! Leader detection and tie resolution.

use std::cmp::Ordering;

use tracing::debug;

use super::{StandingsError, TiebreakerLookup};
use crate::models::{PlayerId, TiebreakScope};

/// Players sharing the maximum score, ascending by id.
///
/// Callers drop players that must never lead (no wins, no games) before
/// calling; an empty input yields no leaders.
pub fn leaders_by<K, I>(scores: I) -> Vec<PlayerId>
where
    K: Ord,
    I: IntoIterator<Item = (PlayerId, K)>,
{
    let mut best: Option<K> = None;
    let mut leaders = Vec::new();

    for (pid, score) in scores {
        match best.as_ref().map(|current| score.cmp(current)) {
            Some(Ordering::Less) => {}
            Some(Ordering::Equal) => leaders.push(pid),
            Some(Ordering::Greater) | None => {
                best = Some(score);
                leaders.clear();
                leaders.push(pid);
            }
        }
    }

    leaders.sort();
    leaders.dedup();
    leaders
}

/// Where a scope stands after consulting the stored decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieOutcome {
    /// Nobody qualifies as a leader.
    NoLeader,

    /// Exactly one leader.
    Clear(PlayerId),

    /// A tie settled by a stored decision naming a current leader.
    Decided(PlayerId),

    /// A tie with no stored decision.
    Undecided,

    /// A tie whose stored decision names a player who no longer leads.
    Stale { stored_winner: PlayerId },
}

impl TieOutcome {
    pub fn winner(&self) -> Option<PlayerId> {
        match self {
            TieOutcome::Clear(pid) | TieOutcome::Decided(pid) => Some(*pid),
            _ => None,
        }
    }

    pub fn is_unresolved(&self) -> bool {
        matches!(self, TieOutcome::Undecided | TieOutcome::Stale { .. })
    }
}

/// Collapse the leaders of a scope into a single winner when possible.
///
/// The store is only consulted for a multi-way tie. A lookup failure fails
/// the computation instead of being reported as an undecided tie.
pub fn resolve_tie<L>(
    top_ids: &[PlayerId],
    scope: TiebreakScope,
    scope_key: &str,
    lookup: &L,
) -> Result<TieOutcome, StandingsError>
where
    L: TiebreakerLookup + ?Sized,
{
    match top_ids {
        [] => return Ok(TieOutcome::NoLeader),
        [only] => return Ok(TieOutcome::Clear(*only)),
        _ => {}
    }

    let stored = lookup
        .lookup(scope, scope_key)
        .map_err(|source| StandingsError::TiebreakerLookup {
            scope,
            scope_key: scope_key.to_string(),
            source,
        })?;

    let outcome = match stored {
        Some(tb) if top_ids.contains(&tb.winner_id) => TieOutcome::Decided(tb.winner_id),
        Some(tb) => {
            debug!(
                "Ignoring stale {} tiebreaker for {}: winner {} not among {:?}",
                scope, scope_key, tb.winner_id, top_ids
            );
            TieOutcome::Stale {
                stored_winner: tb.winner_id,
            }
        }
        None => {
            debug!("Unresolved {} tie for {}: {:?}", scope, scope_key, top_ids);
            TieOutcome::Undecided
        }
    };

    Ok(outcome)
}
