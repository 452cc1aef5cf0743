//! Standings and tiebreak engine.
//!
//! Turns recorded games into ranked standings:
//! - Weekly champion by wins
//! - Yearly champion by win rate among qualifying attendees
//! - Cumulative year race for charting
//!
//! Everything here is a pure function of its inputs. Stored tiebreak
//! decisions are read through [`TiebreakerLookup`]; the engine never writes them.

mod aggregate;
mod leaders;
mod race;
mod scope;
mod week;
mod year;

pub use aggregate::{aggregate, total_wins, PlayerTally};
pub use leaders::{leaders_by, resolve_tie, TieOutcome};
pub use race::compute_year_race;
pub use scope::{
    current_iso_week, filter_week, filter_year, in_week, in_year, parse_week_scope_key,
    week_scope_key, year_scope_key,
};
pub use week::compute_week_standings;
pub use year::{compute_year_standings, compute_year_standings_with};

use thiserror::Error;

use crate::models::{TiebreakScope, Tiebreaker};

/// Failure reported by a tiebreaker lookup. Distinct from "not found",
/// which is `Ok(None)`.
pub type LookupError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can fail a standings computation.
#[derive(Debug, Error)]
pub enum StandingsError {
    #[error("Tiebreaker lookup failed for {scope} {scope_key}: {source}")]
    TiebreakerLookup {
        scope: TiebreakScope,
        scope_key: String,
        #[source]
        source: LookupError,
    },
}

/// Read access to stored tiebreak decisions, keyed by scope and scope key.
pub trait TiebreakerLookup {
    fn lookup(
        &self,
        scope: TiebreakScope,
        scope_key: &str,
    ) -> Result<Option<Tiebreaker>, LookupError>;
}

impl<F> TiebreakerLookup for F
where
    F: Fn(TiebreakScope, &str) -> Result<Option<Tiebreaker>, LookupError>,
{
    fn lookup(
        &self,
        scope: TiebreakScope,
        scope_key: &str,
    ) -> Result<Option<Tiebreaker>, LookupError> {
        self(scope, scope_key)
    }
}

/// A lookup with no decisions recorded.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTiebreakers;

impl TiebreakerLookup for NoTiebreakers {
    fn lookup(&self, _: TiebreakScope, _: &str) -> Result<Option<Tiebreaker>, LookupError> {
        Ok(None)
    }
}
