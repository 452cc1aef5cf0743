//! Persisted tiebreak decisions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::PlayerId;

/// Which championship a tiebreak decision belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TiebreakScope {
    Weekly,
    Yearly,
}

impl TiebreakScope {
    /// Storage tag shared with the tiebreaker store.
    pub fn as_str(&self) -> &'static str {
        match self {
            TiebreakScope::Weekly => "weekly",
            TiebreakScope::Yearly => "yearly",
        }
    }
}

impl fmt::Display for TiebreakScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TiebreakScope {
    type Err = TiebreakError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" => Ok(TiebreakScope::Weekly),
            "yearly" | "year" => Ok(TiebreakScope::Yearly),
            other => Err(TiebreakError::UnknownScope(other.to_string())),
        }
    }
}

/// How a tie was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMethod {
    #[default]
    Chance,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TiebreakError {
    #[error("Unknown tiebreak scope: {0}")]
    UnknownScope(String),

    #[error("Winner {winner} is not among the tied players")]
    WinnerNotTied { winner: PlayerId },
}

/// A human-entered decision that collapses a tie into one winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tiebreaker {
    pub scope: TiebreakScope,

    /// "2026-W07" for weekly, "2026" for yearly
    pub scope_key: String,

    /// Tied leaders at the time of the decision, ascending
    pub tied_player_ids: Vec<PlayerId>,

    pub winner_id: PlayerId,

    #[serde(default)]
    pub method: ResolutionMethod,

    pub decided_at: DateTime<Utc>,
}

impl Tiebreaker {
    /// Build a decision, enforcing that the winner is one of the tied players.
    pub fn new(
        scope: TiebreakScope,
        scope_key: impl Into<String>,
        tied_player_ids: &[PlayerId],
        winner_id: PlayerId,
        decided_at: DateTime<Utc>,
    ) -> Result<Self, TiebreakError> {
        let mut tied = tied_player_ids.to_vec();
        tied.sort();
        tied.dedup();

        if tied.binary_search(&winner_id).is_err() {
            return Err(TiebreakError::WinnerNotTied { winner: winner_id });
        }

        Ok(Self {
            scope,
            scope_key: scope_key.into(),
            tied_player_ids: tied,
            winner_id,
            method: ResolutionMethod::Chance,
            decided_at,
        })
    }
}
