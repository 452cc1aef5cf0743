//! Derived standings models. Rebuilt on every request, never persisted.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use super::PlayerId;

/// Weekly champion standings for one ISO week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekStandings {
    pub year: i32,
    pub week: u32,

    /// "2026-W07"
    pub scope_key: String,

    pub total_games: u32,

    /// Wins per player; players without a win are absent
    pub wins: BTreeMap<PlayerId, u32>,

    /// Tied leaders by wins, ascending id (one entry when there is a clear leader)
    pub top_ids: Vec<PlayerId>,

    pub winner_id: Option<PlayerId>,

    pub tie_unresolved: bool,
}

/// An exact wins/games ratio. Compared by cross-multiplication so that equal
/// ratios with different denominators (2/4 and 3/6) are equal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct WinRate {
    pub wins: u32,
    pub games: u32,
}

impl WinRate {
    pub fn new(wins: u32, games: u32) -> Self {
        Self { wins, games }
    }

    /// Percentage rounded to one decimal place; 0 when no games were played.
    pub fn percent(&self) -> f64 {
        if self.games == 0 {
            return 0.0;
        }
        let ratio = self.wins as f64 / self.games as f64;
        (ratio * 1000.0).round() / 10.0
    }
}

impl PartialEq for WinRate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for WinRate {}

impl PartialOrd for WinRate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WinRate {
    fn cmp(&self, other: &Self) -> Ordering {
        // A rate with no games counts as 0.
        match (self.games, other.games) {
            (0, 0) => Ordering::Equal,
            (0, _) => 0u64.cmp(&(other.wins as u64)),
            (_, 0) => (self.wins as u64).cmp(&0),
            _ => {
                let lhs = self.wins as u64 * other.games as u64;
                let rhs = other.wins as u64 * self.games as u64;
                lhs.cmp(&rhs)
            }
        }
    }
}

/// One player's line in the yearly table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerYearStats {
    pub player_id: PlayerId,

    /// Distinct local dates with at least one game played
    pub attendance: u32,

    pub games_played: u32,

    pub wins: u32,

    /// Percentage with one decimal (66.7)
    pub win_rate: f64,

    pub qualified: bool,
}

impl PlayerYearStats {
    pub fn exact_win_rate(&self) -> WinRate {
        WinRate::new(self.wins, self.games_played)
    }
}

/// How players qualify for the yearly championship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum QualificationRule {
    /// Attendance at or above the attendance of the player ranked ceil(N/2).
    #[default]
    TopHalf,

    /// Attendance of at least `days` distinct days.
    MinAttendance { days: u32 },
}

/// Yearly champion standings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearStandings {
    pub year: i32,

    /// "2026"
    pub scope_key: String,

    /// Attendance desc, win rate desc, id asc
    pub stats: Vec<PlayerYearStats>,

    /// Qualifying players in table order
    pub qualifiers: Vec<PlayerId>,

    /// Attendance needed to qualify; None when nobody played
    pub attendance_cutoff: Option<u32>,

    /// Tied leaders by exact win rate among qualifiers, ascending id
    pub top_ids: Vec<PlayerId>,

    pub winner_id: Option<PlayerId>,

    pub tie_unresolved: bool,
}

impl YearStandings {
    pub fn stats_for(&self, player: PlayerId) -> Option<&PlayerYearStats> {
        self.stats.iter().find(|s| s.player_id == player)
    }
}
