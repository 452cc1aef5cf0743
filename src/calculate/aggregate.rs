//! Per-player counters over a list of games.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::models::{Game, PlayerId, WinRate};

/// Counters for one player across a set of games.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerTally {
    /// Games the player sat at (not deduplicated by day)
    pub games_played: u32,

    /// Games the player is credited with winning
    pub wins: u32,

    /// Distinct local dates the player took part in a game
    pub days: BTreeSet<NaiveDate>,
}

impl PlayerTally {
    pub fn attendance(&self) -> u32 {
        self.days.len() as u32
    }

    pub fn win_rate(&self) -> WinRate {
        WinRate::new(self.wins, self.games_played)
    }
}

/// Walk the games once and tally every player that appears as a participant
/// or winner.
///
/// Winners are credited even if the game does not list them as participants;
/// keeping participant and winner sets consistent is the job of whoever
/// recorded the game.
pub fn aggregate<'a, I>(games: I) -> BTreeMap<PlayerId, PlayerTally>
where
    I: IntoIterator<Item = &'a Game>,
{
    let mut tallies: BTreeMap<PlayerId, PlayerTally> = BTreeMap::new();

    for game in games {
        let date = game.local_date();
        for pid in &game.participant_ids {
            let tally = tallies.entry(*pid).or_default();
            tally.games_played += 1;
            tally.days.insert(date);
        }
        for wid in &game.winner_ids {
            tallies.entry(*wid).or_default().wins += 1;
        }
    }

    tallies
}

/// Total win credits handed out by a set of games.
pub fn total_wins<'a, I>(games: I) -> u32
where
    I: IntoIterator<Item = &'a Game>,
{
    games.into_iter().map(|g| g.winner_ids.len() as u32).sum()
}
