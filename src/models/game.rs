//! Recorded game model.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::{GameId, PlayerId, TitleId};

/// A single game played on a game night.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,

    /// Wall-clock time at the venue, with its UTC offset
    pub played_at: DateTime<FixedOffset>,

    pub title_id: TitleId,

    /// Title name at the time the game was recorded
    #[serde(default)]
    pub title: String,

    /// Everyone who sat at the table
    pub participant_ids: Vec<PlayerId>,

    /// Subset of participants credited with a win (co-winners allowed)
    pub winner_ids: Vec<PlayerId>,

    #[serde(default)]
    pub notes: String,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Game {
    /// Local calendar date the game was played on.
    pub fn local_date(&self) -> NaiveDate {
        self.played_at.date_naive()
    }

    /// Local ISO (year, week) the game was played in.
    pub fn iso_week(&self) -> (i32, u32) {
        let week = self.played_at.iso_week();
        (week.year(), week.week())
    }

    /// Local calendar year the game was played in.
    pub fn year(&self) -> i32 {
        self.played_at.year()
    }

    pub fn has_participant(&self, player: PlayerId) -> bool {
        self.participant_ids.contains(&player)
    }

    pub fn has_winner(&self, player: PlayerId) -> bool {
        self.winner_ids.contains(&player)
    }
}

/// Reasons a game submission is rejected before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select at least one participant")]
    NoParticipants,

    #[error("Please select at least one winner")]
    NoWinners,

    #[error("Winners must also be selected as participants (player {0})")]
    WinnerNotParticipant(PlayerId),

    #[error("Player {0} is listed more than once")]
    DuplicatePlayer(PlayerId),

    #[error("Only weekday games are allowed (Mon-Fri), got {0}")]
    WeekendGame(Weekday),

    #[error("{0} must not be empty")]
    EmptyName(&'static str),
}

/// Payload for recording a new game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewGame {
    pub played_at: DateTime<FixedOffset>,
    pub title_id: TitleId,
    pub participant_ids: Vec<PlayerId>,
    pub winner_ids: Vec<PlayerId>,
    #[serde(default)]
    pub notes: String,
}

impl NewGame {
    /// Check the creation rules. Weekday restriction is a creation-time rule
    /// only; standings never filter by weekday.
    pub fn validate(&self, weekdays_only: bool) -> Result<(), ValidationError> {
        if weekdays_only && !is_weekday(self.played_at.date_naive()) {
            return Err(ValidationError::WeekendGame(self.played_at.weekday()));
        }

        if self.participant_ids.is_empty() {
            return Err(ValidationError::NoParticipants);
        }
        if self.winner_ids.is_empty() {
            return Err(ValidationError::NoWinners);
        }

        check_unique(&self.participant_ids)?;
        check_unique(&self.winner_ids)?;

        if let Some(outsider) = self
            .winner_ids
            .iter()
            .find(|w| !self.participant_ids.contains(w))
        {
            return Err(ValidationError::WinnerNotParticipant(*outsider));
        }

        Ok(())
    }

    /// Turn a validated submission into a stored game.
    pub fn into_game(self, id: GameId, title: String) -> Game {
        Game {
            id,
            played_at: self.played_at,
            title_id: self.title_id,
            title,
            participant_ids: self.participant_ids,
            winner_ids: self.winner_ids,
            notes: self.notes.trim().to_string(),
            is_active: true,
        }
    }
}

/// Monday through Friday.
pub fn is_weekday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

fn check_unique(ids: &[PlayerId]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(ids.len());
    for id in ids {
        if !seen.insert(*id) {
            return Err(ValidationError::DuplicatePlayer(*id));
        }
    }
    Ok(())
}
