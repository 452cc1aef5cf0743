//! Players and game titles.

use serde::{Deserialize, Serialize};

use super::{PlayerId, TitleId, ValidationError};

/// A member of the game-night group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Player {
    pub fn new(id: PlayerId, name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: clean_name(name, "Player name")?,
            is_active: true,
        })
    }
}

/// A game title that can be played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub id: TitleId,
    pub name: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl Title {
    pub fn new(id: TitleId, name: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            id,
            name: clean_name(name, "Title name")?,
            is_active: true,
        })
    }
}

fn default_active() -> bool {
    true
}

/// Trim a display name and reject blanks.
pub fn clean_name(name: &str, what: &'static str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName(what));
    }
    Ok(trimmed.to_string())
}
