//! Core data models for game-night tracking.

mod game;
mod ids;
mod race;
mod roster;
mod standings;
mod tiebreaker;

pub use game::*;
pub use ids::*;
pub use race::*;
pub use roster::*;
pub use standings::*;
pub use tiebreaker::*;
