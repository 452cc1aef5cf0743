//! # Master of Games
//!
//! Tracks board-game nights for a small group and crowns weekly and
//! yearly champions.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (games, players, titles, tiebreakers, standings)
//! - **calculate**: Standings engine (weekly and yearly champions, the year race)
//! - **storage**: JSONL-backed league store
//! - **league**: Operations tying the store to the engine, including tiebreaks
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod league;
pub mod models;
pub mod storage;

pub use models::*;
