//! Scope keys and scope membership.
//!
//! Scope keys are a storage contract with the tiebreaker store:
//! weeks are `YYYY-Www` (zero padded), years are the decimal year.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::models::Game;

static WEEK_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{4})-W(\d{2})$").expect("valid week key regex"));

/// Canonical key for an ISO week, e.g. `2026-W07`.
pub fn week_scope_key(year: i32, week: u32) -> String {
    format!("{:04}-W{:02}", year, week)
}

/// Canonical key for a year, e.g. `2026`.
pub fn year_scope_key(year: i32) -> String {
    year.to_string()
}

/// Parse a week key back into (ISO year, ISO week).
pub fn parse_week_scope_key(key: &str) -> Option<(i32, u32)> {
    let caps = WEEK_KEY.captures(key.trim())?;
    let year: i32 = caps[1].parse().ok()?;
    let week: u32 = caps[2].parse().ok()?;

    // Week 53 only exists in some years.
    NaiveDate::from_isoywd_opt(year, week, chrono::Weekday::Mon)?;
    Some((year, week))
}

/// ISO (year, week) containing a local date.
pub fn current_iso_week(today: NaiveDate) -> (i32, u32) {
    let iso = today.iso_week();
    (iso.year(), iso.week())
}

/// Whether a game falls in the given local ISO year and week.
pub fn in_week(game: &Game, year: i32, week: u32) -> bool {
    game.iso_week() == (year, week)
}

/// Whether a game falls in the given local calendar year.
pub fn in_year(game: &Game, year: i32) -> bool {
    game.year() == year
}

/// Games belonging to an ISO week.
pub fn filter_week(games: &[Game], year: i32, week: u32) -> Vec<&Game> {
    games.iter().filter(|g| in_week(g, year, week)).collect()
}

/// Games belonging to a calendar year.
pub fn filter_year(games: &[Game], year: i32) -> Vec<&Game> {
    games.iter().filter(|g| in_year(g, year)).collect()
}
