//! Cumulative year race for charting.

use std::collections::{BTreeMap, HashMap, HashSet};

use super::filter_year;
use crate::models::{Game, Player, PlayerId, RaceMetric, RaceSeries, YearRace};

/// Series shown when the caller does not ask for a positive count.
pub const DEFAULT_TOP_N: usize = 5;

/// Build per-week cumulative series for the roster and keep the `top_n`
/// players by final value.
///
/// Only weeks that contain games appear; a player's value carries over
/// unchanged through weeks they did not score in.
pub fn compute_year_race(
    games: &[Game],
    year: i32,
    metric: RaceMetric,
    top_n: i32,
    roster: &[Player],
) -> YearRace {
    // Keyed by ISO week number alone. Early-January games that belong to the
    // previous ISO year land on week 52 or 53, and late-December games in the
    // next ISO year land on week 1, so both sort out of calendar order.
    let mut by_week: BTreeMap<u32, Vec<&Game>> = BTreeMap::new();
    for game in filter_year(games, year) {
        let (_, week) = game.iso_week();
        by_week.entry(week).or_default().push(game);
    }

    if by_week.is_empty() {
        return YearRace::empty(year, metric);
    }

    let weeks: Vec<u32> = by_week.keys().copied().collect();

    let mut seen = HashSet::new();
    let players: Vec<&Player> = roster.iter().filter(|p| seen.insert(p.id)).collect();

    let mut running: HashMap<PlayerId, f64> = players.iter().map(|p| (p.id, 0.0)).collect();
    let mut series: Vec<RaceSeries> = players
        .iter()
        .map(|p| RaceSeries {
            player_id: p.id,
            name: p.name.clone(),
            values: Vec::with_capacity(weeks.len()),
        })
        .collect();

    for week_games in by_week.values() {
        for game in week_games {
            for (pid, delta) in metric_deltas(metric, game) {
                if let Some(total) = running.get_mut(&pid) {
                    *total += delta;
                }
            }
        }
        for s in series.iter_mut() {
            s.values.push(running[&s.player_id]);
        }
    }

    series.sort_by(|a, b| {
        b.final_value()
            .total_cmp(&a.final_value())
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    let keep = if top_n <= 0 {
        DEFAULT_TOP_N
    } else {
        top_n as usize
    };
    series.truncate(keep);

    YearRace {
        year,
        metric,
        weeks,
        series,
    }
}

/// Per-player increments a single game contributes to a metric.
fn metric_deltas(metric: RaceMetric, game: &Game) -> Vec<(PlayerId, f64)> {
    match metric {
        RaceMetric::Wins => game.winner_ids.iter().map(|pid| (*pid, 1.0)).collect(),
    }
}
