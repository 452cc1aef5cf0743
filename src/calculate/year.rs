//! Yearly champion standings.
//!
//! Players are ranked by attendance (distinct game days). The better-attending
//! half qualifies, and the qualifier with the best win rate takes the year.

use super::{aggregate, filter_year, leaders_by, resolve_tie, year_scope_key};
use super::{StandingsError, TiebreakerLookup};
use crate::models::{Game, PlayerYearStats, QualificationRule, TiebreakScope, YearStandings};

/// Yearly standings with the default top-half qualification rule.
pub fn compute_year_standings<L>(
    games: &[Game],
    year: i32,
    tiebreakers: &L,
) -> Result<YearStandings, StandingsError>
where
    L: TiebreakerLookup + ?Sized,
{
    compute_year_standings_with(games, year, QualificationRule::TopHalf, tiebreakers)
}

/// Yearly standings under an explicit qualification rule.
pub fn compute_year_standings_with<L>(
    games: &[Game],
    year: i32,
    rule: QualificationRule,
    tiebreakers: &L,
) -> Result<YearStandings, StandingsError>
where
    L: TiebreakerLookup + ?Sized,
{
    let scope_key = year_scope_key(year);
    let tallies = aggregate(filter_year(games, year));

    let mut stats: Vec<PlayerYearStats> = tallies
        .iter()
        .map(|(pid, tally)| PlayerYearStats {
            player_id: *pid,
            attendance: tally.attendance(),
            games_played: tally.games_played,
            wins: tally.wins,
            win_rate: tally.win_rate().percent(),
            qualified: false,
        })
        .collect();

    stats.sort_by(|a, b| {
        b.attendance
            .cmp(&a.attendance)
            .then_with(|| b.exact_win_rate().cmp(&a.exact_win_rate()))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });

    let attendance_cutoff = attendance_cutoff(&stats, rule);
    if let Some(cutoff) = attendance_cutoff {
        for s in stats.iter_mut() {
            s.qualified = s.attendance >= cutoff;
        }
    }

    let qualifiers: Vec<_> = stats
        .iter()
        .filter(|s| s.qualified)
        .map(|s| s.player_id)
        .collect();

    // A qualifier without games has no rate to compare.
    let top_ids = leaders_by(
        stats
            .iter()
            .filter(|s| s.qualified && s.games_played > 0)
            .map(|s| (s.player_id, s.exact_win_rate())),
    );

    let outcome = resolve_tie(&top_ids, TiebreakScope::Yearly, &scope_key, tiebreakers)?;

    Ok(YearStandings {
        year,
        scope_key,
        stats,
        qualifiers,
        attendance_cutoff,
        top_ids,
        winner_id: outcome.winner(),
        tie_unresolved: outcome.is_unresolved(),
    })
}

/// Minimum attendance to qualify. `stats` must be sorted by attendance, descending.
fn attendance_cutoff(stats: &[PlayerYearStats], rule: QualificationRule) -> Option<u32> {
    if stats.is_empty() {
        return None;
    }

    match rule {
        QualificationRule::TopHalf => {
            let rank = stats.len().div_ceil(2);
            Some(stats[rank - 1].attendance)
        }
        QualificationRule::MinAttendance { days } => Some(days),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::testing::*;
    use crate::calculate::NoTiebreakers;
    use chrono::{Days, NaiveDate};
    use pretty_assertions::assert_eq;

    /// One game per day; each player attends their first `n` days. The first
    /// attendee of the day wins unless `winner_of_day` says otherwise.
    fn attendance_log(
        attendance: &[(i64, u32)],
        winner_of_day: impl Fn(u32, &[i64]) -> i64,
    ) -> Vec<Game> {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let days = attendance.iter().map(|(_, n)| *n).max().unwrap_or(0);

        (0..days)
            .map(|day| {
                let present: Vec<i64> = attendance
                    .iter()
                    .filter(|(_, n)| *n > day)
                    .map(|(pid, _)| *pid)
                    .collect();
                let winner = winner_of_day(day, &present);
                let date = start.checked_add_days(Days::new(day as u64)).unwrap();
                game_on(day as i64 + 1, &date.to_string(), &present, &[winner])
            })
            .collect()
    }

    fn first_present(_: u32, present: &[i64]) -> i64 {
        present[0]
    }

    fn qualifier_ids(ys: &YearStandings) -> Vec<i64> {
        ys.qualifiers.iter().map(|p| p.get()).collect()
    }

    #[test]
    fn test_top_half_cutoff_excludes_adjacent_lower_attendance() {
        let games = attendance_log(&[(1, 12), (2, 10), (3, 8), (4, 8)], first_present);
        let ys = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();

        let attendance: Vec<u32> = ys.stats.iter().map(|s| s.attendance).collect();
        assert_eq!(attendance, vec![12, 10, 8, 8]);
        assert_eq!(ys.attendance_cutoff, Some(10));
        assert_eq!(qualifier_ids(&ys), vec![1, 2]);
        assert!(!ys.stats_for(pid(3)).unwrap().qualified);
        assert!(!ys.stats_for(pid(4)).unwrap().qualified);
    }

    #[test]
    fn test_top_half_includes_everyone_tied_at_cutoff() {
        let games = attendance_log(
            &[(1, 4), (2, 3), (3, 3), (4, 3), (5, 1)],
            first_present,
        );
        let ys = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();

        assert_eq!(ys.attendance_cutoff, Some(3));
        assert_eq!(qualifier_ids(&ys), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_odd_player_count_takes_larger_half() {
        let games = attendance_log(&[(1, 5), (2, 4), (3, 3), (4, 2), (5, 1)], first_present);
        let ys = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();

        assert_eq!(ys.attendance_cutoff, Some(3));
        assert_eq!(qualifier_ids(&ys), vec![1, 2, 3]);
    }

    #[test]
    fn test_qualification_is_monotone_in_attendance() {
        let games = attendance_log(
            &[(1, 9), (2, 7), (3, 7), (4, 6), (5, 2), (6, 2)],
            first_present,
        );
        let ys = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();
        let cutoff = ys.attendance_cutoff.unwrap();

        for s in &ys.stats {
            assert_eq!(s.qualified, s.attendance >= cutoff, "player {}", s.player_id);
            assert_eq!(ys.qualifiers.contains(&s.player_id), s.attendance >= cutoff);
        }
    }

    #[test]
    fn test_fixed_attendance_rule() {
        let games = attendance_log(&[(1, 12), (2, 10), (3, 8), (4, 8)], first_present);

        let ys = compute_year_standings_with(
            &games,
            2026,
            QualificationRule::MinAttendance { days: 8 },
            &NoTiebreakers,
        )
        .unwrap();
        assert_eq!(qualifier_ids(&ys), vec![1, 2, 3, 4]);

        let ys = compute_year_standings_with(
            &games,
            2026,
            QualificationRule::MinAttendance { days: 11 },
            &NoTiebreakers,
        )
        .unwrap();
        assert_eq!(qualifier_ids(&ys), vec![1]);
    }

    #[test]
    fn test_attendance_counts_distinct_days() {
        let games = vec![
            game_on(1, "2026-03-02", &[1, 2], &[1]),
            game_on(2, "2026-03-02", &[1, 2], &[2]),
            game_on(3, "2026-03-02", &[1, 2], &[1]),
            game_on(4, "2026-03-03", &[1], &[1]),
        ];
        let ys = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();

        let p1 = ys.stats_for(pid(1)).unwrap();
        assert_eq!(p1.attendance, 2);
        assert_eq!(p1.games_played, 4);
        assert_eq!(p1.wins, 3);
        assert_eq!(p1.win_rate, 75.0);

        let p2 = ys.stats_for(pid(2)).unwrap();
        assert_eq!(p2.attendance, 1);
        assert_eq!(p2.games_played, 3);
        assert_eq!(p2.win_rate, 33.3);
    }

    #[test]
    fn test_best_win_rate_among_qualifiers_wins() {
        // Player 3 wins everything but attends too rarely to qualify.
        let games = vec![
            game_on(1, "2026-03-02", &[1, 2], &[1]),
            game_on(2, "2026-03-03", &[1, 2], &[2]),
            game_on(3, "2026-03-04", &[1, 2], &[1]),
            game_on(4, "2026-03-05", &[1, 2, 3], &[3]),
            game_on(5, "2026-03-05", &[1, 2, 3], &[3]),
        ];
        let ys = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();

        assert_eq!(qualifier_ids(&ys), vec![1, 2]);
        assert_eq!(ys.top_ids, vec![pid(1)]);
        assert_eq!(ys.winner_id, Some(pid(1)));
        assert!(!ys.tie_unresolved);
    }

    #[test]
    fn test_exact_rate_tie_across_denominators() {
        let games = vec![
            game_on(1, "2026-03-02", &[1, 2, 3], &[3]),
            game_on(2, "2026-03-03", &[1, 2], &[1]),
            game_on(3, "2026-03-04", &[1, 2], &[2]),
            game_on(4, "2026-03-05", &[2, 4], &[4]),
            game_on(5, "2026-03-05", &[2, 4], &[2]),
            game_on(6, "2026-03-06", &[2, 4], &[4]),
        ];
        let ys = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();

        // Player 1 wins 1 of 3, player 2 wins 2 of 6.
        let p1 = ys.stats_for(pid(1)).unwrap();
        let p2 = ys.stats_for(pid(2)).unwrap();
        assert_eq!((p1.wins, p1.games_played), (1, 3));
        assert_eq!((p2.wins, p2.games_played), (2, 6));

        assert_eq!(ys.attendance_cutoff, Some(3));
        assert_eq!(qualifier_ids(&ys), vec![2, 1]);
        assert_eq!(ys.top_ids, vec![pid(1), pid(2)]);
        assert_eq!(ys.winner_id, None);
        assert!(ys.tie_unresolved);
    }

    #[test]
    fn test_yearly_tie_with_stored_decision() {
        let games = vec![
            game_on(1, "2026-03-02", &[1, 2], &[1]),
            game_on(2, "2026-03-03", &[1, 2], &[2]),
        ];
        let lookup = stored(vec![tiebreaker(TiebreakScope::Yearly, "2026", &[1, 2], 1)]);
        let ys = compute_year_standings(&games, 2026, &lookup).unwrap();

        assert_eq!(ys.scope_key, "2026");
        assert_eq!(ys.top_ids, vec![pid(1), pid(2)]);
        assert_eq!(ys.winner_id, Some(pid(1)));
        assert!(!ys.tie_unresolved);
    }

    #[test]
    fn test_yearly_weekly_decision_not_used() {
        let games = vec![
            game_on(1, "2026-03-02", &[1, 2], &[1]),
            game_on(2, "2026-03-03", &[1, 2], &[2]),
        ];
        let lookup = stored(vec![tiebreaker(TiebreakScope::Weekly, "2026", &[1, 2], 1)]);
        let ys = compute_year_standings(&games, 2026, &lookup).unwrap();
        assert!(ys.tie_unresolved);
    }

    #[test]
    fn test_yearly_stale_decision_ignored() {
        let games = vec![
            game_on(1, "2026-03-02", &[1, 2], &[1]),
            game_on(2, "2026-03-03", &[1, 2], &[1]),
        ];
        let lookup = stored(vec![tiebreaker(TiebreakScope::Yearly, "2026", &[1, 2], 2)]);
        let ys = compute_year_standings(&games, 2026, &lookup).unwrap();

        assert_eq!(ys.winner_id, Some(pid(1)));
        assert!(!ys.tie_unresolved);
    }

    #[test]
    fn test_yearly_lookup_failure_propagates() {
        let games = vec![
            game_on(1, "2026-03-02", &[1, 2], &[1]),
            game_on(2, "2026-03-03", &[1, 2], &[2]),
        ];
        let result = compute_year_standings(&games, 2026, &failing());
        assert!(matches!(
            result,
            Err(StandingsError::TiebreakerLookup { .. })
        ));
    }

    #[test]
    fn test_display_order() {
        // Same attendance: better win rate first, then lower id.
        let games = vec![
            game_on(1, "2026-03-02", &[1, 2, 3], &[3]),
            game_on(2, "2026-03-03", &[1, 2, 3], &[3]),
            game_on(3, "2026-03-04", &[1, 2, 3], &[2]),
        ];
        let ys = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();

        let order: Vec<i64> = ys.stats.iter().map(|s| s.player_id.get()).collect();
        assert_eq!(order, vec![3, 2, 1]);
    }

    #[test]
    fn test_other_years_ignored() {
        let games = vec![
            game_on(1, "2025-12-30", &[1, 2], &[2]),
            game_on(2, "2026-01-02", &[1, 2], &[1]),
        ];
        let ys = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();

        assert_eq!(ys.stats_for(pid(1)).unwrap().games_played, 1);
        assert_eq!(ys.winner_id, Some(pid(1)));
    }

    #[test]
    fn test_empty_year() {
        let ys = compute_year_standings(&[], 2026, &failing()).unwrap();

        assert!(ys.stats.is_empty());
        assert!(ys.qualifiers.is_empty());
        assert_eq!(ys.attendance_cutoff, None);
        assert!(ys.top_ids.is_empty());
        assert_eq!(ys.winner_id, None);
        assert!(!ys.tie_unresolved);
    }

    #[test]
    fn test_no_qualifier_with_games_means_no_winner() {
        // A malformed record: a winner nobody saw play.
        let games = vec![game_on(1, "2026-03-02", &[], &[5])];
        let ys = compute_year_standings(&games, 2026, &failing()).unwrap();

        assert_eq!(qualifier_ids(&ys), vec![5]);
        assert!(ys.top_ids.is_empty());
        assert_eq!(ys.winner_id, None);
        assert!(!ys.tie_unresolved);
    }

    #[test]
    fn test_idempotent() {
        let games = attendance_log(&[(1, 6), (2, 5), (3, 5), (4, 2)], |day, present| {
            present[day as usize % present.len()]
        });
        let first = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();
        let second = compute_year_standings(&games, 2026, &NoTiebreakers).unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
