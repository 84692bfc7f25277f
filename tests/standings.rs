//! Integration tests for standings: result application and ranking.

use fixture_engine::{
    rank_category, CompetitionConfig, EngineError, Format, Match, MatchState, Phase, Score,
    StandingsRow, StandingsTable, TieBreak,
};
use proptest::prelude::*;
use uuid::Uuid;

fn config() -> CompetitionConfig {
    CompetitionConfig::new(
        Uuid::nil(),
        Format::RoundRobin {
            double_round_robin: false,
        },
    )
}

fn finalized(slot: usize, a: &str, b: &str, score_a: u32, score_b: u32) -> Match {
    let mut m = Match::scheduled(
        Uuid::nil(),
        "open",
        Phase::League,
        1,
        None,
        slot,
        a.to_string(),
        b.to_string(),
    );
    m.state = MatchState::Finalized;
    m.score = Some(Score {
        a: score_a,
        b: score_b,
    });
    m
}

fn row(team: &str, points: i32, goal_difference: i32, goals_for: u32) -> StandingsRow {
    StandingsRow {
        points,
        goal_difference,
        goals_for,
        goals_against: (goals_for as i32 - goal_difference).max(0) as u32,
        ..StandingsRow::new(team, "open")
    }
}

fn order(rows: &[StandingsRow]) -> Vec<&str> {
    rows.iter().map(|r| r.team_id.as_str()).collect()
}

#[test]
fn two_one_win_updates_both_rows() {
    let mut table = StandingsTable::new();
    let rows = table
        .apply_result(&finalized(0, "home", "away", 2, 1), &config())
        .unwrap();
    assert_eq!(rows.len(), 2);

    let home = &rows[0];
    assert_eq!(home.team_id, "home");
    assert_eq!(home.position, 1);
    assert_eq!((home.played, home.wins, home.draws, home.losses), (1, 1, 0, 0));
    assert_eq!((home.goals_for, home.goals_against), (2, 1));
    assert_eq!(home.goal_difference, 1);
    assert_eq!(home.points, 3);

    let away = &rows[1];
    assert_eq!((away.played, away.wins, away.draws, away.losses), (1, 0, 0, 1));
    assert_eq!((away.goals_for, away.goals_against), (1, 2));
    assert_eq!(away.goal_difference, -1);
    assert_eq!(away.points, 0);
}

#[test]
fn draw_uses_configured_points() {
    let config = config().with_points(2, 1, 0);
    let mut table = StandingsTable::new();
    let rows = table
        .apply_result(&finalized(0, "a", "b", 1, 1), &config)
        .unwrap();
    assert!(rows.iter().all(|r| r.draws == 1 && r.points == 1));
}

#[test]
fn applying_twice_is_a_no_op() {
    let mut table = StandingsTable::new();
    let m = finalized(0, "a", "b", 3, 0);
    let first = table.apply_result(&m, &config()).unwrap();
    let second = table.apply_result(&m, &config()).unwrap();
    assert_eq!(first, second);
    assert_eq!(second[0].played, 1);
    assert!(table.is_counted(m.id));
}

#[test]
fn changed_score_is_rejected_without_mutation() {
    let mut table = StandingsTable::new();
    let m = finalized(0, "a", "b", 3, 0);
    table.apply_result(&m, &config()).unwrap();

    let mut changed = m.clone();
    changed.score = Some(Score { a: 0, b: 3 });
    assert!(matches!(
        table.apply_result(&changed, &config()),
        Err(EngineError::InvalidResult(_))
    ));
    let rows = table.ranked("open", &config());
    assert_eq!(rows[0].team_id, "a");
    assert_eq!(rows[0].points, 3);
}

#[test]
fn unfinalized_match_is_rejected() {
    let mut table = StandingsTable::new();
    let mut m = finalized(0, "a", "b", 1, 0);
    m.state = MatchState::Scheduled;
    assert!(matches!(
        table.apply_result(&m, &config()),
        Err(EngineError::InvalidResult(_))
    ));
    assert!(table.rows("open").is_empty());
}

#[test]
fn full_tie_falls_back_to_team_id() {
    let rows = vec![row("y", 6, 3, 5), row("x", 6, 3, 5)];
    let ranked = rank_category(rows, &config(), &[]);
    assert_eq!(order(&ranked), vec!["x", "y"]);
    assert_eq!(ranked[0].position, 1);
    assert_eq!(ranked[1].position, 2);
}

#[test]
fn later_criteria_only_split_ties() {
    let rows = vec![
        row("a", 4, 5, 9),
        row("b", 6, -1, 2),
        row("c", 4, 5, 10),
        row("d", 4, 7, 8),
    ];
    let ranked = rank_category(rows, &config(), &[]);
    assert_eq!(order(&ranked), vec!["b", "d", "c", "a"]);
}

#[test]
fn head_to_head_decides_between_teams_that_met() {
    let config = config().with_tie_break_order(vec![TieBreak::HeadToHead, TieBreak::Alphabetical]);
    let rows = vec![row("a", 3, 0, 1), row("b", 3, 0, 1)];
    let meeting = finalized(0, "a", "b", 0, 1);
    let ranked = rank_category(rows, &config, &[meeting]);
    assert_eq!(order(&ranked), vec!["b", "a"]);
}

#[test]
fn head_to_head_skipped_when_teams_never_met() {
    let config = config().with_tie_break_order(vec![TieBreak::HeadToHead, TieBreak::Alphabetical]);
    let rows = vec![row("b", 3, 0, 1), row("a", 3, 0, 1)];
    let elsewhere = finalized(0, "b", "c", 1, 0);
    let ranked = rank_category(rows, &config, &[elsewhere]);
    assert_eq!(order(&ranked), vec!["a", "b"]);
}

#[test]
fn head_to_head_mini_league_among_three() {
    let config = config().with_tie_break_order(vec![TieBreak::HeadToHead, TieBreak::Alphabetical]);
    let rows = vec![row("a", 4, 0, 2), row("b", 4, 0, 2), row("c", 4, 0, 2)];
    let meetings = [
        finalized(0, "a", "c", 0, 1),
        finalized(1, "b", "c", 0, 2),
        finalized(2, "a", "b", 1, 1),
        // Outside the tied set, ignored.
        finalized(3, "d", "c", 5, 0),
    ];
    let ranked = rank_category(rows, &config, &meetings);
    assert_eq!(order(&ranked), vec!["c", "a", "b"]);
    assert_eq!(ranked[0].position, 1);
}

#[test]
fn head_to_head_skipped_for_three_when_one_pair_never_met() {
    let config = config().with_tie_break_order(vec![TieBreak::HeadToHead, TieBreak::Alphabetical]);
    let rows = vec![row("c", 4, 0, 2), row("b", 4, 0, 2), row("a", 4, 0, 2)];
    let meetings = [finalized(0, "a", "c", 0, 1), finalized(1, "b", "c", 0, 2)];
    let ranked = rank_category(rows, &config, &meetings);
    assert_eq!(order(&ranked), vec!["a", "b", "c"]);
}

#[test]
fn incremental_matches_recompute() {
    let results = vec![
        finalized(0, "a", "b", 2, 0),
        finalized(1, "c", "d", 1, 1),
        finalized(2, "a", "c", 0, 1),
        finalized(3, "b", "d", 4, 2),
    ];
    let mut table = StandingsTable::new();
    for m in &results {
        table.apply_result(m, &config()).unwrap();
    }
    let rebuilt = StandingsTable::from_matches(&results, &config()).unwrap();
    assert_eq!(table.ranked("open", &config()), rebuilt.ranked("open", &config()));
    assert_eq!(table.categories().collect::<Vec<_>>(), vec!["open"]);
}

proptest! {
    #[test]
    fn ranking_is_deterministic(
        stats in prop::collection::vec((0i32..10, -5i32..5, 0u32..8), 1..12),
        rotate in 0usize..12,
    ) {
        let rows: Vec<StandingsRow> = stats
            .iter()
            .enumerate()
            .map(|(i, (p, gd, gf))| row(&format!("t{i:02}"), *p, *gd, *gf))
            .collect();
        let mut shuffled = rows.clone();
        let len = shuffled.len();
        shuffled.rotate_left(rotate % len);

        let ranked = rank_category(rows, &config(), &[]);
        let again = rank_category(shuffled, &config(), &[]);
        prop_assert_eq!(&ranked, &again);

        let reranked = rank_category(ranked.clone(), &config(), &[]);
        prop_assert_eq!(&ranked, &reranked);

        for pair in ranked.windows(2) {
            prop_assert!(pair[0].points >= pair[1].points);
        }
    }
}
