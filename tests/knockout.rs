//! Integration tests for single-elimination brackets and advancement.

use fixture_engine::logic::knockout;
use fixture_engine::{
    advance_bracket, generate_fixtures, record_result, CompetitionConfig, EngineError, Format,
    Match, MatchState, Phase, ResultEvent, Slot, Team, TeamId,
};
use proptest::prelude::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use uuid::Uuid;

fn seeded(n: usize) -> Vec<TeamId> {
    (1..=n).map(|i| format!("s{i:02}")).collect()
}

fn bracket(n: usize, third_place: bool) -> Vec<Match> {
    knockout::build(Uuid::nil(), "open", &seeded(n), 1, third_place).unwrap()
}

/// Finalize every playable match, lower seed number winning, until the bracket is done.
fn play_out(matches: &mut Vec<Match>) {
    loop {
        let playable: Vec<Match> = matches
            .iter()
            .filter(|m| !m.is_finalized() && m.teams().is_some())
            .cloned()
            .collect();
        if playable.is_empty() {
            break;
        }
        for m in playable {
            let (a, b) = m.teams().unwrap();
            let (score_a, score_b) = if a < b { (2, 1) } else { (0, 3) };
            record_result(
                matches,
                &ResultEvent {
                    match_id: m.id,
                    score_a,
                    score_b,
                },
            )
            .unwrap();
            advance_bracket(matches, m.id).unwrap();
        }
    }
}

#[test]
fn eight_teams_standard_seeding() {
    let matches = bracket(8, false);
    assert_eq!(matches.len(), 7);
    let first: Vec<(&str, &str)> = matches
        .iter()
        .filter(|m| m.round == 1)
        .map(|m| {
            let (a, b) = m.teams().unwrap();
            (a.as_str(), b.as_str())
        })
        .collect();
    assert_eq!(
        first,
        vec![("s01", "s08"), ("s04", "s05"), ("s02", "s07"), ("s03", "s06")]
    );
    assert!(matches
        .iter()
        .filter(|m| m.round == 1)
        .all(|m| m.phase == Phase::QuarterFinal && m.state == MatchState::Scheduled));
    assert!(matches
        .iter()
        .filter(|m| m.round > 1)
        .all(|m| m.state == MatchState::PendingOpponent));
    assert_eq!(
        matches.iter().filter(|m| m.phase == Phase::Final).count(),
        1
    );
}

#[test]
fn top_seeds_receive_byes() {
    let matches = bracket(5, false);
    assert_eq!(matches.len(), 4);

    let first: Vec<&Match> = matches.iter().filter(|m| m.round == 1).collect();
    assert_eq!(first.len(), 1);
    assert_eq!(
        first[0].teams().map(|(a, b)| (a.as_str(), b.as_str())),
        Some(("s04", "s05"))
    );

    let semis: Vec<&Match> = matches.iter().filter(|m| m.phase == Phase::SemiFinal).collect();
    assert_eq!(semis.len(), 2);
    assert_eq!(semis[0].team_a, Slot::Team("s01".into()));
    assert_eq!(semis[0].team_b, Some(Slot::WinnerOf(first[0].id)));
    assert_eq!(semis[0].state, MatchState::PendingOpponent);
    // Both byes meet directly.
    assert_eq!(
        semis[1].teams().map(|(a, b)| (a.as_str(), b.as_str())),
        Some(("s02", "s03"))
    );
    assert_eq!(semis[1].state, MatchState::Scheduled);
}

#[test]
fn round_of_sixteen_label() {
    let matches = bracket(16, false);
    assert!(matches
        .iter()
        .filter(|m| m.round == 1)
        .all(|m| m.phase == Phase::RoundOf(16)));
}

#[test]
fn advancing_fills_next_round() {
    let mut matches = bracket(4, false);
    let semis: Vec<Match> = matches.iter().filter(|m| m.round == 1).cloned().collect();

    record_result(
        &mut matches,
        &ResultEvent {
            match_id: semis[0].id,
            score_a: 3,
            score_b: 1,
        },
    )
    .unwrap();
    let ready = advance_bracket(&mut matches, semis[0].id).unwrap();
    assert!(ready.is_empty(), "final still waits for the other semi-final");

    record_result(
        &mut matches,
        &ResultEvent {
            match_id: semis[1].id,
            score_a: 0,
            score_b: 2,
        },
    )
    .unwrap();
    let ready = advance_bracket(&mut matches, semis[1].id).unwrap();
    assert_eq!(ready.len(), 1);
    let final_match = &ready[0];
    assert_eq!(final_match.phase, Phase::Final);
    assert_eq!(final_match.state, MatchState::Ready);
    assert_eq!(
        final_match.teams().map(|(a, b)| (a.as_str(), b.as_str())),
        Some(("s01", "s03"))
    );

    // Advancing again changes nothing.
    assert!(advance_bracket(&mut matches, semis[1].id).unwrap().is_empty());
}

#[test]
fn third_place_between_semi_final_losers() {
    let mut matches = bracket(4, true);
    assert_eq!(matches.len(), 4);
    let third = matches
        .iter()
        .find(|m| m.phase == Phase::ThirdPlace)
        .cloned()
        .unwrap();
    let final_round = matches
        .iter()
        .find(|m| m.phase == Phase::Final)
        .map(|m| m.round)
        .unwrap();
    assert_eq!(third.round, final_round);

    play_out(&mut matches);
    let third = matches.iter().find(|m| m.id == third.id).unwrap();
    assert!(third.is_finalized());
    let teams: BTreeSet<&str> = [third.team_a_id(), third.team_b_id()]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect();
    assert_eq!(teams, BTreeSet::from(["s03", "s04"]));
}

#[test]
fn no_third_place_when_a_semi_final_is_a_bye() {
    let matches = bracket(3, true);
    assert!(matches.iter().all(|m| m.phase != Phase::ThirdPlace));
    assert_eq!(matches.len(), 2);
}

#[test]
fn play_out_crowns_top_seed() {
    let mut matches = bracket(11, false);
    play_out(&mut matches);
    assert!(matches.iter().all(Match::is_finalized));
    let final_match = matches.iter().find(|m| m.phase == Phase::Final).unwrap();
    assert_eq!(final_match.winner().map(String::as_str), Some("s01"));
}

#[test]
fn knockout_rejects_level_score() {
    let mut matches = bracket(2, false);
    let id = matches[0].id;
    let result = record_result(
        &mut matches,
        &ResultEvent {
            match_id: id,
            score_a: 1,
            score_b: 1,
        },
    );
    assert!(matches!(result, Err(EngineError::InvalidResult(_))));
    assert!(!matches[0].is_finalized());
}

#[test]
fn unknown_match_cannot_advance() {
    let mut matches = bracket(4, false);
    assert_eq!(
        advance_bracket(&mut matches, Uuid::nil()),
        Err(EngineError::MatchNotFound(Uuid::nil()))
    );
}

#[test]
fn single_team_is_rejected() {
    let config = CompetitionConfig::new(
        Uuid::new_v4(),
        Format::SingleElimination {
            third_place_match: false,
        },
    );
    let roster = vec![Team::new("only", "Only", "open")];
    assert!(matches!(
        generate_fixtures(&roster, &config),
        Err(EngineError::InsufficientParticipants { required: 2, actual: 1 })
    ));
}

proptest! {
    #[test]
    fn bracket_shape(n in 2usize..70) {
        let matches = bracket(n, false);
        prop_assert_eq!(matches.len(), n - 1);

        let rounds: BTreeSet<u32> = matches.iter().map(|m| m.round).collect();
        let expected = (n as f64).log2().ceil() as usize;
        prop_assert_eq!(rounds.len(), expected);
        prop_assert_eq!(knockout::round_count(n) as usize, expected);

        let mut by_round: HashMap<u32, HashSet<Slot>> = HashMap::new();
        for m in &matches {
            let seen = by_round.entry(m.round).or_default();
            for slot in std::iter::once(&m.team_a).chain(m.team_b.as_ref()) {
                prop_assert!(seen.insert(slot.clone()), "slot used twice in round {}", m.round);
            }
        }

        let ids: HashSet<_> = matches.iter().map(|m| m.id).collect();
        prop_assert_eq!(ids.len(), matches.len());
    }
}
