//! Swiss-system pairing, one round per call.

use crate::logic::round_robin::Pairing;
use crate::models::{Match, TeamId};
use std::collections::HashSet;

/// Upper bound on search steps before falling back to pairing with rematches.
const SEARCH_BUDGET: usize = 200_000;

/// A team entering the next Swiss round with its current points.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SwissEntrant {
    pub team_id: TeamId,
    pub points: i32,
}

/// Pairings for one round, plus the team sitting out (odd counts).
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SwissRound {
    pub pairings: Vec<Pairing>,
    pub bye: Option<TeamId>,
    /// Pairings that repeat an earlier meeting. Non-zero only when no other pairing exists.
    pub rematches: usize,
}

/// Unordered pair key.
fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Meetings that already happened, from any earlier matches with two known teams.
pub fn played_pairs(history: &[Match]) -> HashSet<(String, String)> {
    history
        .iter()
        .filter_map(|m| m.teams())
        .map(|(a, b)| pair_key(a, b))
        .collect()
}

/// Teams that already received a bye.
pub fn bye_holders(history: &[Match]) -> HashSet<TeamId> {
    history
        .iter()
        .filter(|m| m.is_bye())
        .filter_map(|m| m.team_a_id().cloned())
        .collect()
}

/// Split ranked entrants into runs of equal points.
pub fn score_buckets(ranked: &[SwissEntrant]) -> Vec<Vec<&SwissEntrant>> {
    let mut buckets: Vec<Vec<&SwissEntrant>> = Vec::new();
    for entrant in ranked {
        match buckets.last_mut() {
            Some(bucket) if bucket[0].points == entrant.points => bucket.push(entrant),
            _ => buckets.push(vec![entrant]),
        }
    }
    buckets
}

/// Pair one round. `ranked` is strongest first (points descending, then tie-breaks).
///
/// Each team is paired with the highest-ranked unpaired team it has not met yet: first inside its
/// score bucket, then down into the adjacent bucket. If no full pairing without rematches exists the
/// round is paired in rank order preferring new opponents, and the rematches are counted.
/// With an odd count the lowest-ranked team without a previous bye sits out.
pub fn pair_round(
    ranked: &[SwissEntrant],
    played: &HashSet<(String, String)>,
    had_bye: &HashSet<TeamId>,
) -> SwissRound {
    let buckets = score_buckets(ranked);
    log::debug!(
        "swiss: {} entrants in {} score bucket(s)",
        ranked.len(),
        buckets.len()
    );
    let order: Vec<&TeamId> = buckets
        .iter()
        .flatten()
        .map(|entrant| &entrant.team_id)
        .collect();

    if order.len() % 2 == 0 {
        return pair_pool(&order, played, None);
    }

    // Bottom-up candidates for the bye, those without a bye first.
    let mut candidates: Vec<usize> = (0..order.len())
        .rev()
        .filter(|&i| !had_bye.contains(order[i]))
        .collect();
    if candidates.is_empty() {
        candidates = (0..order.len()).rev().collect();
    }

    for &i in &candidates {
        let pool: Vec<&TeamId> = order
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, t)| *t)
            .collect();
        let mut budget = SEARCH_BUDGET;
        if let Some(pairings) = search(&pool, played, &mut budget) {
            return SwissRound {
                pairings,
                bye: Some(order[i].clone()),
                rematches: 0,
            };
        }
    }

    let i = candidates[0];
    let pool: Vec<&TeamId> = order
        .iter()
        .enumerate()
        .filter(|(j, _)| *j != i)
        .map(|(_, t)| *t)
        .collect();
    pair_pool(&pool, played, Some(order[i].clone()))
}

fn pair_pool(pool: &[&TeamId], played: &HashSet<(String, String)>, bye: Option<TeamId>) -> SwissRound {
    let mut budget = SEARCH_BUDGET;
    match search(pool, played, &mut budget) {
        Some(pairings) => SwissRound {
            pairings,
            bye,
            rematches: 0,
        },
        None => {
            let (pairings, rematches) = pair_allowing_rematches(pool, played);
            log::warn!(
                "swiss: no pairing without rematches for {} teams, {} rematch(es) scheduled",
                pool.len(),
                rematches
            );
            SwissRound {
                pairings,
                bye,
                rematches,
            }
        }
    }
}

/// Depth-first search for a perfect pairing with no repeated meeting.
fn search(
    pool: &[&TeamId],
    played: &HashSet<(String, String)>,
    budget: &mut usize,
) -> Option<Vec<Pairing>> {
    let Some((first, rest)) = pool.split_first() else {
        return Some(Vec::new());
    };
    for (j, candidate) in rest.iter().enumerate() {
        if *budget == 0 {
            return None;
        }
        *budget -= 1;
        if played.contains(&pair_key(first, candidate)) {
            continue;
        }
        let remaining: Vec<&TeamId> = rest
            .iter()
            .enumerate()
            .filter(|(k, _)| *k != j)
            .map(|(_, t)| *t)
            .collect();
        if let Some(mut pairings) = search(&remaining, played, budget) {
            pairings.insert(
                0,
                Pairing {
                    team_a: (*first).clone(),
                    team_b: (*candidate).clone(),
                },
            );
            return Some(pairings);
        }
    }
    None
}

/// Greedy pairing in rank order, taking a new opponent where one is left.
fn pair_allowing_rematches(
    pool: &[&TeamId],
    played: &HashSet<(String, String)>,
) -> (Vec<Pairing>, usize) {
    let mut remaining: Vec<&TeamId> = pool.to_vec();
    let mut pairings = Vec::with_capacity(pool.len() / 2);
    let mut rematches = 0;
    while remaining.len() >= 2 {
        let first = remaining.remove(0);
        let j = remaining
            .iter()
            .position(|t| !played.contains(&pair_key(first, t)))
            .unwrap_or_else(|| {
                rematches += 1;
                0
            });
        let second = remaining.remove(j);
        pairings.push(Pairing {
            team_a: first.clone(),
            team_b: second.clone(),
        });
    }
    (pairings, rematches)
}
