//! Round-robin pairings using the circle method.

use crate::models::{CompetitionId, EngineError, EngineResult, Match, Phase, TeamId};

/// Two teams meeting in a round; `team_a` is listed first (home).
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Pairing {
    pub team_a: TeamId,
    pub team_b: TeamId,
}

impl Pairing {
    /// Same pairing with home and away swapped.
    pub fn reversed(&self) -> Self {
        Self {
            team_a: self.team_b.clone(),
            team_b: self.team_a.clone(),
        }
    }
}

/// Build the rounds for `teams` in the given order. Index 0 is round 1.
///
/// The first team stays fixed while the others rotate one place per round. An odd count gets a
/// phantom slot, so N odd yields N rounds with one team resting in each; N even yields N - 1.
/// With `double_round_robin` a mirrored block with home and away swapped follows the first.
pub fn schedule(teams: &[TeamId], double_round_robin: bool) -> EngineResult<Vec<Vec<Pairing>>> {
    if teams.len() < 2 {
        return Err(EngineError::InsufficientParticipants {
            required: 2,
            actual: teams.len(),
        });
    }

    let mut circle: Vec<Option<&TeamId>> = teams.iter().map(Some).collect();
    if circle.len() % 2 == 1 {
        circle.push(None);
    }
    let n = circle.len();

    let mut rounds: Vec<Vec<Pairing>> = Vec::with_capacity(if double_round_robin {
        2 * (n - 1)
    } else {
        n - 1
    });
    for round in 0..n - 1 {
        let mut pairings = Vec::with_capacity(n / 2);
        for i in 0..n / 2 {
            if let (Some(a), Some(b)) = (circle[i], circle[n - 1 - i]) {
                // The fixed team alternates sides so it is not always at home.
                let (a, b) = if i == 0 && round % 2 == 1 { (b, a) } else { (a, b) };
                pairings.push(Pairing {
                    team_a: a.clone(),
                    team_b: b.clone(),
                });
            }
        }
        rounds.push(pairings);
        circle[1..].rotate_right(1);
    }

    if double_round_robin {
        let mirrored: Vec<Vec<Pairing>> = rounds
            .iter()
            .map(|round| round.iter().map(Pairing::reversed).collect())
            .collect();
        rounds.extend(mirrored);
    }

    log::debug!(
        "round robin: {} teams, {} rounds (double: {})",
        teams.len(),
        rounds.len(),
        double_round_robin
    );
    Ok(rounds)
}

/// Turn rounds of pairings into scheduled matches, numbering rounds from `first_round`.
pub fn to_matches(
    competition_id: CompetitionId,
    category: &str,
    phase: Phase,
    group: Option<&str>,
    first_round: u32,
    rounds: &[Vec<Pairing>],
) -> Vec<Match> {
    rounds
        .iter()
        .enumerate()
        .flat_map(|(r, round)| {
            round.iter().enumerate().map(move |(slot, p)| {
                Match::scheduled(
                    competition_id,
                    category,
                    phase,
                    first_round + r as u32,
                    group,
                    slot,
                    p.team_a.clone(),
                    p.team_b.clone(),
                )
            })
        })
        .collect()
}
