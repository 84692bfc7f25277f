//! Single-elimination brackets: seeding with byes, placeholder rounds, advancement.

use crate::models::{
    fixture_id, CompetitionId, EngineError, EngineResult, Match, MatchId, MatchState, Phase, Slot,
    TeamId,
};

/// Seed numbers (1-based) in bracket slot order for a bracket of `size` (a power of two).
/// Adjacent entries meet in the first round, e.g. size 8 gives 1,8,4,5,2,7,3,6.
fn bracket_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let n = order.len() * 2;
        order = order.iter().flat_map(|&s| [s, n + 1 - s]).collect();
    }
    order
}

/// Number of rounds for `teams` entrants (excluding a third-place match).
pub fn round_count(teams: usize) -> u32 {
    teams.next_power_of_two().trailing_zeros()
}

fn bracket_match(
    competition_id: CompetitionId,
    category: &str,
    phase: Phase,
    round: u32,
    slot: usize,
    team_a: Slot,
    team_b: Slot,
) -> Match {
    let state = if team_a.team().is_some() && team_b.team().is_some() {
        MatchState::Scheduled
    } else {
        MatchState::PendingOpponent
    };
    Match {
        id: fixture_id(competition_id, category, phase, round, None, slot),
        competition_id,
        category: category.to_string(),
        phase,
        round,
        group: None,
        team_a,
        team_b: Some(team_b),
        state,
        score: None,
    }
}

/// Build the whole bracket for teams given strongest seed first.
///
/// The field is padded to the next power of two; padding slots are byes and land opposite the top
/// seeds. A team drawn against a bye moves straight into the next round without a match record.
/// Later rounds reference earlier matches through `Slot::WinnerOf` until results arrive.
/// Round numbers start at `first_round`.
pub fn build(
    competition_id: CompetitionId,
    category: &str,
    seeded: &[TeamId],
    first_round: u32,
    third_place_match: bool,
) -> EngineResult<Vec<Match>> {
    if seeded.len() < 2 {
        return Err(EngineError::InsufficientParticipants {
            required: 2,
            actual: seeded.len(),
        });
    }

    let size = seeded.len().next_power_of_two();
    let mut entrants: Vec<Option<Slot>> = bracket_order(size)
        .into_iter()
        .map(|seed| seeded.get(seed - 1).cloned().map(Slot::Team))
        .collect();

    let mut matches = Vec::with_capacity(size);
    let mut semi_finals: Vec<MatchId> = Vec::new();
    let rounds = round_count(seeded.len());
    let final_round = first_round + rounds - 1;
    let mut teams_left = size;
    for round in first_round..=final_round {
        let phase = Phase::for_remaining(teams_left as u32);
        let mut next = Vec::with_capacity(entrants.len() / 2);
        for (slot, pair) in entrants.chunks(2).enumerate() {
            match (&pair[0], &pair[1]) {
                (Some(a), Some(b)) => {
                    let m = bracket_match(
                        competition_id,
                        category,
                        phase,
                        round,
                        slot,
                        a.clone(),
                        b.clone(),
                    );
                    if phase == Phase::SemiFinal {
                        semi_finals.push(m.id);
                    }
                    next.push(Some(Slot::WinnerOf(m.id)));
                    matches.push(m);
                }
                (Some(a), None) | (None, Some(a)) => next.push(Some(a.clone())),
                (None, None) => next.push(None),
            }
        }
        entrants = next;
        teams_left /= 2;
    }

    if third_place_match {
        if let [first, second] = semi_finals[..] {
            matches.push(bracket_match(
                competition_id,
                category,
                Phase::ThirdPlace,
                final_round,
                0,
                Slot::LoserOf(first),
                Slot::LoserOf(second),
            ));
        } else {
            log::debug!("{}: no third-place match, a semi-final was a bye", category);
        }
    }

    log::debug!(
        "knockout: {} teams, bracket of {}, {} matches",
        seeded.len(),
        size,
        matches.len()
    );
    Ok(matches)
}

/// Feed the outcome of a finalized knockout match into the matches that wait on it.
/// Returns the matches whose both teams became known by this call.
pub fn advance(matches: &mut [Match], finalized: MatchId) -> EngineResult<Vec<Match>> {
    let done = matches
        .iter()
        .find(|m| m.id == finalized)
        .ok_or(EngineError::MatchNotFound(finalized))?;
    if !done.phase.is_knockout() {
        return Ok(Vec::new());
    }
    if !done.is_finalized() {
        return Err(EngineError::InvalidResult(format!(
            "match {} is not finalized",
            finalized
        )));
    }
    let winner = done
        .winner()
        .cloned()
        .ok_or_else(|| EngineError::InvalidResult(format!("match {} has no winner", finalized)))?;
    let loser = done.loser().cloned();

    let mut ready = Vec::new();
    for m in matches.iter_mut().filter(|m| !m.is_finalized()) {
        let mut changed = false;
        for slot in std::iter::once(&mut m.team_a).chain(m.team_b.as_mut()) {
            let fill = match &*slot {
                Slot::WinnerOf(src) if *src == finalized => Some(winner.clone()),
                Slot::LoserOf(src) if *src == finalized => loser.clone(),
                _ => None,
            };
            if let Some(team) = fill {
                *slot = Slot::Team(team);
                changed = true;
            }
        }
        if changed && m.state == MatchState::PendingOpponent && m.teams().is_some() {
            m.state = MatchState::Ready;
            ready.push(m.clone());
        }
    }

    log::info!(
        "advanced {} from match {}; {} match(es) now ready",
        winner,
        finalized,
        ready.len()
    );
    Ok(ready)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bracket_order_for_eight() {
        assert_eq!(bracket_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }

    #[test]
    fn round_counts() {
        assert_eq!(round_count(2), 1);
        assert_eq!(round_count(5), 3);
        assert_eq!(round_count(16), 4);
    }
}
