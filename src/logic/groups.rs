//! Group stage: snake allocation of teams into groups, round robin inside each group.

use crate::logic::round_robin;
use crate::models::{CompetitionId, EngineError, EngineResult, Match, Phase, Team, TeamId};
use serde::{Deserialize, Serialize};

/// One group and its members, strongest seed first.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub label: String,
    pub teams: Vec<TeamId>,
}

/// "A".."Z", then "G27", "G28", ...
pub fn group_label(index: usize) -> String {
    if index < 26 {
        ((b'A' + index as u8) as char).to_string()
    } else {
        format!("G{}", index + 1)
    }
}

/// Distribute seeded teams over `group_count` groups in serpentine order
/// (1, 2, ..., G, G, ..., 2, 1, 1, 2, ...). Group sizes differ by at most one.
pub fn allocate(teams: &[TeamId], group_count: usize) -> EngineResult<Vec<Group>> {
    if group_count == 0 {
        return Err(EngineError::Configuration("group count must be at least 1".into()));
    }
    if group_count > teams.len() {
        return Err(EngineError::Configuration(format!(
            "{} groups requested for {} teams",
            group_count,
            teams.len()
        )));
    }
    if teams.len() < 2 * group_count {
        return Err(EngineError::InsufficientParticipants {
            required: 2 * group_count,
            actual: teams.len(),
        });
    }

    let mut groups: Vec<Group> = (0..group_count)
        .map(|i| Group {
            label: group_label(i),
            teams: Vec::new(),
        })
        .collect();
    for (k, team) in teams.iter().enumerate() {
        groups[snake_index(k, group_count)].teams.push(team.clone());
    }
    Ok(groups)
}

fn snake_index(k: usize, group_count: usize) -> usize {
    let pos = k % group_count;
    if (k / group_count) % 2 == 0 {
        pos
    } else {
        group_count - 1 - pos
    }
}

/// Group-stage matches for every group, tagged with the group label.
/// Round numbers are local to each group.
pub fn group_matches(
    competition_id: CompetitionId,
    category: &str,
    groups: &[Group],
    double_round_robin: bool,
) -> EngineResult<Vec<Match>> {
    let mut matches = Vec::new();
    for group in groups {
        let rounds = round_robin::schedule(&group.teams, double_round_robin)?;
        matches.extend(round_robin::to_matches(
            competition_id,
            category,
            Phase::GroupStage,
            Some(&group.label),
            1,
            &rounds,
        ));
    }
    Ok(matches)
}

/// Rebuild groups from generated group-stage matches, ordered by label.
pub fn groups_from_matches(matches: &[Match]) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for m in matches.iter().filter(|m| m.phase == Phase::GroupStage) {
        let Some(label) = &m.group else { continue };
        let idx = match groups.iter().position(|g| &g.label == label) {
            Some(i) => i,
            None => {
                groups.push(Group {
                    label: label.clone(),
                    teams: Vec::new(),
                });
                groups.len() - 1
            }
        };
        for team in [m.team_a_id(), m.team_b_id()].into_iter().flatten() {
            if !groups[idx].teams.contains(team) {
                groups[idx].teams.push(team.clone());
            }
        }
    }
    groups.sort_by(|a, b| group_order(&a.label, &b.label));
    groups
}

/// Copy of `teams` with each member's `group` set to the label of the group holding it.
/// Teams outside every group keep their current assignment.
pub fn assign_groups(teams: &[Team], groups: &[Group]) -> Vec<Team> {
    teams
        .iter()
        .map(|team| {
            let mut team = team.clone();
            if let Some(group) = groups.iter().find(|g| g.teams.contains(&team.id)) {
                team.group = Some(group.label.clone());
            }
            team
        })
        .collect()
}

/// "B" before "AA"-style labels: shorter first, then lexicographic.
fn group_order(a: &str, b: &str) -> std::cmp::Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}
