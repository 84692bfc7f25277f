//! Fixture generation: picks the strategy for the configured format, records results,
//! and produces later stages (knockout after groups, next Swiss round).

use crate::logic::groups::{self, Group};
use crate::logic::standings::{rank_category, StandingsTable};
use crate::logic::swiss::{self, SwissEntrant, SwissRound};
use crate::logic::{knockout, round_robin, seeding};
use crate::models::{
    fixture_id, CompetitionConfig, CompetitionId, EngineError, EngineResult, Format, Match,
    MatchId, MatchState, Phase, ResultEvent, Score, Slot, StandingsRow, Team, TeamId,
};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Fixture of one category: freshly generated, or what was already there.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FixtureSet {
    Generated { category: String, matches: Vec<Match> },
    Existing { category: String, matches: Vec<Match> },
}

impl FixtureSet {
    pub fn category(&self) -> &str {
        match self {
            FixtureSet::Generated { category, .. } | FixtureSet::Existing { category, .. } => {
                category
            }
        }
    }

    pub fn matches(&self) -> &[Match] {
        match self {
            FixtureSet::Generated { matches, .. } | FixtureSet::Existing { matches, .. } => {
                matches
            }
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, FixtureSet::Generated { .. })
    }
}

/// Split a roster by category (ascending name). Rejects a team id used twice in one category.
fn by_category(roster: &[Team]) -> EngineResult<BTreeMap<&str, Vec<Team>>> {
    let mut categories: BTreeMap<&str, Vec<Team>> = BTreeMap::new();
    for team in roster {
        let teams = categories.entry(team.category.as_str()).or_default();
        if teams.iter().any(|t| t.id == team.id) {
            return Err(EngineError::Configuration(format!(
                "team {} registered twice in category {}",
                team.id, team.category
            )));
        }
        teams.push(team.clone());
    }
    Ok(categories)
}

/// Generate the schedule for every category in the roster. Pure: callers persist the result.
///
/// Swiss categories get round 1 only; later rounds come from [`next_swiss_round`].
/// Groups-then-knockout categories get the group stage; the bracket comes from
/// [`knockout_from_groups`].
pub fn generate_fixtures(roster: &[Team], config: &CompetitionConfig) -> EngineResult<Vec<Match>> {
    config.validate()?;
    let mut matches = Vec::new();
    for (category, teams) in by_category(roster)? {
        matches.extend(generate_category(category, &teams, config)?);
    }
    Ok(matches)
}

fn generate_category(
    category: &str,
    teams: &[Team],
    config: &CompetitionConfig,
) -> EngineResult<Vec<Match>> {
    let order = seeding::seed_order(teams, config.draw_seed);
    let competition_id = config.competition_id;
    let matches = match config.format {
        Format::RoundRobin { double_round_robin } => {
            let rounds = round_robin::schedule(&order, double_round_robin)?;
            round_robin::to_matches(competition_id, category, Phase::League, None, 1, &rounds)
        }
        Format::SingleElimination { third_place_match } => {
            knockout::build(competition_id, category, &order, 1, third_place_match)?
        }
        Format::GroupsThenKnockout {
            group_count,
            double_round_robin,
            advance_per_group,
            ..
        } => {
            let groups = groups::allocate(&order, group_count as usize)?;
            check_advancement(&groups, advance_per_group)?;
            groups::group_matches(competition_id, category, &groups, double_round_robin)?
        }
        Format::Swiss { .. } => {
            if order.len() < 2 {
                return Err(EngineError::InsufficientParticipants {
                    required: 2,
                    actual: order.len(),
                });
            }
            let entrants: Vec<SwissEntrant> = order
                .into_iter()
                .map(|team_id| SwissEntrant { team_id, points: 0 })
                .collect();
            let round = swiss::pair_round(&entrants, &HashSet::new(), &HashSet::new());
            swiss_matches(competition_id, category, 1, round)
        }
    };
    log::info!(
        "generated {} matches for category {} ({} teams)",
        matches.len(),
        category,
        teams.len()
    );
    Ok(matches)
}

fn check_advancement(groups: &[Group], advance_per_group: u32) -> EngineResult<()> {
    let smallest = groups.iter().map(|g| g.teams.len()).min().unwrap_or_default();
    if advance_per_group as usize > smallest {
        return Err(EngineError::Configuration(format!(
            "{} teams per group cannot advance from a group of {}",
            advance_per_group, smallest
        )));
    }
    if groups.len() * (advance_per_group as usize) < 2 {
        return Err(EngineError::Configuration(
            "knockout phase needs at least two qualified teams".into(),
        ));
    }
    Ok(())
}

fn swiss_matches(
    competition_id: CompetitionId,
    category: &str,
    round: u32,
    pairing: SwissRound,
) -> Vec<Match> {
    let slots = pairing.pairings.len();
    let mut matches = round_robin::to_matches(
        competition_id,
        category,
        Phase::Swiss,
        None,
        round,
        &[pairing.pairings],
    );
    // The bye is recorded as an already-finalized match without an opponent.
    if let Some(team) = pairing.bye {
        matches.push(Match {
            id: fixture_id(competition_id, category, Phase::Swiss, round, None, slots),
            competition_id,
            category: category.to_string(),
            phase: Phase::Swiss,
            round,
            group: None,
            team_a: Slot::Team(team),
            team_b: None,
            state: MatchState::Finalized,
            score: None,
        });
    }
    matches
}

/// Whether a phase can come out of the given format.
fn phase_fits(format: &Format, phase: Phase) -> bool {
    match format {
        Format::RoundRobin { .. } => phase == Phase::League,
        Format::SingleElimination { .. } => phase.is_knockout(),
        Format::GroupsThenKnockout { .. } => phase == Phase::GroupStage || phase.is_knockout(),
        Format::Swiss { .. } => phase == Phase::Swiss,
    }
}

/// Fail with `IdempotencyViolation` if the category already holds matches.
pub fn ensure_unpopulated(existing: &[Match], category: &str) -> EngineResult<()> {
    let count = existing.iter().filter(|m| m.category == category).count();
    if count > 0 {
        return Err(EngineError::IdempotencyViolation {
            category: category.to_string(),
            existing: count,
        });
    }
    Ok(())
}

/// Generate fixtures for categories that have none yet and hand back the existing set for the
/// others. Existing matches from a different format are a configuration error.
pub fn generate_or_existing(
    existing: &[Match],
    roster: &[Team],
    config: &CompetitionConfig,
) -> EngineResult<Vec<FixtureSet>> {
    config.validate()?;
    let mut sets = Vec::new();
    for (category, teams) in by_category(roster)? {
        let current: Vec<Match> = existing
            .iter()
            .filter(|m| m.category == category)
            .cloned()
            .collect();
        if let Some(m) = current.iter().find(|m| !phase_fits(&config.format, m.phase)) {
            return Err(EngineError::Configuration(format!(
                "category {} already has {} matches from another format",
                category, m.phase
            )));
        }
        match ensure_unpopulated(&current, category) {
            Ok(()) => sets.push(FixtureSet::Generated {
                category: category.to_string(),
                matches: generate_category(category, &teams, config)?,
            }),
            Err(EngineError::IdempotencyViolation { existing: count, .. }) => {
                log::info!(
                    "category {} already has {} matches, returning them",
                    category,
                    count
                );
                sets.push(FixtureSet::Existing {
                    category: category.to_string(),
                    matches: current,
                });
            }
            Err(e) => return Err(e),
        }
    }
    Ok(sets)
}

/// Roster with `group` filled in from the group-stage matches of each team's category.
/// Roster order is kept.
pub fn roster_with_groups(roster: &[Team], matches: &[Match]) -> Vec<Team> {
    let mut group_stages: BTreeMap<&str, Vec<Match>> = BTreeMap::new();
    for m in matches.iter().filter(|m| m.phase == Phase::GroupStage) {
        group_stages
            .entry(m.category.as_str())
            .or_default()
            .push(m.clone());
    }
    let groups: BTreeMap<&str, Vec<Group>> = group_stages
        .into_iter()
        .map(|(category, stage)| (category, groups::groups_from_matches(&stage)))
        .collect();
    roster
        .iter()
        .flat_map(|team| match groups.get(team.category.as_str()) {
            Some(category_groups) => {
                groups::assign_groups(std::slice::from_ref(team), category_groups)
            }
            None => vec![team.clone()],
        })
        .collect()
}

/// Validate a score entry and finalize the match. Returns the finalized match.
///
/// Sending the same score for a finalized match is a no-op; a different score is rejected.
pub fn record_result(matches: &mut [Match], event: &ResultEvent) -> EngineResult<Match> {
    let score = Score::checked(event.score_a, event.score_b)?;
    let m = matches
        .iter_mut()
        .find(|m| m.id == event.match_id)
        .ok_or(EngineError::MatchNotFound(event.match_id))?;

    if m.is_bye() {
        return Err(EngineError::InvalidResult(format!(
            "match {} is a bye and takes no score",
            m.id
        )));
    }
    if m.is_finalized() {
        return if m.score == Some(score) {
            Ok(m.clone())
        } else {
            Err(EngineError::InvalidResult(format!(
                "match {} is already finalized with another score",
                m.id
            )))
        };
    }
    if m.teams().is_none() {
        return Err(EngineError::InvalidResult(format!(
            "match {} is still waiting for an opponent",
            m.id
        )));
    }
    if m.phase.is_knockout() && score.a == score.b {
        return Err(EngineError::InvalidResult(format!(
            "knockout match {} needs a winner",
            m.id
        )));
    }

    m.score = Some(score);
    m.state = MatchState::Finalized;
    log::info!(
        "match {} finalized {}-{} ({} round {})",
        m.id,
        score.a,
        score.b,
        m.phase,
        m.round
    );
    Ok(m.clone())
}

/// Fill the bracket slots that wait on a finalized knockout match.
/// Returns the matches that became playable; empty while their other feeder is undecided.
pub fn advance_bracket(matches: &mut [Match], finalized: MatchId) -> EngineResult<Vec<Match>> {
    knockout::advance(matches, finalized)
}

/// Build the knockout bracket of a groups-then-knockout category from its finished group stage.
///
/// Group winners are seeded first in group order, then runners-up crossed over so a winner does
/// not meet the runner-up of its own group, then lower places in group order.
pub fn knockout_from_groups(
    matches: &[Match],
    config: &CompetitionConfig,
    category: &str,
) -> EngineResult<Vec<Match>> {
    let Format::GroupsThenKnockout {
        advance_per_group,
        third_place_match,
        ..
    } = config.format
    else {
        return Err(EngineError::Configuration(
            "knockout from groups needs the groups_then_knockout format".into(),
        ));
    };

    let category_matches: Vec<Match> = matches
        .iter()
        .filter(|m| m.category == category)
        .cloned()
        .collect();
    let knockout_count = category_matches
        .iter()
        .filter(|m| m.phase.is_knockout())
        .count();
    if knockout_count > 0 {
        return Err(EngineError::IdempotencyViolation {
            category: category.to_string(),
            existing: knockout_count,
        });
    }
    let group_stage: Vec<Match> = category_matches
        .into_iter()
        .filter(|m| m.phase == Phase::GroupStage)
        .collect();
    if group_stage.is_empty() {
        return Err(EngineError::StageIncomplete(format!(
            "category {} has no group stage",
            category
        )));
    }
    let open = group_stage.iter().filter(|m| !m.is_finalized()).count();
    if open > 0 {
        return Err(EngineError::StageIncomplete(format!(
            "{} group match(es) in category {} not finalized",
            open, category
        )));
    }

    let table = StandingsTable::from_matches(&group_stage, config)?;
    let all_rows = table.rows(category);
    let groups = groups::groups_from_matches(&group_stage);
    let mut places: Vec<Vec<TeamId>> = Vec::with_capacity(groups.len());
    for group in &groups {
        let rows: Vec<StandingsRow> = all_rows
            .iter()
            .filter(|r| group.teams.contains(&r.team_id))
            .cloned()
            .collect();
        let ranked = rank_category(rows, config, &group_stage);
        if ranked.len() < advance_per_group as usize {
            return Err(EngineError::Configuration(format!(
                "group {} has {} teams, {} should advance",
                group.label,
                ranked.len(),
                advance_per_group
            )));
        }
        log::debug!(
            "group {} final order: {:?}",
            group.label,
            ranked.iter().map(|r| r.team_id.as_str()).collect::<Vec<_>>()
        );
        places.push(
            ranked
                .into_iter()
                .take(advance_per_group as usize)
                .map(|r| r.team_id)
                .collect(),
        );
    }

    let seeded = seed_qualifiers(&places);
    let first_round = group_stage.iter().map(|m| m.round).max().unwrap_or_default() + 1;
    knockout::build(
        config.competition_id,
        category,
        &seeded,
        first_round,
        third_place_match,
    )
}

/// Like [`knockout_from_groups`], but a category whose bracket already exists gets that bracket
/// back instead of an error.
pub fn knockout_or_existing(
    matches: &[Match],
    config: &CompetitionConfig,
    category: &str,
) -> EngineResult<FixtureSet> {
    match knockout_from_groups(matches, config, category) {
        Ok(generated) => Ok(FixtureSet::Generated {
            category: category.to_string(),
            matches: generated,
        }),
        Err(EngineError::IdempotencyViolation { existing, .. }) => {
            log::info!(
                "category {} already has {} knockout matches, returning them",
                category,
                existing
            );
            Ok(FixtureSet::Existing {
                category: category.to_string(),
                matches: matches
                    .iter()
                    .filter(|m| m.category == category && m.phase.is_knockout())
                    .cloned()
                    .collect(),
            })
        }
        Err(e) => Err(e),
    }
}

/// `places[g][r]` is the team finishing `r + 1` in group `g`.
fn seed_qualifiers(places: &[Vec<TeamId>]) -> Vec<TeamId> {
    let group_count = places.len();
    let depth = places.iter().map(Vec::len).max().unwrap_or_default();
    let partner = |g: usize| {
        if group_count % 2 == 0 {
            g ^ 1
        } else {
            (g + 1) % group_count
        }
    };

    let mut seeded: Vec<TeamId> = places.iter().filter_map(|p| p.first().cloned()).collect();
    if depth >= 2 {
        // Seed G + 1 + j meets seed G - j, the winner of group G - 1 - j.
        seeded.extend(
            (0..group_count)
                .filter_map(|j| places[partner(group_count - 1 - j)].get(1).cloned()),
        );
    }
    for r in 2..depth {
        seeded.extend(places.iter().filter_map(|p| p.get(r).cloned()));
    }
    seeded
}

/// Pair the next Swiss round of a category from its finished rounds.
pub fn next_swiss_round(
    roster: &[Team],
    matches: &[Match],
    config: &CompetitionConfig,
    category: &str,
) -> EngineResult<Vec<Match>> {
    let Format::Swiss { rounds, .. } = config.format else {
        return Err(EngineError::Configuration(
            "next swiss round needs the swiss format".into(),
        ));
    };

    let history: Vec<Match> = matches
        .iter()
        .filter(|m| m.category == category && m.phase == Phase::Swiss)
        .cloned()
        .collect();
    let Some(last_round) = history.iter().map(|m| m.round).max() else {
        return Err(EngineError::StageIncomplete(format!(
            "category {} has no swiss round yet, generate fixtures first",
            category
        )));
    };
    let open = history.iter().filter(|m| !m.is_finalized()).count();
    if open > 0 {
        return Err(EngineError::StageIncomplete(format!(
            "{} match(es) of swiss round {} not finalized",
            open, last_round
        )));
    }
    if last_round >= rounds {
        return Err(EngineError::Configuration(format!(
            "all {} swiss rounds of category {} are already paired",
            rounds, category
        )));
    }

    let table = StandingsTable::from_matches(&history, config)?;
    let mut rows = table.rows(category);
    for team in roster.iter().filter(|t| t.category == category) {
        if !rows.iter().any(|r| r.team_id == team.id) {
            rows.push(StandingsRow::new(team.id.clone(), category));
        }
    }
    let ranked: Vec<SwissEntrant> = rank_category(rows, config, &history)
        .into_iter()
        .map(|r| SwissEntrant {
            team_id: r.team_id,
            points: r.points,
        })
        .collect();

    let round = swiss::pair_round(
        &ranked,
        &swiss::played_pairs(&history),
        &swiss::bye_holders(&history),
    );
    log::info!(
        "swiss round {} for category {}: {} pairing(s), bye: {:?}",
        last_round + 1,
        category,
        round.pairings.len(),
        round.bye
    );
    Ok(swiss_matches(
        config.competition_id,
        category,
        last_round + 1,
        round,
    ))
}

/// Like [`next_swiss_round`], but while the latest round still has open matches that round is
/// handed back instead of an error.
pub fn swiss_round_or_open(
    roster: &[Team],
    matches: &[Match],
    config: &CompetitionConfig,
    category: &str,
) -> EngineResult<FixtureSet> {
    let latest = matches
        .iter()
        .filter(|m| m.category == category && m.phase == Phase::Swiss)
        .map(|m| m.round)
        .max();
    if let Some(round) = latest {
        let current: Vec<Match> = matches
            .iter()
            .filter(|m| m.category == category && m.phase == Phase::Swiss && m.round == round)
            .cloned()
            .collect();
        if current.iter().any(|m| !m.is_finalized()) {
            log::info!(
                "swiss round {} of category {} is still open, returning it",
                round,
                category
            );
            return Ok(FixtureSet::Existing {
                category: category.to_string(),
                matches: current,
            });
        }
    }
    Ok(FixtureSet::Generated {
        category: category.to_string(),
        matches: next_swiss_round(roster, matches, config, category)?,
    })
}
