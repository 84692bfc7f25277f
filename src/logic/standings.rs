//! Standings: incremental result application and tie-break ranking.

use crate::models::{
    CompetitionConfig, EngineError, EngineResult, Format, Match, MatchId, StandingsRow, TeamId,
    TieBreak,
};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};

/// Ranking tables for every category of one competition, plus the results already counted.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StandingsTable {
    rows: BTreeMap<String, BTreeMap<TeamId, StandingsRow>>,
    counted: BTreeMap<MatchId, Match>,
}

impl StandingsTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute from scratch by applying every finalized match in order.
    pub fn from_matches(matches: &[Match], config: &CompetitionConfig) -> EngineResult<Self> {
        let mut table = Self::new();
        for m in matches.iter().filter(|m| m.is_finalized()) {
            table.apply_result(m, config)?;
        }
        Ok(table)
    }

    /// Whether this match has already been counted.
    pub fn is_counted(&self, match_id: MatchId) -> bool {
        self.counted.contains_key(&match_id)
    }

    /// Apply one finalized match to both teams' rows and return the category, ranked.
    ///
    /// Applying the same result again changes nothing. A counted match that comes back with a
    /// different score or different teams is rejected. Validation happens before any row changes.
    pub fn apply_result(
        &mut self,
        m: &Match,
        config: &CompetitionConfig,
    ) -> EngineResult<Vec<StandingsRow>> {
        if !m.is_finalized() {
            return Err(EngineError::InvalidResult(format!(
                "match {} is not finalized",
                m.id
            )));
        }
        if let Some(previous) = self.counted.get(&m.id) {
            if previous.score == m.score
                && previous.team_a == m.team_a
                && previous.team_b == m.team_b
            {
                log::debug!("match {} already counted, skipping", m.id);
                return Ok(self.ranked(&m.category, config));
            }
            return Err(EngineError::InvalidResult(format!(
                "match {} was already counted with a different result",
                m.id
            )));
        }

        if m.is_bye() {
            let team = m.team_a_id().ok_or_else(|| {
                EngineError::InvalidResult(format!("bye {} has no team", m.id))
            })?;
            let as_win = matches!(
                config.format,
                Format::Swiss {
                    bye_counts_as_win: true,
                    ..
                }
            );
            let row = self.row_mut(&m.category, team);
            if as_win {
                row.record_bye(config.points.win);
            }
        } else {
            let (a, b) = m.teams().ok_or_else(|| {
                EngineError::InvalidResult(format!("match {} has an undecided opponent", m.id))
            })?;
            if a == b {
                return Err(EngineError::InvalidResult(format!(
                    "match {} pits {} against itself",
                    m.id, a
                )));
            }
            let score = m.score.ok_or_else(|| {
                EngineError::InvalidResult(format!("match {} has no score", m.id))
            })?;
            let points = config.points;
            let (points_a, points_b) = match score.a.cmp(&score.b) {
                std::cmp::Ordering::Greater => (points.win, points.loss),
                std::cmp::Ordering::Equal => (points.draw, points.draw),
                std::cmp::Ordering::Less => (points.loss, points.win),
            };
            self.row_mut(&m.category, a)
                .record(score.a, score.b, points_a);
            self.row_mut(&m.category, b)
                .record(score.b, score.a, points_b);
        }

        self.counted.insert(m.id, m.clone());
        Ok(self.ranked(&m.category, config))
    }

    fn row_mut(&mut self, category: &str, team: &TeamId) -> &mut StandingsRow {
        self.rows
            .entry(category.to_string())
            .or_default()
            .entry(team.clone())
            .or_insert_with(|| StandingsRow::new(team.clone(), category))
    }

    /// Rows of a category in team id order, not ranked.
    pub fn rows(&self, category: &str) -> Vec<StandingsRow> {
        self.rows
            .get(category)
            .map(|rows| rows.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Counted matches of a category.
    pub fn counted_matches(&self, category: &str) -> Vec<Match> {
        self.counted
            .values()
            .filter(|m| m.category == category)
            .cloned()
            .collect()
    }

    /// Ranked rows of a category.
    pub fn ranked(&self, category: &str, config: &CompetitionConfig) -> Vec<StandingsRow> {
        rank_category(
            self.rows(category),
            config,
            &self.counted_matches(category),
        )
    }
}

/// Sort rows by points, then by `config.tie_break_order`, and number the positions.
///
/// Each criterion only splits rows still tied on everything before it. Head-to-head uses the
/// finalized matches between the tied teams; it is skipped for a tied set in which some pair
/// never met. Ties left after the chain fall back to team id, so the order is always total and
/// does not depend on the input order.
pub fn rank_category(
    mut rows: Vec<StandingsRow>,
    config: &CompetitionConfig,
    matches: &[Match],
) -> Vec<StandingsRow> {
    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| a.team_id.cmp(&b.team_id))
    });
    let mut blocks = split_by(rows, |r| Reverse(r.points));

    for criterion in config
        .tie_break_order
        .iter()
        .chain(std::iter::once(&TieBreak::Alphabetical))
    {
        blocks = blocks
            .into_iter()
            .flat_map(|block| {
                if block.len() < 2 {
                    vec![block]
                } else {
                    refine(block, *criterion, config, matches)
                }
            })
            .collect();
    }

    blocks
        .into_iter()
        .flatten()
        .enumerate()
        .map(|(i, mut row)| {
            row.position = i as u32 + 1;
            row
        })
        .collect()
}

fn refine(
    block: Vec<StandingsRow>,
    criterion: TieBreak,
    config: &CompetitionConfig,
    matches: &[Match],
) -> Vec<Vec<StandingsRow>> {
    match criterion {
        TieBreak::GoalDifference => split_by(block, |r| Reverse(r.goal_difference)),
        TieBreak::GoalsFor => split_by(block, |r| Reverse(r.goals_for)),
        TieBreak::Alphabetical => split_by(block, |r| r.team_id.clone()),
        TieBreak::HeadToHead => match head_to_head_points(&block, config, matches) {
            Some(points) => split_by(block, |r| {
                Reverse(points.get(&r.team_id).copied().unwrap_or_default())
            }),
            None => vec![block],
        },
    }
}

/// Points earned only in matches among the tied teams, or `None` if some pair of them never met.
fn head_to_head_points(
    block: &[StandingsRow],
    config: &CompetitionConfig,
    matches: &[Match],
) -> Option<BTreeMap<TeamId, i32>> {
    let tied: HashSet<&str> = block.iter().map(|r| r.team_id.as_str()).collect();
    let mut met: HashSet<(&str, &str)> = HashSet::new();
    let mut points: BTreeMap<TeamId, i32> = BTreeMap::new();

    for m in matches.iter().filter(|m| m.is_finalized()) {
        let (Some((a, b)), Some(score)) = (m.teams(), m.score) else {
            continue;
        };
        if !tied.contains(a.as_str()) || !tied.contains(b.as_str()) {
            continue;
        }
        met.insert(if a <= b {
            (a.as_str(), b.as_str())
        } else {
            (b.as_str(), a.as_str())
        });
        let (pa, pb) = match score.a.cmp(&score.b) {
            std::cmp::Ordering::Greater => (config.points.win, config.points.loss),
            std::cmp::Ordering::Equal => (config.points.draw, config.points.draw),
            std::cmp::Ordering::Less => (config.points.loss, config.points.win),
        };
        *points.entry(a.clone()).or_default() += pa;
        *points.entry(b.clone()).or_default() += pb;
    }

    let pairs = block.len() * (block.len() - 1) / 2;
    (met.len() == pairs).then_some(points)
}

/// Stable sort by `key`, then cut into runs of equal keys.
fn split_by<K: Ord>(
    mut block: Vec<StandingsRow>,
    key: impl Fn(&StandingsRow) -> K,
) -> Vec<Vec<StandingsRow>> {
    block.sort_by_key(&key);
    let mut out: Vec<Vec<StandingsRow>> = Vec::new();
    let mut last: Option<K> = None;
    for row in block {
        let k = key(&row);
        if last.as_ref() == Some(&k) {
            if let Some(run) = out.last_mut() {
                run.push(row);
            }
        } else {
            out.push(vec![row]);
        }
        last = Some(k);
    }
    out
}
