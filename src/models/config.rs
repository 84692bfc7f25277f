//! Competition format parameters.

use crate::models::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

/// Unique identifier for a competition.
pub type CompetitionId = Uuid;

/// Competition format. Each variant carries only the fields that apply to it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Format {
    RoundRobin {
        #[serde(default)]
        double_round_robin: bool,
    },
    SingleElimination {
        #[serde(default)]
        third_place_match: bool,
    },
    GroupsThenKnockout {
        group_count: u32,
        #[serde(default)]
        double_round_robin: bool,
        /// Teams from each group that reach the knockout phase.
        #[serde(default = "default_advance_per_group")]
        advance_per_group: u32,
        #[serde(default)]
        third_place_match: bool,
    },
    Swiss {
        rounds: u32,
        #[serde(default = "default_true")]
        bye_counts_as_win: bool,
    },
}

fn default_advance_per_group() -> u32 {
    2
}

fn default_true() -> bool {
    true
}

/// Points awarded per match outcome.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PointValues {
    pub win: i32,
    pub draw: i32,
    pub loss: i32,
}

impl Default for PointValues {
    fn default() -> Self {
        Self {
            win: 3,
            draw: 1,
            loss: 0,
        }
    }
}

/// Secondary ranking criteria, applied after points.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    GoalDifference,
    GoalsFor,
    HeadToHead,
    /// By team id, ascending. Always last, makes the order total.
    Alphabetical,
}

fn default_tie_break_order() -> Vec<TieBreak> {
    vec![
        TieBreak::GoalDifference,
        TieBreak::GoalsFor,
        TieBreak::HeadToHead,
        TieBreak::Alphabetical,
    ]
}

/// Validated competition parameters.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CompetitionConfig {
    pub competition_id: CompetitionId,
    pub format: Format,
    #[serde(default)]
    pub points: PointValues,
    #[serde(default = "default_tie_break_order")]
    pub tie_break_order: Vec<TieBreak>,
    /// Shuffles unseeded teams reproducibly before placement.
    #[serde(default)]
    pub draw_seed: Option<u64>,
}

impl CompetitionConfig {
    /// New config with default points (3/1/0) and the default tie-break chain.
    pub fn new(competition_id: CompetitionId, format: Format) -> Self {
        Self {
            competition_id,
            format,
            points: PointValues::default(),
            tie_break_order: default_tie_break_order(),
            draw_seed: None,
        }
    }

    pub fn with_points(mut self, win: i32, draw: i32, loss: i32) -> Self {
        self.points = PointValues { win, draw, loss };
        self
    }

    pub fn with_tie_break_order(mut self, order: Vec<TieBreak>) -> Self {
        self.tie_break_order = order;
        self
    }

    pub fn with_draw_seed(mut self, seed: u64) -> Self {
        self.draw_seed = Some(seed);
        self
    }

    /// Check the configuration on its own (team-count checks happen at generation time).
    pub fn validate(&self) -> EngineResult<()> {
        match self.tie_break_order.last() {
            None => {
                return Err(EngineError::Configuration(
                    "tie-break order must not be empty".into(),
                ))
            }
            Some(TieBreak::Alphabetical) => {}
            Some(other) => {
                return Err(EngineError::Configuration(format!(
                    "tie-break order must end with alphabetical, ends with {:?}",
                    other
                )))
            }
        }
        let mut seen = HashSet::new();
        for criterion in &self.tie_break_order {
            if !seen.insert(*criterion) {
                return Err(EngineError::Configuration(format!(
                    "tie-break criterion {:?} listed twice",
                    criterion
                )));
            }
        }
        let p = self.points;
        if p.win < p.draw || p.draw < p.loss {
            return Err(EngineError::Configuration(format!(
                "points must satisfy win >= draw >= loss (got {}/{}/{})",
                p.win, p.draw, p.loss
            )));
        }
        match self.format {
            Format::GroupsThenKnockout {
                group_count,
                advance_per_group,
                ..
            } => {
                if group_count == 0 {
                    return Err(EngineError::Configuration("group count must be at least 1".into()));
                }
                if advance_per_group == 0 {
                    return Err(EngineError::Configuration(
                        "at least one team per group must advance".into(),
                    ));
                }
            }
            Format::Swiss { rounds, .. } if rounds == 0 => {
                return Err(EngineError::Configuration("swiss needs at least one round".into()));
            }
            _ => {}
        }
        Ok(())
    }

    pub fn third_place_match(&self) -> bool {
        match self.format {
            Format::SingleElimination { third_place_match }
            | Format::GroupsThenKnockout {
                third_place_match, ..
            } => third_place_match,
            _ => false,
        }
    }
}
