//! Match, Slot, Phase and result types.

use crate::models::config::CompetitionId;
use crate::models::error::{EngineError, EngineResult};
use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a match. Derived from the match's place in the fixture.
pub type MatchId = Uuid;

/// Highest score accepted for one side.
pub const MAX_SCORE: u32 = 999;

/// Stage of the competition a match belongs to.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    League,
    GroupStage,
    Swiss,
    /// Knockout round with this many teams left (16, 32, ...).
    RoundOf(u32),
    QuarterFinal,
    SemiFinal,
    ThirdPlace,
    Final,
}

impl Phase {
    /// Knockout label for a round that starts with `teams` teams.
    pub fn for_remaining(teams: u32) -> Self {
        match teams {
            2 => Phase::Final,
            4 => Phase::SemiFinal,
            8 => Phase::QuarterFinal,
            n => Phase::RoundOf(n),
        }
    }

    pub fn is_knockout(&self) -> bool {
        !matches!(self, Phase::League | Phase::GroupStage | Phase::Swiss)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::League => write!(f, "league"),
            Phase::GroupStage => write!(f, "group_stage"),
            Phase::Swiss => write!(f, "swiss"),
            Phase::RoundOf(n) => write!(f, "round_of_{}", n),
            Phase::QuarterFinal => write!(f, "quarter_final"),
            Phase::SemiFinal => write!(f, "semi_final"),
            Phase::ThirdPlace => write!(f, "third_place"),
            Phase::Final => write!(f, "final"),
        }
    }
}

/// One side of a match: a known team or a reference to an earlier match's outcome.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Slot {
    Team(TeamId),
    WinnerOf(MatchId),
    LoserOf(MatchId),
}

impl Slot {
    pub fn team(&self) -> Option<&TeamId> {
        match self {
            Slot::Team(id) => Some(id),
            _ => None,
        }
    }
}

/// Lifecycle: `Scheduled` (both teams known at generation) or
/// `PendingOpponent` → `Ready` (knockout scaffold filled in), then `Finalized`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchState {
    #[default]
    Scheduled,
    PendingOpponent,
    Ready,
    Finalized,
}

/// Final score, team A first.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub a: u32,
    pub b: u32,
}

impl Score {
    /// Validate raw scores from a result event.
    pub fn checked(a: i64, b: i64) -> EngineResult<Self> {
        let check = |v: i64| {
            u32::try_from(v)
                .ok()
                .filter(|v| *v <= MAX_SCORE)
                .ok_or_else(|| {
                    EngineError::InvalidResult(format!("score {} outside 0..={}", v, MAX_SCORE))
                })
        };
        Ok(Self {
            a: check(a)?,
            b: check(b)?,
        })
    }
}

/// Score entry for an existing match, as delivered by the score-entry UI.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ResultEvent {
    pub match_id: MatchId,
    pub score_a: i64,
    pub score_b: i64,
}

/// A scheduled match. `team_b == None` is a bye.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub competition_id: CompetitionId,
    pub category: String,
    pub phase: Phase,
    /// Round number within the category, starting at 1.
    pub round: u32,
    pub group: Option<String>,
    pub team_a: Slot,
    pub team_b: Option<Slot>,
    pub state: MatchState,
    /// None until finalized.
    pub score: Option<Score>,
}

impl Match {
    /// A playable match between two known teams.
    #[allow(clippy::too_many_arguments)]
    pub fn scheduled(
        competition_id: CompetitionId,
        category: &str,
        phase: Phase,
        round: u32,
        group: Option<&str>,
        slot: usize,
        team_a: TeamId,
        team_b: TeamId,
    ) -> Self {
        Self {
            id: fixture_id(competition_id, category, phase, round, group, slot),
            competition_id,
            category: category.to_string(),
            phase,
            round,
            group: group.map(str::to_string),
            team_a: Slot::Team(team_a),
            team_b: Some(Slot::Team(team_b)),
            state: MatchState::Scheduled,
            score: None,
        }
    }

    pub fn team_a_id(&self) -> Option<&TeamId> {
        self.team_a.team()
    }

    pub fn team_b_id(&self) -> Option<&TeamId> {
        self.team_b.as_ref().and_then(Slot::team)
    }

    pub fn is_bye(&self) -> bool {
        self.team_b.is_none()
    }

    pub fn is_finalized(&self) -> bool {
        self.state == MatchState::Finalized
    }

    /// True if the given team is known to play in this match.
    pub fn involves(&self, team: &str) -> bool {
        self.team_a_id().is_some_and(|t| t == team) || self.team_b_id().is_some_and(|t| t == team)
    }

    /// Both concrete team ids, if known.
    pub fn teams(&self) -> Option<(&TeamId, &TeamId)> {
        Some((self.team_a_id()?, self.team_b_id()?))
    }

    /// Winner of a finalized, decided match. A bye's team counts as the winner.
    pub fn winner(&self) -> Option<&TeamId> {
        if !self.is_finalized() {
            return None;
        }
        if self.is_bye() {
            return self.team_a_id();
        }
        let score = self.score?;
        if score.a > score.b {
            self.team_a_id()
        } else if score.b > score.a {
            self.team_b_id()
        } else {
            None
        }
    }

    /// Loser of a finalized, decided, non-bye match.
    pub fn loser(&self) -> Option<&TeamId> {
        let score = self.score?;
        if !self.is_finalized() {
            return None;
        }
        if score.a > score.b {
            self.team_b_id()
        } else if score.b > score.a {
            self.team_a_id()
        } else {
            None
        }
    }
}

/// Stable id for the match at this position of a category's fixture.
pub fn fixture_id(
    competition_id: CompetitionId,
    category: &str,
    phase: Phase,
    round: u32,
    group: Option<&str>,
    slot: usize,
) -> MatchId {
    let key = format!(
        "{}/{}/{}/{}/{}",
        category,
        phase,
        round,
        group.unwrap_or("-"),
        slot
    );
    Uuid::new_v5(&competition_id, key.as_bytes())
}
