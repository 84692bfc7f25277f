//! Ranking table row.

use crate::models::team::TeamId;
use serde::{Deserialize, Serialize};

/// One team's line in a category's ranking table.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team_id: TeamId,
    pub category: String,
    pub played: u32,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub goals_for: u32,
    pub goals_against: u32,
    pub goal_difference: i32,
    pub points: i32,
    /// 1-based; 0 until the row has been ranked.
    pub position: u32,
}

impl StandingsRow {
    pub fn new(team_id: impl Into<TeamId>, category: impl Into<String>) -> Self {
        Self {
            team_id: team_id.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// Count one played match with the given goals and points.
    pub fn record(&mut self, goals_for: u32, goals_against: u32, points: i32) {
        self.played += 1;
        match goals_for.cmp(&goals_against) {
            std::cmp::Ordering::Greater => self.wins += 1,
            std::cmp::Ordering::Equal => self.draws += 1,
            std::cmp::Ordering::Less => self.losses += 1,
        }
        self.goals_for += goals_for;
        self.goals_against += goals_against;
        self.goal_difference = self.goals_for as i32 - self.goals_against as i32;
        self.points += points;
    }

    /// Count a bye as a goalless win.
    pub fn record_bye(&mut self, points: i32) {
        self.played += 1;
        self.wins += 1;
        self.points += points;
    }
}
