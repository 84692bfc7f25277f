//! Team data structure and roster import.

use crate::models::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;

/// Unique identifier for a team. Compared as a string for the alphabetical tie-break.
pub type TeamId = String;

/// A registered team. Identity is fixed for the whole competition run.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    pub category: String,
    /// Group label, set by the group allocator.
    #[serde(default)]
    pub group: Option<String>,
    /// Explicit seed rank (1 is strongest). `None` falls back to registration order.
    #[serde(default)]
    pub seed: Option<u32>,
}

impl Team {
    pub fn new(id: impl Into<TeamId>, name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: category.into(),
            group: None,
            seed: None,
        }
    }

    /// Builder-style seed setter.
    pub fn with_seed(mut self, seed: u32) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Deserialize)]
struct RosterRecord {
    id: String,
    name: String,
    category: String,
    #[serde(default)]
    seed: Option<u32>,
}

/// Read a roster from CSV with header `id,name,category,seed` (seed may be empty).
/// Rejects blank ids and ids repeated within a category.
pub fn parse_roster_csv<R: Read>(reader: R) -> EngineResult<Vec<Team>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut seen = HashSet::new();
    let mut teams = Vec::new();
    for (line, record) in rdr.deserialize::<RosterRecord>().enumerate() {
        let record = record.map_err(|e| EngineError::Roster(e.to_string()))?;
        if record.id.is_empty() {
            return Err(EngineError::Roster(format!("row {}: empty team id", line + 1)));
        }
        if !seen.insert((record.category.clone(), record.id.clone())) {
            return Err(EngineError::Roster(format!(
                "row {}: duplicate team id {} in category {}",
                line + 1,
                record.id,
                record.category
            )));
        }
        teams.push(Team {
            id: record.id,
            name: record.name,
            category: record.category,
            group: None,
            seed: record.seed,
        });
    }
    Ok(teams)
}
