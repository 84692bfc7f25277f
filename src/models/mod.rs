//! Data structures for competitions: teams, configuration, matches, standings.

mod config;
mod error;
mod game;
mod standings;
mod team;

pub use config::{CompetitionConfig, CompetitionId, Format, PointValues, TieBreak};
pub use error::{EngineError, EngineResult};
pub use game::{fixture_id, Match, MatchId, MatchState, Phase, ResultEvent, Score, Slot, MAX_SCORE};
pub use standings::StandingsRow;
pub use team::{parse_roster_csv, Team, TeamId};
