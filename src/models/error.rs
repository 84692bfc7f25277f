//! Error taxonomy for fixture generation and standings.

use crate::models::game::MatchId;
use thiserror::Error;

/// Errors returned by the engine. All of them are deterministic functions of the input.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum EngineError {
    /// Invalid or contradictory competition configuration.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Fewer teams than the chosen format needs.
    #[error("Not enough teams: need at least {required}, have {actual}")]
    InsufficientParticipants { required: usize, actual: usize },

    /// The category already holds a fixture set.
    #[error("Category {category} already has {existing} generated matches")]
    IdempotencyViolation { category: String, existing: usize },

    /// Result rejected; nothing was changed.
    #[error("Invalid result: {0}")]
    InvalidResult(String),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    /// A stage was requested before the previous one finished.
    #[error("Stage not complete: {0}")]
    StageIncomplete(String),

    #[error("Invalid roster: {0}")]
    Roster(String),
}

pub type EngineResult<T> = Result<T, EngineError>;
