//! Sports competition engine: fixture generation per format and incremental standings.

pub mod logic;
pub mod models;

pub use logic::{
    advance_bracket, ensure_unpopulated, generate_fixtures, generate_or_existing,
    knockout_from_groups, knockout_or_existing, next_swiss_round, rank_category, record_result,
    roster_with_groups, swiss_round_or_open, FixtureSet, Group, Pairing, StandingsTable,
};
pub use models::{
    parse_roster_csv, CompetitionConfig, CompetitionId, EngineError, EngineResult, Format, Match,
    MatchId, MatchState, Phase, PointValues, ResultEvent, Score, Slot, StandingsRow, Team, TeamId,
    TieBreak, MAX_SCORE,
};
