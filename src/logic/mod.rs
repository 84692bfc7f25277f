//! Fixture and standings engine: schedulers per format, orchestration, ranking.

pub mod fixtures;
pub mod groups;
pub mod knockout;
pub mod round_robin;
pub mod seeding;
pub mod standings;
pub mod swiss;

pub use fixtures::{
    advance_bracket, ensure_unpopulated, generate_fixtures, generate_or_existing,
    knockout_from_groups, knockout_or_existing, next_swiss_round, record_result,
    roster_with_groups, swiss_round_or_open, FixtureSet,
};
pub use groups::Group;
pub use round_robin::Pairing;
pub use standings::{rank_category, StandingsTable};
pub use swiss::{SwissEntrant, SwissRound};
