//! Seed order shared by all formats.

use crate::models::{Team, TeamId};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Team ids strongest first: explicit seeds ascending, then unseeded teams in registration
/// order (or in drawn order when `draw_seed` is set). Equal explicit seeds keep registration order.
pub fn seed_order(teams: &[Team], draw_seed: Option<u64>) -> Vec<TeamId> {
    let mut seeded: Vec<&Team> = teams.iter().filter(|t| t.seed.is_some()).collect();
    seeded.sort_by_key(|t| t.seed);

    let mut unseeded: Vec<&Team> = teams.iter().filter(|t| t.seed.is_none()).collect();
    if let Some(seed) = draw_seed {
        let mut rng = StdRng::seed_from_u64(seed);
        unseeded.shuffle(&mut rng);
    }

    seeded
        .into_iter()
        .chain(unseeded)
        .map(|t| t.id.clone())
        .collect()
}
