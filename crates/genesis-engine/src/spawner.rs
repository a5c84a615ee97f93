//! Seeding the world with its first beings.
//!
//! The first generation spawns near the origin with fully random
//! personalities and drawn names. Later beings come from the god's
//! `spawn_ai` interventions instead.

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tracing::info;

use genesis_agents::spawn;
use genesis_core::runner::WorldState;
use genesis_types::Vec3;

/// Names drawn for the first generation; the god invents the rest.
const FOUNDER_NAMES: [&str; 12] = [
    "Ash", "Vale", "Moss", "Reed", "Wren", "Sol", "Ember", "Slate", "Fern", "Orin",
    "Juno", "Pax",
];

/// Spawn radius for the first generation.
const SPAWN_RADIUS: f64 = 40.0;

/// Spawn the first generation of native entities.
///
/// Deterministic for a given seed: names, positions, and personalities
/// all derive from it.
pub fn seed_world(state: &mut WorldState, count: u32, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);

    for i in 0..count {
        let name = FOUNDER_NAMES
            .choose(&mut rng)
            .map_or_else(|| spawn::generated_name(&mut rng), |n| (*n).to_owned());
        // Avoid duplicate founder names within one world.
        let name = if state.entities.values().any(|e| e.name == name) {
            format!("{name}-{i}")
        } else {
            name
        };

        let position = Vec3::new(
            rng.random_range(-SPAWN_RADIUS..=SPAWN_RADIUS),
            0.0,
            rng.random_range(-SPAWN_RADIUS..=SPAWN_RADIUS),
        );
        let personality = spawn::random_personality(&mut rng, &[]);
        let entity = spawn::spawn_native(&name, position, personality, 0);

        info!(name = %entity.name, x = position.x, z = position.z, "seeded entity");
        state.entities.insert(entity.id, entity);
    }
}
