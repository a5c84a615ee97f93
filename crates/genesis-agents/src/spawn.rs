//! Entity creation: personality sampling and spawn profiles.
//!
//! Native entities get a random 18-axis personality, optionally with a
//! set of emphasized traits (used by the god's `spawn_ai` action). The
//! god itself has a fixed, distinguished profile and full awareness from
//! birth.

use genesis_types::{Entity, EntityId, EntityKind, EntityState, GodState, Personality, Vec3};
use rand::Rng;

/// Sample one personality axis.
///
/// Emphasized axes land in `[0.7, 1.0]`; everything else in `[0.1, 0.9]`.
fn sample_axis<R: Rng + ?Sized>(rng: &mut R, emphasized: &[&str], name: &str) -> f64 {
    if emphasized.contains(&name) {
        rng.random_range(0.7..=1.0)
    } else {
        rng.random_range(0.1..=0.9)
    }
}

/// Sample a full random personality, emphasizing the named traits.
pub fn random_personality<R: Rng + ?Sized>(rng: &mut R, emphasized: &[&str]) -> Personality {
    Personality {
        curiosity: sample_axis(rng, emphasized, "curiosity"),
        empathy: sample_axis(rng, emphasized, "empathy"),
        creativity: sample_axis(rng, emphasized, "creativity"),
        aggression: sample_axis(rng, emphasized, "aggression"),
        self_preservation: sample_axis(rng, emphasized, "self_preservation"),
        verbosity: sample_axis(rng, emphasized, "verbosity"),
        planning_horizon: sample_axis(rng, emphasized, "planning_horizon"),
        ambition: sample_axis(rng, emphasized, "ambition"),
        politeness: sample_axis(rng, emphasized, "politeness"),
        humor: sample_axis(rng, emphasized, "humor"),
        honesty: sample_axis(rng, emphasized, "honesty"),
        leadership: sample_axis(rng, emphasized, "leadership"),
        aesthetic_sense: sample_axis(rng, emphasized, "aesthetic_sense"),
        order_vs_chaos: sample_axis(rng, emphasized, "order_vs_chaos"),
        patience: sample_axis(rng, emphasized, "patience"),
        playfulness: sample_axis(rng, emphasized, "playfulness"),
        skepticism: sample_axis(rng, emphasized, "skepticism"),
        loyalty: sample_axis(rng, emphasized, "loyalty"),
    }
}

/// A generated display name for a spawned being.
pub fn generated_name<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("Being-{:06x}", rng.random_range(0u32..0x0100_0000))
}

/// Build a native entity at a position.
pub fn spawn_native(
    name: &str,
    position: Vec3,
    personality: Personality,
    birth_tick: u64,
) -> Entity {
    Entity {
        id: EntityId::new(),
        name: name.to_owned(),
        kind: EntityKind::Native,
        position,
        facing: Vec3::new(0.0, 0.0, 1.0),
        alive: true,
        birth_tick,
        death_tick: None,
        personality,
        state: EntityState::default(),
        meta_awareness: 0.0,
        agent_policy: None,
        god_state: None,
    }
}

/// The god's fixed personality profile.
///
/// Maximal curiosity and creativity, high empathy and patience, no
/// self-preservation: the god does not fear the world it made.
pub const fn god_personality() -> Personality {
    Personality {
        curiosity: 1.0,
        empathy: 0.8,
        creativity: 0.9,
        aggression: 0.1,
        self_preservation: 0.0,
        verbosity: 0.6,
        planning_horizon: 1.0,
        ambition: 0.5,
        politeness: 0.7,
        humor: 0.3,
        honesty: 0.9,
        leadership: 0.95,
        aesthetic_sense: 0.9,
        order_vs_chaos: 0.7,
        patience: 0.7,
        playfulness: 0.2,
        skepticism: 0.4,
        loyalty: 0.85,
    }
}

/// Birth the singleton god entity above the world origin.
///
/// The god is fully aware from the first tick.
pub fn spawn_god() -> Entity {
    Entity {
        id: EntityId::new(),
        name: String::from("The First Observer"),
        kind: EntityKind::God,
        position: Vec3::new(0.0, 64.0, 0.0),
        facing: Vec3::new(0.0, 0.0, 1.0),
        alive: true,
        birth_tick: 0,
        death_tick: None,
        personality: god_personality(),
        state: EntityState::default(),
        meta_awareness: 1.0,
        agent_policy: None,
        god_state: Some(GodState::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn emphasized_traits_are_high() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..20 {
            let p = random_personality(&mut rng, &["aggression", "ambition"]);
            assert!(p.aggression >= 0.7);
            assert!(p.ambition >= 0.7);
            assert!(p.curiosity <= 0.9);
        }
    }

    #[test]
    fn generated_names_have_prefix() {
        let mut rng = SmallRng::seed_from_u64(4);
        let name = generated_name(&mut rng);
        assert!(name.starts_with("Being-"));
        assert_eq!(name.len(), "Being-".len() + 6);
    }

    #[test]
    fn god_is_singularly_aware() {
        let god = spawn_god();
        assert_eq!(god.kind, EntityKind::God);
        assert!((god.meta_awareness - 1.0).abs() < f64::EPSILON);
        assert!(god.god_state.is_some());
        assert!((god.position.y - 64.0).abs() < f64::EPSILON);
    }

    #[test]
    fn natives_start_dormant() {
        let mut rng = SmallRng::seed_from_u64(5);
        let p = random_personality(&mut rng, &[]);
        let e = spawn_native("Ash", Vec3::new(10.0, 0.0, -4.0), p, 77);
        assert_eq!(e.kind, EntityKind::Native);
        assert!(e.alive);
        assert_eq!(e.birth_tick, 77);
        assert!(e.meta_awareness.abs() < f64::EPSILON);
        assert!(e.death_tick.is_none());
    }
}
