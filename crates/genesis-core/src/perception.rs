//! Limited perception for entities -- they can only see and hear what is
//! within range and line of sight, creating emergent fog of war.
//!
//! Vision: entities within `vision_range` and inside the horizontal view
//! cone, with any solid voxel on the sight line blocking fully.
//! Hearing: sound sources within `hearing_range`, attenuated by distance
//! and halved per wall; low clarity degrades content and hides the
//! source. Threat sensing ignores the cone -- hostility is felt, not
//! seen.

use std::collections::BTreeMap;

use genesis_agents::meta;
use genesis_types::{
    DetailLevel, Entity, EntityId, PerceivedSound, Perception, SoundSource, Vec3,
    VisibleEntity,
};
use genesis_world::VoxelEngine;

use crate::config::PerceptionConfig;

/// Placeholder for speech too faint to make out.
pub const UNCLEAR_CONTENT: &str = "[unclear]";

/// Maximum samples along one occlusion trace.
const MAX_TRACE_STEPS: usize = 500;

/// Angle tolerance so the cone boundary is inclusive despite floating
/// point error in the dot product.
const ANGLE_EPSILON_DEG: f64 = 1e-6;

/// Aggression above which a nearby entity reads as a threat.
const THREAT_AGGRESSION: f64 = 0.8;

/// A named structure fed into perception assembly.
#[derive(Debug, Clone)]
pub struct StructureInfo {
    /// Structure name.
    pub name: String,
    /// Structure kind label.
    pub kind: String,
    /// Structure position.
    pub position: Vec3,
}

/// Build one entity's perception snapshot.
///
/// `known_names` maps the entities the perceiver has met to their names;
/// anyone else is seen but nameless. `sounds` are the active sound
/// sources this tick (speech from the previous tick, typically).
pub fn perceive(
    perceiver: &Entity,
    all_entities: &[Entity],
    voxels: &VoxelEngine,
    known_names: &BTreeMap<EntityId, String>,
    sounds: &[SoundSource],
    structures: &[StructureInfo],
    config: &PerceptionConfig,
) -> Perception {
    let mut perception = Perception::default();
    let origin = perceiver.position;
    let facing = perceiver.facing;

    // ----- Vision and threat sensing -----
    for other in all_entities {
        if other.id == perceiver.id || !other.alive {
            continue;
        }

        let distance = other.position.distance(origin);
        if distance > config.vision_range {
            continue;
        }

        let observed = VisibleEntity {
            id: other.id,
            name: known_names.get(&other.id).cloned(),
            position: other.position,
            distance,
            detail: if distance < config.high_detail_distance {
                DetailLevel::High
            } else {
                DetailLevel::Low
            },
            behavior_mode: other.state.behavior_mode,
        };

        // Threats are sensed without the cone: rampaging entities in
        // visual range, or the openly aggressive within earshot.
        let rampaging = other.state.behavior_mode == genesis_types::BehaviorMode::Rampage;
        let menacing = other.personality.aggression > THREAT_AGGRESSION
            && distance < config.hearing_range;
        if rampaging || menacing {
            perception.threats.push(observed.clone());
        }

        // Sight requires the cone and a clear line.
        if !in_view_cone(origin, facing, other.position, config.view_angle) {
            continue;
        }
        if count_walls_between(origin, other.position, voxels) > 0 {
            continue;
        }

        if distance <= config.interaction_range {
            perception.nearby.push(observed.clone());
        }
        perception.visible.push(observed);
    }

    perception
        .visible
        .sort_by(|a, b| a.distance.total_cmp(&b.distance));
    perception
        .nearby
        .sort_by(|a, b| a.distance.total_cmp(&b.distance));
    perception
        .threats
        .sort_by(|a, b| a.distance.total_cmp(&b.distance));

    // ----- Hearing -----
    for sound in sounds {
        if sound.source_id == perceiver.id {
            continue;
        }
        let distance = sound.position.distance(origin);
        if distance > config.hearing_range {
            continue;
        }

        let walls = count_walls_between(origin, sound.position, voxels);
        let clarity = sound_clarity(distance, walls, config.hearing_range);
        if clarity <= 0.0 {
            continue;
        }

        perception.audible.push(PerceivedSound {
            source: (clarity >= 0.5).then_some(sound.source_id),
            content: degrade_content(&sound.content, clarity),
            clarity,
            direction: Some(sound.position.sub(origin).normalized()),
        });
    }
    perception
        .audible
        .sort_by(|a, b| b.clarity.total_cmp(&a.clarity));

    // ----- Structures -----
    for structure in structures {
        let distance = structure.position.distance(origin);
        if distance <= config.vision_range {
            perception.structures.push(genesis_types::NearbyStructure {
                name: structure.name.clone(),
                kind: structure.kind.clone(),
                position: structure.position,
                distance,
            });
        }
    }
    perception
        .structures
        .sort_by(|a, b| a.distance.total_cmp(&b.distance));

    // ----- Meta-awareness hint -----
    perception.awareness_hint =
        meta::awareness_hint(perceiver.meta_awareness).map(ToOwned::to_owned);

    perception
}

/// Whether a target falls inside the horizontal view cone.
///
/// Uses the XZ plane only: entities can look up and down freely but have
/// a limited horizontal field of view. Degenerate cases (target directly
/// above or below, zero facing vector) count as in view. The boundary is
/// inclusive: a target exactly at the half-angle is visible.
pub fn in_view_cone(origin: Vec3, facing: Vec3, target: Vec3, view_angle_deg: f64) -> bool {
    let to_target = target.sub(origin).xz();
    let facing_xz = facing.xz();

    if to_target.length() < 1e-9 || facing_xz.length() < 1e-9 {
        return true;
    }

    let dot = to_target
        .normalized()
        .dot(facing_xz.normalized())
        .clamp(-1.0, 1.0);
    let angle_deg = dot.acos().to_degrees();

    angle_deg <= view_angle_deg / 2.0 + ANGLE_EPSILON_DEG
}

/// Count solid voxels along the line from `start` to `end`.
///
/// Steps in one-unit increments (capped at [`MAX_TRACE_STEPS`]), floors
/// each sample to a voxel coordinate, skips the perceiver's own voxel,
/// and deduplicates consecutive samples that land in the same voxel.
pub fn count_walls_between(start: Vec3, end: Vec3, voxels: &VoxelEngine) -> usize {
    let direction = end.sub(start);
    let total_distance = direction.length();
    if total_distance < 1e-9 {
        return 0;
    }

    let step = direction.normalized();
    let num_steps = (total_distance.floor() as usize).min(MAX_TRACE_STEPS);

    let mut walls = 0;
    let mut previous_voxel: Option<(i64, i64, i64)> = None;

    // Start at 1 to skip the perceiver's own voxel.
    for i in 1..num_steps {
        let t = i as f64;
        let sample = Vec3::new(
            start.x + step.x * t,
            start.y + step.y * t,
            start.z + step.z * t,
        );
        let voxel = sample.voxel();
        if previous_voxel == Some(voxel) {
            continue;
        }
        previous_voxel = Some(voxel);

        if voxels.is_solid(voxel.0, voxel.1, voxel.2) {
            walls += 1;
        }
    }

    walls
}

/// Clarity of a sound: `(1 - d/range) * 0.5^walls`, clamped to `[0, 1]`.
pub fn sound_clarity(distance: f64, walls: usize, hearing_range: f64) -> f64 {
    if distance >= hearing_range {
        return 0.0;
    }
    let distance_factor = 1.0 - distance / hearing_range;
    let wall_factor = 0.5_f64.powi(walls as i32);
    (distance_factor * wall_factor).clamp(0.0, 1.0)
}

/// Degrade speech content by clarity.
///
/// Below 0.3 the content is replaced entirely. Between 0.3 and 0.7,
/// words are dropped by a deterministic index pattern so the same line
/// degrades the same way for every listener at equal clarity.
fn degrade_content(content: &str, clarity: f64) -> String {
    if clarity < 0.3 {
        return String::from(UNCLEAR_CONTENT);
    }
    if clarity >= 0.7 {
        return content.to_owned();
    }

    let words: Vec<&str> = content.split_whitespace().collect();
    if words.len() <= 3 {
        return content.to_owned();
    }

    words
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if (((i * 7 + 3) % 10) as f64) < clarity * 10.0 {
                (*word).to_owned()
            } else {
                String::from("...")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use genesis_agents::spawn;
    use genesis_types::{Material, Personality};

    fn entity_at(name: &str, position: Vec3) -> Entity {
        spawn::spawn_native(name, position, Personality::default(), 0)
    }

    fn facing_z(mut entity: Entity) -> Entity {
        entity.facing = Vec3::new(0.0, 0.0, 1.0);
        entity
    }

    #[test]
    fn view_cone_boundary_is_inclusive() {
        let origin = Vec3::default();
        let facing = Vec3::new(0.0, 0.0, 1.0);
        let half = 60.0_f64.to_radians();

        // Exactly at the half-angle.
        let boundary = Vec3::new(half.sin() * 10.0, 0.0, half.cos() * 10.0);
        assert!(in_view_cone(origin, facing, boundary, 120.0));

        // One degree beyond.
        let outside_angle = 61.0_f64.to_radians();
        let outside = Vec3::new(outside_angle.sin() * 10.0, 0.0, outside_angle.cos() * 10.0);
        assert!(!in_view_cone(origin, facing, outside, 120.0));

        // Directly above: degenerate, counts as visible.
        assert!(in_view_cone(origin, facing, Vec3::new(0.0, 10.0, 0.0), 120.0));
    }

    #[test]
    fn wall_blocks_vision_but_attenuates_sound() {
        let voxels = VoxelEngine::new();
        let config = PerceptionConfig::default();

        let perceiver = facing_z(entity_at("A", Vec3::new(0.0, 1.0, 0.0)));
        let other = entity_at("B", Vec3::new(0.0, 1.0, 10.0));

        // Clear line: B is visible.
        let clear = perceive(
            &perceiver,
            &[other.clone()],
            &voxels,
            &BTreeMap::new(),
            &[],
            &[],
            &config,
        );
        assert_eq!(clear.visible.len(), 1);

        // One solid voxel on the line hides B entirely.
        voxels
            .place_block(0, 1, 5, "#888888", Material::Solid, perceiver.id, 1)
            .unwrap();
        let sounds = [SoundSource {
            source_id: other.id,
            position: other.position,
            content: String::from("hello there"),
        }];
        let blocked = perceive(
            &perceiver,
            &[other],
            &voxels,
            &BTreeMap::new(),
            &sounds,
            &[],
            &config,
        );
        assert!(blocked.visible.is_empty());

        // But B is still audible at (1 - 10/150) * 0.5.
        assert_eq!(blocked.audible.len(), 1);
        let expected = (1.0 - 10.0 / 150.0) * 0.5;
        let clarity = blocked.audible.first().map_or(0.0, |s| s.clarity);
        assert!((clarity - expected).abs() < 1e-9);
    }

    #[test]
    fn one_wall_halves_clarity() {
        assert!((sound_clarity(0.0, 1, 150.0) - 0.5).abs() < f64::EPSILON);
        assert!((sound_clarity(0.0, 2, 150.0) - 0.25).abs() < f64::EPSILON);
        assert!(sound_clarity(150.0, 0, 150.0).abs() < f64::EPSILON);
    }

    #[test]
    fn clarity_floor_governs_content() {
        assert_eq!(degrade_content("meet me at the tower tonight", 0.2), UNCLEAR_CONTENT);
        // 0.3 is the inclusive floor for content visibility.
        let at_floor = degrade_content("meet me at the tower tonight", 0.3);
        assert_ne!(at_floor, UNCLEAR_CONTENT);
        assert_eq!(
            degrade_content("meet me at the tower tonight", 0.9),
            "meet me at the tower tonight"
        );
        // Partial clarity drops words deterministically.
        let partial_a = degrade_content("meet me at the tower tonight", 0.5);
        let partial_b = degrade_content("meet me at the tower tonight", 0.5);
        assert_eq!(partial_a, partial_b);
        assert!(partial_a.contains("..."));
    }

    #[test]
    fn quiet_sources_are_anonymous() {
        let voxels = VoxelEngine::new();
        let config = PerceptionConfig::default();
        let perceiver = facing_z(entity_at("A", Vec3::default()));
        let far_speaker = entity_at("B", Vec3::new(0.0, 0.0, 100.0));

        // Clarity at 100 units: 1 - 100/150 = 0.33 -> audible, unnamed.
        let sounds = [SoundSource {
            source_id: far_speaker.id,
            position: far_speaker.position,
            content: String::from("a secret worth keeping from strangers"),
        }];
        let perception = perceive(
            &perceiver,
            &[far_speaker],
            &voxels,
            &BTreeMap::new(),
            &sounds,
            &[],
            &config,
        );
        let sound = perception.audible.first().unwrap();
        assert!(sound.source.is_none());
        assert!(sound.clarity < 0.5);
    }

    #[test]
    fn names_come_only_from_the_known_map() {
        let voxels = VoxelEngine::new();
        let config = PerceptionConfig::default();
        let perceiver = facing_z(entity_at("A", Vec3::default()));
        let known = entity_at("Known", Vec3::new(0.0, 0.0, 5.0));
        let stranger = entity_at("Stranger", Vec3::new(2.0, 0.0, 5.0));

        let mut names = BTreeMap::new();
        names.insert(known.id, known.name.clone());

        let perception = perceive(
            &perceiver,
            &[known, stranger],
            &voxels,
            &names,
            &[],
            &[],
            &config,
        );
        assert_eq!(perception.visible.len(), 2);
        let named: Vec<Option<&str>> = perception
            .visible
            .iter()
            .map(|v| v.name.as_deref())
            .collect();
        assert!(named.contains(&Some("Known")));
        assert!(named.contains(&None));
    }

    #[test]
    fn rampaging_entities_are_threats_even_behind() {
        let voxels = VoxelEngine::new();
        let config = PerceptionConfig::default();
        let perceiver = facing_z(entity_at("A", Vec3::default()));
        // Behind the perceiver (negative Z), outside the cone.
        let mut berserker = entity_at("B", Vec3::new(0.0, 0.0, -20.0));
        berserker.state.behavior_mode = genesis_types::BehaviorMode::Rampage;

        let perception = perceive(
            &perceiver,
            &[berserker],
            &voxels,
            &BTreeMap::new(),
            &[],
            &[],
            &config,
        );
        assert!(perception.visible.is_empty());
        assert_eq!(perception.threats.len(), 1);
    }
}
