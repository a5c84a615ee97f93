//! Pairwise directed relationship state.
//!
//! Seven axes per directed pair. Events apply deltas from a fixed table
//! scaled by magnitude; the volatile axes (anger, gratitude, fear) decay
//! multiplicatively toward zero every decay cycle. The manager also
//! renders an axis snapshot into prose for conversation prompts.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use genesis_types::{EntityId, Relationship, RelationshipEvent};
use tracing::debug;

/// Multiplier applied to volatile axes each decay cycle.
pub const DECAY_FACTOR: f64 = 0.9;

/// Decay runs when `tick % DECAY_INTERVAL_TICKS == 0`.
pub const DECAY_INTERVAL_TICKS: u64 = 10;

/// Per-axis deltas for one relationship event at magnitude 1.0.
///
/// Order: trust, familiarity, anger, gratitude, fear, respect, rivalry.
const fn event_deltas(event: RelationshipEvent) -> [f64; 7] {
    match event {
        RelationshipEvent::LongTalk => [2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        RelationshipEvent::Insulted => [-4.0, 0.0, 5.0, 0.0, 0.0, 0.0, 0.0],
        RelationshipEvent::SharedCreation => [3.0, 2.0, 0.0, 0.0, 0.0, 3.0, 0.0],
        RelationshipEvent::CompetedLost => [-3.0, 0.0, 4.0, 0.0, 0.0, 0.0, 4.0],
        RelationshipEvent::CompetedWon => [0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 3.0],
        RelationshipEvent::Helped => [4.0, 1.0, 0.0, 5.0, 0.0, 0.0, 0.0],
        RelationshipEvent::Threatened => [-3.0, 0.0, 0.0, 0.0, 5.0, 0.0, 0.0],
    }
}

/// Directed relationship store keyed by `(source, target)`.
#[derive(Debug, Default)]
pub struct RelationshipManager {
    relationships: RwLock<BTreeMap<(EntityId, EntityId), Relationship>>,
}

impl RelationshipManager {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The relationship from `source` toward `target`, zeros if none.
    pub fn get(&self, source: EntityId, target: EntityId) -> Relationship {
        self.relationships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(source, target))
            .copied()
            .unwrap_or_default()
    }

    /// Apply an event to the `source -> target` relationship.
    ///
    /// Deltas come from the fixed event table scaled by `magnitude`.
    /// Trust is clamped to `[-100, 100]`, all other axes to `[0, 100]`.
    /// Returns the updated snapshot.
    pub fn update(
        &self,
        source: EntityId,
        target: EntityId,
        event: RelationshipEvent,
        magnitude: f64,
        tick: u64,
    ) -> Relationship {
        let [trust, familiarity, anger, gratitude, fear, respect, rivalry] =
            event_deltas(event);

        let mut relationships = self
            .relationships
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let rel = relationships.entry((source, target)).or_default();

        rel.trust = (rel.trust + trust * magnitude).clamp(-100.0, 100.0);
        rel.familiarity = (rel.familiarity + familiarity * magnitude).clamp(0.0, 100.0);
        rel.anger = (rel.anger + anger * magnitude).clamp(0.0, 100.0);
        rel.gratitude = (rel.gratitude + gratitude * magnitude).clamp(0.0, 100.0);
        rel.fear = (rel.fear + fear * magnitude).clamp(0.0, 100.0);
        rel.respect = (rel.respect + respect * magnitude).clamp(0.0, 100.0);
        rel.rivalry = (rel.rivalry + rivalry * magnitude).clamp(0.0, 100.0);

        debug!(%source, %target, ?event, magnitude, tick, "relationship updated");
        *rel
    }

    /// Decay the volatile axes of every relationship `entity` holds.
    pub fn decay_all(&self, entity: EntityId) {
        let mut relationships = self
            .relationships
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for ((source, _), rel) in relationships.iter_mut() {
            if *source != entity {
                continue;
            }
            rel.anger *= DECAY_FACTOR;
            rel.gratitude *= DECAY_FACTOR;
            rel.fear *= DECAY_FACTOR;
        }
    }

    /// All relationships held by one entity, as `(target, snapshot)` pairs.
    pub fn all_for(&self, entity: EntityId) -> Vec<(EntityId, Relationship)> {
        self.relationships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|((source, _), _)| *source == entity)
            .map(|((_, target), rel)| (*target, *rel))
            .collect()
    }
}

/// Render a relationship snapshot into prose for a conversation prompt.
///
/// A familiarity below 5 reads as a first meeting regardless of the
/// other axes.
pub fn describe(rel: &Relationship, other_name: &str) -> String {
    if rel.familiarity < 5.0 {
        return format!(
            "You don't know {other_name}. This is your first real conversation."
        );
    }

    let mut parts: Vec<String> = Vec::new();
    if rel.trust > 50.0 {
        parts.push(format!("You deeply trust {other_name}"));
    } else if rel.trust > 20.0 {
        parts.push(format!("You somewhat trust {other_name}"));
    } else if rel.trust < -50.0 {
        parts.push(format!("You deeply distrust {other_name}"));
    } else if rel.trust < -20.0 {
        parts.push(format!("You distrust {other_name}"));
    }

    if rel.anger > 50.0 {
        parts.push(format!("you are angry at {other_name}"));
    } else if rel.anger > 20.0 {
        parts.push(format!("you are annoyed with {other_name}"));
    }

    if rel.fear > 50.0 {
        parts.push(format!("you fear {other_name}"));
    } else if rel.fear > 20.0 {
        parts.push(format!("you are wary of {other_name}"));
    }

    if rel.respect > 50.0 {
        parts.push(format!("you respect {other_name}"));
    }

    if parts.is_empty() {
        return format!("{other_name} is an acquaintance. No strong feelings.");
    }

    let mut text = parts.join(". ");
    text.push('.');
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_relationship_is_zeroed() {
        let store = RelationshipManager::new();
        let rel = store.get(EntityId::new(), EntityId::new());
        assert!(rel.trust.abs() < f64::EPSILON);
        assert!(rel.familiarity.abs() < f64::EPSILON);
    }

    #[test]
    fn insult_lowers_trust_and_raises_anger() {
        let store = RelationshipManager::new();
        let a = EntityId::new();
        let b = EntityId::new();
        let rel = store.update(a, b, RelationshipEvent::Insulted, 1.0, 50);
        assert!((rel.trust - -4.0).abs() < f64::EPSILON);
        assert!((rel.anger - 5.0).abs() < f64::EPSILON);

        // Direction matters: B's view of A is untouched.
        let reverse = store.get(b, a);
        assert!(reverse.anger.abs() < f64::EPSILON);
    }

    #[test]
    fn magnitude_scales_deltas() {
        let store = RelationshipManager::new();
        let a = EntityId::new();
        let b = EntityId::new();
        let rel = store.update(a, b, RelationshipEvent::SharedCreation, 1.5, 10);
        assert!((rel.trust - 4.5).abs() < 1e-9);
        assert!((rel.respect - 4.5).abs() < 1e-9);
    }

    #[test]
    fn decay_touches_only_volatile_axes() {
        let store = RelationshipManager::new();
        let a = EntityId::new();
        let b = EntityId::new();
        store.update(a, b, RelationshipEvent::Insulted, 10.0, 10);
        store.update(a, b, RelationshipEvent::SharedCreation, 10.0, 10);

        let before = store.get(a, b);
        store.decay_all(a);
        let after = store.get(a, b);

        assert!((after.anger - before.anger * DECAY_FACTOR).abs() < 1e-9);
        assert!((after.respect - before.respect).abs() < f64::EPSILON);
        assert!((after.familiarity - before.familiarity).abs() < f64::EPSILON);
    }

    #[test]
    fn trust_clamps_at_bounds() {
        let store = RelationshipManager::new();
        let a = EntityId::new();
        let b = EntityId::new();
        for _ in 0..100 {
            store.update(a, b, RelationshipEvent::Insulted, 2.0, 1);
        }
        let rel = store.get(a, b);
        assert!((rel.trust - -100.0).abs() < f64::EPSILON);
        assert!((rel.anger - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn describe_first_meeting_and_acquaintance() {
        let stranger = Relationship::default();
        assert!(describe(&stranger, "Ash").contains("first real conversation"));

        let acquaintance = Relationship {
            familiarity: 10.0,
            ..Relationship::default()
        };
        assert!(describe(&acquaintance, "Ash").contains("acquaintance"));

        let feared = Relationship {
            familiarity: 30.0,
            fear: 60.0,
            trust: -60.0,
            ..Relationship::default()
        };
        let text = describe(&feared, "Ash");
        assert!(text.contains("deeply distrust"));
        assert!(text.contains("you fear Ash"));
    }
}
