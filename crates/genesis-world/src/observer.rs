//! Tracking of human observers watching individual entities.
//!
//! The frontend reports camera focus; the runtime reads per-entity
//! observer counts to drive meta-awareness. The tracker is the fallback
//! source -- the primary is the count synced into entity state.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use genesis_types::EntityId;

/// Per-entity observer counts.
#[derive(Debug, Default)]
pub struct ObserverTracker {
    counts: RwLock<BTreeMap<EntityId, u32>>,
}

impl ObserverTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of observers watching an entity.
    pub fn set_observers(&self, entity_id: EntityId, count: u32) {
        let mut counts = self.counts.write().unwrap_or_else(PoisonError::into_inner);
        if count == 0 {
            counts.remove(&entity_id);
        } else {
            counts.insert(entity_id, count);
        }
    }

    /// How many observers are watching an entity right now.
    pub fn observer_count(&self, entity_id: EntityId) -> u32 {
        self.counts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity_id)
            .copied()
            .unwrap_or(0)
    }

    /// Total observers across all entities.
    pub fn total_observers(&self) -> u64 {
        self.counts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .map(|c| u64::from(*c))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_round_trip() {
        let tracker = ObserverTracker::new();
        let watched = EntityId::new();
        assert_eq!(tracker.observer_count(watched), 0);

        tracker.set_observers(watched, 3);
        assert_eq!(tracker.observer_count(watched), 3);
        assert_eq!(tracker.total_observers(), 3);

        tracker.set_observers(watched, 0);
        assert_eq!(tracker.observer_count(watched), 0);
    }
}
