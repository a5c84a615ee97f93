//! Episodic memory store with TTL, importance ranking, and retrieval.
//!
//! Memories are per-entity, dated, and importance-weighted. Retrieval
//! ranks by importance then recency; cleanup deletes expired episodes
//! unless they are pinned (importance at or above 0.8). The runtime runs
//! cleanup every 100 ticks per entity.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use genesis_types::{EntityId, EpisodeId, MemoryEpisode, Vec3, memory_types};
use tracing::debug;

/// TTL in ticks for an episode of the given memory type.
///
/// Visions from the god outlive everything else; threat memories fade
/// fastest.
pub fn default_ttl(memory_type: &str) -> u64 {
    match memory_type {
        memory_types::DIVINE_VISION => 50_000,
        memory_types::TERRITORY => 20_000,
        memory_types::THREAT => 3_000,
        memory_types::CODE_MEMORY => 5_000,
        memory_types::CONVERSATION => 8_000,
        _ => 10_000,
    }
}

/// Per-entity episodic memory store.
#[derive(Debug, Default)]
pub struct MemoryManager {
    episodes: RwLock<BTreeMap<EntityId, Vec<MemoryEpisode>>>,
}

impl MemoryManager {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an episodic memory with the default TTL for its type.
    #[allow(clippy::too_many_arguments)]
    pub fn add_episodic(
        &self,
        entity_id: EntityId,
        summary: &str,
        importance: f64,
        tick: u64,
        related: Vec<EntityId>,
        location: Vec3,
        memory_type: &str,
    ) -> EpisodeId {
        self.add_episodic_with_ttl(
            entity_id,
            summary,
            importance,
            tick,
            related,
            location,
            memory_type,
            default_ttl(memory_type),
        )
    }

    /// Insert an episodic memory with an explicit TTL.
    #[allow(clippy::too_many_arguments)]
    pub fn add_episodic_with_ttl(
        &self,
        entity_id: EntityId,
        summary: &str,
        importance: f64,
        tick: u64,
        related: Vec<EntityId>,
        location: Vec3,
        memory_type: &str,
        ttl: u64,
    ) -> EpisodeId {
        let episode = MemoryEpisode {
            id: EpisodeId::new(),
            entity_id,
            summary: summary.to_owned(),
            importance: importance.clamp(0.0, 1.0),
            tick,
            related,
            location,
            memory_type: memory_type.to_owned(),
            ttl,
        };
        let id = episode.id;
        let mut episodes = self
            .episodes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        episodes.entry(entity_id).or_default().push(episode);
        id
    }

    /// Top `limit` episodes ranked by importance desc then recency desc,
    /// rendered as bullet lines for LLM prompts.
    ///
    /// Returns a fixed placeholder line when the entity has no memories.
    pub fn summarize_for_prompt(&self, entity_id: EntityId, limit: usize) -> String {
        let mut ranked = self.episodes_for(entity_id);
        ranked.sort_by(|a, b| {
            b.importance
                .total_cmp(&a.importance)
                .then(b.tick.cmp(&a.tick))
        });
        if ranked.is_empty() {
            return String::from("- No memories formed yet.");
        }
        ranked
            .iter()
            .take(limit)
            .map(|e| format!("- {}", e.summary))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Delete expired, unpinned episodes for one entity.
    ///
    /// Idempotent: a second call at the same tick removes nothing.
    /// Returns the number of episodes removed.
    pub fn cleanup_expired(&self, entity_id: EntityId, now_tick: u64) -> usize {
        let mut episodes = self
            .episodes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(owned) = episodes.get_mut(&entity_id) else {
            return 0;
        };
        let before = owned.len();
        owned.retain(|e| !e.expired(now_tick));
        let removed = before - owned.len();
        if removed > 0 {
            debug!(%entity_id, removed, now_tick, "expired memories cleaned up");
        }
        removed
    }

    /// All episodes for one entity (clones).
    pub fn episodes_for(&self, entity_id: EntityId) -> Vec<MemoryEpisode> {
        self.episodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity_id)
            .cloned()
            .unwrap_or_default()
    }

    /// The `limit` most recent episodes by tick, newest first.
    pub fn recent_for(&self, entity_id: EntityId, limit: usize) -> Vec<MemoryEpisode> {
        let mut episodes = self.episodes_for(entity_id);
        episodes.sort_by(|a, b| b.tick.cmp(&a.tick));
        episodes.truncate(limit);
        episodes
    }

    /// How many episodes of a given memory type the entity holds.
    pub fn count_of_type(&self, entity_id: EntityId, memory_type: &str) -> usize {
        self.episodes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity_id)
            .map_or(0, |episodes| {
                episodes
                    .iter()
                    .filter(|e| e.memory_type == memory_type)
                    .count()
            })
    }
}
