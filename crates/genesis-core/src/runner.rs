//! The fixed-rate world loop.
//!
//! One tick: collect last tick's speech as sound sources, run the pure
//! planning phase for every living entity (concurrently, bounded by
//! `max_entity_concurrency`), apply each entity's tick sequentially in
//! id order (action effects for an entity always complete before its
//! memory and awareness updates), sweep deaths, and run the god
//! cadences. Per-entity planning RNGs are seeded from
//! `(world seed, tick, entity id)`, so a replay with the same seed and
//! the same LLM transcripts resolves actions identically.
//!
//! No error in one entity's tick aborts the tick of any other; the god
//! loop's failures never affect ordinary ticks; an overrunning tick is
//! logged and the loop continues without dropping ticks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use genesis_llm::GodManager;
use genesis_types::{
    Entity, EntityId, EventResult, EventType, SoundSource, TickSummary,
};
use genesis_world::{EventLog, VoxelEngine};

use crate::config::RuntimeConfig;
use crate::runtime::{AgentRuntime, PlannedTick};

/// The mutable world: the entity arena and the tick counter.
///
/// Entities live in one id-indexed table; memories, relationships, and
/// events reference entity ids and hold no back-pointers.
#[derive(Debug, Default)]
pub struct WorldState {
    /// All entities, dead and alive, by id.
    pub entities: BTreeMap<EntityId, Entity>,
    /// The current tick number.
    pub tick: u64,
}

impl WorldState {
    /// An empty world at tick zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of living entities, in id order.
    pub fn living_ids(&self) -> Vec<EntityId> {
        self.entities
            .values()
            .filter(|e| e.alive)
            .map(|e| e.id)
            .collect()
    }
}

/// Drives the world at a fixed tick rate.
pub struct WorldRunner {
    runtime: Arc<AgentRuntime>,
    god: Arc<GodManager>,
    events: Arc<EventLog>,
    voxels: Arc<VoxelEngine>,
    config: RuntimeConfig,
    world_seed: u64,
}

impl WorldRunner {
    /// Wire up the runner.
    pub fn new(
        runtime: Arc<AgentRuntime>,
        god: Arc<GodManager>,
        events: Arc<EventLog>,
        voxels: Arc<VoxelEngine>,
        config: RuntimeConfig,
        world_seed: u64,
    ) -> Self {
        Self {
            runtime,
            god,
            events,
            voxels,
            config,
            world_seed,
        }
    }

    /// Run the loop until the shutdown signal flips true.
    pub async fn run(
        &self,
        state: &mut WorldState,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) {
        let interval_duration = self.config.tick_interval();
        let mut interval = tokio::time::interval(interval_duration);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        info!(
            tick_rate_hz = self.config.tick_rate_hz,
            "world loop started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!(tick = state.tick, "world loop shutting down");
                        return;
                    }
                }
            }

            let started = Instant::now();
            let summaries = self.run_tick(state).await;
            let elapsed = started.elapsed();

            debug!(
                tick = state.tick,
                entities = summaries.len(),
                elapsed_ms = elapsed.as_millis() as u64,
                "tick complete"
            );
            // Soft budget: log the overrun, never drop subsequent ticks.
            if elapsed > interval_duration {
                warn!(
                    tick = state.tick,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "tick overran its budget"
                );
            }
        }
    }

    /// Execute one complete world tick. Public so tests and embedders
    /// can drive the world without the timer.
    pub async fn run_tick(&self, state: &mut WorldState) -> Vec<TickSummary> {
        state.tick += 1;
        let tick = state.tick;

        // Last tick's speech carries into this tick's hearing.
        let sounds = self.collect_sounds(state, tick);

        // --- Planning phase: pure, concurrent, seeded. ---
        let living = state.living_ids();
        let snapshot: Arc<Vec<Entity>> = Arc::new(
            state
                .entities
                .values()
                .filter(|e| e.alive)
                .cloned()
                .collect(),
        );
        let planned = self.plan_phase(&living, &snapshot, &sounds, tick).await;

        // --- Apply phase: sequential, in id order. ---
        let mut summaries = Vec::with_capacity(planned.len());
        for (entity_id, plan) in planned {
            let Some(mut entity) = state.entities.remove(&entity_id) else {
                continue;
            };
            if !entity.alive {
                state.entities.insert(entity_id, entity);
                continue;
            }

            let mut rng = self.entity_rng(tick, entity_id);
            let summary = self
                .runtime
                .apply_tick(&mut entity, plan, &mut state.entities, tick, &mut rng)
                .await;
            state.entities.insert(entity_id, entity);
            summaries.push(summary);
        }

        // --- God cadences (failures never touch entity ticks). ---
        let _ = self
            .god
            .observation_pass(&mut state.entities, &self.voxels, tick)
            .await;
        let _ = self
            .god
            .world_update_pass(&mut state.entities, &self.voxels, tick)
            .await;
        let _ = self.god.succession_pass(&mut state.entities, tick).await;

        // --- Death sweep: energy depletion plus divine judgments. ---
        self.death_sweep(state, tick).await;

        summaries
    }

    /// Planning for all living entities, concurrently, bounded by the
    /// configured fan-out. Each task gets a deterministic RNG.
    async fn plan_phase(
        &self,
        living: &[EntityId],
        snapshot: &Arc<Vec<Entity>>,
        sounds: &[SoundSource],
        tick: u64,
    ) -> BTreeMap<EntityId, PlannedTick> {
        let gate = Arc::new(Semaphore::new(self.config.max_entity_concurrency.max(1)));
        let sounds: Arc<Vec<SoundSource>> = Arc::new(sounds.to_vec());
        let mut tasks: JoinSet<Option<(EntityId, PlannedTick)>> = JoinSet::new();

        for &entity_id in living {
            let runtime = Arc::clone(&self.runtime);
            let snapshot = Arc::clone(snapshot);
            let sounds = Arc::clone(&sounds);
            let gate = Arc::clone(&gate);
            let mut rng = self.entity_rng(tick, entity_id);

            tasks.spawn(async move {
                let _permit = gate.acquire().await.ok()?;
                let entity = snapshot.iter().find(|e| e.id == entity_id)?;
                let others: Vec<Entity> = snapshot
                    .iter()
                    .filter(|e| e.id != entity_id)
                    .cloned()
                    .collect();
                Some((
                    entity_id,
                    runtime.observe_and_plan(entity, &others, &sounds, &[], &mut rng),
                ))
            });
        }

        let mut planned = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some((entity_id, plan))) => {
                    planned.insert(entity_id, plan);
                }
                Ok(None) => {}
                Err(e) => warn!(error = %e, "planning task failed"),
            }
        }
        planned
    }

    /// Speech events from the previous tick become audible sound
    /// sources this tick.
    fn collect_sounds(&self, state: &WorldState, tick: u64) -> Vec<SoundSource> {
        let previous = tick.saturating_sub(1);
        self.events
            .in_range(previous, previous)
            .into_iter()
            .filter(|e| e.event_type == EventType::Speech)
            .filter_map(|e| {
                let content = e
                    .params
                    .get("text")
                    .and_then(serde_json::Value::as_str)?
                    .to_owned();
                // Dead speakers leave no echo.
                state.entities.get(&e.actor).filter(|s| s.alive)?;
                Some(SoundSource {
                    source_id: e.actor,
                    position: e.position,
                    content,
                })
            })
            .collect()
    }

    /// Mark entities whose energy has run out, then run death rites for
    /// everything that died this tick (including divine judgments).
    async fn death_sweep(&self, state: &mut WorldState, tick: u64) {
        let mut newly_dead = Vec::new();

        for entity in state.entities.values_mut() {
            if entity.alive && entity.state.needs.energy <= 0.0 {
                entity.alive = false;
                entity.death_tick = Some(tick);
                info!(entity = %entity.name, tick, "entity died of energy depletion");
                self.events.record(
                    tick,
                    entity.id,
                    EventType::Death,
                    "energy_depletion",
                    serde_json::json!({"name": entity.name}),
                    EventResult::Accepted,
                    "energy_depletion",
                    entity.position,
                    0.9,
                );
            }
        }

        for entity in state.entities.values() {
            if !entity.alive && entity.death_tick == Some(tick) {
                newly_dead.push(entity.id);
            }
        }

        for dead_id in newly_dead {
            self.god
                .handle_death(&mut state.entities, dead_id, tick)
                .await;
        }
    }

    /// Deterministic per-entity planning RNG.
    fn entity_rng(&self, tick: u64, entity_id: EntityId) -> StdRng {
        let id_bits = entity_id.into_inner().as_u128() as u64;
        StdRng::seed_from_u64(
            self.world_seed ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ id_bits,
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::PerceptionConfig;
    use crate::runtime::RuntimeSettings;
    use genesis_agents::{MemoryManager, RelationshipManager, spawn};
    use genesis_llm::{ConversationManager, LlmClient, PromptEngine};
    use genesis_sandbox::SandboxConfig;
    use genesis_types::{Personality, Vec3};
    use genesis_world::{EventPublisher, ObserverTracker};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn build_runner() -> (WorldRunner, Arc<EventLog>) {
        let memory = Arc::new(MemoryManager::new());
        let relationships = Arc::new(RelationshipManager::new());
        let events = Arc::new(EventLog::new());
        let publisher = Arc::new(EventPublisher::Log);
        let voxels = Arc::new(VoxelEngine::new());
        let observers = Arc::new(ObserverTracker::new());

        let conversations = Arc::new(ConversationManager::new(
            Arc::new(LlmClient::scripted(Vec::<String>::new())),
            PromptEngine::new().unwrap(),
            Arc::clone(&memory),
            Arc::clone(&relationships),
            Arc::clone(&events),
            Arc::clone(&publisher),
            Arc::clone(&voxels),
            SandboxConfig {
                python_bin: String::from("/nonexistent/python3"),
                node_bin: String::from("/nonexistent/node"),
                ..SandboxConfig::default()
            },
        ));

        let runtime = Arc::new(AgentRuntime::new(
            Arc::clone(&memory),
            Arc::clone(&relationships),
            Arc::clone(&events),
            Arc::clone(&publisher),
            Arc::clone(&voxels),
            observers,
            conversations,
            RuntimeSettings {
                perception: PerceptionConfig::default(),
                conversation_cooldown: 20,
                social_need_threshold: 60.0,
            },
        ));

        let god = Arc::new(GodManager::new(
            Arc::new(LlmClient::scripted(Vec::<String>::new())),
            PromptEngine::new().unwrap(),
            Arc::clone(&memory),
            relationships,
            Arc::clone(&events),
            publisher,
        ));

        let runner = WorldRunner::new(
            runtime,
            god,
            Arc::clone(&events),
            voxels,
            RuntimeConfig::default(),
            42,
        );
        (runner, events)
    }

    fn seeded_world(count: u64) -> WorldState {
        let mut state = WorldState::new();
        let mut rng = SmallRng::seed_from_u64(99);
        for i in 0..count {
            let entity = spawn::spawn_native(
                &format!("Being-{i}"),
                Vec3::new(i as f64 * 8.0, 0.0, 0.0),
                spawn::random_personality(&mut rng, &[]),
                0,
            );
            state.entities.insert(entity.id, entity);
        }
        state
    }

    #[tokio::test]
    async fn ticks_advance_and_summarize_every_living_entity() {
        let (runner, _events) = build_runner();
        let mut state = seeded_world(3);

        let summaries = runner.run_tick(&mut state).await;
        assert_eq!(state.tick, 1);
        assert_eq!(summaries.len(), 3);

        let summaries = runner.run_tick(&mut state).await;
        assert_eq!(state.tick, 2);
        assert_eq!(summaries.len(), 3);
    }

    #[tokio::test]
    async fn god_is_spawned_by_the_first_due_cadence() {
        let (runner, _events) = build_runner();
        let mut state = seeded_world(1);

        runner.run_tick(&mut state).await;
        // The god is created lazily by its first pass.
        let gods = state
            .entities
            .values()
            .filter(|e| e.kind == genesis_types::EntityKind::God)
            .count();
        assert_eq!(gods, 1);
    }

    #[tokio::test]
    async fn dead_entities_are_skipped_but_kept() {
        let (runner, events) = build_runner();
        let mut state = seeded_world(2);

        let doomed_id = *state.entities.keys().next().unwrap();
        if let Some(doomed) = state.entities.get_mut(&doomed_id) {
            doomed.state.needs.energy = 0.0;
            doomed.alive = false;
            doomed.death_tick = Some(0);
        }

        let summaries = runner.run_tick(&mut state).await;
        assert_eq!(summaries.len(), 1);
        assert!(state.entities.contains_key(&doomed_id));
        // No death event this tick: the entity was already dead.
        assert!(events.by_type(EventType::Death, 10).is_empty());
    }

    #[tokio::test]
    async fn planning_is_deterministic_for_a_seeded_world() {
        let (runner_a, _) = build_runner();
        let (runner_b, _) = build_runner();

        // Identical worlds, identical ids.
        let state = seeded_world(2);
        let mut world_a = WorldState::new();
        let mut world_b = WorldState::new();
        for entity in state.entities.values() {
            world_a.entities.insert(entity.id, entity.clone());
            world_b.entities.insert(entity.id, entity.clone());
        }

        let summaries_a = runner_a.run_tick(&mut world_a).await;
        let summaries_b = runner_b.run_tick(&mut world_b).await;

        let plans_a: Vec<_> = summaries_a
            .iter()
            .map(|s| (s.entity_id, s.actions_taken.clone()))
            .collect();
        let plans_b: Vec<_> = summaries_b
            .iter()
            .map(|s| (s.entity_id, s.actions_taken.clone()))
            .collect();
        assert_eq!(plans_a, plans_b);
    }
}
