//! The per-entity tick pipeline.
//!
//! Each tick, every living entity goes through a fixed 12-step sequence:
//!
//! 1. Perceive (range, cone, occlusion)
//! 2. Update needs (personality-scaled accumulation)
//! 3. Update behavior mode
//! 4. Decay relationships (every 10th tick)
//! 5. Plan actions (GOAP, never an LLM)
//! 6. Execute actions against the world
//! 7. Satisfy needs from the actions taken
//! 8. Conversation gate (conflict predicate first, then dialogue)
//! 9. Memory update (first encounters, threats, notable actions)
//! 10. Meta-awareness update from observer attention
//! 11. Track visited positions
//! 12. Clamp needs and build the summary
//!
//! Steps 1-5 are pure and run on snapshots (the planning phase); steps
//! 6-12 mutate the entity and the shared services (the apply phase). The
//! world loop may run planning for many entities concurrently, but each
//! entity's apply phase runs alone with its own `&mut Entity`.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info};

use genesis_agents::goap::{self, PlanContext};
use genesis_agents::relationships::DECAY_INTERVAL_TICKS;
use genesis_agents::{MemoryManager, RelationshipManager, behavior, meta, needs};
use genesis_llm::ConversationManager;
use genesis_types::{
    ActionKind, ActionParams, ActionProposal, ActionTaken, BehaviorMode, ConflictSummary,
    ConversationSummary, Entity, EntityId, EventResult, EventType, Needs, Perception,
    SoundSource, TickSummary, Vec3, memory_types,
};
use genesis_world::{EventLog, EventPublisher, ObserverTracker, VoxelEngine, topics};

use crate::config::PerceptionConfig;
use crate::conflict;
use crate::perception::{self, StructureInfo};

/// Maximum distance moved per movement action.
const MAX_MOVE_PER_ACTION: f64 = 3.0;

/// Energy below which a conversation will not trigger.
const CONVERSATION_MIN_ENERGY: f64 = 15.0;

/// Energy restored by one rest action.
const REST_ENERGY_RESTORE: f64 = 15.0;

/// Memory cleanup cadence, in ticks.
const MEMORY_CLEANUP_INTERVAL: u64 = 100;

/// Energy cost per action; rest is special-cased to restore.
const fn energy_cost(kind: ActionKind) -> f64 {
    match kind {
        ActionKind::MoveTo => 1.0,
        ActionKind::Explore => 1.5,
        ActionKind::ApproachEntity => 0.8,
        ActionKind::Flee => 2.0,
        ActionKind::PlaceVoxel => 2.5,
        ActionKind::DestroyVoxel => 2.0,
        ActionKind::Speak => 0.5,
        ActionKind::Rest => REST_ENERGY_RESTORE,
        ActionKind::Observe => 0.3,
        ActionKind::Challenge => 3.0,
        ActionKind::ClaimTerritory => 4.0,
        ActionKind::CreateArt => 3.5,
        ActionKind::WriteSign => 0.5,
    }
}

/// Stable action name for events and logs.
const fn action_name(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::MoveTo => "move_to",
        ActionKind::Explore => "explore",
        ActionKind::ApproachEntity => "approach_entity",
        ActionKind::Flee => "flee",
        ActionKind::PlaceVoxel => "place_voxel",
        ActionKind::DestroyVoxel => "destroy_voxel",
        ActionKind::Speak => "speak",
        ActionKind::Rest => "rest",
        ActionKind::Observe => "observe",
        ActionKind::Challenge => "challenge",
        ActionKind::ClaimTerritory => "claim_territory",
        ActionKind::CreateArt => "create_art",
        ActionKind::WriteSign => "write_sign",
    }
}

/// Runtime knobs the pipeline reads every tick.
#[derive(Debug, Clone)]
pub struct RuntimeSettings {
    /// Perception geometry.
    pub perception: PerceptionConfig,
    /// Minimum ticks between conversations with the same partner.
    pub conversation_cooldown: u64,
    /// Social need value that gates conversation triggering.
    pub social_need_threshold: f64,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            perception: PerceptionConfig::default(),
            conversation_cooldown: 20,
            social_need_threshold: 60.0,
        }
    }
}

/// Output of the pure planning phase (steps 1-3 and 5).
#[derive(Debug, Clone)]
pub struct PlannedTick {
    /// The perception snapshot.
    pub perception: Perception,
    /// Needs after accumulation (unclamped).
    pub needs: Needs,
    /// The behavior mode after transition checks.
    pub behavior_mode: BehaviorMode,
    /// The ordered action plan.
    pub plan: Vec<ActionProposal>,
}

/// Runs the per-entity tick pipeline against the shared services.
pub struct AgentRuntime {
    memory: Arc<MemoryManager>,
    relationships: Arc<RelationshipManager>,
    events: Arc<EventLog>,
    publisher: Arc<EventPublisher>,
    voxels: Arc<VoxelEngine>,
    observers: Arc<ObserverTracker>,
    conversations: Arc<ConversationManager>,
    settings: RuntimeSettings,
}

impl AgentRuntime {
    /// Wire up the runtime against the shared services.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        memory: Arc<MemoryManager>,
        relationships: Arc<RelationshipManager>,
        events: Arc<EventLog>,
        publisher: Arc<EventPublisher>,
        voxels: Arc<VoxelEngine>,
        observers: Arc<ObserverTracker>,
        conversations: Arc<ConversationManager>,
        settings: RuntimeSettings,
    ) -> Self {
        Self {
            memory,
            relationships,
            events,
            publisher,
            voxels,
            observers,
            conversations,
            settings,
        }
    }

    // ==================================================================
    // Planning phase (pure)
    // ==================================================================

    /// Steps 1-3 and 5: perceive, accumulate needs, transition behavior
    /// mode, and plan. Pure with respect to shared state; safe to run
    /// for many entities concurrently on snapshots.
    pub fn observe_and_plan<R: Rng + ?Sized>(
        &self,
        entity: &Entity,
        all_entities: &[Entity],
        sounds: &[SoundSource],
        structures: &[StructureInfo],
        rng: &mut R,
    ) -> PlannedTick {
        // Names resolve only for entities met before.
        let known_names: BTreeMap<EntityId, String> = all_entities
            .iter()
            .filter(|other| entity.state.known_entity_ids.contains(&other.id))
            .map(|other| (other.id, other.name.clone()))
            .collect();

        // 1. Perceive
        let perception = perception::perceive(
            entity,
            all_entities,
            &self.voxels,
            &known_names,
            sounds,
            structures,
            &self.settings.perception,
        );

        // 2. Update needs
        let mut updated_needs = entity.state.needs;
        needs::update_needs(&mut updated_needs, &entity.personality, &perception);

        // 3. Update behavior mode
        let behavior_mode =
            behavior::update_behavior_mode(&updated_needs, entity.state.behavior_mode);

        // 5. Plan (step 4, relationship decay, belongs to the apply
        // phase because it touches the shared store).
        let ctx = PlanContext {
            position: entity.position,
            energy: updated_needs.energy,
            behavior_mode,
            visited_positions: &entity.state.visited_positions,
            needs: &updated_needs,
            personality: &entity.personality,
            perception: &perception,
            policy: entity.agent_policy.as_ref(),
        };
        let plan = goap::plan(&ctx, rng);

        PlannedTick {
            perception,
            needs: updated_needs,
            behavior_mode,
            plan,
        }
    }

    // ==================================================================
    // Apply phase (mutating)
    // ==================================================================

    /// Steps 4 and 6-12: execute the plan against the world and fold the
    /// results back into the entity.
    ///
    /// `others` is the rest of the entity table (the entity itself must
    /// not be in it); conversation partners are borrowed from it.
    pub async fn apply_tick<R: Rng + ?Sized>(
        &self,
        entity: &mut Entity,
        planned: PlannedTick,
        others: &mut BTreeMap<EntityId, Entity>,
        tick: u64,
        rng: &mut R,
    ) -> TickSummary {
        let PlannedTick {
            perception,
            needs: updated_needs,
            behavior_mode,
            plan,
        } = planned;

        entity.state.needs = updated_needs;
        entity.state.behavior_mode = behavior_mode;

        // 4. Relationship decay
        if tick % DECAY_INTERVAL_TICKS == 0 {
            self.relationships.decay_all(entity.id);
        }

        // 6. Execute actions
        self.execute_actions(entity, &plan, tick, rng);

        // 7. Satisfy needs from actions taken
        needs::satisfy_from_actions(&mut entity.state.needs, &plan);

        // 8. Conversation gate
        let (conversation, conflict_result) = self
            .conversation_step(entity, &perception, others, tick)
            .await;

        // 9. Memory update
        self.memory_step(entity, &plan, &perception, tick);

        // 10. Meta-awareness
        let observer_count = self.observer_count(entity);
        let old_awareness = entity.meta_awareness;
        entity.meta_awareness = meta::calculate_update(old_awareness, observer_count);
        let awareness_hint =
            meta::awareness_hint(entity.meta_awareness).map(ToOwned::to_owned);
        if meta::awareness_level(entity.meta_awareness) != meta::awareness_level(old_awareness)
        {
            info!(
                entity = %entity.name,
                old = old_awareness,
                new = entity.meta_awareness,
                observer_count,
                "meta-awareness level crossed"
            );
        }

        // 11. Visited positions
        entity.state.push_visited(entity.position);

        // 12. Clamp needs
        entity.state.needs.clamp_all();

        let actions_taken: Vec<ActionTaken> = plan
            .iter()
            .map(|p| ActionTaken {
                action: p.action,
                reason: p.reason.clone(),
            })
            .collect();
        let goal = plan
            .first()
            .map_or_else(|| String::from("idle"), |p| p.reason.clone());

        let summary = TickSummary {
            entity_id: entity.id,
            entity_name: entity.name.clone(),
            tick,
            actions_taken,
            conversation,
            conflict: conflict_result,
            needs: entity.state.needs,
            behavior_mode: entity.state.behavior_mode,
            goal,
            awareness_hint,
            observer_count,
        };

        self.publisher
            .publish(
                topics::THOUGHT,
                &serde_json::json!({
                    "entity_id": entity.id.to_string(),
                    "name": entity.name,
                    "tick": tick,
                    "goal": summary.goal,
                    "actions": summary
                        .actions_taken
                        .iter()
                        .map(|a| action_name(a.action))
                        .collect::<Vec<_>>(),
                    "behavior_mode": summary.behavior_mode,
                }),
            )
            .await;

        debug!(
            tick,
            entity = %entity.name,
            mode = ?entity.state.behavior_mode,
            goal = %summary.goal,
            actions = summary.actions_taken.len(),
            "entity tick complete"
        );

        summary
    }

    /// Convenience: plan and apply for one entity inside the table.
    ///
    /// Returns `None` for unknown or dead entities.
    pub async fn tick_entity<R: Rng + ?Sized>(
        &self,
        entity_id: EntityId,
        entities: &mut BTreeMap<EntityId, Entity>,
        sounds: &[SoundSource],
        tick: u64,
        rng: &mut R,
    ) -> Option<TickSummary> {
        let entity = entities.remove(&entity_id)?;
        if !entity.alive {
            entities.insert(entity_id, entity);
            return None;
        }
        let mut entity = entity;

        let snapshot: Vec<Entity> = entities.values().cloned().collect();
        let planned = self.observe_and_plan(&entity, &snapshot, sounds, &[], rng);
        let summary = self.apply_tick(&mut entity, planned, entities, tick, rng).await;

        entities.insert(entity_id, entity);
        Some(summary)
    }

    // ------------------------------------------------------------------
    // 6. Action execution
    // ------------------------------------------------------------------

    /// Execute planned actions: move, build, destroy, and log one event
    /// per action. Voxel conflicts are recorded as rejections without
    /// aborting the rest of the plan.
    fn execute_actions<R: Rng + ?Sized>(
        &self,
        entity: &mut Entity,
        plan: &[ActionProposal],
        tick: u64,
        rng: &mut R,
    ) {
        for proposal in plan {
            let mut result = EventResult::Accepted;
            let mut reason = proposal.reason.clone();

            match &proposal.params {
                ActionParams::MoveTo { target }
                | ActionParams::Explore { target }
                | ActionParams::Flee { target } => {
                    move_toward(entity, *target);
                }
                ActionParams::ApproachEntity { position, .. } => {
                    move_toward(entity, *position);
                }
                ActionParams::PlaceVoxel {
                    x,
                    y,
                    z,
                    color,
                    material,
                } => {
                    if let Err(e) =
                        self.voxels
                            .place_block(*x, *y, *z, color, *material, entity.id, tick)
                    {
                        result = EventResult::Rejected;
                        reason = e.to_string();
                    }
                }
                ActionParams::DestroyVoxel { x, y, z } => {
                    if !self.voxels.destroy_block(*x, *y, *z) {
                        result = EventResult::Rejected;
                        reason = String::from("no block at target");
                    }
                }
                ActionParams::CreateArt {
                    base,
                    primary_color,
                    secondary_color,
                    material,
                    pattern,
                    block_count,
                } => {
                    let placed = self.place_art(
                        entity.id,
                        *base,
                        primary_color,
                        secondary_color,
                        *material,
                        *pattern,
                        *block_count,
                        tick,
                        rng,
                    );
                    if placed == 0 {
                        result = EventResult::Rejected;
                        reason = String::from("no blocks could be placed");
                    }
                }
                ActionParams::Speak { .. }
                | ActionParams::Rest
                | ActionParams::Observe
                | ActionParams::Challenge { .. }
                | ActionParams::ClaimTerritory { .. }
                | ActionParams::WriteSign { .. } => {}
            }

            // Energy accounting: rest restores, everything else costs.
            let cost = energy_cost(proposal.action);
            let energy = &mut entity.state.needs.energy;
            if proposal.action == ActionKind::Rest {
                *energy += cost;
            } else {
                *energy -= cost.abs();
            }
            *energy = energy.clamp(0.0, 100.0);

            self.events.record(
                tick,
                entity.id,
                EventType::Action,
                action_name(proposal.action),
                serde_json::to_value(&proposal.params)
                    .unwrap_or(serde_json::Value::Null),
                result,
                &reason,
                entity.position,
                0.3,
            );
        }
    }

    /// Place an art piece's blocks in the requested pattern. Occupied
    /// coordinates are skipped. Returns the number of blocks placed.
    #[allow(clippy::too_many_arguments)]
    fn place_art<R: Rng + ?Sized>(
        &self,
        artist: EntityId,
        base: Vec3,
        primary_color: &str,
        secondary_color: &str,
        material: genesis_types::Material,
        pattern: genesis_types::ArtPattern,
        block_count: u32,
        tick: u64,
        rng: &mut R,
    ) -> u32 {
        use genesis_types::ArtPattern;

        let (bx, by, bz) = base.voxel();
        let count = i64::from(block_count);
        let mut placed = 0;

        for i in 0..count {
            let color = if i % 2 == 0 {
                primary_color
            } else {
                secondary_color
            };

            let (ox, oy, oz) = match pattern {
                ArtPattern::Tower => (0, i, 0),
                ArtPattern::Wall => (i % 4, i / 4, 0),
                ArtPattern::Arch => {
                    let third = (count / 3).max(1);
                    if i < third {
                        (0, i, 0)
                    } else if i < 2 * third {
                        (third, i - third, 0)
                    } else {
                        (i - 2 * third, third, 0)
                    }
                }
                ArtPattern::Grid => {
                    let side = ((count as f64).sqrt().floor() as i64).max(1);
                    (i % side, 0, i / side)
                }
                ArtPattern::Spiral => {
                    let angle = i as f64 * 0.8;
                    let radius = 1.0 + i as f64 * 0.3;
                    (
                        (radius * angle.cos()) as i64,
                        i / 3,
                        (radius * angle.sin()) as i64,
                    )
                }
                ArtPattern::Organic => (
                    rng.random_range(-2i64..=2),
                    rng.random_range(0i64..=3),
                    rng.random_range(-2i64..=2),
                ),
                ArtPattern::Scatter | ArtPattern::Abstract => (
                    rng.random_range(-3i64..=3),
                    rng.random_range(0i64..=4),
                    rng.random_range(-3i64..=3),
                ),
            };

            if self
                .voxels
                .place_block(bx + ox, by + oy, bz + oz, color, material, artist, tick)
                .is_ok()
            {
                placed += 1;
            }
        }

        placed
    }

    // ------------------------------------------------------------------
    // 8. Conversation gate
    // ------------------------------------------------------------------

    /// All trigger conditions for an LLM conversation.
    fn should_converse(&self, entity: &Entity, perception: &Perception, tick: u64) -> bool {
        let Some(nearest) = perception.nearby.first() else {
            return false;
        };

        if entity.state.needs.social < self.settings.social_need_threshold {
            return false;
        }
        if entity.state.needs.energy < CONVERSATION_MIN_ENERGY {
            return false;
        }

        let last = entity
            .state
            .last_conversation_ticks
            .get(&nearest.id)
            .copied()
            .unwrap_or(0);
        tick.saturating_sub(last) >= self.settings.conversation_cooldown
    }

    /// Run the conflict predicate, then the conversation. Either way the
    /// cooldown is stamped.
    async fn conversation_step(
        &self,
        entity: &mut Entity,
        perception: &Perception,
        others: &mut BTreeMap<EntityId, Entity>,
        tick: u64,
    ) -> (Option<ConversationSummary>, Option<ConflictSummary>) {
        if !self.should_converse(entity, perception, tick) {
            return (None, None);
        }
        let Some(partner_id) = perception.nearby.first().map(|n| n.id) else {
            return (None, None);
        };
        let Some(mut partner) = others.remove(&partner_id) else {
            return (None, None);
        };

        let rel = self.relationships.get(entity.id, partner_id);
        let mut conversation = None;
        let mut conflict_result = None;

        if conflict::should_conflict(entity, &partner, &rel) {
            conflict_result = Some(conflict::resolve_conflict(
                entity,
                &partner,
                &self.relationships,
                &self.memory,
                &self.events,
                tick,
            ));
        } else {
            conversation = self
                .conversations
                .run_conversation(entity, &mut partner, tick)
                .await;
        }

        entity
            .state
            .last_conversation_ticks
            .insert(partner_id, tick);
        others.insert(partner_id, partner);

        (conversation, conflict_result)
    }

    // ------------------------------------------------------------------
    // 9. Memory update
    // ------------------------------------------------------------------

    /// Store significant events to episodic memory. Not every tick
    /// produces a memory; the filters are first meetings, threats, and
    /// notable actions.
    fn memory_step(
        &self,
        entity: &mut Entity,
        plan: &[ActionProposal],
        perception: &Perception,
        tick: u64,
    ) {
        // First encounters.
        for seen in &perception.visible {
            if entity.state.known_entity_ids.contains(&seen.id) {
                continue;
            }
            entity.state.known_entity_ids.insert(seen.id);
            let label = seen
                .name
                .clone()
                .unwrap_or_else(|| String::from("an unfamiliar being"));
            self.memory.add_episodic(
                entity.id,
                &format!("First encountered {label}"),
                0.9,
                tick,
                vec![seen.id],
                entity.position,
                memory_types::ENCOUNTER,
            );
        }

        // Threats.
        if !perception.threats.is_empty() {
            let names = perception
                .threats
                .iter()
                .take(3)
                .map(|t| t.name.as_deref().unwrap_or("?").to_owned())
                .collect::<Vec<_>>()
                .join(", ");
            self.memory.add_episodic(
                entity.id,
                &format!("Detected threats: {names}"),
                0.5,
                tick,
                perception.threats.iter().map(|t| t.id).collect(),
                entity.position,
                memory_types::THREAT,
            );
        }

        // Notable actions.
        for proposal in plan {
            match &proposal.params {
                ActionParams::ClaimTerritory { .. } => {
                    self.memory.add_episodic(
                        entity.id,
                        "Claimed territory at current location",
                        0.8,
                        tick,
                        Vec::new(),
                        entity.position,
                        memory_types::TERRITORY,
                    );
                }
                ActionParams::CreateArt { pattern, .. } => {
                    self.memory.add_episodic(
                        entity.id,
                        &format!("Created art piece with pattern {pattern:?}"),
                        0.4,
                        tick,
                        Vec::new(),
                        entity.position,
                        memory_types::CREATION,
                    );
                }
                _ => {}
            }
        }

        // Periodic cleanup.
        if tick % MEMORY_CLEANUP_INTERVAL == 0 {
            self.memory.cleanup_expired(entity.id, tick);
        }
    }

    // ------------------------------------------------------------------
    // 10. Meta-awareness
    // ------------------------------------------------------------------

    /// Observer count: the state field first, the tracker as fallback.
    fn observer_count(&self, entity: &Entity) -> u32 {
        let from_state = entity.state.observer_count;
        if from_state > 0 {
            from_state
        } else {
            self.observers.observer_count(entity.id)
        }
    }
}

/// Move an entity toward a target, capped at [`MAX_MOVE_PER_ACTION`],
/// snapping on arrival and updating the facing to the horizontal unit
/// vector of the movement.
fn move_toward(entity: &mut Entity, target: Vec3) {
    let delta = target.sub(entity.position);
    let distance = delta.length();
    if distance < 1e-9 {
        return;
    }

    if distance <= MAX_MOVE_PER_ACTION {
        entity.position = target;
    } else {
        let ratio = MAX_MOVE_PER_ACTION / distance;
        entity.position = Vec3::new(
            entity.position.x + delta.x * ratio,
            entity.position.y + delta.y * ratio,
            entity.position.z + delta.z * ratio,
        );
    }

    if distance > 0.01 {
        let horizontal = delta.xz().normalized();
        if horizontal.length() > 1e-9 {
            entity.facing = horizontal;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use genesis_llm::{LlmClient, PromptEngine};
    use genesis_sandbox::SandboxConfig;
    use genesis_types::Personality;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn build_runtime(responses: Vec<&str>) -> AgentRuntime {
        let memory = Arc::new(MemoryManager::new());
        let relationships = Arc::new(RelationshipManager::new());
        let events = Arc::new(EventLog::new());
        let publisher = Arc::new(EventPublisher::Log);
        let voxels = Arc::new(VoxelEngine::new());
        let observers = Arc::new(ObserverTracker::new());

        let prompts = PromptEngine::new().unwrap();
        let conversations = Arc::new(ConversationManager::new(
            Arc::new(LlmClient::scripted(responses)),
            prompts,
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

        AgentRuntime::new(
            memory,
            relationships,
            events,
            publisher,
            voxels,
            observers,
            conversations,
            RuntimeSettings::default(),
        )
    }

    fn entity_named(name: &str, position: Vec3) -> Entity {
        genesis_agents::spawn::spawn_native(name, position, Personality::default(), 0)
    }

    #[tokio::test]
    async fn movement_caps_speed_and_updates_facing() {
        let mut entity = entity_named("A", Vec3::default());
        move_toward(&mut entity, Vec3::new(10.0, 0.0, 0.0));
        assert!((entity.position.x - 3.0).abs() < 1e-9);
        assert!((entity.facing.x - 1.0).abs() < 1e-9);

        // Close targets snap.
        move_toward(&mut entity, Vec3::new(4.0, 0.0, 0.0));
        assert!((entity.position.x - 4.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn rest_override_restores_energy() {
        let runtime = build_runtime(Vec::new());
        let mut entities = BTreeMap::new();

        let mut tired = entity_named("Tired", Vec3::default());
        tired.state.needs.energy = 8.0;
        tired.state.needs.social = 90.0;
        let tired_id = tired.id;
        entities.insert(tired_id, tired);

        let nearby = entity_named("Bystander", Vec3::new(2.0, 0.0, 0.0));
        entities.insert(nearby.id, nearby);

        let mut rng = SmallRng::seed_from_u64(1);
        let summary = runtime
            .tick_entity(tired_id, &mut entities, &[], 1, &mut rng)
            .await
            .unwrap();

        assert_eq!(summary.actions_taken.len(), 1);
        assert_eq!(
            summary.actions_taken.first().map(|a| a.action),
            Some(ActionKind::Rest)
        );
        // 8 - small accumulation drain + 15 restored.
        assert!((summary.needs.energy - 23.0).abs() < 0.5);
        // Social untouched by the plan; only accumulation moved it.
        assert!(summary.needs.social > 90.0);
    }

    #[tokio::test]
    async fn first_encounter_creates_one_pinned_memory() {
        let runtime = build_runtime(Vec::new());
        let mut entities = BTreeMap::new();

        let mut observer = entity_named("Observer", Vec3::default());
        observer.facing = Vec3::new(0.0, 0.0, 1.0);
        // Low social need so no conversation fires.
        observer.state.needs.social = 10.0;
        let observer_id = observer.id;
        entities.insert(observer_id, observer);

        let stranger = entity_named("Stranger", Vec3::new(0.0, 0.0, 10.0));
        let stranger_id = stranger.id;
        entities.insert(stranger_id, stranger);

        let mut rng = SmallRng::seed_from_u64(2);
        runtime
            .tick_entity(observer_id, &mut entities, &[], 1, &mut rng)
            .await
            .unwrap();

        let episodes = runtime.memory.episodes_for(observer_id);
        let encounters: Vec<_> = episodes
            .iter()
            .filter(|e| e.memory_type == memory_types::ENCOUNTER)
            .collect();
        assert_eq!(encounters.len(), 1);
        assert!((encounters.first().unwrap().importance - 0.9).abs() < f64::EPSILON);
        assert!(
            entities
                .get(&observer_id)
                .unwrap()
                .state
                .known_entity_ids
                .contains(&stranger_id)
        );

        // A second tick must not duplicate the encounter memory.
        let mut rng = SmallRng::seed_from_u64(3);
        runtime
            .tick_entity(observer_id, &mut entities, &[], 2, &mut rng)
            .await
            .unwrap();
        let episodes = runtime.memory.episodes_for(observer_id);
        let encounters = episodes
            .iter()
            .filter(|e| e.memory_type == memory_types::ENCOUNTER)
            .count();
        assert_eq!(encounters, 1);
    }

    #[tokio::test]
    async fn conversation_cooldown_blocks_retrigger() {
        let runtime = build_runtime(Vec::new());

        let mut chatty = entity_named("Chatty", Vec3::default());
        chatty.state.needs.social = 80.0;
        chatty.state.needs.energy = 80.0;

        let partner = entity_named("Partner", Vec3::new(1.0, 0.0, 2.0));
        let partner_id = partner.id;

        let around = vec![partner];
        let perception = perception::perceive(
            &chatty,
            &around,
            &runtime.voxels,
            &BTreeMap::new(),
            &[],
            &[],
            &runtime.settings.perception,
        );
        assert!(!perception.nearby.is_empty());

        // Fresh pair: gate open at tick 100.
        assert!(runtime.should_converse(&chatty, &perception, 100));

        // Conversed at 100; at 115 the cooldown still holds.
        chatty.state.last_conversation_ticks.insert(partner_id, 100);
        assert!(!runtime.should_converse(&chatty, &perception, 115));
        assert!(runtime.should_converse(&chatty, &perception, 120));
    }

    #[tokio::test]
    async fn needs_stay_clamped_and_visited_bounded() {
        let runtime = build_runtime(Vec::new());
        let mut entities = BTreeMap::new();

        let mut entity = entity_named("Wanderer", Vec3::default());
        entity.state.needs.curiosity = 99.5;
        let id = entity.id;
        entities.insert(id, entity);

        for tick in 1..=30 {
            let mut rng = SmallRng::seed_from_u64(tick);
            let summary = runtime
                .tick_entity(id, &mut entities, &[], tick, &mut rng)
                .await
                .unwrap();
            for need in genesis_types::Need::ALL {
                let value = summary.needs.value(need);
                assert!((0.0..=100.0).contains(&value), "{need:?} out of range: {value}");
            }
        }

        let entity = entities.get(&id).unwrap();
        assert!(entity.state.visited_positions.len() <= 20);
        assert!((0.0..=1.0).contains(&entity.meta_awareness));
    }

    #[tokio::test]
    async fn events_match_plan_length() {
        let runtime = build_runtime(Vec::new());
        let mut entities = BTreeMap::new();

        let mut loner = entity_named("Loner", Vec3::default());
        loner.state.needs.social = 10.0;
        let id = loner.id;
        entities.insert(id, loner);

        let mut rng = SmallRng::seed_from_u64(5);
        let summary = runtime
            .tick_entity(id, &mut entities, &[], 1, &mut rng)
            .await
            .unwrap();

        let action_events = runtime.events.by_actor(id, 100);
        let action_events = action_events
            .iter()
            .filter(|e| e.event_type == EventType::Action)
            .count();
        assert_eq!(action_events, summary.actions_taken.len());
    }
}
