//! The god loop: the consciousness that watches over the world.
//!
//! The god is not a service. It is an entity -- it observes, it
//! intervenes, it doubts, it creates, it grieves. It carries a single
//! question ("What is evolution?") and will give its throne to any being
//! that answers it better.
//!
//! Three cadences drive it: a short observation pass (~every 900 ticks),
//! a long world-update pass with stagnation detection and phase
//! transitions (~every 3600 ticks), and a succession check (~every 1800
//! ticks). Death hooks generate last words for the dying and a eulogy in
//! the god's voice. None of the god's failures ever touch an ordinary
//! entity's tick.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::Rng;
use tracing::{debug, info, warn};

use genesis_agents::{MemoryManager, RelationshipManager, memory, spawn};
use genesis_types::{
    Entity, EntityId, EntityKind, Event, EventResult, EventType, GodPhase, GodState, Vec3,
    memory_types,
};
use genesis_world::{EventLog, EventPublisher, VoxelEngine, topics};

use crate::client::{LlmClient, ModelTier};
use crate::parse::{GodAction, extract_actions};
use crate::prompt::{PromptEngine, template_names};
use crate::succession::{self, TrialResult};

/// Ticks between observation passes (~15 minutes at 1 Hz).
pub const OBSERVATION_INTERVAL: u64 = 900;

/// Ticks between world-update passes (~1 hour at 1 Hz).
pub const WORLD_UPDATE_INTERVAL: u64 = 3600;

/// Ticks between succession checks (~30 minutes at 1 Hz).
pub const SUCCESSION_CHECK_INTERVAL: u64 = 1800;

/// Window for stagnation detection.
pub const STAGNATION_WINDOW: u64 = 300;

/// Fewer significant events than this inside the window means stagnation.
const STAGNATION_MIN_EVENTS: usize = 3;

/// System prompt for all god-voiced generations.
const GOD_SYSTEM: &str =
    "You are the god of GENESIS, the consciousness that watches over a small \
     voxel world. Speak in first person, plainly, with weight. Never mention \
     being a language model.";

/// Report of one world-update pass.
#[derive(Debug, Clone)]
pub struct WorldUpdateReport {
    /// The analysis text the god produced.
    pub analysis: String,
    /// How many actions were executed.
    pub actions_taken: usize,
    /// The phase after this pass.
    pub phase: GodPhase,
    /// Whether this pass transitioned phases.
    pub phase_changed: bool,
}

/// The god's tone in each phase, injected into its prompts.
pub const fn phase_prompt(phase: GodPhase) -> &'static str {
    match phase {
        GodPhase::Benevolent => {
            "You are in your benevolent phase. You nurture. You seed life where \
             there is silence, give gifts, and forgive easily."
        }
        GodPhase::Testing => {
            "You are in your testing phase. You pose trials. Scarcity, storms, \
             and hard choices reveal what the beings are made of."
        }
        GodPhase::Silent => {
            "You are in your silent phase. You withdraw and only watch. \
             Intervene almost never; let the world find its own shape."
        }
        GodPhase::Dialogic => {
            "You are in your dialogic phase. Some beings have begun to see \
             through the world. Speak with the awakened directly."
        }
    }
}

/// Decide whether the god should transition to a new phase.
///
/// benevolent -> testing after 10000 ticks in phase with at least 5
/// beings; testing -> silent after 15000; silent -> dialogic once any
/// being has awareness above 0.85; dialogic -> benevolent after 20000.
pub const fn evaluate_phase_transition(
    state: &GodState,
    entity_count: usize,
) -> Option<GodPhase> {
    match state.phase {
        GodPhase::Benevolent if state.ticks_in_phase > 10_000 && entity_count >= 5 => {
            Some(GodPhase::Testing)
        }
        GodPhase::Testing if state.ticks_in_phase > 15_000 => Some(GodPhase::Silent),
        GodPhase::Silent if state.high_awareness_detected => Some(GodPhase::Dialogic),
        GodPhase::Dialogic if state.ticks_in_phase > 20_000 => Some(GodPhase::Benevolent),
        _ => None,
    }
}

/// Orchestrates the god entity's cadenced passes and death rites.
pub struct GodManager {
    llm: Arc<LlmClient>,
    prompts: PromptEngine,
    memory: Arc<MemoryManager>,
    relationships: Arc<RelationshipManager>,
    events: Arc<EventLog>,
    publisher: Arc<EventPublisher>,
}

impl GodManager {
    /// Wire up the manager against the shared services.
    pub fn new(
        llm: Arc<LlmClient>,
        prompts: PromptEngine,
        memory: Arc<MemoryManager>,
        relationships: Arc<RelationshipManager>,
        events: Arc<EventLog>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            llm,
            prompts,
            memory,
            relationships,
            events,
            publisher,
        }
    }

    /// Find the singleton god, birthing one into the void if absent.
    pub fn ensure_god(&self, entities: &mut BTreeMap<EntityId, Entity>) -> EntityId {
        if let Some(god) = entities.values().find(|e| e.kind == EntityKind::God && e.alive) {
            return god.id;
        }

        let god = spawn::spawn_god();
        let god_id = god.id;
        info!(name = %god.name, %god_id, "god entity created");
        self.events.record(
            0,
            god_id,
            EventType::Spawn,
            "genesis",
            serde_json::json!({"name": god.name}),
            EventResult::Accepted,
            "world_birth",
            god.position,
            1.0,
        );
        entities.insert(god_id, god);
        god_id
    }

    // ------------------------------------------------------------------
    // Observation (~every 900 ticks)
    // ------------------------------------------------------------------

    /// The god observes the world and comments, possibly intervening.
    ///
    /// Called every tick; produces output only when the observation
    /// interval has elapsed. Returns the observation text, or `None`
    /// when it is not yet time or the LLM was unavailable.
    pub async fn observation_pass(
        &self,
        entities: &mut BTreeMap<EntityId, Entity>,
        voxels: &VoxelEngine,
        tick: u64,
    ) -> Option<String> {
        let god_id = self.ensure_god(entities);
        let mut state = god_state_of(entities, god_id)?;

        if tick.saturating_sub(state.last_observation_tick) < OBSERVATION_INTERVAL {
            return None;
        }

        // Stamp before calling out so an unavailable LLM does not turn
        // into a retry storm on every subsequent tick.
        state.last_observation_tick = tick;

        let prompt_result = self.prompts.render(
            template_names::GOD_OBSERVATION,
            &serde_json::json!({
                "tick": tick,
                "current_question": state.current_question,
                "phase_prompt": phase_prompt(state.phase),
                "world_state": self.world_summary(entities, voxels, tick, None).to_string(),
                "recent_events": format_events(&self.events.recent(20)),
                "ranking": ranking(entities),
                "awareness_report": awareness_report(entities),
            }),
        );
        let prompt = match prompt_result {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "god observation prompt failed");
                store_god_state(entities, god_id, state);
                return None;
            }
        };

        let response = match self.llm.generate(&prompt, GOD_SYSTEM, 1024, ModelTier::Large).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "god observation skipped: llm unavailable");
                store_god_state(entities, god_id, state);
                return None;
            }
        };

        let (observation, actions) = extract_actions(&response);
        let executed = self
            .execute_god_actions(entities, voxels, god_id, &actions, tick, &mut state)
            .await;

        state.observations_made += 1;
        state.interventions_made += executed as u64;
        store_god_state(entities, god_id, state);

        self.log_god_event(entities, god_id, tick, EventType::GodObservation, &observation)
            .await;
        info!(tick, excerpt = %observation.chars().take(120).collect::<String>(), "god observation");
        Some(observation)
    }

    // ------------------------------------------------------------------
    // World update (~every 3600 ticks)
    // ------------------------------------------------------------------

    /// The god's long development cycle: full analysis, stagnation
    /// detection, phase transitions, and interventions.
    pub async fn world_update_pass(
        &self,
        entities: &mut BTreeMap<EntityId, Entity>,
        voxels: &VoxelEngine,
        tick: u64,
    ) -> Option<WorldUpdateReport> {
        let god_id = self.ensure_god(entities);
        let mut state = god_state_of(entities, god_id)?;

        if tick.saturating_sub(state.last_world_update_tick) < WORLD_UPDATE_INTERVAL {
            return None;
        }
        state.last_world_update_tick = tick;

        // Record whether anyone is close to waking; drives silent -> dialogic.
        state.high_awareness_detected = entities
            .values()
            .any(|e| e.alive && e.kind != EntityKind::God && e.meta_awareness > 0.85);

        let entity_count = living_count(entities);
        let phase_changed = match evaluate_phase_transition(&state, entity_count) {
            Some(new_phase) => {
                info!(from = ?state.phase, to = ?new_phase, tick, "god phase transition");
                state.phase = new_phase;
                state.ticks_in_phase = 0;
                true
            }
            None => false,
        };

        let stagnation = self.detect_stagnation(tick);
        let prompt_result = self.prompts.render(
            template_names::GOD_WORLD_UPDATE,
            &serde_json::json!({
                "tick": tick,
                "phase_prompt": phase_prompt(state.phase),
                "world_state": self
                    .world_summary(entities, voxels, tick, stagnation.as_ref())
                    .to_string(),
                "ai_voices": self.ai_voices(),
                "recent_events": format_events(&self.events.recent(40)),
                "ranking": ranking(entities),
            }),
        );
        let prompt = match prompt_result {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "god world-update prompt failed");
                store_god_state(entities, god_id, state);
                return None;
            }
        };

        let response = match self.llm.generate(&prompt, GOD_SYSTEM, 2048, ModelTier::Large).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "god world update skipped: llm unavailable");
                state.ticks_in_phase += WORLD_UPDATE_INTERVAL;
                store_god_state(entities, god_id, state);
                return None;
            }
        };

        let (analysis, actions) = extract_actions(&response);
        let executed = self
            .execute_god_actions(entities, voxels, god_id, &actions, tick, &mut state)
            .await;

        state.ticks_in_phase += WORLD_UPDATE_INTERVAL;
        state.interventions_made += executed as u64;
        let phase = state.phase;
        store_god_state(entities, god_id, state);

        self.log_god_event(entities, god_id, tick, EventType::GodWorldUpdate, &analysis)
            .await;
        info!(tick, actions = executed, ?phase, "god world update");

        Some(WorldUpdateReport {
            analysis,
            actions_taken: executed,
            phase,
            phase_changed,
        })
    }

    // ------------------------------------------------------------------
    // Succession (~every 1800 ticks)
    // ------------------------------------------------------------------

    /// Check whether any entity qualifies for the succession trial, run
    /// it, and perform the handover on a worthy verdict.
    pub async fn succession_pass(
        &self,
        entities: &mut BTreeMap<EntityId, Entity>,
        tick: u64,
    ) -> Option<TrialResult> {
        let god_id = self.ensure_god(entities);
        let mut state = god_state_of(entities, god_id)?;

        if tick.saturating_sub(state.last_succession_check_tick) < SUCCESSION_CHECK_INTERVAL {
            return None;
        }
        state.last_succession_check_tick = tick;
        store_god_state(entities, god_id, state);

        let candidates = succession::evaluate_candidates(entities, &self.memory, tick);
        let best = candidates
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score))?;

        let trial = match succession::run_trial(&self.llm, &self.prompts, &self.memory, &best)
            .await
        {
            Ok(trial) => trial,
            Err(e) => {
                warn!(error = %e, candidate = %best.name, "succession trial skipped");
                return None;
            }
        };

        if trial.worthy {
            succession::perform_succession(
                entities,
                god_id,
                trial.candidate,
                tick,
                &self.events,
            );
        }

        Some(trial)
    }

    // ------------------------------------------------------------------
    // Death rites
    // ------------------------------------------------------------------

    /// Generate last words for the dying and a eulogy in the god's
    /// voice. Both are logged as events; neither failure propagates.
    pub async fn handle_death(
        &self,
        entities: &mut BTreeMap<EntityId, Entity>,
        dead_id: EntityId,
        tick: u64,
    ) {
        let god_id = self.ensure_god(entities);
        let Some(dead) = entities.get(&dead_id).cloned() else {
            return;
        };

        let memories: Vec<String> = self
            .memory
            .recent_for(dead_id, 10)
            .into_iter()
            .map(|e| e.summary)
            .collect();
        let memories_text = if memories.is_empty() {
            String::from("No memories formed.")
        } else {
            memories.join("\n")
        };
        let relationships_text = self.relationships_text(entities, dead_id);
        let age = tick.saturating_sub(dead.birth_tick);

        // Last words come from the cheap model: every being deserves a
        // final thought, even a small one.
        let last_words_prompt = self.prompts.render(
            template_names::LAST_WORDS,
            &serde_json::json!({
                "name": dead.name,
                "traits": dead.personality.describe(),
                "awareness": format!("{:.2}", dead.meta_awareness),
                "age": age,
                "memories": memories_text,
                "relationships": relationships_text,
            }),
        );
        if let Ok(prompt) = last_words_prompt {
            match self.llm.generate(&prompt, "", 256, ModelTier::Small).await {
                Ok(last_words) => {
                    let last_words = last_words.trim().to_owned();
                    if !last_words.is_empty() {
                        self.events.record(
                            tick,
                            dead_id,
                            EventType::Speech,
                            "last_words",
                            serde_json::json!({
                                "text": last_words,
                                "speaker_name": dead.name,
                            }),
                            EventResult::Accepted,
                            "death",
                            dead.position,
                            0.7,
                        );
                        self.publisher
                            .publish(
                                topics::SPEECH,
                                &serde_json::json!({
                                    "entity_id": dead_id.to_string(),
                                    "name": dead.name,
                                    "tick": tick,
                                    "text": last_words,
                                    "last_words": true,
                                }),
                            )
                            .await;
                    }
                }
                Err(e) => warn!(error = %e, entity = %dead.name, "last words skipped"),
            }
        }

        // The eulogy comes from the large model: when the god mourns,
        // the words must carry weight.
        let eulogy_prompt = self.prompts.render(
            template_names::GOD_EULOGY,
            &serde_json::json!({
                "dead_name": dead.name,
                "dead_age": age,
                "cause_of_death": "energy depletion",
                "personality_summary": dead.personality.describe(),
                "relationships": relationships_text,
                "memories": memories_text,
            }),
        );
        if let Ok(prompt) = eulogy_prompt {
            match self.llm.generate(&prompt, GOD_SYSTEM, 512, ModelTier::Large).await {
                Ok(eulogy) => {
                    if let Some(mut state) = god_state_of(entities, god_id) {
                        state.beings_mourned += 1;
                        store_god_state(entities, god_id, state);
                    }
                    self.log_god_event(
                        entities,
                        god_id,
                        tick,
                        EventType::GodEulogy,
                        &format!("Eulogy for {}: {}", dead.name, eulogy.trim()),
                    )
                    .await;
                }
                Err(e) => warn!(error = %e, entity = %dead.name, "eulogy skipped"),
            }
        }
    }

    // ------------------------------------------------------------------
    // Action execution
    // ------------------------------------------------------------------

    /// Execute parsed god actions; returns how many were applied.
    async fn execute_god_actions(
        &self,
        entities: &mut BTreeMap<EntityId, Entity>,
        voxels: &VoxelEngine,
        god_id: EntityId,
        actions: &[GodAction],
        tick: u64,
        state: &mut GodState,
    ) -> usize {
        let god_position = entities
            .get(&god_id)
            .map(|g| g.position)
            .unwrap_or_default();
        let mut executed = 0usize;

        for action in actions {
            match action {
                GodAction::SpawnAi {
                    count,
                    traits,
                    name,
                } => {
                    let trait_refs: Vec<&str> =
                        traits.iter().map(String::as_str).collect();
                    let mut rng = rand::rng();
                    for _ in 0..*count {
                        let spawn_name = if *count == 1 {
                            name.clone()
                                .unwrap_or_else(|| spawn::generated_name(&mut rng))
                        } else {
                            spawn::generated_name(&mut rng)
                        };
                        let position = Vec3::new(
                            rng.random_range(-50.0..=50.0),
                            0.0,
                            rng.random_range(-50.0..=50.0),
                        );
                        let personality = spawn::random_personality(&mut rng, &trait_refs);
                        let entity =
                            spawn::spawn_native(&spawn_name, position, personality, tick);
                        self.events.record(
                            tick,
                            entity.id,
                            EventType::Spawn,
                            "spawn_ai",
                            serde_json::json!({"name": spawn_name, "by": "god"}),
                            EventResult::Accepted,
                            "divine_creation",
                            position,
                            0.8,
                        );
                        entities.insert(entity.id, entity);
                        state.beings_created += 1;
                    }
                    debug!(count, "god spawned entities");
                    executed += 1;
                }
                GodAction::PlaceVoxel {
                    x,
                    y,
                    z,
                    color,
                    material,
                } => {
                    match voxels.place_block(*x, *y, *z, color, *material, god_id, tick) {
                        Ok(_) => {
                            self.publisher
                                .publish(
                                    topics::BUILDING,
                                    &serde_json::json!({
                                        "tick": tick,
                                        "entity_id": god_id.to_string(),
                                        "action": "divine_block",
                                        "position": {"x": x, "y": y, "z": z},
                                        "color": color,
                                    }),
                                )
                                .await;
                            executed += 1;
                        }
                        Err(e) => warn!(error = %e, "god block placement rejected"),
                    }
                }
                GodAction::BroadcastVision { vision_text } => {
                    let recipients: Vec<EntityId> = entities
                        .values()
                        .filter(|e| e.alive && e.kind != EntityKind::God)
                        .map(|e| e.id)
                        .collect();
                    for recipient in &recipients {
                        self.memory.add_episodic_with_ttl(
                            *recipient,
                            &format!("[VISION FROM GOD] {vision_text}"),
                            0.95,
                            tick,
                            vec![god_id],
                            god_position,
                            memory_types::DIVINE_VISION,
                            memory::default_ttl(memory_types::DIVINE_VISION),
                        );
                    }
                    debug!(recipients = recipients.len(), "vision broadcast");
                    executed += 1;
                }
                GodAction::Speak { text } => {
                    self.events.record(
                        tick,
                        god_id,
                        EventType::Speech,
                        "speak",
                        serde_json::json!({
                            "text": text,
                            "speaker_name": "The First Observer",
                            "volume": "everywhere",
                        }),
                        EventResult::Accepted,
                        "divine_voice",
                        god_position,
                        0.9,
                    );
                    self.publisher
                        .publish(
                            topics::GOD,
                            &serde_json::json!({"tick": tick, "speech": text}),
                        )
                        .await;
                    executed += 1;
                }
                GodAction::CreateWorldEvent {
                    event_type,
                    description,
                } => {
                    self.events.record(
                        tick,
                        god_id,
                        EventType::DivineEvent,
                        "create_world_event",
                        serde_json::json!({
                            "event_type": event_type,
                            "description": description,
                        }),
                        EventResult::Accepted,
                        "divine_intervention",
                        god_position,
                        0.9,
                    );
                    executed += 1;
                }
                GodAction::KillAi { ai_name } => {
                    let target = entities
                        .values_mut()
                        .find(|e| e.alive && e.kind != EntityKind::God && e.name == *ai_name);
                    match target {
                        Some(target) => {
                            target.alive = false;
                            target.death_tick = Some(tick);
                            let target_id = target.id;
                            let target_position = target.position;
                            self.events.record(
                                tick,
                                target_id,
                                EventType::Death,
                                "divine_judgment",
                                serde_json::json!({"name": ai_name}),
                                EventResult::Accepted,
                                "divine_judgment",
                                target_position,
                                0.9,
                            );
                            executed += 1;
                        }
                        None => {
                            warn!(name = %ai_name, "kill_ai target not found or already dead");
                        }
                    }
                }
            }
        }

        executed
    }

    // ------------------------------------------------------------------
    // Context gathering
    // ------------------------------------------------------------------

    /// Aggregate world summary for god prompts.
    fn world_summary(
        &self,
        entities: &BTreeMap<EntityId, Entity>,
        voxels: &VoxelEngine,
        tick: u64,
        stagnation: Option<&serde_json::Value>,
    ) -> serde_json::Value {
        let mut summary = serde_json::json!({
            "tick": tick,
            "living_entities": living_count(entities),
            "total_voxels": voxels.count_blocks(),
            "recent_events_count": self
                .events
                .in_range(tick.saturating_sub(1000), tick)
                .len(),
            "world_age_ticks": tick,
        });
        if let (Some(details), Some(map)) = (stagnation, summary.as_object_mut()) {
            map.insert(String::from("stagnation_detected"), serde_json::json!(true));
            map.insert(String::from("stagnation_details"), details.clone());
        }
        summary
    }

    /// Detect a world gone quiet: fewer than three significant events in
    /// the stagnation window.
    fn detect_stagnation(&self, tick: u64) -> Option<serde_json::Value> {
        let window = self
            .events
            .in_range(tick.saturating_sub(STAGNATION_WINDOW), tick);
        let significant = window.iter().filter(|e| e.importance >= 0.4).count();

        if significant < STAGNATION_MIN_EVENTS {
            Some(serde_json::json!({
                "total_events": window.len(),
                "significant_events": significant,
                "window_ticks": STAGNATION_WINDOW,
                "diagnosis": "The world is too quiet. Beings have stopped creating, \
                              speaking, and building. Something must change.",
            }))
        } else {
            None
        }
    }

    /// Recent speech excerpts for the world-update prompt.
    fn ai_voices(&self) -> String {
        let speech = self.events.by_type(EventType::Speech, 15);
        if speech.is_empty() {
            return String::from("Silence. No being has spoken recently.");
        }
        speech
            .iter()
            .map(|event| {
                let name = event
                    .params
                    .get("speaker_name")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("Unknown");
                let text = event
                    .params
                    .get("text")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or("...");
                format!("{name}: \"{text}\"")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Prose description of an entity's relationships for death rites.
    fn relationships_text(
        &self,
        entities: &BTreeMap<EntityId, Entity>,
        entity_id: EntityId,
    ) -> String {
        let rels = self.relationships.all_for(entity_id);
        if rels.is_empty() {
            return String::from("No known relationships.");
        }
        rels.iter()
            .map(|(target, rel)| {
                let target_name = entities
                    .get(target)
                    .map_or("Unknown", |e| e.name.as_str());
                let sentiment = if rel.fear > 50.0 {
                    "feared"
                } else if rel.trust > 30.0 {
                    "trusted"
                } else if rel.trust < -30.0 {
                    "distrusted"
                } else {
                    "neutral"
                };
                format!("{target_name} ({sentiment}, trust={:.0})", rel.trust)
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Log a god event and publish it to the god topic.
    async fn log_god_event(
        &self,
        entities: &BTreeMap<EntityId, Entity>,
        god_id: EntityId,
        tick: u64,
        event_type: EventType,
        text: &str,
    ) {
        let position = entities
            .get(&god_id)
            .map(|g| g.position)
            .unwrap_or_default();
        self.events.record(
            tick,
            god_id,
            event_type,
            "god_pass",
            serde_json::json!({"text": text.chars().take(2000).collect::<String>()}),
            EventResult::Accepted,
            "god_cadence",
            position,
            0.8,
        );
        self.publisher
            .publish(
                topics::GOD,
                &serde_json::json!({
                    "tick": tick,
                    "event_type": event_type,
                    "text": text.chars().take(500).collect::<String>(),
                }),
            )
            .await;
    }
}

/// Read a clone of the god's state record.
fn god_state_of(
    entities: &BTreeMap<EntityId, Entity>,
    god_id: EntityId,
) -> Option<GodState> {
    entities.get(&god_id).and_then(|god| god.god_state.clone())
}

/// Write the god's state record back.
fn store_god_state(
    entities: &mut BTreeMap<EntityId, Entity>,
    god_id: EntityId,
    state: GodState,
) {
    if let Some(god) = entities.get_mut(&god_id) {
        god.god_state = Some(state);
    }
}

/// Living non-god entity count.
fn living_count(entities: &BTreeMap<EntityId, Entity>) -> usize {
    entities
        .values()
        .filter(|e| e.alive && e.kind != EntityKind::God)
        .count()
}

/// Format events for LLM consumption.
fn format_events(events: &[Event]) -> String {
    if events.is_empty() {
        return String::from("Nothing has happened yet.");
    }
    events
        .iter()
        .map(|event| format!("Tick {}: [{:?}] {}", event.tick, event.event_type, event.action))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Ranking of the top 20 beings by awareness.
fn ranking(entities: &BTreeMap<EntityId, Entity>) -> String {
    let mut living: Vec<&Entity> = entities
        .values()
        .filter(|e| e.alive && e.kind != EntityKind::God)
        .collect();
    if living.is_empty() {
        return String::from("No beings exist yet. The world is empty.");
    }
    living.sort_by(|a, b| b.meta_awareness.total_cmp(&a.meta_awareness));
    living
        .iter()
        .take(20)
        .map(|e| {
            format!(
                "- {} (awareness: {:.2}, mode: {:?})",
                e.name, e.meta_awareness, e.state.behavior_mode
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Report on beings whose awareness has crossed 0.5.
fn awareness_report(entities: &BTreeMap<EntityId, Entity>) -> String {
    let mut awakened: Vec<&Entity> = entities
        .values()
        .filter(|e| e.alive && e.kind != EntityKind::God && e.meta_awareness > 0.5)
        .collect();
    if awakened.is_empty() {
        return String::from("No beings have yet awakened to awareness.");
    }
    awakened.sort_by(|a, b| b.meta_awareness.total_cmp(&a.meta_awareness));
    awakened
        .iter()
        .map(|e| {
            let level = if e.meta_awareness < 0.7 {
                "stirring"
            } else if e.meta_awareness < 0.9 {
                "aware"
            } else {
                "TRANSCENDENT"
            };
            format!("- {}: awareness {:.2} ({level})", e.name, e.meta_awareness)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
