//! Multi-turn LLM conversation orchestration.
//!
//! Conversations are the only place entity behavior touches an LLM.
//! The manager builds per-participant system prompts from personality,
//! relationship, memory, and awareness; runs an alternating turn loop
//! with early-exit detection; classifies the outcome from keyword
//! lexicons; and applies the post-conversation effects (relationship
//! deltas, episodic memories, events, fanout). Turn texts are also
//! scanned for fenced code and run through the sandbox under the
//! speaker's identity.

use std::sync::Arc;

use rand::Rng;
use tracing::{debug, warn};

use genesis_agents::{MemoryManager, RelationshipManager, meta, relationships};
use genesis_sandbox::{
    NearbyEntityInfo, SandboxConfig, SandboxContext, apply_reports, extract_and_run,
};
use genesis_types::{
    ConversationOutcome, ConversationSummary, ConversationTurn, Entity, EventResult,
    EventType, Personality, Relationship, RelationshipEvent, memory_types,
};
use genesis_world::{EventLog, EventPublisher, VoxelEngine, topics};

use crate::client::{ChatMessage, LlmClient};
use crate::prompt::{PromptEngine, template_names};

/// Turn limits and token budget.
#[derive(Debug, Clone)]
pub struct ConversationConfig {
    /// Maximum turns (each participant speaks once per round).
    pub max_turns: u32,
    /// Minimum turns before an early exit is honored.
    pub min_turns: u32,
    /// Token budget per turn.
    pub max_tokens_per_turn: u32,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            max_turns: 8,
            min_turns: 2,
            max_tokens_per_turn: 150,
        }
    }
}

/// Keyword bags for outcome classification and early exit.
///
/// The lexicon is configuration: the contract is the precedence rules,
/// not the particular words.
#[derive(Debug, Clone)]
pub struct OutcomeLexicon {
    /// Words signaling hostility.
    pub hostile: Vec<String>,
    /// Words signaling warmth.
    pub friendly: Vec<String>,
    /// Words signaling explicit agreement.
    pub agreement: Vec<String>,
    /// Words that end a conversation amicably.
    pub farewell: Vec<String>,
    /// Words that end a conversation by escalation.
    pub hostile_exit: Vec<String>,
}

impl Default for OutcomeLexicon {
    fn default() -> Self {
        let words = |items: &[&str]| items.iter().map(|w| (*w).to_owned()).collect();
        Self {
            hostile: words(&[
                "attack", "fight", "hate", "enemy", "destroy", "threat", "war", "kill",
                "die", "betray", "liar",
            ]),
            friendly: words(&[
                "friend", "help", "together", "agree", "trust", "like", "beautiful",
                "wonderful", "share", "ally", "cooperate",
            ]),
            agreement: words(&["agree", "deal", "promise", "alliance", "pact", "yes"]),
            farewell: words(&["goodbye", "farewell", "leave", "walk away", "enough"]),
            hostile_exit: words(&["attack", "fight", "strike", "flee", "run away"]),
        }
    }
}

/// Classify a conversation's concatenated text.
///
/// Counts are distinct-word presence, not occurrences. Precedence:
/// conflict, agreement, hostile, friendly, neutral.
pub fn analyze_outcome(full_text: &str, lexicon: &OutcomeLexicon) -> ConversationOutcome {
    let text = full_text.to_lowercase();
    let count = |bag: &[String]| bag.iter().filter(|w| text.contains(w.as_str())).count();

    let hostile = count(&lexicon.hostile);
    let friendly = count(&lexicon.friendly);
    let agreement = count(&lexicon.agreement);

    if hostile >= 3 || (hostile >= 2 && friendly == 0) {
        ConversationOutcome::Conflict
    } else if agreement >= 2 {
        ConversationOutcome::Agreement
    } else if hostile > friendly {
        ConversationOutcome::Hostile
    } else if friendly > hostile + 1 {
        ConversationOutcome::Friendly
    } else {
        ConversationOutcome::Neutral
    }
}

/// The relationship event and magnitude an outcome maps to.
pub const fn outcome_relationship_event(
    outcome: ConversationOutcome,
) -> (RelationshipEvent, f64) {
    match outcome {
        ConversationOutcome::Friendly => (RelationshipEvent::LongTalk, 1.2),
        ConversationOutcome::Neutral => (RelationshipEvent::LongTalk, 0.5),
        ConversationOutcome::Hostile => (RelationshipEvent::Insulted, 1.0),
        ConversationOutcome::Agreement => (RelationshipEvent::SharedCreation, 1.5),
        ConversationOutcome::Conflict => (RelationshipEvent::CompetedLost, 1.3),
    }
}

/// Episodic memory importance for an outcome.
pub const fn outcome_importance(outcome: ConversationOutcome) -> f64 {
    match outcome {
        ConversationOutcome::Friendly => 0.6,
        ConversationOutcome::Neutral => 0.4,
        ConversationOutcome::Hostile => 0.7,
        ConversationOutcome::Agreement => 0.8,
        ConversationOutcome::Conflict => 0.85,
    }
}

/// Orchestrates conversations between two entities.
pub struct ConversationManager {
    llm: Arc<LlmClient>,
    prompts: PromptEngine,
    memory: Arc<MemoryManager>,
    relationships: Arc<RelationshipManager>,
    events: Arc<EventLog>,
    publisher: Arc<EventPublisher>,
    voxels: Arc<VoxelEngine>,
    sandbox_config: SandboxConfig,
    lexicon: OutcomeLexicon,
    config: ConversationConfig,
}

impl ConversationManager {
    /// Wire up the manager against the shared services.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        llm: Arc<LlmClient>,
        prompts: PromptEngine,
        memory: Arc<MemoryManager>,
        relationships: Arc<RelationshipManager>,
        events: Arc<EventLog>,
        publisher: Arc<EventPublisher>,
        voxels: Arc<VoxelEngine>,
        sandbox_config: SandboxConfig,
    ) -> Self {
        Self {
            llm,
            prompts,
            memory,
            relationships,
            events,
            publisher,
            voxels,
            sandbox_config,
            lexicon: OutcomeLexicon::default(),
            config: ConversationConfig::default(),
        }
    }

    /// Replace the outcome lexicon (configuration hook).
    pub fn with_lexicon(mut self, lexicon: OutcomeLexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    // ------------------------------------------------------------------
    // Multi-turn conversation
    // ------------------------------------------------------------------

    /// Run a multi-turn conversation; `a` is the initiator.
    ///
    /// Returns `None` when no turns were produced (LLM failure or empty
    /// responses). Cooldown stamping is the caller's responsibility.
    pub async fn run_conversation(
        &self,
        a: &mut Entity,
        b: &mut Entity,
        tick: u64,
    ) -> Option<ConversationSummary> {
        let system_a = self.build_system_prompt(a, b).ok()?;
        let system_b = self.build_system_prompt(b, a).ok()?;

        let rel_a_to_b = self.relationships.get(a.id, b.id);
        let topic = pick_topic(
            &a.personality,
            &b.personality,
            &rel_a_to_b,
            &mut rand::rng(),
        );

        let opening = format!(
            "You are about to have a conversation about {topic}. \
             {} approaches and initiates. Respond naturally as yourself. Begin.",
            a.name
        );

        let mut history_a = vec![ChatMessage::user(&opening)];
        let mut history_b = vec![ChatMessage::user(&opening)];
        let mut turns: Vec<ConversationTurn> = Vec::new();

        for turn_idx in 0..self.config.max_turns {
            let a_speaks = turn_idx % 2 == 0;
            let (system, speaker_name, speaker_id) = if a_speaks {
                (&system_a, a.name.clone(), a.id)
            } else {
                (&system_b, b.name.clone(), b.id)
            };
            let speaker_history = if a_speaks { &history_a } else { &history_b };

            let text = match self
                .llm
                .chat(speaker_history, system, self.config.max_tokens_per_turn)
                .await
            {
                Ok(text) => text.trim().to_owned(),
                Err(e) => {
                    warn!(turn = turn_idx, speaker = %speaker_name, error = %e, "conversation turn failed");
                    break;
                }
            };
            if text.is_empty() {
                break;
            }

            turns.push(ConversationTurn {
                speaker: speaker_id,
                speaker_name: speaker_name.clone(),
                text: text.clone(),
                turn: turn_idx,
            });

            let relayed = ChatMessage::user(format!("{speaker_name}: {text}"));
            if a_speaks {
                history_a.push(ChatMessage::assistant(&text));
                history_b.push(relayed);
            } else {
                history_b.push(ChatMessage::assistant(&text));
                history_a.push(relayed);
            }

            if turn_idx >= self.config.min_turns && self.is_exit_line(&text) {
                break;
            }
        }

        if turns.is_empty() {
            return None;
        }

        let full_text = turns
            .iter()
            .map(|t| format!("{}: {}", t.speaker_name, t.text))
            .collect::<Vec<_>>()
            .join("\n");
        let outcome = analyze_outcome(&full_text, &self.lexicon);

        self.apply_outcome(a, b, outcome, &full_text, tick);
        self.log_conversation_events(a, b, &turns, outcome, &topic, tick)
            .await;
        self.run_turn_code(a, b, &turns, tick).await;

        debug!(
            initiator = %a.name,
            respondent = %b.name,
            turns = turns.len(),
            ?outcome,
            topic = %topic,
            "conversation completed"
        );

        Some(ConversationSummary {
            initiator: a.id,
            initiator_name: a.name.clone(),
            respondent: b.id,
            respondent_name: b.name.clone(),
            turns,
            outcome,
            topic,
            tick,
        })
    }

    // ------------------------------------------------------------------
    // Speech-triggered response
    // ------------------------------------------------------------------

    /// Generate an AI response to speech heard from a nearby entity.
    ///
    /// Used when any entity (human avatars included) speaks near an AI
    /// entity. Same personality, memory, and relationship machinery as a
    /// full conversation, but only the responder's side is generated,
    /// for at most two turns. From the system's perspective there is no
    /// distinction between human-initiated and AI-initiated speech.
    pub async fn run_speech_response(
        &self,
        responder: &mut Entity,
        speaker: &Entity,
        spoken_text: &str,
        tick: u64,
    ) -> Option<ConversationSummary> {
        if spoken_text.trim().is_empty() {
            return None;
        }

        let system = self.build_system_prompt(responder, speaker).ok()?;
        let mut history = vec![ChatMessage::user(format!(
            "{} says: \"{spoken_text}\"",
            speaker.name
        ))];
        let mut turns: Vec<ConversationTurn> = Vec::new();

        for turn_idx in 0..2u32 {
            let text = match self
                .llm
                .chat(&history, &system, self.config.max_tokens_per_turn)
                .await
            {
                Ok(text) => text.trim().to_owned(),
                Err(e) => {
                    warn!(turn = turn_idx, responder = %responder.name, error = %e, "speech response failed");
                    break;
                }
            };
            if text.is_empty() {
                break;
            }

            turns.push(ConversationTurn {
                speaker: responder.id,
                speaker_name: responder.name.clone(),
                text: text.clone(),
                turn: turn_idx,
            });
            history.push(ChatMessage::assistant(&text));

            if turn_idx >= 1 || self.is_farewell_line(&text) {
                break;
            }
        }

        if turns.is_empty() {
            return None;
        }

        // Outcome analysis includes the stimulus the speaker provided.
        let mut full_text = format!("{}: {spoken_text}\n", speaker.name);
        full_text.push_str(
            &turns
                .iter()
                .map(|t| format!("{}: {}", t.speaker_name, t.text))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        let outcome = analyze_outcome(&full_text, &self.lexicon);

        let (event, magnitude) = outcome_relationship_event(outcome);
        self.relationships
            .update(responder.id, speaker.id, event, magnitude, tick);
        self.relationships
            .update(speaker.id, responder.id, event, magnitude, tick);

        let importance = outcome_importance(outcome);
        let excerpt: String = full_text.chars().take(300).collect();
        self.memory.add_episodic(
            responder.id,
            &format!("Conversation with {} ({outcome:?}): {excerpt}", speaker.name),
            importance,
            tick,
            vec![speaker.id],
            responder.position,
            memory_types::CONVERSATION,
        );
        self.memory.add_episodic(
            speaker.id,
            &format!(
                "Conversation with {} ({outcome:?}): {excerpt}",
                responder.name
            ),
            importance,
            tick,
            vec![responder.id],
            speaker.position,
            memory_types::CONVERSATION,
        );

        self.events.record(
            tick,
            responder.id,
            EventType::Conversation,
            "speech_response",
            serde_json::json!({
                "other_id": speaker.id.to_string(),
                "other_name": speaker.name,
                "stimulus": spoken_text.chars().take(200).collect::<String>(),
                "turns": turns.len(),
                "outcome": outcome,
            }),
            EventResult::Accepted,
            "heard_speech",
            responder.position,
            0.6,
        );
        for turn in &turns {
            self.publish_speech_turn(turn, &speaker.name, responder, tick).await;
        }

        Some(ConversationSummary {
            initiator: speaker.id,
            initiator_name: speaker.name.clone(),
            respondent: responder.id,
            respondent_name: responder.name.clone(),
            turns,
            outcome,
            topic: format!(
                "response to: {}",
                spoken_text.chars().take(50).collect::<String>()
            ),
            tick,
        })
    }

    // ------------------------------------------------------------------
    // Prompt building
    // ------------------------------------------------------------------

    /// Build one participant's system prompt.
    fn build_system_prompt(
        &self,
        entity: &Entity,
        other: &Entity,
    ) -> Result<String, crate::error::LlmError> {
        let rel = self.relationships.get(entity.id, other.id);
        let memories = self.memory.summarize_for_prompt(entity.id, 5);

        let awareness_hint = meta::awareness_hint(entity.meta_awareness)
            .filter(|_| meta::should_inject_hint(entity.meta_awareness))
            .unwrap_or_default();

        let policy_hint = entity
            .agent_policy
            .as_ref()
            .map(|policy| policy.current_directive.chars().take(300).collect::<String>())
            .unwrap_or_default();

        self.prompts.render(
            template_names::CONVERSATION_SYSTEM,
            &serde_json::json!({
                "name": entity.name,
                "personality": entity.personality.describe(),
                "style": entity.personality.speaking_style().join(", "),
                "other_name": other.name,
                "relationship": relationships::describe(&rel, &other.name),
                "memories": memories,
                "awareness_hint": awareness_hint,
                "policy_hint": policy_hint,
            }),
        )
    }

    // ------------------------------------------------------------------
    // Post-conversation effects
    // ------------------------------------------------------------------

    /// Bidirectional relationship update plus one episode per side.
    fn apply_outcome(
        &self,
        a: &Entity,
        b: &Entity,
        outcome: ConversationOutcome,
        full_text: &str,
        tick: u64,
    ) {
        let (event, magnitude) = outcome_relationship_event(outcome);
        self.relationships.update(a.id, b.id, event, magnitude, tick);
        self.relationships.update(b.id, a.id, event, magnitude, tick);

        let importance = outcome_importance(outcome);
        let excerpt: String = full_text.chars().take(300).collect();
        self.memory.add_episodic(
            a.id,
            &format!("Conversation with {} ({outcome:?}): {excerpt}", b.name),
            importance,
            tick,
            vec![b.id],
            a.position,
            memory_types::CONVERSATION,
        );
        self.memory.add_episodic(
            b.id,
            &format!("Conversation with {} ({outcome:?}): {excerpt}", a.name),
            importance,
            tick,
            vec![a.id],
            b.position,
            memory_types::CONVERSATION,
        );
    }

    /// One `conversation` event plus one `speech` event per turn.
    async fn log_conversation_events(
        &self,
        a: &Entity,
        b: &Entity,
        turns: &[ConversationTurn],
        outcome: ConversationOutcome,
        topic: &str,
        tick: u64,
    ) {
        let importance = if matches!(
            outcome,
            ConversationOutcome::Agreement | ConversationOutcome::Conflict
        ) {
            0.7
        } else {
            0.5
        };

        self.events.record(
            tick,
            a.id,
            EventType::Conversation,
            "multi_turn_dialogue",
            serde_json::json!({
                "other_id": b.id.to_string(),
                "other_name": b.name,
                "turns": turns.len(),
                "outcome": outcome,
                "topic": topic,
            }),
            EventResult::Accepted,
            "social_need",
            a.position,
            importance,
        );

        for turn in turns {
            let listener = if turn.speaker == a.id { &b.name } else { &a.name };
            self.publish_speech_turn(turn, listener, a, tick).await;
        }
    }

    /// Log and publish one spoken turn.
    async fn publish_speech_turn(
        &self,
        turn: &ConversationTurn,
        listener: &str,
        at: &Entity,
        tick: u64,
    ) {
        self.events.record(
            tick,
            turn.speaker,
            EventType::Speech,
            "speak",
            serde_json::json!({
                "text": turn.text.chars().take(200).collect::<String>(),
                "to": listener,
                "speaker_name": turn.speaker_name,
            }),
            EventResult::Accepted,
            "conversation",
            at.position,
            0.3,
        );
        self.publisher
            .publish(
                topics::SPEECH,
                &serde_json::json!({
                    "entity_id": turn.speaker.to_string(),
                    "name": turn.speaker_name,
                    "tick": tick,
                    "text": turn.text.chars().take(300).collect::<String>(),
                    "to": listener,
                }),
            )
            .await;
    }

    /// Run any fenced code in the turns through the sandbox, each block
    /// under its speaker's identity.
    async fn run_turn_code(
        &self,
        a: &mut Entity,
        b: &mut Entity,
        turns: &[ConversationTurn],
        tick: u64,
    ) {
        for turn in turns {
            let speaker_is_a = turn.speaker == a.id;
            let (other_name, other_id, other_position) = if speaker_is_a {
                (b.name.clone(), b.id, b.position)
            } else {
                (a.name.clone(), a.id, a.position)
            };
            let speaker: &mut Entity = if speaker_is_a { &mut *a } else { &mut *b };

            let context = SandboxContext {
                entity_name: speaker.name.clone(),
                entity_position: speaker.position,
                tick,
                nearby_entities: vec![NearbyEntityInfo {
                    name: other_name,
                    id: other_id.to_string(),
                    position: other_position,
                }],
            };

            let reports = extract_and_run(&turn.text, &context, &self.sandbox_config).await;
            if reports.is_empty() {
                continue;
            }
            apply_reports(
                speaker,
                &reports,
                &self.voxels,
                &self.memory,
                &self.events,
                &self.publisher,
                tick,
            )
            .await;
        }
    }

    /// Whether a line ends the conversation (amicably or by escalation).
    fn is_exit_line(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.lexicon
            .farewell
            .iter()
            .chain(self.lexicon.hostile_exit.iter())
            .any(|signal| lower.contains(signal.as_str()))
    }

    /// Whether a line is an amicable farewell only.
    fn is_farewell_line(&self, text: &str) -> bool {
        let lower = text.to_lowercase();
        self.lexicon
            .farewell
            .iter()
            .any(|signal| lower.contains(signal.as_str()))
    }
}

// ---------------------------------------------------------------------------
// Topic selection
// ---------------------------------------------------------------------------

/// Pick a conversation topic by weighted sampling.
///
/// Each topic's weight is a linear function of the two personalities and
/// the initiator's relationship toward the respondent.
pub fn pick_topic<R: Rng + ?Sized>(
    pa: &Personality,
    pb: &Personality,
    relationship: &Relationship,
    rng: &mut R,
) -> String {
    let topics = [
        (
            "the nature of this world",
            0.3 + pa.curiosity * 0.5 + pb.curiosity * 0.5,
        ),
        (
            "building and creation",
            0.2 + pa.creativity * 0.5 + pb.creativity * 0.5,
        ),
        (
            "power and territory",
            0.1 + pa.ambition * 0.5 + pb.ambition * 0.5,
        ),
        (
            "trust and betrayal",
            0.2 + relationship.trust.abs() / 100.0 * 0.5,
        ),
        ("the meaning of evolution", 0.4),
        ("recent events", 0.5),
        (
            "philosophy",
            0.1 + pa.curiosity * 0.3 + pb.curiosity * 0.3,
        ),
        (
            "beauty and art",
            0.1 + pa.aesthetic_sense * 0.5 + pb.aesthetic_sense * 0.5,
        ),
    ];

    let total: f64 = topics.iter().map(|(_, w)| w).sum();
    let mut roll = rng.random_range(0.0..1.0) * total;
    for (topic, weight) in topics {
        roll -= weight;
        if roll <= 0.0 {
            return topic.to_owned();
        }
    }
    String::from("beauty and art")
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_agents::spawn;
    use genesis_types::Vec3;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn manager(responses: Vec<&str>) -> ConversationManager {
        let prompts = match PromptEngine::new() {
            Ok(engine) => engine,
            Err(e) => panic!("prompt engine must build: {e}"),
        };
        ConversationManager::new(
            Arc::new(LlmClient::scripted(responses)),
            prompts,
            Arc::new(MemoryManager::new()),
            Arc::new(RelationshipManager::new()),
            Arc::new(EventLog::new()),
            Arc::new(EventPublisher::Log),
            Arc::new(VoxelEngine::new()),
            SandboxConfig {
                python_bin: String::from("/nonexistent/python3"),
                node_bin: String::from("/nonexistent/node"),
                ..SandboxConfig::default()
            },
        )
    }

    fn pair() -> (Entity, Entity) {
        let mut rng = SmallRng::seed_from_u64(8);
        let a = spawn::spawn_native(
            "Ash",
            Vec3::new(0.0, 0.0, 0.0),
            spawn::random_personality(&mut rng, &[]),
            0,
        );
        let b = spawn::spawn_native(
            "Vale",
            Vec3::new(3.0, 0.0, 0.0),
            spawn::random_personality(&mut rng, &[]),
            0,
        );
        (a, b)
    }

    #[test]
    fn outcome_precedence_matches_design() {
        let lexicon = OutcomeLexicon::default();

        // 2 hostile tokens + 1 friendly token -> hostile.
        assert_eq!(
            analyze_outcome("I hate you. You are my enemy. We were friends once.", &lexicon),
            ConversationOutcome::Hostile
        );

        // 2 hostile tokens and zero friendly -> conflict.
        assert_eq!(
            analyze_outcome("I hate you, liar.", &lexicon),
            ConversationOutcome::Conflict
        );

        // 2 agreement tokens -> agreement.
        assert_eq!(
            analyze_outcome("We have a deal. I promise.", &lexicon),
            ConversationOutcome::Agreement
        );

        // friendly must exceed hostile by 2.
        assert_eq!(
            analyze_outcome("You are a wonderful friend and a great help.", &lexicon),
            ConversationOutcome::Friendly
        );

        assert_eq!(
            analyze_outcome("The weather is ordinary.", &lexicon),
            ConversationOutcome::Neutral
        );
    }

    #[test]
    fn outcome_mappings() {
        let (event, magnitude) = outcome_relationship_event(ConversationOutcome::Hostile);
        assert_eq!(event, RelationshipEvent::Insulted);
        assert!((magnitude - 1.0).abs() < f64::EPSILON);
        assert!((outcome_importance(ConversationOutcome::Conflict) - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn topic_selection_is_total() {
        let mut rng = SmallRng::seed_from_u64(21);
        let p = Personality::default();
        let rel = Relationship::default();
        for _ in 0..50 {
            let topic = pick_topic(&p, &p, &rel, &mut rng);
            assert!(!topic.is_empty());
        }
    }

    #[tokio::test]
    async fn hostile_conversation_updates_relationships_and_memory() {
        let m = manager(vec![
            "I hate you.",
            "You are my enemy, but once my friend.",
            "Enough. I walk away.",
        ]);
        let (mut a, mut b) = pair();
        let a_id = a.id;
        let b_id = b.id;

        let summary = m.run_conversation(&mut a, &mut b, 100).await;
        let Some(summary) = summary else {
            return assert!(false, "conversation should produce turns");
        };

        assert_eq!(summary.turns.len(), 3);
        assert_eq!(summary.outcome, ConversationOutcome::Hostile);

        // Insulted at magnitude 1.0, both directions.
        let rel = m.relationships.get(a_id, b_id);
        assert!((rel.trust - -4.0).abs() < f64::EPSILON);
        assert!((rel.anger - 5.0).abs() < f64::EPSILON);
        let rel_back = m.relationships.get(b_id, a_id);
        assert!((rel_back.anger - 5.0).abs() < f64::EPSILON);

        // One conversation memory per participant at hostile importance.
        let episodes = m.memory.episodes_for(a_id);
        assert_eq!(episodes.len(), 1);
        assert!(episodes.first().is_some_and(|e| (e.importance - 0.7).abs() < f64::EPSILON));

        // One conversation event, one speech event per turn.
        assert_eq!(m.events.by_type(EventType::Conversation, 10).len(), 1);
        assert_eq!(m.events.by_type(EventType::Speech, 10).len(), 3);
    }

    #[tokio::test]
    async fn exhausted_llm_yields_none() {
        let m = manager(Vec::new());
        let (mut a, mut b) = pair();
        assert!(m.run_conversation(&mut a, &mut b, 5).await.is_none());
    }

    #[tokio::test]
    async fn speech_response_caps_at_two_turns() {
        let m = manager(vec!["Who goes there?", "Ah, a traveler. Welcome.", "unused"]);
        let (mut responder, speaker) = pair();

        let summary = m
            .run_speech_response(&mut responder, &speaker, "Hello in there!", 40)
            .await;
        let Some(summary) = summary else {
            return assert!(false, "speech response should produce turns");
        };
        assert_eq!(summary.turns.len(), 2);
        assert_eq!(summary.initiator_name, "Vale");
        assert!(summary.topic.starts_with("response to:"));
    }
}
