//! End-to-end scenarios driving the full tick engine: the world loop,
//! the agent runtime, conversations (with a scripted LLM), the sandbox,
//! and the god cadences, all against the in-memory world services.

use std::collections::BTreeMap;
use std::sync::Arc;

use genesis_agents::{MemoryManager, RelationshipManager, spawn};
use genesis_core::config::PerceptionConfig;
use genesis_core::runner::{WorldRunner, WorldState};
use genesis_core::runtime::{AgentRuntime, RuntimeSettings};
use genesis_core::RuntimeConfig;
use genesis_llm::{ConversationManager, GodManager, LlmClient, PromptEngine};
use genesis_sandbox::SandboxConfig;
use genesis_types::{
    ConversationOutcome, Entity, EntityKind, EventResult, EventType, Need, Personality,
    Vec3,
};
use genesis_world::{EventLog, EventPublisher, ObserverTracker, VoxelEngine};

/// Everything a scenario needs to assert against.
struct Stack {
    runner: WorldRunner,
    memory: Arc<MemoryManager>,
    relationships: Arc<RelationshipManager>,
    events: Arc<EventLog>,
    voxels: Arc<VoxelEngine>,
}

/// Build the full stack with scripted LLM transcripts.
fn build_stack(conversation_responses: Vec<&str>, god_responses: Vec<&str>) -> Stack {
    let memory = Arc::new(MemoryManager::new());
    let relationships = Arc::new(RelationshipManager::new());
    let events = Arc::new(EventLog::new());
    let publisher = Arc::new(EventPublisher::Log);
    let voxels = Arc::new(VoxelEngine::new());
    let observers = Arc::new(ObserverTracker::new());

    let sandbox_config = SandboxConfig {
        python_bin: String::from("/nonexistent/python3"),
        node_bin: String::from("/nonexistent/node"),
        ..SandboxConfig::default()
    };

    let prompts = match PromptEngine::new() {
        Ok(engine) => engine,
        Err(e) => panic!("prompt engine must build: {e}"),
    };
    let conversations = Arc::new(ConversationManager::new(
        Arc::new(LlmClient::scripted(conversation_responses)),
        prompts,
        Arc::clone(&memory),
        Arc::clone(&relationships),
        Arc::clone(&events),
        Arc::clone(&publisher),
        Arc::clone(&voxels),
        sandbox_config,
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

    let god_prompts = match PromptEngine::new() {
        Ok(engine) => engine,
        Err(e) => panic!("prompt engine must build: {e}"),
    };
    let god = Arc::new(GodManager::new(
        Arc::new(LlmClient::scripted(god_responses)),
        god_prompts,
        Arc::clone(&memory),
        Arc::clone(&relationships),
        Arc::clone(&events),
        publisher,
    ));

    let runner = WorldRunner::new(
        runtime,
        god,
        Arc::clone(&events),
        Arc::clone(&voxels),
        RuntimeConfig::default(),
        7,
    );

    Stack {
        runner,
        memory,
        relationships,
        events,
        voxels,
    }
}

fn facing_entity(name: &str, position: Vec3, facing: Vec3, personality: Personality) -> Entity {
    let mut entity = spawn::spawn_native(name, position, personality, 0);
    entity.facing = facing;
    entity
}

#[tokio::test]
async fn world_soak_holds_every_invariant() {
    let stack = build_stack(Vec::new(), Vec::new());
    let mut state = WorldState::new();

    for i in 0..4u64 {
        let entity = facing_entity(
            &format!("Being-{i}"),
            Vec3::new(i as f64 * 6.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Personality {
                curiosity: 0.7,
                creativity: 0.6,
                ..Personality::default()
            },
        );
        state.entities.insert(entity.id, entity);
    }

    for _ in 0..25 {
        let summaries = stack.runner.run_tick(&mut state).await;

        for summary in &summaries {
            for need in Need::ALL {
                let value = summary.needs.value(need);
                assert!(
                    (0.0..=100.0).contains(&value),
                    "{need:?} out of bounds: {value}"
                );
            }
        }
        for entity in state.entities.values() {
            assert!(entity.state.visited_positions.len() <= 20);
            assert!((0.0..=1.0).contains(&entity.meta_awareness));
        }
    }

    // The event log holds a total order: (tick, seq) strictly advances.
    let all_events = stack.events.recent(usize::MAX);
    let mut previous = (0u64, 0u64);
    for (index, event) in all_events.iter().enumerate() {
        let key = (event.tick, event.seq);
        if index > 0 {
            assert!(key > previous, "event order violated at {index}");
        }
        previous = key;
    }

    // Voxel uniqueness is structural, but the count must be consistent.
    let near_origin = stack.voxels.blocks_near(Vec3::default(), 1e6);
    assert_eq!(near_origin.len(), stack.voxels.count_blocks());
}

#[tokio::test]
async fn hostile_dialogue_flows_through_the_runtime() {
    let stack = build_stack(
        vec![
            "I hate you.",
            "You are my enemy, but once my friend.",
            "Enough. I walk away.",
        ],
        Vec::new(),
    );
    let mut state = WorldState::new();

    let sociable = Personality {
        empathy: 0.8,
        verbosity: 0.6,
        ..Personality::default()
    };
    let a = facing_entity(
        "Ash",
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        sociable.clone(),
    );
    let b = facing_entity(
        "Vale",
        Vec3::new(0.0, 0.0, 3.0),
        Vec3::new(0.0, 0.0, -1.0),
        sociable,
    );

    // The apply phase walks ids in order, so the lower id initiates.
    let (first_id, second_id) = if a.id < b.id { (a.id, b.id) } else { (b.id, a.id) };
    state.entities.insert(a.id, a);
    state.entities.insert(b.id, b);
    if let Some(first) = state.entities.get_mut(&first_id) {
        first.state.needs.social = 85.0;
    }
    if let Some(second) = state.entities.get_mut(&second_id) {
        second.state.needs.social = 40.0;
    }

    // Past the fresh-spawn cooldown window.
    state.tick = 30;
    let summaries = stack.runner.run_tick(&mut state).await;

    let initiator_summary = summaries
        .iter()
        .find(|s| s.entity_id == first_id)
        .and_then(|s| s.conversation.clone());
    let Some(conversation) = initiator_summary else {
        panic!("the first entity should have initiated a conversation");
    };

    assert_eq!(conversation.turns.len(), 3);
    assert_eq!(conversation.outcome, ConversationOutcome::Hostile);

    // Insulted at magnitude 1.0, both directions.
    let rel = stack.relationships.get(first_id, second_id);
    assert!((rel.trust - -4.0).abs() < f64::EPSILON);
    assert!((rel.anger - 5.0).abs() < f64::EPSILON);

    // Cooldown stamped on the initiator.
    let stamped = state
        .entities
        .get(&first_id)
        .and_then(|e| e.state.last_conversation_ticks.get(&second_id).copied());
    assert_eq!(stamped, Some(31));

    // One conversation memory per participant.
    assert!(
        stack
            .memory
            .episodes_for(first_id)
            .iter()
            .any(|e| e.memory_type == "conversation")
    );
    assert!(
        stack
            .memory
            .episodes_for(second_id)
            .iter()
            .any(|e| e.memory_type == "conversation")
    );
}

#[tokio::test]
async fn forbidden_code_in_dialogue_is_rejected_and_logged() {
    let code_turn = "Watch this.\n```python\nimport os\nos.system('x')\n```";
    let stack = build_stack(
        vec![code_turn, "What are you doing?", "Nothing. Goodbye."],
        Vec::new(),
    );
    let mut state = WorldState::new();

    let sociable = Personality {
        empathy: 0.8,
        ..Personality::default()
    };
    let a = facing_entity(
        "Coder",
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
        sociable.clone(),
    );
    let b = facing_entity(
        "Witness",
        Vec3::new(0.0, 0.0, 3.0),
        Vec3::new(0.0, 0.0, -1.0),
        sociable,
    );
    let first_id = a.id.min(b.id);
    state.entities.insert(a.id, a);
    state.entities.insert(b.id, b);
    if let Some(first) = state.entities.get_mut(&first_id) {
        first.state.needs.social = 85.0;
    }

    // Past the fresh-spawn cooldown window.
    state.tick = 30;
    stack.runner.run_tick(&mut state).await;

    let code_events = stack.events.by_type(EventType::CodeExecuted, 10);
    assert_eq!(code_events.len(), 1);
    let event = code_events.first().expect("one code event");
    assert_eq!(event.result, EventResult::Rejected);
    assert!(event.reason.contains("Forbidden operation: import os"));

    // The forbidden block spawned nothing and placed nothing.
    assert_eq!(stack.voxels.count_blocks(), 0);
}

#[tokio::test]
async fn the_god_seeds_life_on_its_first_observation() {
    let god_response = "The world is empty, and emptiness teaches nothing.\n===ACTIONS===\n[{\"action\": \"spawn_ai\", \"count\": 3, \"traits\": [\"curiosity\"]}]";
    let stack = build_stack(Vec::new(), vec![god_response]);
    let mut state = WorldState::new();
    state.tick = 899;

    stack.runner.run_tick(&mut state).await;
    assert_eq!(state.tick, 900);

    let natives = state
        .entities
        .values()
        .filter(|e| e.kind == EntityKind::Native && e.alive)
        .count();
    assert_eq!(natives, 3);

    let gods = state
        .entities
        .values()
        .filter(|e| e.kind == EntityKind::God)
        .count();
    assert_eq!(gods, 1);

    assert_eq!(stack.events.by_type(EventType::GodObservation, 5).len(), 1);
}
