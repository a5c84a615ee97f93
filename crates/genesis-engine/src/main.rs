//! World engine binary.
//!
//! Loads configuration, wires the dependency-injection container (every
//! manager is constructed here and handed down -- no hidden globals),
//! seeds the first generation, and runs the fixed-rate world loop until
//! Ctrl-C.

mod spawner;

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use genesis_agents::{MemoryManager, RelationshipManager};
use genesis_core::runner::{WorldRunner, WorldState};
use genesis_core::runtime::{AgentRuntime, RuntimeSettings};
use genesis_core::GenesisConfig;
use genesis_llm::{ConversationManager, GodManager, LlmClient, PromptEngine};
use genesis_world::{EventLog, EventPublisher, ObserverTracker, VoxelEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| String::from("genesis-config.yaml"));

    let config = if Path::new(&config_path).exists() {
        GenesisConfig::from_file(Path::new(&config_path))
            .with_context(|| format!("loading config from {config_path}"))?
    } else {
        GenesisConfig::default()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!(
        world = %config.world.name,
        seed = config.world.seed,
        tick_rate_hz = config.runtime.tick_rate_hz,
        "genesis engine starting"
    );

    // ---- Shared world services ----
    let memory = Arc::new(MemoryManager::new());
    let relationships = Arc::new(RelationshipManager::new());
    let events = Arc::new(EventLog::new());
    let voxels = Arc::new(VoxelEngine::new());
    let observers = Arc::new(ObserverTracker::new());

    let publisher = if config.infrastructure.nats_url.is_empty() {
        info!("no NATS URL configured; fanout goes to the log");
        Arc::new(EventPublisher::Log)
    } else {
        match EventPublisher::connect_nats(&config.infrastructure.nats_url).await {
            Ok(publisher) => {
                info!(url = %config.infrastructure.nats_url, "fanout connected to NATS");
                Arc::new(publisher)
            }
            Err(e) => {
                warn!(error = %e, "NATS unreachable; fanout goes to the log");
                Arc::new(EventPublisher::Log)
            }
        }
    };

    // ---- LLM orchestration ----
    let llm = Arc::new(LlmClient::new(&config.llm));
    info!(backend = llm.backend_name(), model = %config.llm.model, "llm client ready");

    let sandbox_config = config.sandbox.to_sandbox_config();
    let conversations = Arc::new(ConversationManager::new(
        Arc::clone(&llm),
        PromptEngine::new().context("building conversation prompts")?,
        Arc::clone(&memory),
        Arc::clone(&relationships),
        Arc::clone(&events),
        Arc::clone(&publisher),
        Arc::clone(&voxels),
        sandbox_config,
    ));

    let god = Arc::new(GodManager::new(
        Arc::clone(&llm),
        PromptEngine::new().context("building god prompts")?,
        Arc::clone(&memory),
        Arc::clone(&relationships),
        Arc::clone(&events),
        Arc::clone(&publisher),
    ));

    // ---- Tick engine ----
    let runtime = Arc::new(AgentRuntime::new(
        memory,
        relationships,
        Arc::clone(&events),
        publisher,
        Arc::clone(&voxels),
        observers,
        conversations,
        RuntimeSettings {
            perception: config.perception.clone(),
            conversation_cooldown: config.runtime.conversation_cooldown,
            social_need_threshold: config.runtime.social_need_threshold,
        },
    ));

    let runner = WorldRunner::new(
        runtime,
        god,
        events,
        voxels,
        config.runtime.clone(),
        config.world.seed,
    );

    // ---- Seed the first generation ----
    let mut state = WorldState::new();
    spawner::seed_world(&mut state, config.world.seed_entities, config.world.seed);
    info!(entities = state.entities.len(), "world seeded");

    // ---- Run until Ctrl-C ----
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    runner.run(&mut state, shutdown_rx).await;

    info!(tick = state.tick, "genesis engine stopped");
    Ok(())
}
