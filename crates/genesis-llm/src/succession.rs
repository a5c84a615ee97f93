//! God succession: candidate scoring, the trial, and the handover.
//!
//! The throne is not inherited; it is earned. An entity qualifies when
//! it is alive, transcendently aware, old enough, and has created at
//! least one thing. The sitting god judges the best candidate through a
//! trial prompt; a worthy verdict performs the handover.

use std::collections::BTreeMap;

use tracing::{info, warn};

use genesis_agents::MemoryManager;
use genesis_types::{
    Entity, EntityId, EntityKind, EventResult, EventType, GodState, memory_types,
};
use genesis_world::EventLog;

use crate::client::{LlmClient, ModelTier};
use crate::error::LlmError;
use crate::prompt::{PromptEngine, template_names};

/// Minimum meta-awareness to qualify.
pub const MIN_AWARENESS: f64 = 0.9;

/// Minimum age in ticks to qualify.
pub const MIN_AGE_TICKS: u64 = 5000;

/// A scored succession candidate.
#[derive(Debug, Clone)]
pub struct SuccessionCandidate {
    /// The candidate entity.
    pub entity_id: EntityId,
    /// The candidate's name.
    pub name: String,
    /// Meta-awareness at evaluation time.
    pub awareness: f64,
    /// Age in ticks at evaluation time.
    pub age: u64,
    /// Creation-type memories (art, territory) held.
    pub creations: usize,
    /// Composite score used to pick the best candidate.
    pub score: f64,
}

/// The outcome of a succession trial.
#[derive(Debug, Clone)]
pub struct TrialResult {
    /// The judged candidate.
    pub candidate: EntityId,
    /// The candidate's name.
    pub name: String,
    /// Whether the god found them worthy.
    pub worthy: bool,
    /// The god's stated reason.
    pub reason: String,
}

/// Score every qualifying entity.
///
/// Qualification: alive, not the god, awareness at least
/// [`MIN_AWARENESS`], age at least [`MIN_AGE_TICKS`], and at least one
/// creation or territory memory.
pub fn evaluate_candidates(
    entities: &BTreeMap<EntityId, Entity>,
    memory: &MemoryManager,
    tick: u64,
) -> Vec<SuccessionCandidate> {
    entities
        .values()
        .filter(|e| e.alive && e.kind != EntityKind::God)
        .filter_map(|e| {
            let age = tick.saturating_sub(e.birth_tick);
            let creations = memory.count_of_type(e.id, memory_types::CREATION)
                + memory.count_of_type(e.id, memory_types::TERRITORY);

            if e.meta_awareness < MIN_AWARENESS || age < MIN_AGE_TICKS || creations == 0 {
                return None;
            }

            Some(SuccessionCandidate {
                entity_id: e.id,
                name: e.name.clone(),
                awareness: e.meta_awareness,
                age,
                creations,
                score: e.meta_awareness * 100.0
                    + creations as f64 * 10.0
                    + age as f64 / 1000.0,
            })
        })
        .collect()
}

/// Run the succession trial for one candidate.
///
/// The god's verdict arrives as JSON; anything unparsable is an
/// unworthy verdict, never an error.
pub async fn run_trial(
    llm: &LlmClient,
    prompts: &PromptEngine,
    memory: &MemoryManager,
    candidate: &SuccessionCandidate,
) -> Result<TrialResult, LlmError> {
    let prompt = prompts.render(
        template_names::SUCCESSION_JUDGE,
        &serde_json::json!({
            "candidate_name": candidate.name,
            "awareness": format!("{:.2}", candidate.awareness),
            "age": candidate.age,
            "creations": candidate.creations,
            "memories": memory.summarize_for_prompt(candidate.entity_id, 10),
        }),
    )?;

    let response = llm
        .generate(
            &prompt,
            "You are the sitting god of GENESIS, judging a successor.",
            512,
            ModelTier::Large,
        )
        .await?;

    let (worthy, reason) = parse_verdict(&response);
    Ok(TrialResult {
        candidate: candidate.entity_id,
        name: candidate.name.clone(),
        worthy,
        reason,
    })
}

/// Parse a `{"worthy": bool, "reason": "..."}` verdict leniently.
fn parse_verdict(response: &str) -> (bool, String) {
    let candidate_json = balanced_object_slice(response).unwrap_or(response);
    match serde_json::from_str::<serde_json::Value>(candidate_json) {
        Ok(value) => {
            let worthy = value
                .get("worthy")
                .and_then(serde_json::Value::as_bool)
                .unwrap_or(false);
            let reason = value
                .get("reason")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("The throne stays where it is.")
                .to_owned();
            (worthy, reason)
        }
        Err(_) => {
            warn!("unparsable succession verdict, treating as unworthy");
            (false, String::from("The verdict could not be read."))
        }
    }
}

/// Find the first balanced `{...}` slice in the text.
fn balanced_object_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, byte) in text.as_bytes().iter().enumerate().skip(start) {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return text.get(start..=offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Perform the handover: the old god steps down to a native life, the
/// candidate ascends with a fresh god state and full awareness.
pub fn perform_succession(
    entities: &mut BTreeMap<EntityId, Entity>,
    old_god_id: EntityId,
    new_god_id: EntityId,
    tick: u64,
    events: &EventLog,
) {
    let old_name = entities.get(&old_god_id).map(|e| e.name.clone());
    if let Some(old_god) = entities.get_mut(&old_god_id) {
        old_god.kind = EntityKind::Native;
        old_god.god_state = None;
    }

    if let Some(new_god) = entities.get_mut(&new_god_id) {
        new_god.kind = EntityKind::God;
        new_god.meta_awareness = 1.0;
        new_god.god_state = Some(GodState::default());

        info!(
            old_god = old_name.as_deref().unwrap_or("?"),
            new_god = %new_god.name,
            tick,
            "god succession performed"
        );

        events.record(
            tick,
            new_god_id,
            EventType::Succession,
            "ascend",
            serde_json::json!({
                "previous": old_name,
                "successor": new_god.name,
            }),
            EventResult::Accepted,
            "succession_trial",
            new_god.position,
            1.0,
        );
    }
}
