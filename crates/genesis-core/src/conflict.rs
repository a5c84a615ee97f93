//! The conflict predicate and short conflict resolution.
//!
//! When two mutually aggressive entities with deeply negative trust come
//! into conversation range, words are skipped: a short conflict resolves
//! instead of a dialogue. This is the rare path -- most encounters talk.

use genesis_agents::{MemoryManager, RelationshipManager};
use genesis_types::{
    ConflictSummary, Entity, EventResult, EventType, Relationship, RelationshipEvent,
    memory_types,
};
use genesis_world::EventLog;
use tracing::info;

/// Trust below which a meeting can turn violent.
const CONFLICT_TRUST_FLOOR: f64 = -30.0;

/// Both parties must be at least this aggressive.
const CONFLICT_AGGRESSION: f64 = 0.6;

/// Whether a meeting between two entities resolves as a conflict
/// instead of a conversation.
pub fn should_conflict(a: &Entity, b: &Entity, rel_a_to_b: &Relationship) -> bool {
    rel_a_to_b.trust < CONFLICT_TRUST_FLOOR
        && a.personality.aggression > CONFLICT_AGGRESSION
        && b.personality.aggression > CONFLICT_AGGRESSION
}

/// Resolve a short conflict between two entities.
///
/// The winner is decided by aggression plus dominance drive; ties go to
/// the instigator. Both sides remember it; the loser's view of the
/// winner sours, the winner's rivalry sharpens.
pub fn resolve_conflict(
    instigator: &Entity,
    target: &Entity,
    relationships: &RelationshipManager,
    memory: &MemoryManager,
    events: &EventLog,
    tick: u64,
) -> ConflictSummary {
    let instigator_score =
        instigator.personality.aggression + instigator.state.needs.dominance / 100.0;
    let target_score = target.personality.aggression + target.state.needs.dominance / 100.0;

    let (winner, loser) = if target_score > instigator_score {
        (target, instigator)
    } else {
        (instigator, target)
    };

    relationships.update(
        loser.id,
        winner.id,
        RelationshipEvent::CompetedLost,
        1.0,
        tick,
    );
    relationships.update(
        winner.id,
        loser.id,
        RelationshipEvent::CompetedWon,
        1.0,
        tick,
    );

    memory.add_episodic(
        winner.id,
        &format!("Clashed with {} and prevailed", loser.name),
        0.6,
        tick,
        vec![loser.id],
        winner.position,
        memory_types::THREAT,
    );
    memory.add_episodic(
        loser.id,
        &format!("Clashed with {} and backed down", winner.name),
        0.6,
        tick,
        vec![winner.id],
        loser.position,
        memory_types::THREAT,
    );

    events.record(
        tick,
        instigator.id,
        EventType::Conflict,
        "confrontation",
        serde_json::json!({
            "target": target.id.to_string(),
            "winner": winner.id.to_string(),
        }),
        EventResult::Accepted,
        "mutual_hostility",
        instigator.position,
        0.7,
    );

    info!(
        instigator = %instigator.name,
        target = %target.name,
        winner = %winner.name,
        tick,
        "conflict resolved without words"
    );

    ConflictSummary {
        instigator: instigator.id,
        target: target.id,
        winner: winner.id,
        tick,
    }
}
