//! Captured world actions and their application to the world.
//!
//! Sandboxed code interacts with the world only through the harness
//! `world` object; its calls arrive here as [`SandboxAction`] records.
//! `apply_reports` translates them into real mutations under the
//! executing entity's identity: speech events, position deltas, voxel
//! placements, and episodic memories.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use genesis_agents::MemoryManager;
use genesis_types::{Entity, EventResult, EventType, memory_types};
use genesis_world::{EventLog, EventPublisher, VoxelEngine, topics};

use crate::extract::Language;
use crate::run::SandboxOutcome;

/// Movement clamp applied when actions are replayed into the world.
///
/// The harness already clamps; replaying the clamp here keeps a
/// hand-crafted result line from teleporting an entity.
const MOVE_CLAMP: f64 = 15.0;

/// One world call captured by a harness.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SandboxAction {
    /// `world.say(message)`.
    Say {
        /// The spoken message, capped at 500 chars by the harness.
        message: String,
    },
    /// `world.move(dx, dz)`.
    Move {
        /// X delta, clamped to +-15.
        dx: f64,
        /// Z delta, clamped to +-15.
        dz: f64,
    },
    /// `world.place_block(x, y, z, color)`.
    PlaceBlock {
        /// Block X coordinate.
        x: i64,
        /// Block Y coordinate.
        y: i64,
        /// Block Z coordinate.
        z: i64,
        /// Hex color, capped at 7 chars by the harness.
        color: String,
    },
    /// `world.remember(text)`.
    Remember {
        /// The memory text, capped at 500 chars by the harness.
        text: String,
    },
}

/// The result of running one extracted block.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionReport {
    /// The source code, truncated to 500 chars for storage.
    pub code: String,
    /// The block's language.
    pub language: Language,
    /// The structured outcome.
    pub outcome: SandboxOutcome,
}

/// Apply the captured actions of successful executions to the world.
///
/// Every report is logged as a `code_executed` event (success or error)
/// and published for real-time viewers. Failed executions apply no
/// actions -- a timeout must not leave half a plan behind.
pub async fn apply_reports(
    entity: &mut Entity,
    reports: &[ExecutionReport],
    voxels: &VoxelEngine,
    memory: &MemoryManager,
    events: &EventLog,
    publisher: &EventPublisher,
    tick: u64,
) {
    for report in reports {
        let success = report.outcome.success();
        let error_text = report.outcome.error_text();

        events.record(
            tick,
            entity.id,
            EventType::CodeExecuted,
            "execute_code",
            serde_json::json!({
                "language": report.language.name(),
                "code_preview": report.code.chars().take(200).collect::<String>(),
            }),
            if success { EventResult::Accepted } else { EventResult::Rejected },
            error_text.as_deref().unwrap_or(""),
            entity.position,
            0.6,
        );

        publisher
            .publish(
                topics::CODE_EXECUTED,
                &serde_json::json!({
                    "entity_id": entity.id.to_string(),
                    "entity_name": entity.name,
                    "tick": tick,
                    "language": report.language.name(),
                    "success": success,
                    "error": error_text,
                }),
            )
            .await;

        let SandboxOutcome::Ok { actions, .. } = &report.outcome else {
            continue;
        };

        for action in actions {
            match action {
                SandboxAction::Say { message } => {
                    if message.is_empty() {
                        continue;
                    }
                    events.record(
                        tick,
                        entity.id,
                        EventType::Speech,
                        "speak_from_code",
                        serde_json::json!({
                            "text": message.chars().take(200).collect::<String>(),
                        }),
                        EventResult::Accepted,
                        "code_speech",
                        entity.position,
                        0.3,
                    );
                    publisher
                        .publish(
                            topics::THOUGHT,
                            &serde_json::json!({
                                "entity_id": entity.id.to_string(),
                                "name": entity.name,
                                "tick": tick,
                                "speech": message.chars().take(300).collect::<String>(),
                            }),
                        )
                        .await;
                }
                SandboxAction::Move { dx, dz } => {
                    entity.position.x += dx.clamp(-MOVE_CLAMP, MOVE_CLAMP);
                    entity.position.z += dz.clamp(-MOVE_CLAMP, MOVE_CLAMP);
                }
                SandboxAction::PlaceBlock { x, y, z, color } => {
                    match voxels.place_block(
                        *x,
                        *y,
                        *z,
                        color,
                        genesis_types::Material::Solid,
                        entity.id,
                        tick,
                    ) {
                        Ok(_) => {
                            publisher
                                .publish(
                                    topics::BUILDING,
                                    &serde_json::json!({
                                        "tick": tick,
                                        "entity_id": entity.id.to_string(),
                                        "entity_name": entity.name,
                                        "action": "place_voxel_from_code",
                                        "position": {"x": x, "y": y, "z": z},
                                        "color": color,
                                    }),
                                )
                                .await;
                        }
                        Err(e) => {
                            warn!(entity = %entity.name, error = %e, "code-placed block rejected");
                        }
                    }
                }
                SandboxAction::Remember { text } => {
                    if text.is_empty() {
                        continue;
                    }
                    memory.add_episodic(
                        entity.id,
                        &format!("[Code memory] {text}"),
                        0.5,
                        tick,
                        Vec::new(),
                        entity.position,
                        memory_types::CODE_MEMORY,
                    );
                }
            }
        }

        debug!(
            entity = %entity.name,
            tick,
            actions = actions.len(),
            "applied sandbox actions"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_agents::spawn;
    use genesis_types::{Personality, Vec3};

    fn test_entity() -> Entity {
        spawn::spawn_native("Ash", Vec3::new(10.0, 0.0, 10.0), Personality::default(), 0)
    }

    fn ok_report(actions: Vec<SandboxAction>) -> ExecutionReport {
        ExecutionReport {
            code: String::from("world.say('x')"),
            language: Language::Python,
            outcome: SandboxOutcome::Ok {
                actions,
                outputs: Vec::new(),
            },
        }
    }

    #[tokio::test]
    async fn moves_and_memories_apply() {
        let mut entity = test_entity();
        let voxels = VoxelEngine::new();
        let memory = MemoryManager::new();
        let events = EventLog::new();
        let publisher = EventPublisher::Log;

        let reports = vec![ok_report(vec![
            SandboxAction::Move { dx: 3.0, dz: -4.0 },
            SandboxAction::Remember {
                text: String::from("the ridge is safe"),
            },
            SandboxAction::PlaceBlock {
                x: 11,
                y: 0,
                z: 10,
                color: String::from("#FF8800"),
            },
        ])];

        apply_reports(
            &mut entity,
            &reports,
            &voxels,
            &memory,
            &events,
            &publisher,
            42,
        )
        .await;

        assert!((entity.position.x - 13.0).abs() < f64::EPSILON);
        assert!((entity.position.z - 6.0).abs() < f64::EPSILON);
        assert_eq!(voxels.count_blocks(), 1);
        assert_eq!(
            memory.count_of_type(entity.id, memory_types::CODE_MEMORY),
            1
        );
        // One code_executed event regardless of action count.
        assert_eq!(events.by_type(EventType::CodeExecuted, 10).len(), 1);
    }

    #[tokio::test]
    async fn failed_outcomes_apply_nothing_but_still_log() {
        let mut entity = test_entity();
        let voxels = VoxelEngine::new();
        let memory = MemoryManager::new();
        let events = EventLog::new();
        let publisher = EventPublisher::Log;

        let reports = vec![ExecutionReport {
            code: String::from("import os"),
            language: Language::Python,
            outcome: SandboxOutcome::Forbidden {
                rule: String::from("Forbidden operation: import os"),
            },
        }];

        apply_reports(
            &mut entity,
            &reports,
            &voxels,
            &memory,
            &events,
            &publisher,
            7,
        )
        .await;

        assert!((entity.position.x - 10.0).abs() < f64::EPSILON);
        assert_eq!(voxels.count_blocks(), 0);

        let logged = events.by_type(EventType::CodeExecuted, 10);
        assert_eq!(logged.len(), 1);
        assert_eq!(
            logged.first().map(|e| e.result),
            Some(EventResult::Rejected)
        );
        assert!(
            logged
                .first()
                .is_some_and(|e| e.reason.contains("Forbidden operation"))
        );
    }

    #[test]
    fn clamp_defends_against_forged_results() {
        let action: Result<SandboxAction, _> =
            serde_json::from_value(serde_json::json!({"type": "move", "dx": 900.0, "dz": 0.0}));
        // Deserialization succeeds; the clamp happens at application time.
        assert!(action.is_ok());
    }
}
