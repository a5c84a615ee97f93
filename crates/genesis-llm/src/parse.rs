//! Lenient parsing of god actions embedded in LLM responses.
//!
//! The god's responses may end with a `===ACTIONS===` marker followed by
//! a JSON array. Models mangle JSON in predictable ways, so parsing
//! attempts multiple recovery strategies: strict parse, then balanced
//! bracket extraction, then nothing. Unknown action names are logged and
//! skipped, never fatal -- the schema registry is the [`GodAction`] enum.

use genesis_types::Material;
use tracing::{debug, warn};

/// The marker separating god prose from machine-readable actions.
pub const ACTIONS_MARKER: &str = "===ACTIONS===";

/// Validated god actions.
#[derive(Debug, Clone, PartialEq)]
pub enum GodAction {
    /// Spawn new native entities (capped at 5 per action).
    SpawnAi {
        /// How many to spawn.
        count: u32,
        /// Trait names to emphasize in their personalities.
        traits: Vec<String>,
        /// Optional name, honored only for a single spawn.
        name: Option<String>,
    },
    /// Place a single block under the god's identity.
    PlaceVoxel {
        /// Block X coordinate.
        x: i64,
        /// Block Y coordinate.
        y: i64,
        /// Block Z coordinate.
        z: i64,
        /// Hex color.
        color: String,
        /// Block material.
        material: Material,
    },
    /// Plant a vision memory in every living entity.
    BroadcastVision {
        /// The vision text.
        vision_text: String,
    },
    /// Speak so that the whole world hears.
    Speak {
        /// The spoken text.
        text: String,
    },
    /// Create a named world event (storm, aurora, ...).
    CreateWorldEvent {
        /// Event type label.
        event_type: String,
        /// Narrative description.
        description: String,
    },
    /// End an entity's life by name.
    KillAi {
        /// The target's display name.
        ai_name: String,
    },
}

/// Split a god response into prose and actions.
///
/// Returns the prose (text before the marker, trimmed) and whatever
/// actions could be recovered. A response without the marker yields no
/// actions.
pub fn extract_actions(text: &str) -> (String, Vec<GodAction>) {
    let Some((prose, actions_text)) = text.split_once(ACTIONS_MARKER) else {
        return (text.trim().to_owned(), Vec::new());
    };

    let prose = prose.trim().to_owned();
    let actions_text = actions_text.trim();

    let values = parse_action_values(actions_text);
    let actions = values
        .iter()
        .filter_map(|value| match action_from_value(value) {
            Some(action) => Some(action),
            None => {
                warn!(?value, "unknown or malformed god action skipped");
                None
            }
        })
        .collect();

    (prose, actions)
}

/// Parse the action payload into raw JSON values.
///
/// Strategy 1: strict parse of the whole tail (array or single object).
/// Strategy 2: balanced-bracket recovery of the first `[...]` run.
/// Strategy 3: give up and return nothing.
fn parse_action_values(actions_text: &str) -> Vec<serde_json::Value> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(actions_text) {
        return match value {
            serde_json::Value::Array(items) => items,
            object @ serde_json::Value::Object(_) => vec![object],
            _ => Vec::new(),
        };
    }

    if let Some(slice) = balanced_array_slice(actions_text)
        && let Ok(serde_json::Value::Array(items)) =
            serde_json::from_str::<serde_json::Value>(slice)
    {
        return items;
    }

    debug!("no parsable god actions after marker");
    Vec::new()
}

/// Find the first balanced `[...]` slice in the text.
fn balanced_array_slice(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    for (offset, byte) in text.as_bytes().iter().enumerate().skip(start) {
        match byte {
            b'[' => depth += 1,
            b']' => {
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

/// Build a validated action from one raw JSON object.
fn action_from_value(value: &serde_json::Value) -> Option<GodAction> {
    let action = value.get("action").and_then(serde_json::Value::as_str)?;

    match action {
        "spawn_ai" => {
            let count = value
                .get("count")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(1)
                .min(5) as u32;
            let traits = value
                .get("traits")
                .and_then(serde_json::Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|t| t.as_str().map(ToOwned::to_owned))
                        .collect()
                })
                .unwrap_or_default();
            let name = value
                .get("name")
                .and_then(serde_json::Value::as_str)
                .map(ToOwned::to_owned);
            Some(GodAction::SpawnAi {
                count,
                traits,
                name,
            })
        }
        "place_voxel" => Some(GodAction::PlaceVoxel {
            x: value.get("x").and_then(serde_json::Value::as_i64).unwrap_or(0),
            y: value.get("y").and_then(serde_json::Value::as_i64).unwrap_or(0),
            z: value.get("z").and_then(serde_json::Value::as_i64).unwrap_or(0),
            color: value
                .get("color")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("#FFD700")
                .to_owned(),
            material: value
                .get("material")
                .and_then(serde_json::Value::as_str)
                .and_then(|m| serde_json::from_value(serde_json::json!(m)).ok())
                .unwrap_or(Material::Emissive),
        }),
        "broadcast_vision" => {
            let vision_text = value
                .get("vision_text")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_owned();
            if vision_text.is_empty() {
                return None;
            }
            Some(GodAction::BroadcastVision { vision_text })
        }
        "speak" => {
            let text = value
                .get("text")
                .or_else(|| value.get("vision_text"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_owned();
            if text.is_empty() {
                return None;
            }
            Some(GodAction::Speak { text })
        }
        "create_feature" | "create_world_event" => Some(GodAction::CreateWorldEvent {
            event_type: value
                .get("event_type")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("divine_event")
                .to_owned(),
            description: value
                .get("description")
                .and_then(serde_json::Value::as_str)
                .unwrap_or("Something shifts in the world.")
                .to_owned(),
        }),
        "kill_ai" => {
            let ai_name = value
                .get("ai_name")
                .and_then(serde_json::Value::as_str)
                .unwrap_or_default()
                .to_owned();
            if ai_name.is_empty() {
                return None;
            }
            Some(GodAction::KillAi { ai_name })
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_without_marker_has_no_actions() {
        let (prose, actions) = extract_actions("The world turns quietly.");
        assert_eq!(prose, "The world turns quietly.");
        assert!(actions.is_empty());
    }

    #[test]
    fn strict_json_array_parses() {
        let text = format!(
            "I will seed new life.\n{ACTIONS_MARKER}\n[{{\"action\": \"spawn_ai\", \"count\": 2, \"traits\": [\"curiosity\"]}}]"
        );
        let (prose, actions) = extract_actions(&text);
        assert_eq!(prose, "I will seed new life.");
        assert_eq!(
            actions,
            vec![GodAction::SpawnAi {
                count: 2,
                traits: vec![String::from("curiosity")],
                name: None,
            }]
        );
    }

    #[test]
    fn single_object_is_wrapped() {
        let text = format!("{ACTIONS_MARKER}\n{{\"action\": \"speak\", \"text\": \"Rise.\"}}");
        let (_, actions) = extract_actions(&text);
        assert_eq!(
            actions,
            vec![GodAction::Speak {
                text: String::from("Rise.")
            }]
        );
    }

    #[test]
    fn balanced_bracket_recovery_survives_trailing_prose() {
        let text = format!(
            "{ACTIONS_MARKER}\nHere are my decrees: [{{\"action\": \"broadcast_vision\", \"vision_text\": \"Wake.\"}}] So it is done."
        );
        let (_, actions) = extract_actions(&text);
        assert_eq!(
            actions,
            vec![GodAction::BroadcastVision {
                vision_text: String::from("Wake.")
            }]
        );
    }

    #[test]
    fn unknown_actions_are_skipped_not_fatal() {
        let text = format!(
            "{ACTIONS_MARKER}\n[{{\"action\": \"rewrite_physics\"}}, {{\"action\": \"kill_ai\", \"ai_name\": \"Ash\"}}]"
        );
        let (_, actions) = extract_actions(&text);
        assert_eq!(
            actions,
            vec![GodAction::KillAi {
                ai_name: String::from("Ash")
            }]
        );
    }

    #[test]
    fn spawn_count_is_capped_at_five() {
        let text = format!("{ACTIONS_MARKER}\n[{{\"action\": \"spawn_ai\", \"count\": 50}}]");
        let (_, actions) = extract_actions(&text);
        assert_eq!(
            actions,
            vec![GodAction::SpawnAi {
                count: 5,
                traits: Vec::new(),
                name: None,
            }]
        );
    }

    #[test]
    fn garbage_after_marker_yields_empty() {
        let text = format!("{ACTIONS_MARKER}\nnot json at all");
        let (_, actions) = extract_actions(&text);
        assert!(actions.is_empty());
    }
}
