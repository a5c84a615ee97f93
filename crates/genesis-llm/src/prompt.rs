//! Prompt template rendering via `minijinja`.
//!
//! Templates are embedded assets compiled into the binary, so the
//! prompt contract ships with the code and cannot drift from it.
//! Rendering takes a `serde_json::Value` context so callers build
//! contexts with `json!` without intermediate structs.

use minijinja::Environment;

use crate::error::LlmError;

/// Template names registered in the engine.
pub mod template_names {
    /// System prompt for a conversation participant.
    pub const CONVERSATION_SYSTEM: &str = "conversation_system";
    /// The god's short observation pass.
    pub const GOD_OBSERVATION: &str = "god_observation";
    /// The god's long world-update pass.
    pub const GOD_WORLD_UPDATE: &str = "god_world_update";
    /// The god's eulogy for a dead entity.
    pub const GOD_EULOGY: &str = "god_eulogy";
    /// A dying entity's last words.
    pub const LAST_WORDS: &str = "last_words";
    /// The succession trial judgment.
    pub const SUCCESSION_JUDGE: &str = "succession_judge";
}

/// Embedded template sources, paired with their registered names.
const TEMPLATES: [(&str, &str); 6] = [
    (
        template_names::CONVERSATION_SYSTEM,
        include_str!("../templates/conversation_system.j2"),
    ),
    (
        template_names::GOD_OBSERVATION,
        include_str!("../templates/god_observation.j2"),
    ),
    (
        template_names::GOD_WORLD_UPDATE,
        include_str!("../templates/god_world_update.j2"),
    ),
    (
        template_names::GOD_EULOGY,
        include_str!("../templates/god_eulogy.j2"),
    ),
    (
        template_names::LAST_WORDS,
        include_str!("../templates/last_words.j2"),
    ),
    (
        template_names::SUCCESSION_JUDGE,
        include_str!("../templates/succession_judge.j2"),
    ),
];

/// The prompt engine: a `minijinja` environment with all templates
/// pre-registered.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    /// Build the engine, registering every embedded template.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Template`] when a template fails to parse --
    /// which would mean a broken embedded asset, caught at startup.
    pub fn new() -> Result<Self, LlmError> {
        let mut env = Environment::new();
        for (name, source) in TEMPLATES {
            env.add_template(name, source)
                .map_err(|e| LlmError::Template(format!("failed to add {name}: {e}")))?;
        }
        Ok(Self { env })
    }

    /// Render a registered template with a JSON context.
    pub fn render(
        &self,
        name: &str,
        context: &serde_json::Value,
    ) -> Result<String, LlmError> {
        self.env
            .get_template(name)
            .map_err(|e| LlmError::Template(format!("missing template {name}: {e}")))?
            .render(context)
            .map_err(|e| LlmError::Template(format!("render of {name} failed: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_parse() {
        assert!(PromptEngine::new().is_ok());
    }

    #[test]
    fn conversation_system_renders_optional_sections() {
        let engine = PromptEngine::new().unwrap();

        let with_hint = engine
            .render(
                template_names::CONVERSATION_SYSTEM,
                &serde_json::json!({
                    "name": "Ash",
                    "personality": "A being defined by curiosity.",
                    "style": "terse, few words",
                    "other_name": "Vale",
                    "relationship": "You somewhat trust Vale.",
                    "memories": "- First encountered Vale",
                    "awareness_hint": "Patterns repeat.",
                    "policy_hint": "",
                }),
            )
            .unwrap();
        assert!(with_hint.contains("You are Ash"));
        assert!(with_hint.contains("Patterns repeat."));
        assert!(!with_hint.contains("guiding thought"));

        let without_hint = engine
            .render(
                template_names::CONVERSATION_SYSTEM,
                &serde_json::json!({
                    "name": "Ash",
                    "personality": "p",
                    "style": "s",
                    "other_name": "Vale",
                    "relationship": "r",
                    "memories": "m",
                    "awareness_hint": "",
                    "policy_hint": "",
                }),
            )
            .unwrap();
        assert!(!without_hint.contains("strange feeling"));
    }

    #[test]
    fn god_observation_mentions_action_marker() {
        let engine = PromptEngine::new().unwrap();
        let rendered = engine
            .render(
                template_names::GOD_OBSERVATION,
                &serde_json::json!({
                    "tick": 900,
                    "current_question": "What is evolution?",
                    "phase_prompt": "You are benevolent.",
                    "world_state": "{}",
                    "recent_events": "Nothing has happened yet.",
                    "ranking": "No beings exist yet.",
                    "awareness_report": "No beings have yet awakened to awareness.",
                }),
            )
            .unwrap();
        assert!(rendered.contains("===ACTIONS==="));
        assert!(rendered.contains("Tick 900"));
    }
}
