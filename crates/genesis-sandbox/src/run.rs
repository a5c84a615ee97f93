//! Sandboxed subprocess execution.
//!
//! Both harnesses are embedded assets. The child receives a single JSON
//! descriptor on stdin and prints one line beginning with the result
//! marker, followed by `{actions, outputs}`. A hard wall-clock timeout
//! kills the child (kill-on-drop); a missing interpreter, a crash, and a
//! timeout are all structured outcomes -- this module never panics and
//! never returns a raw error.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use genesis_types::Vec3;

use crate::actions::SandboxAction;
use crate::extract::{CodeBlock, Language};
use crate::validate::validate_python;

/// The line prefix the child uses to frame its result record.
pub const RESULT_MARKER: &str = "__GENESIS_RESULT__";

/// Maximum characters of child output retained.
pub const MAX_OUTPUT_LENGTH: usize = 2000;

/// Embedded Python harness asset.
pub const PYTHON_HARNESS: &str = include_str!("../assets/harness.py");

/// Embedded JavaScript harness asset.
pub const JS_HARNESS: &str = include_str!("../assets/harness.js");

/// Sandbox runtime configuration.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    /// Hard wall-clock limit per block.
    pub timeout: Duration,
    /// Python interpreter binary.
    pub python_bin: String,
    /// Node interpreter binary.
    pub node_bin: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            python_bin: String::from("python3"),
            node_bin: String::from("node"),
        }
    }
}

/// A nearby entity as exposed to sandboxed code.
#[derive(Debug, Clone, Serialize)]
pub struct NearbyEntityInfo {
    /// Display name.
    pub name: String,
    /// Entity id as a string.
    pub id: String,
    /// World position.
    pub position: Vec3,
}

/// The execution context serialized into the child's stdin descriptor.
#[derive(Debug, Clone, Serialize)]
pub struct SandboxContext {
    /// The executing entity's name.
    pub entity_name: String,
    /// The executing entity's position.
    pub entity_position: Vec3,
    /// Current tick.
    pub tick: u64,
    /// Entities near the executing entity.
    pub nearby_entities: Vec<NearbyEntityInfo>,
}

/// Stdin descriptor: context plus the code to run.
#[derive(Debug, Serialize)]
struct Descriptor<'a> {
    entity_name: &'a str,
    entity_position: Vec3,
    tick: u64,
    nearby_entities: &'a [NearbyEntityInfo],
    code: &'a str,
}

/// Structured result of one sandboxed execution.
#[derive(Debug, Clone, PartialEq)]
pub enum SandboxOutcome {
    /// The child ran and produced a framed result.
    Ok {
        /// Captured world actions, in call order.
        actions: Vec<SandboxAction>,
        /// Captured print output lines.
        outputs: Vec<String>,
    },
    /// A deny rule matched; no process was spawned.
    Forbidden {
        /// The full `Forbidden operation: ...` message.
        rule: String,
    },
    /// The wall-clock limit elapsed and the child was killed.
    Timeout,
    /// The interpreter binary was not found.
    RuntimeMissing,
    /// The child exited abnormally without a framed result.
    Crash {
        /// Cleaned stderr, or a generic failure note.
        error: String,
    },
}

impl SandboxOutcome {
    /// Whether the execution produced a usable result.
    pub const fn success(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// The error text for failed outcomes.
    pub fn error_text(&self) -> Option<String> {
        match self {
            Self::Ok { .. } => None,
            Self::Forbidden { rule } => Some(rule.clone()),
            Self::Timeout => Some(String::from("Execution timed out")),
            Self::RuntimeMissing => Some(String::from("Runtime not found")),
            Self::Crash { error } => Some(error.clone()),
        }
    }
}

/// Execute one extracted code block.
///
/// Python blocks are validated against the deny list first; a match
/// returns [`SandboxOutcome::Forbidden`] without spawning anything.
pub async fn run_block(
    block: &CodeBlock,
    context: &SandboxContext,
    config: &SandboxConfig,
) -> SandboxOutcome {
    if block.language == Language::Python
        && let Some(rule) = validate_python(&block.code)
    {
        debug!(entity = %context.entity_name, rule = %rule, "code rejected before spawn");
        return SandboxOutcome::Forbidden { rule };
    }

    let (program, harness) = match block.language {
        Language::Python => (config.python_bin.as_str(), PYTHON_HARNESS),
        Language::Javascript => (config.node_bin.as_str(), JS_HARNESS),
    };

    let descriptor = Descriptor {
        entity_name: &context.entity_name,
        entity_position: context.entity_position,
        tick: context.tick,
        nearby_entities: &context.nearby_entities,
        code: &block.code,
    };
    let descriptor_json = match serde_json::to_string(&descriptor) {
        Ok(json) => json,
        Err(e) => {
            return SandboxOutcome::Crash {
                error: format!("descriptor serialization failed: {e}"),
            };
        }
    };

    let mut command = Command::new(program);
    match block.language {
        Language::Python => command.args(["-u", "-c", harness]),
        Language::Javascript => command.args(["-e", harness]),
    };
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = match command.spawn() {
        Ok(child) => child,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(program, "sandbox runtime not found");
            return SandboxOutcome::RuntimeMissing;
        }
        Err(e) => {
            return SandboxOutcome::Crash {
                error: format!("spawn failed: {e}"),
            };
        }
    };

    if let Some(mut stdin) = child.stdin.take() {
        if let Err(e) = stdin.write_all(descriptor_json.as_bytes()).await {
            warn!(error = %e, "failed to write sandbox descriptor");
        }
        // Dropping stdin closes the pipe so the child sees EOF.
    }

    // wait_with_output owns the child; if the timeout fires the future
    // is dropped and kill_on_drop reaps the process.
    let output = match tokio::time::timeout(config.timeout, child.wait_with_output()).await {
        Err(_) => {
            warn!(entity = %context.entity_name, "sandbox execution timed out");
            return SandboxOutcome::Timeout;
        }
        Ok(Err(e)) => {
            return SandboxOutcome::Crash {
                error: format!("wait failed: {e}"),
            };
        }
        Ok(Ok(output)) => output,
    };

    // The framed result line must be located before any truncation, or a
    // chatty child could push its own marker out of the window. Entry
    // caps inside the parser keep the retained data bounded.
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = truncate(&String::from_utf8_lossy(&output.stderr), MAX_OUTPUT_LENGTH);

    match parse_result_line(&stdout) {
        Some((actions, outputs)) => SandboxOutcome::Ok { actions, outputs },
        None if !output.status.success() => SandboxOutcome::Crash {
            error: truncate(&clean_error(&stderr), 500),
        },
        None => SandboxOutcome::Ok {
            actions: Vec::new(),
            outputs: Vec::new(),
        },
    }
}

/// Find and parse the framed result line in child stdout.
///
/// Unknown action entries are skipped individually so one malformed
/// record cannot discard the rest.
pub fn parse_result_line(stdout: &str) -> Option<(Vec<SandboxAction>, Vec<String>)> {
    let line = stdout
        .lines()
        .find_map(|l| l.strip_prefix(RESULT_MARKER))?;
    let value: serde_json::Value = serde_json::from_str(line).ok()?;

    let actions = value
        .get("actions")
        .and_then(serde_json::Value::as_array)
        .map(|raw| {
            raw.iter()
                .filter_map(|entry| serde_json::from_value(entry.clone()).ok())
                .collect()
        })
        .unwrap_or_default();

    let outputs = value
        .get("outputs")
        .and_then(serde_json::Value::as_array)
        .map(|raw| {
            raw.iter()
                .filter_map(|entry| entry.as_str())
                .map(|s| truncate(s, 500))
                .collect()
        })
        .unwrap_or_default();

    Some((actions, outputs))
}

/// Remove harness-internal lines from a child traceback.
fn clean_error(error_text: &str) -> String {
    let mut cleaned = Vec::new();
    let mut skipping = false;
    for line in error_text.lines() {
        if line.contains("exec(") || line.contains(RESULT_MARKER) || line.contains("WorldAPI") {
            skipping = true;
            continue;
        }
        if skipping && line.starts_with("  ") {
            continue;
        }
        skipping = false;
        cleaned.push(line);
    }
    let joined = cleaned.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        String::from("Execution failed")
    } else {
        trimmed.to_owned()
    }
}

/// Truncate a string to at most `max` bytes on a char boundary.
fn truncate(text: &str, max: usize) -> String {
    if text.len() <= max {
        return text.to_owned();
    }
    let mut end = max;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    text.get(..end).unwrap_or_default().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_code_never_spawns() {
        // Spec scenario: `import os` must be rejected with the exact
        // message and no subprocess. A bogus interpreter path proves no
        // spawn happened: a spawn attempt would yield RuntimeMissing.
        let block = CodeBlock {
            code: String::from("import os\nos.system('x')"),
            language: Language::Python,
        };
        let context = SandboxContext {
            entity_name: String::from("Ash"),
            entity_position: Vec3::default(),
            tick: 1,
            nearby_entities: Vec::new(),
        };
        let config = SandboxConfig {
            python_bin: String::from("/nonexistent/python3"),
            ..SandboxConfig::default()
        };

        let outcome = futures_executor(run_block(&block, &context, &config));
        assert_eq!(
            outcome,
            SandboxOutcome::Forbidden {
                rule: String::from("Forbidden operation: import os")
            }
        );
    }

    #[test]
    fn missing_runtime_is_structured() {
        let block = CodeBlock {
            code: String::from("world.say('hi')"),
            language: Language::Python,
        };
        let context = SandboxContext {
            entity_name: String::from("Ash"),
            entity_position: Vec3::default(),
            tick: 1,
            nearby_entities: Vec::new(),
        };
        let config = SandboxConfig {
            python_bin: String::from("/nonexistent/python3"),
            ..SandboxConfig::default()
        };

        let outcome = futures_executor(run_block(&block, &context, &config));
        assert_eq!(outcome, SandboxOutcome::RuntimeMissing);
    }

    #[test]
    fn parses_framed_result() {
        let stdout = format!(
            "noise\n{RESULT_MARKER}{}",
            r#"{"actions":[{"type":"say","message":"hello"},{"type":"warp","to":"nowhere"}],"outputs":["hello"]}"#
        );
        match parse_result_line(&stdout) {
            Some((actions, outputs)) => {
                // The unknown "warp" action is skipped, not fatal.
                assert_eq!(actions.len(), 1);
                assert_eq!(outputs, vec![String::from("hello")]);
            }
            None => assert!(false, "expected a framed result"),
        }
    }

    #[test]
    fn harnesses_carry_the_marker() {
        assert!(PYTHON_HARNESS.contains(RESULT_MARKER));
        assert!(JS_HARNESS.contains(RESULT_MARKER));
        // Both read the descriptor from stdin, not from interpolated code.
        assert!(PYTHON_HARNESS.contains("stdin"));
        assert!(JS_HARNESS.contains("stdin"));
    }

    #[test]
    fn clean_error_strips_harness_lines() {
        let raw = "Traceback (most recent call last):\n  File \"<string>\", line 1, in exec(\n  inner detail\nNameError: name 'foo' is not defined";
        let cleaned = clean_error(raw);
        assert!(cleaned.contains("NameError"));
        assert!(!cleaned.contains("exec("));
    }

    /// Run a future to completion on a small runtime.
    fn futures_executor<F: std::future::Future>(future: F) -> F::Output {
        match tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
        {
            Ok(rt) => rt.block_on(future),
            Err(e) => panic!("runtime build failed: {e}"),
        }
    }

    #[tokio::test]
    async fn python_block_runs_when_interpreter_available() {
        // Skipped quietly when python3 is absent from the environment.
        let probe = std::process::Command::new("python3")
            .arg("--version")
            .output();
        if probe.is_err() {
            return;
        }

        let block = CodeBlock {
            code: String::from(
                "world.say('born')\nworld.move(3, 4)\nprint('thinking')",
            ),
            language: Language::Python,
        };
        let context = SandboxContext {
            entity_name: String::from("Ash"),
            entity_position: Vec3::new(1.0, 0.0, 2.0),
            tick: 9,
            nearby_entities: Vec::new(),
        };
        let outcome = run_block(&block, &context, &SandboxConfig::default()).await;

        match outcome {
            SandboxOutcome::Ok { actions, outputs } => {
                assert_eq!(actions.len(), 2);
                assert_eq!(outputs, vec![String::from("thinking")]);
            }
            other => assert!(false, "expected Ok outcome, got {other:?}"),
        }
    }
}
