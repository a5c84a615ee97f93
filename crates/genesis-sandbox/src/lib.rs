//! Subprocess-isolated execution of LLM-produced code.
//!
//! Entities sometimes answer with fenced code blocks. This crate bridges
//! that text to the world: it extracts the blocks, validates Python
//! against a fixed deny list, runs each block in an isolated child
//! process with a `world` capability object, and applies the captured
//! actions back onto the entity and the voxel world.
//!
//! Security posture:
//!
//! - All code runs in a subprocess, never in this process
//! - Hard 5-second wall-clock timeout per block, kill-on-drop
//! - Python builtins are whitelisted; dangerous constructs are rejected
//!   before any process spawns
//! - Harnesses are embedded assets; the child reads a structured
//!   descriptor on stdin and writes one framed result line on stdout,
//!   so no user text is ever interpolated into the harness source
//! - Output is capped; every failure mode is a structured outcome
//!
//! # Modules
//!
//! - [`extract`] -- Fenced block extraction
//! - [`validate`] -- Python deny-pattern validation
//! - [`run`] -- Subprocess execution and result framing
//! - [`actions`] -- Captured actions and world application

pub mod actions;
pub mod extract;
pub mod run;
pub mod validate;

pub use actions::{ExecutionReport, SandboxAction, apply_reports};
pub use extract::{CodeBlock, Language, extract_code_blocks};
pub use run::{
    NearbyEntityInfo, RESULT_MARKER, SandboxConfig, SandboxContext, SandboxOutcome, run_block,
};
pub use validate::validate_python;

/// Extract every code block from an LLM response and execute each one.
///
/// Returns one [`ExecutionReport`] per block, in order. Callers apply
/// the reports with [`apply_reports`] under the entity's identity.
pub async fn extract_and_run(
    response: &str,
    context: &SandboxContext,
    config: &SandboxConfig,
) -> Vec<ExecutionReport> {
    let blocks = extract_code_blocks(response);
    let mut reports = Vec::with_capacity(blocks.len());

    for block in blocks {
        let outcome = run_block(&block, context, config).await;
        reports.push(ExecutionReport {
            code: block.code.chars().take(500).collect(),
            language: block.language,
            outcome,
        });
    }

    reports
}
