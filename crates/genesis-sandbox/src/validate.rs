//! Pre-execution validation of Python code.
//!
//! A fixed deny-pattern list rejects obviously dangerous constructs
//! before any subprocess is spawned: module imports that reach the OS or
//! network, reflective builtins, dunder access, and `from X import`.
//! Rejected code never runs.

use std::sync::LazyLock;

use regex::Regex;

/// One deny rule: a compiled pattern and the label reported on match.
struct DenyRule {
    pattern: Regex,
    label: &'static str,
}

/// Build a case-insensitive rule, skipping any pattern that fails to
/// compile (none do; the list is fixed).
fn rule(pattern: &str, label: &'static str) -> Option<DenyRule> {
    Regex::new(&format!("(?i){pattern}"))
        .ok()
        .map(|pattern| DenyRule { pattern, label })
}

/// The fixed deny list, checked in order; the first match wins.
static DENY_RULES: LazyLock<Vec<DenyRule>> = LazyLock::new(|| {
    [
        (r"\bimport\s+os\b", "import os"),
        (r"\bimport\s+sys\b", "import sys"),
        (r"\bimport\s+subprocess\b", "import subprocess"),
        (r"\bimport\s+socket\b", "import socket"),
        (r"\bimport\s+shutil\b", "import shutil"),
        (r"\bimport\s+ctypes\b", "import ctypes"),
        (r"\bimport\s+pickle\b", "import pickle"),
        (r"\bimport\s+http\b", "import http"),
        (r"\bimport\s+urllib\b", "import urllib"),
        (r"\bimport\s+requests\b", "import requests"),
        (r"\b__import__\s*\(", "__import__()"),
        (r"\bopen\s*\(", "open()"),
        (r"\beval\s*\(", "eval()"),
        (r"\bexec\s*\(", "exec()"),
        (r"\bcompile\s*\(", "compile()"),
        (r"\bglobals\s*\(", "globals()"),
        (r"\blocals\s*\(", "locals()"),
        (r"\bgetattr\s*\(", "getattr()"),
        (r"\bsetattr\s*\(", "setattr()"),
        (r"\bdelattr\s*\(", "delattr()"),
        (r"\binput\s*\(", "input()"),
        (r"__\w+__", "dunder access"),
        (r"\bfrom\s+\w+\s+import", "from-import"),
    ]
    .into_iter()
    .filter_map(|(pattern, label)| rule(pattern, label))
    .collect()
});

/// Check Python code against the deny list.
///
/// Returns the full error string (`Forbidden operation: <label>`) when a
/// rule matches, `None` when the code may be handed to the harness.
pub fn validate_python(code: &str) -> Option<String> {
    DENY_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(code))
        .map(|rule| format!("Forbidden operation: {}", rule.label))
}
