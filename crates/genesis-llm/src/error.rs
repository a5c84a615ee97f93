//! Error types for LLM orchestration.

/// Errors produced by LLM backends, prompt rendering, and parsing.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// The backend HTTP call failed or returned an unusable response.
    #[error("llm backend error: {0}")]
    Backend(String),

    /// The per-request timeout elapsed.
    #[error("llm request timed out")]
    Timeout,

    /// Concurrency gate closed during shutdown.
    #[error("llm concurrency gate closed")]
    GateClosed,

    /// A prompt template failed to load or render.
    #[error("template error: {0}")]
    Template(String),
}
