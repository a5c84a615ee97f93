//! Real-time event fanout.
//!
//! Speech, thoughts, building, and code-execution events are published to
//! subscribers (the world viewer) over NATS. Publication is
//! fire-and-forget: a failed publish is logged and never fails a tick.

use tracing::{debug, warn};

/// Well-known fanout subjects.
pub mod topics {
    /// An entity spoke.
    pub const SPEECH: &str = "genesis.speech";
    /// An entity's per-tick thought summary.
    pub const THOUGHT: &str = "genesis.entity_thought";
    /// A block was placed or destroyed.
    pub const BUILDING: &str = "genesis.building_event";
    /// Sandboxed code ran.
    pub const CODE_EXECUTED: &str = "genesis.code_executed";
    /// The god observed, intervened, or mourned.
    pub const GOD: &str = "genesis.god";
}

/// Fanout backend for real-time events.
///
/// Enum dispatch instead of a trait object because publishing is async
/// and async trait methods are not dyn-compatible.
pub enum EventPublisher {
    /// Publish over a NATS connection.
    Nats(async_nats::Client),
    /// Log-only sink for tests and offline runs.
    Log,
}

impl EventPublisher {
    /// Connect a NATS-backed publisher.
    ///
    /// # Errors
    ///
    /// Returns the connection error when the NATS server is unreachable.
    pub async fn connect_nats(url: &str) -> Result<Self, async_nats::ConnectError> {
        let client = async_nats::connect(url).await?;
        Ok(Self::Nats(client))
    }

    /// Publish a payload to a topic.
    ///
    /// Failures are logged with `warn!` and swallowed: fanout is an
    /// observability surface, never a correctness dependency.
    pub async fn publish(&self, topic: &str, payload: &serde_json::Value) {
        match self {
            Self::Nats(client) => {
                let bytes = match serde_json::to_vec(payload) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        warn!(topic, error = %e, "failed to serialize fanout payload");
                        return;
                    }
                };
                if let Err(e) = client.publish(topic.to_owned(), bytes.into()).await {
                    warn!(topic, error = %e, "fanout publish failed");
                }
            }
            Self::Log => {
                debug!(topic, %payload, "fanout (log sink)");
            }
        }
    }
}
