//! Error types for world-side services.

/// Errors produced by the voxel engine and event services.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A block already occupies the target coordinate.
    #[error("block already present at ({x}, {y}, {z})")]
    BlockOccupied {
        /// Target X coordinate.
        x: i64,
        /// Target Y coordinate.
        y: i64,
        /// Target Z coordinate.
        z: i64,
    },

    /// A payload could not be serialized for publication.
    #[error("failed to serialize payload for topic {topic}: {source}")]
    PayloadSerialization {
        /// The topic being published to.
        topic: String,
        /// The underlying serialization error.
        source: serde_json::Error,
    },
}
