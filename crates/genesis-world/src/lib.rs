//! World-side mutable services for the Genesis simulation.
//!
//! These are the shared resources entity ticks mutate through: the voxel
//! block world, the append-only event stream, observer tracking, and
//! real-time fanout. Each service guards its own state; runtime code
//! issues individual calls and tolerates rejections.
//!
//! # Modules
//!
//! - [`voxel`] -- In-memory [`VoxelEngine`] with one-block-per-coordinate
//! - [`event_log`] -- Append-only [`EventLog`] ordered by `(tick, seq)`
//! - [`observer`] -- [`ObserverTracker`] feeding meta-awareness
//! - [`publisher`] -- [`EventPublisher`] NATS/log fanout
//! - [`error`] -- [`WorldError`]

pub mod error;
pub mod event_log;
pub mod observer;
pub mod publisher;
pub mod voxel;

pub use error::WorldError;
pub use event_log::EventLog;
pub use observer::ObserverTracker;
pub use publisher::{EventPublisher, topics};
pub use voxel::VoxelEngine;
