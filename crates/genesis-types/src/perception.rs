//! Perception payload types delivered to entities each tick.
//!
//! The perception is the **only** information an entity receives about
//! the world. If something is not in the perception, the entity does not
//! know about it. Vision is range-, cone-, and occlusion-limited; hearing
//! is range- and wall-attenuated.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BehaviorMode, DetailLevel};
use crate::ids::EntityId;
use crate::structs::Vec3;

/// The complete tick-scoped perception snapshot for one entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Perception {
    /// Entities in view, sorted by distance ascending.
    pub visible: Vec<VisibleEntity>,
    /// Visible entities within interaction range, sorted by distance.
    pub nearby: Vec<VisibleEntity>,
    /// Visible or audible entities judged threatening.
    pub threats: Vec<VisibleEntity>,
    /// Audible sounds, sorted by clarity descending.
    pub audible: Vec<PerceivedSound>,
    /// Named structures within vision range, sorted by distance.
    pub structures: Vec<NearbyStructure>,
    /// Optional meta-awareness hint for this entity's current level.
    pub awareness_hint: Option<String>,
}

/// What an entity can see about another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleEntity {
    /// The observed entity.
    pub id: EntityId,
    /// Name, populated only when the observer already knows this entity.
    pub name: Option<String>,
    /// The observed entity's position.
    pub position: Vec3,
    /// Distance from the observer.
    pub distance: f64,
    /// High under 50 world units, otherwise low.
    pub detail: DetailLevel,
    /// The observed entity's apparent behavior mode.
    pub behavior_mode: BehaviorMode,
}

/// What an entity can hear from one sound source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PerceivedSound {
    /// The source entity, withheld when clarity is below 0.5.
    pub source: Option<EntityId>,
    /// Perceived content; replaced by an unclear marker below clarity
    /// 0.3 and partially word-dropped between 0.3 and 0.7.
    pub content: String,
    /// Clarity in `[0, 1]`: `(1 - d/range) * 0.5^walls`.
    pub clarity: f64,
    /// Unit vector from the listener toward the source.
    pub direction: Option<Vec3>,
}

/// An active sound source fed into the perception system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SoundSource {
    /// The emitting entity.
    pub source_id: EntityId,
    /// Where the sound originates.
    pub position: Vec3,
    /// The raw content at the source.
    pub content: String,
}

/// A named structure near the perceiving entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct NearbyStructure {
    /// Structure name.
    pub name: String,
    /// Structure kind label (e.g. "monument", "sign").
    pub kind: String,
    /// Structure position.
    pub position: Vec3,
    /// Distance from the observer.
    pub distance: f64,
}
