//! Action proposals emitted by the planner and per-tick summaries.
//!
//! The planner produces [`ActionProposal`] records; the runtime executes
//! them and reports a [`TickSummary`] per entity per tick. Parameters are
//! a typed enum rather than loose maps, so the executor can only be
//! handed shapes it knows how to apply.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    ActionKind, ArtPattern, BehaviorMode, ConversationOutcome, Material, SpeechIntent,
};
use crate::ids::EntityId;
use crate::structs::{Needs, Vec3};

// ---------------------------------------------------------------------------
// Proposals
// ---------------------------------------------------------------------------

/// Typed parameters for each action in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionParams {
    /// Walk toward a position.
    MoveTo {
        /// Destination.
        target: Vec3,
    },
    /// Wander toward an unvisited area.
    Explore {
        /// Chosen wander destination.
        target: Vec3,
    },
    /// Close distance to a visible entity.
    ApproachEntity {
        /// The entity to approach, when one is visible.
        target: Option<EntityId>,
        /// Where that entity was last seen.
        position: Vec3,
    },
    /// Move away from threats.
    Flee {
        /// Escape destination, opposite the threat centroid.
        target: Vec3,
    },
    /// Place a single voxel block.
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
    /// Destroy a voxel block.
    DestroyVoxel {
        /// Block X coordinate.
        x: i64,
        /// Block Y coordinate.
        y: i64,
        /// Block Z coordinate.
        z: i64,
    },
    /// Say something to a nearby entity.
    Speak {
        /// The addressee, if anyone is close enough.
        target: Option<EntityId>,
        /// What kind of speech this is.
        intent: SpeechIntent,
    },
    /// Do nothing and recover energy.
    Rest,
    /// Watch the surroundings.
    Observe,
    /// Challenge a nearby entity for dominance.
    Challenge {
        /// The entity being challenged.
        target: Option<EntityId>,
    },
    /// Claim the surrounding area.
    ClaimTerritory {
        /// Territory center.
        center: Vec3,
        /// Claim radius, scaled by ambition.
        radius: f64,
    },
    /// Place multiple blocks in a pattern.
    CreateArt {
        /// Base position of the piece.
        base: Vec3,
        /// Primary color.
        primary_color: String,
        /// Alternating secondary color.
        secondary_color: String,
        /// Block material.
        material: Material,
        /// Placement pattern.
        pattern: ArtPattern,
        /// Number of blocks to place.
        block_count: u32,
    },
    /// Write a short text onto a sign.
    WriteSign {
        /// Sign position.
        position: Vec3,
        /// Sign text.
        text: String,
    },
}

impl ActionParams {
    /// The action kind these parameters belong to.
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::MoveTo { .. } => ActionKind::MoveTo,
            Self::Explore { .. } => ActionKind::Explore,
            Self::ApproachEntity { .. } => ActionKind::ApproachEntity,
            Self::Flee { .. } => ActionKind::Flee,
            Self::PlaceVoxel { .. } => ActionKind::PlaceVoxel,
            Self::DestroyVoxel { .. } => ActionKind::DestroyVoxel,
            Self::Speak { .. } => ActionKind::Speak,
            Self::Rest => ActionKind::Rest,
            Self::Observe => ActionKind::Observe,
            Self::Challenge { .. } => ActionKind::Challenge,
            Self::ClaimTerritory { .. } => ActionKind::ClaimTerritory,
            Self::CreateArt { .. } => ActionKind::CreateArt,
            Self::WriteSign { .. } => ActionKind::WriteSign,
        }
    }
}

/// One planned action with its parameters and the reason it was chosen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionProposal {
    /// The action to perform.
    pub action: ActionKind,
    /// Typed parameters for the action.
    pub params: ActionParams,
    /// Short machine-readable reason, e.g. `achieve_curiosity_satisfied`.
    pub reason: String,
}

// ---------------------------------------------------------------------------
// Summaries
// ---------------------------------------------------------------------------

/// An action the runtime executed, as reported in the tick summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ActionTaken {
    /// The executed action.
    pub action: ActionKind,
    /// Why it was planned.
    pub reason: String,
}

/// One turn of a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConversationTurn {
    /// Who spoke.
    pub speaker: EntityId,
    /// The speaker's display name.
    pub speaker_name: String,
    /// What was said.
    pub text: String,
    /// Zero-based turn index.
    pub turn: u32,
}

/// Result of a completed conversation between two entities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConversationSummary {
    /// The initiator.
    pub initiator: EntityId,
    /// The initiator's name.
    pub initiator_name: String,
    /// The respondent.
    pub respondent: EntityId,
    /// The respondent's name.
    pub respondent_name: String,
    /// The turns spoken, in order.
    pub turns: Vec<ConversationTurn>,
    /// Classified outcome.
    pub outcome: ConversationOutcome,
    /// The topic that framed the exchange.
    pub topic: String,
    /// Tick the conversation completed in.
    pub tick: u64,
}

/// Result of a short conflict that preempted a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ConflictSummary {
    /// One side of the conflict.
    pub instigator: EntityId,
    /// The other side.
    pub target: EntityId,
    /// Who came out ahead.
    pub winner: EntityId,
    /// Tick the conflict resolved in.
    pub tick: u64,
}

/// Everything that happened to one entity in one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TickSummary {
    /// The entity this summary is for.
    pub entity_id: EntityId,
    /// The entity's display name.
    pub entity_name: String,
    /// The tick number.
    pub tick: u64,
    /// Executed actions with their reasons.
    pub actions_taken: Vec<ActionTaken>,
    /// A conversation, if one ran.
    pub conversation: Option<ConversationSummary>,
    /// A conflict, if one resolved instead of a conversation.
    pub conflict: Option<ConflictSummary>,
    /// Need values at the end of the tick.
    pub needs: Needs,
    /// Behavior mode at the end of the tick.
    pub behavior_mode: BehaviorMode,
    /// The goal that drove the plan (the first proposal's reason), or
    /// `idle` when the plan was empty.
    pub goal: String,
    /// Awareness hint surfaced this tick, if any.
    pub awareness_hint: Option<String>,
    /// Observer count used for the meta-awareness update.
    pub observer_count: u32,
}
