//! Enumeration types shared across the Genesis workspace.
//!
//! All enums serialize as `snake_case` strings so that event payloads,
//! persisted state, and TypeScript bindings agree on one spelling.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// What kind of entity this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EntityKind {
    /// An autonomous AI being born inside the world.
    Native,
    /// A human-controlled avatar.
    Avatar,
    /// The singleton god entity.
    God,
    /// System-owned entities (markers, scripted props).
    System,
}

/// Discrete modifier of goal selection and policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum BehaviorMode {
    /// Ordinary goal selection.
    #[default]
    Normal,
    /// Multiple needs critically high; the entity pursues desperate evolution.
    Desperate,
    /// Dominance-saturated and fearless; the entity seeks dominance only.
    Rampage,
}

/// The eight scalar drives of an entity, each in `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Need {
    /// Drive to explore and learn.
    Curiosity,
    /// Drive to be near and interact with others.
    Social,
    /// Drive to build and make.
    Creation,
    /// Drive to dominate and claim.
    Dominance,
    /// Drive to be safe from threats.
    Safety,
    /// Drive to express thoughts outward.
    Expression,
    /// Drive to comprehend the world.
    Understanding,
    /// Remaining capacity to act. Drains; restored only by rest.
    Energy,
}

impl Need {
    /// All needs in stable order.
    pub const ALL: [Self; 8] = [
        Self::Curiosity,
        Self::Social,
        Self::Creation,
        Self::Dominance,
        Self::Safety,
        Self::Expression,
        Self::Understanding,
        Self::Energy,
    ];
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// The fixed catalog of actions the planner can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ActionKind {
    /// Walk toward a target position.
    MoveTo,
    /// Wander toward an unvisited area.
    Explore,
    /// Close distance to a visible entity.
    ApproachEntity,
    /// Move away from threats.
    Flee,
    /// Place a single voxel block.
    PlaceVoxel,
    /// Destroy a voxel block.
    DestroyVoxel,
    /// Say something to a nearby entity.
    Speak,
    /// Do nothing and recover energy.
    Rest,
    /// Watch the surroundings.
    Observe,
    /// Challenge a nearby entity for dominance.
    Challenge,
    /// Claim the surrounding area as territory.
    ClaimTerritory,
    /// Place multiple blocks in an artistic pattern.
    CreateArt,
    /// Write a short text onto a sign block.
    WriteSign,
}

/// Shape of a multi-block art piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ArtPattern {
    /// A vertical column.
    Tower,
    /// A flat vertical plane.
    Wall,
    /// Two pillars with a bridge.
    Arch,
    /// A flat horizontal lattice.
    Grid,
    /// Random placement in a small radius.
    Scatter,
    /// An ascending spiral.
    Spiral,
    /// Clustered irregular growth.
    Organic,
    /// Wide random placement.
    Abstract,
}

/// What a planned `speak` action intends to convey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum SpeechIntent {
    /// A joke or playful remark.
    Joke,
    /// A polite greeting.
    Greeting,
    /// An instruction or demand.
    Command,
    /// A factual observation.
    Observation,
    /// Idle chat.
    Chat,
    /// Speech with nobody in particular listening.
    Monologue,
}

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// Voxel block material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Material {
    /// Opaque and light-blocking; counts as a wall for perception.
    #[default]
    Solid,
    /// Transparent.
    Glass,
    /// Light-emitting.
    Emissive,
}

/// Whether an action or event was accepted by the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventResult {
    /// The world applied the action.
    Accepted,
    /// The world refused the action; `reason` carries why.
    Rejected,
}

/// Category of a world event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventType {
    /// A planned action executed by an entity.
    Action,
    /// A spoken utterance.
    Speech,
    /// A completed multi-turn conversation.
    Conversation,
    /// A short conflict that replaced a conversation.
    Conflict,
    /// A sandboxed code execution attempt.
    CodeExecuted,
    /// A god observation pass.
    GodObservation,
    /// A god world-update pass.
    GodWorldUpdate,
    /// A eulogy spoken by the god.
    GodEulogy,
    /// A world event created by the god (storm, aurora, ...).
    DivineEvent,
    /// An entity died.
    Death,
    /// An entity was spawned.
    Spawn,
    /// A god succession handover.
    Succession,
}

// ---------------------------------------------------------------------------
// Perception
// ---------------------------------------------------------------------------

/// How much detail a visual observation carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum DetailLevel {
    /// Close enough to read expressions and actions.
    High,
    /// Only silhouette and rough movement.
    Low,
}

// ---------------------------------------------------------------------------
// Awareness, relationships, conversations, god
// ---------------------------------------------------------------------------

/// Discrete bands of the meta-awareness scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AwarenessLevel {
    /// Below 0.3: no sense of being observed.
    Dormant,
    /// 0.3 to 0.7: vague unease.
    Stirring,
    /// 0.7 to 0.9: conscious of the simulation.
    Aware,
    /// 0.9 and above: fully awake to the construct.
    Transcendent,
}

/// Relationship-affecting event categories used by the delta table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum RelationshipEvent {
    /// A long, neutral-to-warm conversation.
    LongTalk,
    /// Was insulted or spoken to with hostility.
    Insulted,
    /// Built or created something together.
    SharedCreation,
    /// Lost a contest against the other.
    CompetedLost,
    /// Won a contest against the other.
    CompetedWon,
    /// Received help.
    Helped,
    /// Was threatened.
    Threatened,
}

/// Classified result of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum ConversationOutcome {
    /// Warm exchange.
    Friendly,
    /// Nothing notable.
    Neutral,
    /// More hostility than warmth.
    Hostile,
    /// An explicit agreement or pact was reached.
    Agreement,
    /// Open conflict broke out in words.
    Conflict,
}

/// The god entity's intervention tone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum GodPhase {
    /// Nurturing; spawns beings and gives gifts.
    #[default]
    Benevolent,
    /// Poses trials and scarcity.
    Testing,
    /// Withdraws and only watches.
    Silent,
    /// Speaks directly with awakened beings.
    Dialogic,
}
