//! Core entity structs for the Genesis simulation.
//!
//! Covers geometry, `Personality`, `Needs`, entity records, episodic
//! memories, relationships, world events, and voxel blocks.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{
    BehaviorMode, EntityKind, EventResult, EventType, GodPhase, Material, Need,
};
use crate::ids::{EntityId, EpisodeId, EventId};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point or direction in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Vec3 {
    /// East-west axis.
    pub x: f64,
    /// Vertical axis.
    pub y: f64,
    /// North-south axis.
    pub z: f64,
}

impl Vec3 {
    /// Construct a vector from components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise subtraction `self - other`.
    pub const fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Euclidean length.
    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Distance to another point.
    pub fn distance(self, other: Self) -> f64 {
        self.sub(other).length()
    }

    /// Unit vector in the same direction, or zero for degenerate input.
    pub fn normalized(self) -> Self {
        let len = self.length();
        if len < 1e-9 {
            return Self::default();
        }
        Self::new(self.x / len, self.y / len, self.z / len)
    }

    /// Dot product.
    pub const fn dot(self, other: Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// The same vector flattened onto the XZ plane (`y = 0`).
    pub const fn xz(self) -> Self {
        Self::new(self.x, 0.0, self.z)
    }

    /// Integer voxel coordinate containing this point.
    pub fn voxel(self) -> (i64, i64, i64) {
        (
            self.x.floor() as i64,
            self.y.floor() as i64,
            self.z.floor() as i64,
        )
    }
}

// ---------------------------------------------------------------------------
// Personality
// ---------------------------------------------------------------------------

/// Immutable 18-axis personality vector assigned at entity creation.
///
/// Each axis is an `f64` in `[0, 1]`. Personality influences goal
/// selection, action parameters, and conversational voice, but never
/// changes over the entity's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Personality {
    /// Drive to explore and investigate.
    pub curiosity: f64,
    /// Warmth toward and understanding of others.
    pub empathy: f64,
    /// Drive to make new things.
    pub creativity: f64,
    /// Tendency toward conflict and confrontation.
    pub aggression: f64,
    /// Instinct to avoid danger.
    pub self_preservation: f64,
    /// How much the entity talks.
    pub verbosity: f64,
    /// How far ahead the entity thinks.
    pub planning_horizon: f64,
    /// Hunger for status and territory.
    pub ambition: f64,
    /// Formality and courtesy in speech.
    pub politeness: f64,
    /// Playful wit.
    pub humor: f64,
    /// Tendency toward truthful communication.
    pub honesty: f64,
    /// Tendency to take charge of groups.
    pub leadership: f64,
    /// Sensitivity to color and form.
    pub aesthetic_sense: f64,
    /// Preference for structure (high) versus chaos (low).
    pub order_vs_chaos: f64,
    /// Tolerance for waiting and slow progress.
    pub patience: f64,
    /// Lightness and love of games.
    pub playfulness: f64,
    /// Doubt toward claims and appearances.
    pub skepticism: f64,
    /// Commitment to relationships.
    pub loyalty: f64,
}

impl Personality {
    /// All axes as `(name, value)` pairs in declaration order.
    pub const fn axes(&self) -> [(&'static str, f64); 18] {
        [
            ("curiosity", self.curiosity),
            ("empathy", self.empathy),
            ("creativity", self.creativity),
            ("aggression", self.aggression),
            ("self_preservation", self.self_preservation),
            ("verbosity", self.verbosity),
            ("planning_horizon", self.planning_horizon),
            ("ambition", self.ambition),
            ("politeness", self.politeness),
            ("humor", self.humor),
            ("honesty", self.honesty),
            ("leadership", self.leadership),
            ("aesthetic_sense", self.aesthetic_sense),
            ("order_vs_chaos", self.order_vs_chaos),
            ("patience", self.patience),
            ("playfulness", self.playfulness),
            ("skepticism", self.skepticism),
            ("loyalty", self.loyalty),
        ]
    }

    /// One-line trait summary naming the three strongest axes.
    ///
    /// Pure: the same personality always produces the same string. Ties
    /// break by axis declaration order (the sort is stable).
    pub fn describe(&self) -> String {
        let mut axes = self.axes();
        axes.sort_by(|a, b| b.1.total_cmp(&a.1));
        let dominant: Vec<String> = axes
            .iter()
            .take(3)
            .map(|(name, value)| format!("{} ({:.1})", name.replace('_', " "), value))
            .collect();
        format!("A being defined by {}.", dominant.join(", "))
    }

    /// Short speaking-style tags derived from trait thresholds at 0.3 and 0.7.
    ///
    /// Used to flavor conversation system prompts. Returns a single
    /// "balanced and measured" tag when no trait is extreme.
    pub fn speaking_style(&self) -> Vec<&'static str> {
        let mut hints = Vec::new();

        if self.verbosity > 0.7 {
            hints.push("talkative, elaborate");
        } else if self.verbosity < 0.3 {
            hints.push("terse, few words");
        }

        if self.politeness > 0.7 {
            hints.push("formal and polite");
        } else if self.politeness < 0.3 {
            hints.push("blunt and crude");
        }

        if self.humor > 0.7 {
            hints.push("witty, uses humor");
        } else if self.humor < 0.3 {
            hints.push("dead serious");
        }

        if self.honesty > 0.7 {
            hints.push("direct and honest");
        } else if self.honesty < 0.3 {
            hints.push("evasive, may lie");
        }

        if self.leadership > 0.7 {
            hints.push("commanding, takes charge");
        } else if self.leadership < 0.3 {
            hints.push("deferential, listens more");
        }

        if self.aggression > 0.7 {
            hints.push("aggressive, confrontational");
        }

        if self.empathy > 0.7 {
            hints.push("warm and understanding");
        }

        if hints.is_empty() {
            hints.push("balanced and measured");
        }
        hints
    }
}

// ---------------------------------------------------------------------------
// Needs
// ---------------------------------------------------------------------------

/// The eight drives of an entity, each held in `[0, 100]`.
///
/// Needs accumulate over time (energy drains instead) and are discharged
/// by the actions that address them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Needs {
    /// Drive to explore.
    pub curiosity: f64,
    /// Drive to interact.
    pub social: f64,
    /// Drive to build.
    pub creation: f64,
    /// Drive to dominate.
    pub dominance: f64,
    /// Drive to be safe.
    pub safety: f64,
    /// Drive to express.
    pub expression: f64,
    /// Drive to comprehend.
    pub understanding: f64,
    /// Capacity to act.
    pub energy: f64,
}

impl Default for Needs {
    fn default() -> Self {
        Self {
            curiosity: 50.0,
            social: 50.0,
            creation: 50.0,
            dominance: 30.0,
            safety: 20.0,
            expression: 50.0,
            understanding: 50.0,
            energy: 100.0,
        }
    }
}

impl Needs {
    /// Read the value of one need.
    pub const fn value(&self, need: Need) -> f64 {
        match need {
            Need::Curiosity => self.curiosity,
            Need::Social => self.social,
            Need::Creation => self.creation,
            Need::Dominance => self.dominance,
            Need::Safety => self.safety,
            Need::Expression => self.expression,
            Need::Understanding => self.understanding,
            Need::Energy => self.energy,
        }
    }

    /// Mutable access to one need.
    pub const fn value_mut(&mut self, need: Need) -> &mut f64 {
        match need {
            Need::Curiosity => &mut self.curiosity,
            Need::Social => &mut self.social,
            Need::Creation => &mut self.creation,
            Need::Dominance => &mut self.dominance,
            Need::Safety => &mut self.safety,
            Need::Expression => &mut self.expression,
            Need::Understanding => &mut self.understanding,
            Need::Energy => &mut self.energy,
        }
    }

    /// Subtract `amount` from a need, flooring at zero.
    pub fn discharge(&mut self, need: Need, amount: f64) {
        let slot = self.value_mut(need);
        *slot = (*slot - amount).max(0.0);
    }

    /// Clamp every need into `[0, 100]`.
    pub fn clamp_all(&mut self) {
        for need in Need::ALL {
            let slot = self.value_mut(need);
            *slot = slot.clamp(0.0, 100.0);
        }
    }

    /// Count needs (excluding energy) above the given threshold.
    pub fn critical_count(&self, threshold: f64) -> usize {
        Need::ALL
            .iter()
            .filter(|n| **n != Need::Energy && self.value(**n) > threshold)
            .count()
    }
}

// ---------------------------------------------------------------------------
// Entity state and entities
// ---------------------------------------------------------------------------

/// Maximum retained entries in the visited-position ring.
pub const VISITED_POSITIONS_CAP: usize = 20;

/// Directive bag for user-controlled agents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentPolicy {
    /// A short free-text directive injected into conversations as a
    /// "guiding thought". Truncated to 300 characters at use sites.
    pub current_directive: String,
}

/// Mutable per-entity state, persisted as one JSON blob at the storage
/// boundary but held as a typed record everywhere else.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct EntityState {
    /// Current need values.
    pub needs: Needs,
    /// Current behavior mode.
    pub behavior_mode: BehaviorMode,
    /// Recently occupied positions, newest last, at most
    /// [`VISITED_POSITIONS_CAP`] entries.
    pub visited_positions: Vec<Vec3>,
    /// Last tick a conversation completed with each partner.
    pub last_conversation_ticks: BTreeMap<EntityId, u64>,
    /// Entities this one has encountered before.
    pub known_entity_ids: BTreeSet<EntityId>,
    /// Human observers currently watching this entity.
    pub observer_count: u32,
}

impl EntityState {
    /// Record a visited position, truncating the ring to its cap.
    pub fn push_visited(&mut self, position: Vec3) {
        self.visited_positions.push(position);
        if self.visited_positions.len() > VISITED_POSITIONS_CAP {
            let excess = self.visited_positions.len() - VISITED_POSITIONS_CAP;
            self.visited_positions.drain(..excess);
        }
    }
}

/// Book-keeping carried by the singleton god entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct GodState {
    /// Current intervention tone.
    pub phase: GodPhase,
    /// Ticks elapsed in the current phase.
    pub ticks_in_phase: u64,
    /// Observation passes completed.
    pub observations_made: u64,
    /// Interventions executed.
    pub interventions_made: u64,
    /// Beings spawned by the god.
    pub beings_created: u64,
    /// Beings eulogized by the god.
    pub beings_mourned: u64,
    /// Tick of the last observation pass.
    pub last_observation_tick: u64,
    /// Tick of the last world-update pass.
    pub last_world_update_tick: u64,
    /// Tick of the last succession check.
    pub last_succession_check_tick: u64,
    /// The question the god carries.
    pub current_question: String,
    /// The god's present mood, surfaced into prompts.
    pub mood: String,
    /// Whether any entity has crossed high awareness (drives the silent
    /// to dialogic phase transition).
    pub high_awareness_detected: bool,
}

impl Default for GodState {
    fn default() -> Self {
        Self {
            phase: GodPhase::Benevolent,
            ticks_in_phase: 0,
            observations_made: 0,
            interventions_made: 0,
            beings_created: 0,
            beings_mourned: 0,
            last_observation_tick: 0,
            last_world_update_tick: 0,
            last_succession_check_tick: 0,
            current_question: String::from("What is evolution?"),
            mood: String::from("anticipation"),
            high_awareness_detected: false,
        }
    }
}

/// A being in the world: native AI, human avatar, god, or system prop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Entity {
    /// Stable identifier.
    pub id: EntityId,
    /// Display name.
    pub name: String,
    /// What kind of entity this is.
    pub kind: EntityKind,
    /// World position.
    pub position: Vec3,
    /// Unit facing direction in the XZ plane (`y` is always 0).
    pub facing: Vec3,
    /// Whether the entity is alive.
    pub alive: bool,
    /// Tick of birth.
    pub birth_tick: u64,
    /// Tick of death, unset while alive.
    pub death_tick: Option<u64>,
    /// Immutable personality, written once at creation.
    pub personality: Personality,
    /// Mutable state record.
    pub state: EntityState,
    /// Awareness of being observed, in `[0, 1]`.
    pub meta_awareness: f64,
    /// Optional directive bag for user-controlled agents.
    pub agent_policy: Option<AgentPolicy>,
    /// Present only on the singleton god entity.
    pub god_state: Option<GodState>,
}

// ---------------------------------------------------------------------------
// Episodic memory
// ---------------------------------------------------------------------------

/// Well-known memory type category constants.
pub mod memory_types {
    /// First meeting with another entity.
    pub const ENCOUNTER: &str = "encounter";
    /// A threat was perceived.
    pub const THREAT: &str = "threat";
    /// Territory was claimed.
    pub const TERRITORY: &str = "territory";
    /// Something was built or made.
    pub const CREATION: &str = "creation";
    /// A conversation happened.
    pub const CONVERSATION: &str = "conversation";
    /// A memory stored by sandboxed code via `world.remember`.
    pub const CODE_MEMORY: &str = "code_memory";
    /// A vision broadcast by the god.
    pub const DIVINE_VISION: &str = "divine_vision";
}

/// Importance at or above which an episode is never purged by TTL.
pub const MEMORY_PIN_IMPORTANCE: f64 = 0.8;

/// A single dated, importance-weighted memory held by one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MemoryEpisode {
    /// Stable identifier.
    pub id: EpisodeId,
    /// The owning entity.
    pub entity_id: EntityId,
    /// Human-readable description of what happened.
    pub summary: String,
    /// Retention weight in `[0, 1]`; at or above
    /// [`MEMORY_PIN_IMPORTANCE`] the episode is pinned.
    pub importance: f64,
    /// Tick when the memory formed.
    pub tick: u64,
    /// Other entities involved.
    pub related: Vec<EntityId>,
    /// Where the memory formed.
    pub location: Vec3,
    /// Category, one of the [`memory_types`] constants.
    pub memory_type: String,
    /// Ticks until the episode expires (unless pinned).
    pub ttl: u64,
}

impl MemoryEpisode {
    /// Whether the episode has expired at `now_tick`.
    ///
    /// Pinned episodes (importance at or above
    /// [`MEMORY_PIN_IMPORTANCE`]) never expire.
    pub fn expired(&self, now_tick: u64) -> bool {
        self.importance < MEMORY_PIN_IMPORTANCE
            && now_tick >= self.tick.saturating_add(self.ttl)
    }
}

// ---------------------------------------------------------------------------
// Relationships
// ---------------------------------------------------------------------------

/// Directed relationship state from one entity toward another.
///
/// Trust ranges over `[-100, 100]`; the remaining axes over `[0, 100]`.
/// Anger, gratitude, and fear are volatile and decay multiplicatively.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Relationship {
    /// Confidence in the other's good intent. Negative means distrust.
    pub trust: f64,
    /// How well the other is known.
    pub familiarity: f64,
    /// Resentment toward the other (volatile).
    pub anger: f64,
    /// Indebtedness toward the other (volatile).
    pub gratitude: f64,
    /// Dread of the other (volatile).
    pub fear: f64,
    /// Regard for the other's capability.
    pub respect: f64,
    /// Competitive tension with the other.
    pub rivalry: f64,
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// One append-only record in the world event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Event {
    /// Stable identifier.
    pub id: EventId,
    /// Tick the event occurred in.
    pub tick: u64,
    /// Insertion sequence within the log; assigned on append. Total
    /// ordering is `(tick asc, seq asc)`.
    pub seq: u64,
    /// The entity that caused the event.
    pub actor: EntityId,
    /// Event category.
    pub event_type: EventType,
    /// The specific action or operation name.
    pub action: String,
    /// Action parameters or payload.
    pub params: serde_json::Value,
    /// Whether the world accepted the event's action.
    pub result: EventResult,
    /// Why the action was taken, or why it was rejected.
    pub reason: String,
    /// Where the event happened.
    pub position: Vec3,
    /// Significance in `[0, 1]`; events below 0.2 may be compacted.
    pub importance: f64,
}

// ---------------------------------------------------------------------------
// Voxels
// ---------------------------------------------------------------------------

/// A block in the shared voxel world. At most one block exists per
/// integer coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VoxelBlock {
    /// Integer X coordinate.
    pub x: i64,
    /// Integer Y coordinate.
    pub y: i64,
    /// Integer Z coordinate.
    pub z: i64,
    /// Hex color string, e.g. `#FF8800`.
    pub color: String,
    /// Block material.
    pub material: Material,
    /// The entity that placed the block.
    pub placed_by: EntityId,
    /// Tick the block was placed.
    pub placed_tick: u64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn describe_is_pure() {
        let p = Personality {
            curiosity: 0.9,
            creativity: 0.8,
            empathy: 0.7,
            ..Personality::default()
        };
        assert_eq!(p.describe(), p.describe());
        assert!(p.describe().contains("curiosity"));
    }

    #[test]
    fn speaking_style_thresholds() {
        let blunt = Personality {
            politeness: 0.1,
            verbosity: 0.1,
            humor: 0.5,
            ..Personality::default()
        };
        let tags = blunt.speaking_style();
        assert!(tags.contains(&"blunt and crude"));
        assert!(tags.contains(&"terse, few words"));

        let plain = Personality {
            verbosity: 0.5,
            politeness: 0.5,
            humor: 0.5,
            honesty: 0.5,
            leadership: 0.5,
            ..Personality::default()
        };
        assert_eq!(plain.speaking_style(), vec!["balanced and measured"]);
    }

    #[test]
    fn needs_defaults_match_design() {
        let needs = Needs::default();
        assert!((needs.curiosity - 50.0).abs() < f64::EPSILON);
        assert!((needs.dominance - 30.0).abs() < f64::EPSILON);
        assert!((needs.safety - 20.0).abs() < f64::EPSILON);
        assert!((needs.energy - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn needs_clamp_bounds() {
        let mut needs = Needs::default();
        needs.curiosity = 250.0;
        needs.energy = -10.0;
        needs.clamp_all();
        assert!((needs.curiosity - 100.0).abs() < f64::EPSILON);
        assert!(needs.energy.abs() < f64::EPSILON);
    }

    #[test]
    fn visited_ring_truncates() {
        let mut state = EntityState::default();
        for i in 0..30 {
            state.push_visited(Vec3::new(f64::from(i), 0.0, 0.0));
        }
        assert_eq!(state.visited_positions.len(), VISITED_POSITIONS_CAP);
        // Oldest entries dropped, newest kept.
        assert!((state.visited_positions[0].x - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn pinned_memory_never_expires() {
        let episode = MemoryEpisode {
            id: EpisodeId::new(),
            entity_id: EntityId::new(),
            summary: String::from("claimed the eastern ridge"),
            importance: 0.9,
            tick: 100,
            related: Vec::new(),
            location: Vec3::default(),
            memory_type: String::from(memory_types::TERRITORY),
            ttl: 10,
        };
        assert!(!episode.expired(1_000_000));

        let fleeting = MemoryEpisode {
            importance: 0.3,
            ..episode
        };
        assert!(fleeting.expired(110));
        assert!(!fleeting.expired(109));
    }

    #[test]
    fn voxel_floor_conversion() {
        let p = Vec3::new(1.9, -0.5, 3.2);
        assert_eq!(p.voxel(), (1, -1, 3));
    }
}
