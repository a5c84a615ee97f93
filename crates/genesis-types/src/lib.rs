//! Shared type definitions for the Genesis simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Genesis workspace. Frontend-facing types flow downstream to
//! `TypeScript` via `ts-rs` for the world viewer.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for identifiers
//! - [`enums`] -- Enumeration types (entities, actions, events, awareness)
//! - [`structs`] -- Core structs (entities, personality, needs, memories,
//!   relationships, events, voxels)
//! - [`actions`] -- Action proposals and per-tick summaries
//! - [`perception`] -- Perception payload delivered to entities each tick

pub mod actions;
pub mod enums;
pub mod ids;
pub mod perception;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use actions::{
    ActionParams, ActionProposal, ActionTaken, ConflictSummary, ConversationSummary,
    ConversationTurn, TickSummary,
};
pub use enums::{
    ActionKind, ArtPattern, AwarenessLevel, BehaviorMode, ConversationOutcome, DetailLevel,
    EntityKind, EventResult, EventType, GodPhase, Material, Need, RelationshipEvent,
    SpeechIntent,
};
pub use ids::{EntityId, EpisodeId, EventId};
pub use perception::{NearbyStructure, PerceivedSound, Perception, SoundSource, VisibleEntity};
pub use structs::{
    AgentPolicy, Entity, EntityState, Event, GodState, MEMORY_PIN_IMPORTANCE, MemoryEpisode,
    Needs, Personality, Relationship, VISITED_POSITIONS_CAP, Vec3, VoxelBlock, memory_types,
};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::EntityId::export_all();
        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::EpisodeId::export_all();

        // Enums
        let _ = crate::enums::EntityKind::export_all();
        let _ = crate::enums::BehaviorMode::export_all();
        let _ = crate::enums::Need::export_all();
        let _ = crate::enums::ActionKind::export_all();
        let _ = crate::enums::ArtPattern::export_all();
        let _ = crate::enums::SpeechIntent::export_all();
        let _ = crate::enums::Material::export_all();
        let _ = crate::enums::EventResult::export_all();
        let _ = crate::enums::EventType::export_all();
        let _ = crate::enums::DetailLevel::export_all();
        let _ = crate::enums::AwarenessLevel::export_all();
        let _ = crate::enums::RelationshipEvent::export_all();
        let _ = crate::enums::ConversationOutcome::export_all();
        let _ = crate::enums::GodPhase::export_all();

        // Structs
        let _ = crate::structs::Vec3::export_all();
        let _ = crate::structs::Personality::export_all();
        let _ = crate::structs::Needs::export_all();
        let _ = crate::structs::AgentPolicy::export_all();
        let _ = crate::structs::EntityState::export_all();
        let _ = crate::structs::GodState::export_all();
        let _ = crate::structs::Entity::export_all();
        let _ = crate::structs::MemoryEpisode::export_all();
        let _ = crate::structs::Relationship::export_all();
        let _ = crate::structs::Event::export_all();
        let _ = crate::structs::VoxelBlock::export_all();

        // Actions
        let _ = crate::actions::ActionParams::export_all();
        let _ = crate::actions::ActionProposal::export_all();
        let _ = crate::actions::ActionTaken::export_all();
        let _ = crate::actions::ConversationTurn::export_all();
        let _ = crate::actions::ConversationSummary::export_all();
        let _ = crate::actions::ConflictSummary::export_all();
        let _ = crate::actions::TickSummary::export_all();

        // Perception
        let _ = crate::perception::Perception::export_all();
        let _ = crate::perception::VisibleEntity::export_all();
        let _ = crate::perception::PerceivedSound::export_all();
        let _ = crate::perception::SoundSource::export_all();
        let _ = crate::perception::NearbyStructure::export_all();
    }
}
