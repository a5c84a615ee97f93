//! The fixed action catalog and goal definitions for the planner.
//!
//! Actions declare preconditions and effects over a small set of boolean
//! world-state flags. Goals name the effect set they require. The
//! catalog order is stable: it is the final tie-breaker after cost.

use genesis_types::ActionKind;

/// Boolean world-state flags the planner reasons over.
///
/// Context flags (`EntityVisible`, `ThreatDetected`, ...) are derived
/// from perception and personality; effect flags (`CuriositySatisfied`,
/// `BlockPlaced`, ...) start false and become true only when an action
/// that produces them is planned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum WorldFlag {
    /// At least one entity is visible.
    EntityVisible,
    /// At least one entity is within interaction range.
    EntityNearby,
    /// A threat is perceived.
    ThreatDetected,
    /// Personality supports dominance plays (ambition and aggression).
    DominanceHigh,
    /// Personality supports building (creativity).
    HasBuildIntent,
    /// Personality has something to say (planning, empathy, or ambition).
    HasThought,
    /// Position changed this plan.
    PositionChanged,
    /// Curiosity was addressed.
    CuriositySatisfied,
    /// The entity is close to another entity.
    NearEntity,
    /// No threat remains.
    Safe,
    /// Creation was addressed.
    CreationSatisfied,
    /// A block was placed.
    BlockPlaced,
    /// A block was destroyed.
    BlockDestroyed,
    /// Expression was addressed.
    ExpressionSatisfied,
    /// Energy was restored.
    EnergyRestored,
    /// Understanding was addressed.
    UnderstandingSatisfied,
    /// Dominance was addressed.
    DominanceSatisfied,
    /// Territory was claimed.
    TerritoryClaimed,
}

/// One catalog entry: what an action needs and what it produces.
#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    /// The action.
    pub kind: ActionKind,
    /// Flags that must hold (or be producible) before the action.
    pub preconditions: &'static [WorldFlag],
    /// Flags the action makes true.
    pub effects: &'static [WorldFlag],
    /// Planning cost; cheaper actions are preferred.
    pub cost: u32,
}

/// The full action catalog, in stable tie-break order.
pub const CATALOG: [ActionSpec; 13] = [
    ActionSpec {
        kind: ActionKind::MoveTo,
        preconditions: &[],
        effects: &[WorldFlag::PositionChanged],
        cost: 1,
    },
    ActionSpec {
        kind: ActionKind::Explore,
        preconditions: &[],
        effects: &[WorldFlag::CuriositySatisfied],
        cost: 2,
    },
    ActionSpec {
        kind: ActionKind::ApproachEntity,
        preconditions: &[WorldFlag::EntityVisible],
        effects: &[WorldFlag::NearEntity],
        cost: 1,
    },
    ActionSpec {
        kind: ActionKind::Flee,
        preconditions: &[WorldFlag::ThreatDetected],
        effects: &[WorldFlag::Safe],
        cost: 1,
    },
    ActionSpec {
        kind: ActionKind::PlaceVoxel,
        preconditions: &[WorldFlag::HasBuildIntent],
        effects: &[WorldFlag::CreationSatisfied, WorldFlag::BlockPlaced],
        cost: 3,
    },
    ActionSpec {
        kind: ActionKind::DestroyVoxel,
        preconditions: &[],
        effects: &[WorldFlag::BlockDestroyed],
        cost: 2,
    },
    ActionSpec {
        kind: ActionKind::Speak,
        preconditions: &[WorldFlag::EntityNearby],
        effects: &[WorldFlag::ExpressionSatisfied],
        cost: 2,
    },
    ActionSpec {
        kind: ActionKind::Rest,
        preconditions: &[],
        effects: &[WorldFlag::EnergyRestored],
        cost: 1,
    },
    ActionSpec {
        kind: ActionKind::Observe,
        preconditions: &[],
        effects: &[WorldFlag::UnderstandingSatisfied],
        cost: 1,
    },
    ActionSpec {
        kind: ActionKind::Challenge,
        preconditions: &[WorldFlag::EntityNearby],
        effects: &[WorldFlag::DominanceSatisfied],
        cost: 4,
    },
    ActionSpec {
        kind: ActionKind::ClaimTerritory,
        preconditions: &[WorldFlag::DominanceHigh],
        effects: &[WorldFlag::DominanceSatisfied, WorldFlag::TerritoryClaimed],
        cost: 5,
    },
    ActionSpec {
        kind: ActionKind::CreateArt,
        preconditions: &[],
        effects: &[WorldFlag::CreationSatisfied, WorldFlag::ExpressionSatisfied],
        cost: 4,
    },
    ActionSpec {
        kind: ActionKind::WriteSign,
        preconditions: &[WorldFlag::HasThought],
        effects: &[WorldFlag::ExpressionSatisfied],
        cost: 3,
    },
];

/// The goals the planner can pursue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    /// Address curiosity.
    SatisfyCuriosity,
    /// Get near another entity.
    SatisfySocial,
    /// Address creation.
    SatisfyCreation,
    /// Address dominance.
    SatisfyDominance,
    /// Get safe from threats.
    SeekSafety,
    /// Address expression.
    SatisfyExpression,
    /// Address understanding.
    SatisfyUnderstanding,
    /// Restore energy.
    RestoreEnergy,
    /// Desperate mode: dominance and creation at once.
    DesperateEvolution,
}

impl Goal {
    /// The effect flags this goal requires.
    pub const fn required_effects(self) -> &'static [WorldFlag] {
        match self {
            Self::SatisfyCuriosity => &[WorldFlag::CuriositySatisfied],
            Self::SatisfySocial => &[WorldFlag::NearEntity],
            Self::SatisfyCreation => &[WorldFlag::CreationSatisfied],
            Self::SatisfyDominance => &[WorldFlag::DominanceSatisfied],
            Self::SeekSafety => &[WorldFlag::Safe],
            Self::SatisfyExpression => &[WorldFlag::ExpressionSatisfied],
            Self::SatisfyUnderstanding => &[WorldFlag::UnderstandingSatisfied],
            Self::RestoreEnergy => &[WorldFlag::EnergyRestored],
            Self::DesperateEvolution => {
                &[WorldFlag::CreationSatisfied, WorldFlag::DominanceSatisfied]
            }
        }
    }

    /// Stable goal name used in logs and summaries.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SatisfyCuriosity => "satisfy_curiosity",
            Self::SatisfySocial => "satisfy_social",
            Self::SatisfyCreation => "satisfy_creation",
            Self::SatisfyDominance => "satisfy_dominance",
            Self::SeekSafety => "seek_safety",
            Self::SatisfyExpression => "satisfy_expression",
            Self::SatisfyUnderstanding => "satisfy_understanding",
            Self::RestoreEnergy => "restore_energy",
            Self::DesperateEvolution => "desperate_evolution",
        }
    }

    /// Goals scored in normal mode, in stable order.
    pub const SCORED: [Self; 8] = [
        Self::SatisfyCuriosity,
        Self::SatisfySocial,
        Self::SatisfyCreation,
        Self::SatisfyDominance,
        Self::SeekSafety,
        Self::SatisfyExpression,
        Self::SatisfyUnderstanding,
        Self::RestoreEnergy,
    ];
}

/// Stable label for an effect flag, used in plan reasons.
pub const fn effect_label(flag: WorldFlag) -> &'static str {
    match flag {
        WorldFlag::EntityVisible => "entity_visible",
        WorldFlag::EntityNearby => "entity_nearby",
        WorldFlag::ThreatDetected => "threat_detected",
        WorldFlag::DominanceHigh => "dominance_high",
        WorldFlag::HasBuildIntent => "has_build_intent",
        WorldFlag::HasThought => "has_thought",
        WorldFlag::PositionChanged => "position_changed",
        WorldFlag::CuriositySatisfied => "curiosity_satisfied",
        WorldFlag::NearEntity => "near_entity",
        WorldFlag::Safe => "safe",
        WorldFlag::CreationSatisfied => "creation_satisfied",
        WorldFlag::BlockPlaced => "block_placed",
        WorldFlag::BlockDestroyed => "block_destroyed",
        WorldFlag::ExpressionSatisfied => "expression_satisfied",
        WorldFlag::EnergyRestored => "energy_restored",
        WorldFlag::UnderstandingSatisfied => "understanding_satisfied",
        WorldFlag::DominanceSatisfied => "dominance_satisfied",
        WorldFlag::TerritoryClaimed => "territory_claimed",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_goal_effect_has_a_producer() {
        for goal in Goal::SCORED {
            for effect in goal.required_effects() {
                let producible = CATALOG
                    .iter()
                    .any(|spec| spec.effects.contains(effect));
                assert!(producible, "no action produces {effect:?}");
            }
        }
    }

    #[test]
    fn catalog_costs_match_design() {
        let rest = CATALOG.iter().find(|s| s.kind == ActionKind::Rest);
        assert_eq!(rest.map(|s| s.cost), Some(1));
        let claim = CATALOG.iter().find(|s| s.kind == ActionKind::ClaimTerritory);
        assert_eq!(claim.map(|s| s.cost), Some(5));
    }
}
