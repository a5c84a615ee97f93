//! Goal-Oriented Action Planning. No LLM calls -- pure algorithmic
//! planning.
//!
//! Pipeline per entity per tick:
//!
//! 1. Read the needs (which are most urgent?)
//! 2. Read the perception (who and what is around?)
//! 3. Select the best goal
//! 4. Backward-chain an action sequence to achieve it
//!
//! The planner is deterministic modulo the selection jitter: callers
//! pass the RNG, so a seeded RNG reproduces the plan exactly.

pub mod catalog;
mod params;

use std::collections::BTreeMap;

use genesis_types::{
    ActionKind, ActionParams, ActionProposal, AgentPolicy, BehaviorMode, Needs,
    Perception, Personality, Vec3,
};
use rand::Rng;
use tracing::debug;

use self::catalog::{ActionSpec, CATALOG, Goal, WorldFlag, effect_label};

/// Everything the planner reads about one entity for one tick.
///
/// The runtime assembles this from the entity snapshot; the planner
/// never touches shared state.
#[derive(Debug)]
pub struct PlanContext<'a> {
    /// Current position.
    pub position: Vec3,
    /// Current energy value.
    pub energy: f64,
    /// Current behavior mode.
    pub behavior_mode: BehaviorMode,
    /// Recently visited positions (for explore biasing).
    pub visited_positions: &'a [Vec3],
    /// Current needs.
    pub needs: &'a Needs,
    /// The entity's personality.
    pub personality: &'a Personality,
    /// This tick's perception snapshot.
    pub perception: &'a Perception,
    /// Optional user-agent directive bag (consumed by conversations, not
    /// by planning).
    pub policy: Option<&'a AgentPolicy>,
}

/// Energy below which the plan is forced to a single `rest`.
pub const ENERGY_CRITICAL: f64 = 10.0;

/// Produce an ordered action plan for one tick.
///
/// Critically low energy overrides everything with `rest`. An empty
/// chain falls back to `observe`.
pub fn plan<R: Rng + ?Sized>(ctx: &PlanContext<'_>, rng: &mut R) -> Vec<ActionProposal> {
    if ctx.energy < ENERGY_CRITICAL {
        debug!(energy = ctx.energy, "energy critically low, forcing rest");
        return vec![ActionProposal {
            action: ActionKind::Rest,
            params: ActionParams::Rest,
            reason: String::from("energy_critical"),
        }];
    }

    let goal = select_goal(ctx, rng);
    debug!(goal = goal.name(), mode = ?ctx.behavior_mode, "goal selected");

    let mut actions = find_actions(goal, ctx, rng);

    if actions.is_empty() {
        actions.push(ActionProposal {
            action: ActionKind::Observe,
            params: ActionParams::Observe,
            reason: String::from("no_plan_found"),
        });
    }

    actions
}

// ---------------------------------------------------------------------------
// Goal selection
// ---------------------------------------------------------------------------

/// The need value backing a goal's base score.
const fn base_score(goal: Goal, needs: &Needs) -> f64 {
    match goal {
        Goal::SatisfyCuriosity => needs.curiosity,
        Goal::SatisfySocial => needs.social,
        Goal::SatisfyCreation => needs.creation,
        Goal::SatisfyDominance => needs.dominance,
        Goal::SeekSafety => needs.safety,
        Goal::SatisfyExpression => needs.expression,
        Goal::SatisfyUnderstanding => needs.understanding,
        Goal::RestoreEnergy => needs.energy,
        Goal::DesperateEvolution => 0.0,
    }
}

/// Personality bonus applied once per matching goal.
const fn personality_bonus(goal: Goal, p: &Personality) -> f64 {
    match goal {
        Goal::SeekSafety => p.self_preservation * 20.0,
        Goal::SatisfyCuriosity => p.curiosity * 15.0,
        Goal::SatisfyDominance => p.aggression * 10.0,
        Goal::SatisfySocial => p.empathy * 10.0,
        Goal::SatisfyCreation => p.creativity * 12.0,
        Goal::SatisfyExpression => p.verbosity * 8.0,
        Goal::SatisfyUnderstanding => p.planning_horizon * 8.0,
        Goal::RestoreEnergy | Goal::DesperateEvolution => 0.0,
    }
}

/// Context bonus from the perception snapshot.
fn context_bonus(goal: Goal, perception: &Perception) -> f64 {
    let mut bonus = 0.0;

    if !perception.threats.is_empty() && goal == Goal::SeekSafety {
        bonus += 40.0;
    }

    if !perception.nearby.is_empty() {
        match goal {
            Goal::SatisfySocial => bonus += 10.0,
            Goal::SatisfyExpression => bonus += 5.0,
            _ => {}
        }
    }

    if perception.visible.is_empty() {
        match goal {
            Goal::SatisfySocial => bonus -= 20.0,
            Goal::SatisfyCuriosity => bonus += 10.0,
            _ => {}
        }
    }

    bonus
}

/// Pick the goal with the highest score.
///
/// Behavior modes short-circuit scoring: desperate always pursues
/// desperate evolution, rampage always pursues dominance. Normal mode
/// scores `need + personality bonus + context bonus + jitter(+-5)`.
fn select_goal<R: Rng + ?Sized>(ctx: &PlanContext<'_>, rng: &mut R) -> Goal {
    match ctx.behavior_mode {
        BehaviorMode::Desperate => return Goal::DesperateEvolution,
        BehaviorMode::Rampage => return Goal::SatisfyDominance,
        BehaviorMode::Normal => {}
    }

    let mut best = Goal::SatisfyCuriosity;
    let mut best_score = f64::NEG_INFINITY;

    for goal in Goal::SCORED {
        let score = base_score(goal, ctx.needs)
            + personality_bonus(goal, ctx.personality)
            + context_bonus(goal, ctx.perception)
            + rng.random_range(-5.0..=5.0);
        if score > best_score {
            best_score = score;
            best = goal;
        }
    }

    best
}

// ---------------------------------------------------------------------------
// Backward chaining
// ---------------------------------------------------------------------------

/// Derive the boolean world-state flags from context.
fn compute_world_state(ctx: &PlanContext<'_>) -> BTreeMap<WorldFlag, bool> {
    let p = ctx.personality;
    let perception = ctx.perception;

    let mut state = BTreeMap::new();
    state.insert(WorldFlag::EntityVisible, !perception.visible.is_empty());
    state.insert(WorldFlag::EntityNearby, !perception.nearby.is_empty());
    state.insert(WorldFlag::ThreatDetected, !perception.threats.is_empty());
    state.insert(
        WorldFlag::DominanceHigh,
        p.ambition > 0.6 && p.aggression > 0.5,
    );
    state.insert(WorldFlag::HasBuildIntent, p.creativity > 0.4);
    state.insert(
        WorldFlag::HasThought,
        p.planning_horizon > 0.3 || p.empathy > 0.4 || p.ambition > 0.5,
    );
    // Effect flags start false; they become true only when an action is
    // planned. Two are derivable from context directly.
    state.insert(WorldFlag::NearEntity, !perception.nearby.is_empty());
    state.insert(WorldFlag::Safe, perception.threats.is_empty());
    state.insert(WorldFlag::EnergyRestored, ctx.energy > 80.0);
    state
}

/// Find an action sequence achieving the goal's unsatisfied effects.
fn find_actions<R: Rng + ?Sized>(
    goal: Goal,
    ctx: &PlanContext<'_>,
    rng: &mut R,
) -> Vec<ActionProposal> {
    let world_state = compute_world_state(ctx);

    let unsatisfied: Vec<WorldFlag> = goal
        .required_effects()
        .iter()
        .copied()
        .filter(|flag| !world_state.get(flag).copied().unwrap_or(false))
        .collect();

    if unsatisfied.is_empty() {
        // Goal is already met; do something low-cost.
        return vec![ActionProposal {
            action: ActionKind::Observe,
            params: ActionParams::Observe,
            reason: String::from("goal_already_met"),
        }];
    }

    backward_chain(&unsatisfied, &world_state, ctx, rng)
}

/// Chain backward from unsatisfied effects to the cheapest viable actions.
fn backward_chain<R: Rng + ?Sized>(
    unsatisfied: &[WorldFlag],
    world_state: &BTreeMap<WorldFlag, bool>,
    ctx: &PlanContext<'_>,
    rng: &mut R,
) -> Vec<ActionProposal> {
    let mut plan: Vec<ActionProposal> = Vec::new();
    let mut satisfied: Vec<WorldFlag> = Vec::new();
    let mut resolved_preconditions: Vec<WorldFlag> = Vec::new();

    for &effect in unsatisfied {
        if satisfied.contains(&effect) {
            continue;
        }

        let mut candidates: Vec<&ActionSpec> = CATALOG
            .iter()
            .filter(|spec| spec.effects.contains(&effect))
            .collect();
        // Stable sort: cost first, catalog order breaks ties.
        candidates.sort_by_key(|spec| spec.cost);

        for spec in candidates {
            let mut prereq_actions: Vec<ActionProposal> = Vec::new();
            let mut preconditions_met = true;

            for &precondition in spec.preconditions {
                if world_state.get(&precondition).copied().unwrap_or(false) {
                    continue;
                }
                if resolved_preconditions.contains(&precondition) {
                    continue;
                }
                match prereq_action(precondition, ctx, rng) {
                    Some(prereq) => {
                        prereq_actions.push(prereq);
                        resolved_preconditions.push(precondition);
                    }
                    None => {
                        preconditions_met = false;
                        break;
                    }
                }
            }

            if preconditions_met {
                plan.append(&mut prereq_actions);
                plan.push(ActionProposal {
                    action: spec.kind,
                    params: generate_params(spec.kind, effect, ctx, rng),
                    reason: format!("achieve_{}", effect_label(effect)),
                });
                satisfied.extend_from_slice(spec.effects);
                break;
            }
        }
    }

    plan
}

/// A single action that can satisfy a precondition, when one exists.
///
/// Only visibility and proximity can be manufactured; personality- and
/// threat-derived flags cannot be created by acting.
fn prereq_action<R: Rng + ?Sized>(
    precondition: WorldFlag,
    ctx: &PlanContext<'_>,
    rng: &mut R,
) -> Option<ActionProposal> {
    match precondition {
        WorldFlag::EntityVisible => Some(ActionProposal {
            action: ActionKind::Explore,
            params: ActionParams::Explore {
                target: params::explore_target(ctx, rng),
            },
            reason: String::from("find_entities"),
        }),
        WorldFlag::EntityNearby => {
            if ctx.perception.visible.is_empty() {
                Some(ActionProposal {
                    action: ActionKind::Explore,
                    params: ActionParams::Explore {
                        target: params::explore_target(ctx, rng),
                    },
                    reason: String::from("find_entities"),
                })
            } else {
                Some(ActionProposal {
                    action: ActionKind::ApproachEntity,
                    params: params::approach_params(ctx, rng),
                    reason: String::from("get_closer"),
                })
            }
        }
        _ => None,
    }
}

/// Generate concrete parameters for a chosen action.
fn generate_params<R: Rng + ?Sized>(
    kind: ActionKind,
    effect: WorldFlag,
    ctx: &PlanContext<'_>,
    rng: &mut R,
) -> ActionParams {
    match kind {
        ActionKind::MoveTo => {
            let target = if effect == WorldFlag::Safe {
                params::flee_target(ctx, rng)
            } else {
                params::wander_target(ctx, rng)
            };
            ActionParams::MoveTo { target }
        }
        ActionKind::Explore => ActionParams::Explore {
            target: params::explore_target(ctx, rng),
        },
        ActionKind::ApproachEntity => params::approach_params(ctx, rng),
        ActionKind::Flee => ActionParams::Flee {
            target: params::flee_target(ctx, rng),
        },
        ActionKind::PlaceVoxel => params::build_params(ctx, rng),
        ActionKind::DestroyVoxel => params::destroy_params(ctx, rng),
        ActionKind::Speak => params::speak_params(ctx),
        ActionKind::Rest => ActionParams::Rest,
        ActionKind::Observe => ActionParams::Observe,
        ActionKind::Challenge => params::challenge_params(ctx),
        ActionKind::ClaimTerritory => params::territory_params(ctx),
        ActionKind::CreateArt => params::art_params(ctx, rng),
        ActionKind::WriteSign => params::sign_params(ctx, rng),
    }
}
