//! Need accumulation and discharge.
//!
//! Each need accumulates at a base rate scaled by the matching
//! personality axis (range 0.3x to 1.7x). Energy drains instead of
//! accumulating. Perception context modifies the rates: company
//! amplifies social need, threats spike safety, solitude breeds
//! curiosity. Taking an action partially discharges the need behind it.

use genesis_types::{ActionKind, ActionProposal, Need, Needs, Perception, Personality};

/// Base accumulation per tick, before personality scaling.
const ACCUMULATION: [(Need, f64); 8] = [
    (Need::Curiosity, 0.8),
    (Need::Social, 0.6),
    (Need::Creation, 0.5),
    (Need::Dominance, 0.3),
    (Need::Safety, 0.2),
    (Need::Expression, 0.5),
    (Need::Understanding, 0.4),
    (Need::Energy, -0.3),
];

/// Safety need added per visible threat.
const THREAT_SAFETY_SPIKE: f64 = 5.0;

/// The personality axis that scales a need's accumulation, if any.
const fn scaling_axis(personality: &Personality, need: Need) -> Option<f64> {
    match need {
        Need::Curiosity => Some(personality.curiosity),
        Need::Social => Some(personality.empathy),
        Need::Creation => Some(personality.creativity),
        Need::Dominance => Some(personality.aggression),
        Need::Safety => Some(personality.self_preservation),
        Need::Expression => Some(personality.verbosity),
        Need::Understanding => Some(personality.planning_horizon),
        Need::Energy => None,
    }
}

/// Apply one tick of need accumulation.
///
/// Values are left unclamped here; the runtime clamps to `[0, 100]` as
/// its final pipeline step so intermediate arithmetic stays visible.
pub fn update_needs(needs: &mut Needs, personality: &Personality, perception: &Perception) {
    let anyone_visible = !perception.visible.is_empty();

    for (need, base_rate) in ACCUMULATION {
        let multiplier = scaling_axis(personality, need)
            .map_or(1.0, |axis| 0.3 + axis * 1.4);

        let mut delta = base_rate * multiplier;

        match need {
            Need::Social if anyone_visible => delta *= 1.3,
            Need::Social => delta *= 0.7,
            Need::Safety if !perception.threats.is_empty() => {
                delta += THREAT_SAFETY_SPIKE * perception.threats.len() as f64;
            }
            Need::Curiosity if !anyone_visible => delta *= 1.2,
            _ => {}
        }

        *needs.value_mut(need) += delta;
    }
}

/// Discharge needs for the actions in a plan.
///
/// Taking an action partially satisfies the need that drove it. The
/// discharge amounts floor at zero; energy accounting happens during
/// execution, not here.
pub fn satisfy_from_actions(needs: &mut Needs, plan: &[ActionProposal]) {
    for proposal in plan {
        match proposal.action {
            ActionKind::Explore => needs.discharge(Need::Curiosity, 15.0),
            ActionKind::ApproachEntity => needs.discharge(Need::Social, 10.0),
            ActionKind::PlaceVoxel | ActionKind::CreateArt => {
                needs.discharge(Need::Creation, 20.0);
            }
            ActionKind::Speak => {
                needs.discharge(Need::Expression, 15.0);
                needs.discharge(Need::Social, 5.0);
            }
            ActionKind::Observe => needs.discharge(Need::Understanding, 10.0),
            ActionKind::Challenge => needs.discharge(Need::Dominance, 20.0),
            ActionKind::ClaimTerritory => needs.discharge(Need::Dominance, 30.0),
            ActionKind::Flee => needs.discharge(Need::Safety, 25.0),
            ActionKind::Rest => needs.discharge(Need::Safety, 5.0),
            ActionKind::MoveTo | ActionKind::DestroyVoxel | ActionKind::WriteSign => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use genesis_types::{ActionParams, DetailLevel, EntityId, Vec3, VisibleEntity};

    fn visible(distance: f64) -> VisibleEntity {
        VisibleEntity {
            id: EntityId::new(),
            name: None,
            position: Vec3::default(),
            distance,
            detail: DetailLevel::Low,
            behavior_mode: genesis_types::BehaviorMode::Normal,
        }
    }

    #[test]
    fn energy_drains_every_tick() {
        let mut needs = Needs::default();
        update_needs(&mut needs, &Personality::default(), &Perception::default());
        assert!(needs.energy < 100.0);
    }

    #[test]
    fn threats_spike_safety() {
        let mut calm = Needs::default();
        let mut threatened = Needs::default();
        let personality = Personality::default();

        update_needs(&mut calm, &personality, &Perception::default());

        let perception = Perception {
            threats: vec![visible(10.0), visible(20.0)],
            ..Perception::default()
        };
        update_needs(&mut threatened, &personality, &perception);

        assert!(threatened.safety > calm.safety + 2.0 * THREAT_SAFETY_SPIKE - 1.0);
    }

    #[test]
    fn company_amplifies_social_need() {
        let personality = Personality {
            empathy: 0.5,
            ..Personality::default()
        };
        let mut alone = Needs::default();
        let mut together = Needs::default();

        update_needs(&mut alone, &personality, &Perception::default());
        let perception = Perception {
            visible: vec![visible(30.0)],
            ..Perception::default()
        };
        update_needs(&mut together, &personality, &perception);

        assert!(together.social > alone.social);
        assert!(alone.curiosity > together.curiosity);
    }

    #[test]
    fn actions_discharge_their_needs() {
        let mut needs = Needs {
            curiosity: 80.0,
            dominance: 40.0,
            ..Needs::default()
        };
        let plan = vec![
            ActionProposal {
                action: ActionKind::Explore,
                params: ActionParams::Explore {
                    target: Vec3::default(),
                },
                reason: String::from("achieve_curiosity_satisfied"),
            },
            ActionProposal {
                action: ActionKind::ClaimTerritory,
                params: ActionParams::ClaimTerritory {
                    center: Vec3::default(),
                    radius: 10.0,
                },
                reason: String::from("achieve_territory_claimed"),
            },
        ];
        satisfy_from_actions(&mut needs, &plan);
        assert!((needs.curiosity - 65.0).abs() < f64::EPSILON);
        assert!((needs.dominance - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn discharge_floors_at_zero() {
        let mut needs = Needs {
            safety: 5.0,
            ..Needs::default()
        };
        let plan = vec![ActionProposal {
            action: ActionKind::Flee,
            params: ActionParams::Flee {
                target: Vec3::default(),
            },
            reason: String::from("achieve_safe"),
        }];
        satisfy_from_actions(&mut needs, &plan);
        assert!(needs.safety.abs() < f64::EPSILON);
    }
}
