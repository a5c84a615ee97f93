//! Behavior mode transitions.
//!
//! The behavior mode is a discrete modifier of goal selection:
//!
//! - `rampage` when dominance is saturated and the entity feels secure
//! - `desperate` when three or more non-energy needs are critical
//! - `normal` otherwise, with hysteresis on the way back down

use genesis_types::{BehaviorMode, Needs};

/// Need value above which a need counts as critical.
pub const CRITICAL_NEED: f64 = 85.0;

/// Compute the next behavior mode from need levels.
///
/// Rampage requires dominance > 90, safety < 30, energy > 30. Desperate
/// requires at least three critical non-energy needs. An active mode
/// persists until its exit condition holds: rampage ends when dominance
/// drops below 70 or energy below 20; desperate ends when fewer than two
/// needs remain critical.
pub fn update_behavior_mode(needs: &Needs, current: BehaviorMode) -> BehaviorMode {
    let critical = needs.critical_count(CRITICAL_NEED);

    if needs.dominance > 90.0 && needs.safety < 30.0 && needs.energy > 30.0 {
        return BehaviorMode::Rampage;
    }

    if critical >= 3 {
        return BehaviorMode::Desperate;
    }

    match current {
        BehaviorMode::Rampage if needs.dominance < 70.0 || needs.energy < 20.0 => {
            BehaviorMode::Normal
        }
        BehaviorMode::Desperate if critical < 2 => BehaviorMode::Normal,
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rampage_requires_all_three_conditions() {
        let needs = Needs {
            dominance: 95.0,
            safety: 10.0,
            energy: 50.0,
            ..Needs::default()
        };
        assert_eq!(
            update_behavior_mode(&needs, BehaviorMode::Normal),
            BehaviorMode::Rampage
        );

        let tired = Needs { energy: 20.0, ..needs };
        assert_eq!(
            update_behavior_mode(&tired, BehaviorMode::Normal),
            BehaviorMode::Normal
        );
    }

    #[test]
    fn desperate_needs_three_critical() {
        let needs = Needs {
            curiosity: 90.0,
            social: 90.0,
            creation: 90.0,
            ..Needs::default()
        };
        assert_eq!(
            update_behavior_mode(&needs, BehaviorMode::Normal),
            BehaviorMode::Desperate
        );
    }

    #[test]
    fn energy_is_not_a_critical_need() {
        // Energy at 100 plus two critical needs must not trip desperate.
        let needs = Needs {
            curiosity: 90.0,
            social: 90.0,
            energy: 100.0,
            ..Needs::default()
        };
        assert_eq!(
            update_behavior_mode(&needs, BehaviorMode::Normal),
            BehaviorMode::Normal
        );
    }

    #[test]
    fn modes_normalize_with_hysteresis() {
        let cooled = Needs {
            dominance: 60.0,
            ..Needs::default()
        };
        assert_eq!(
            update_behavior_mode(&cooled, BehaviorMode::Rampage),
            BehaviorMode::Normal
        );

        // One critical need keeps nothing: desperate exits below two.
        let recovering = Needs {
            curiosity: 90.0,
            ..Needs::default()
        };
        assert_eq!(
            update_behavior_mode(&recovering, BehaviorMode::Desperate),
            BehaviorMode::Normal
        );

        // Two critical needs hold desperate even though three are required to enter.
        let still_bad = Needs {
            curiosity: 90.0,
            social: 90.0,
            ..Needs::default()
        };
        assert_eq!(
            update_behavior_mode(&still_bad, BehaviorMode::Desperate),
            BehaviorMode::Desperate
        );
    }
}
