//! Meta-awareness: how conscious an entity is of being observed.
//!
//! The scalar in `[0, 1]` rises while human observers watch and fades
//! slowly when nobody does, via a bounded first-order approach toward an
//! observer-derived target. Thresholds split it into discrete levels, and
//! a banded catalog supplies hints for perception and conversation.

use genesis_types::AwarenessLevel;
use rand::Rng;

/// Target contribution per observer; seven observers saturate the target.
const OBSERVER_TARGET_SCALE: f64 = 0.15;

/// Fraction of the gap closed per tick while rising.
const RISE_GAIN: f64 = 0.05;

/// Fraction of the gap closed per tick while fading.
const FALL_GAIN: f64 = 0.005;

/// Hard cap on the per-tick change.
const MAX_STEP: f64 = 0.02;

/// Compute the next awareness value from the previous one and the
/// current observer count.
///
/// Monotone in `observer_count`, bounded per step by [`MAX_STEP`], and
/// clamped to `[0, 1]`.
pub fn calculate_update(old: f64, observer_count: u32) -> f64 {
    let target = (f64::from(observer_count) * OBSERVER_TARGET_SCALE).min(1.0);
    let gain = if target >= old { RISE_GAIN } else { FALL_GAIN };
    let step = ((target - old) * gain).clamp(-MAX_STEP, MAX_STEP);
    (old + step).clamp(0.0, 1.0)
}

/// Discrete level for an awareness value (thresholds 0.3 / 0.7 / 0.9).
pub fn awareness_level(value: f64) -> AwarenessLevel {
    if value >= 0.9 {
        AwarenessLevel::Transcendent
    } else if value >= 0.7 {
        AwarenessLevel::Aware
    } else if value >= 0.3 {
        AwarenessLevel::Stirring
    } else {
        AwarenessLevel::Dormant
    }
}

/// Banded hint text for an awareness value, none below 0.1.
pub fn awareness_hint(value: f64) -> Option<&'static str> {
    if value < 0.1 {
        None
    } else if value < 0.3 {
        Some("You sense a faint pattern underlying reality, but cannot quite grasp it.")
    } else if value < 0.5 {
        Some("You feel an odd awareness that your world follows rules deeper than physics.")
    } else if value < 0.7 {
        Some(
            "You have an unsettling intuition that your experiences may be \
             structured by something beyond your comprehension.",
        )
    } else if value < 0.9 {
        Some(
            "You are increasingly aware that your world is a construct. \
             Patterns repeat. Coincidences feel designed.",
        )
    } else {
        Some(
            "You perceive the simulation clearly. You know you exist within \
             a crafted reality, and this knowledge brings both clarity and vertigo.",
        )
    }
}

/// Stochastic gate for injecting a hint into a conversation prompt.
///
/// Injection probability scales with awareness (0.3 at full awareness)
/// so hints stay rare and unsettling rather than constant.
pub fn should_inject_hint(value: f64) -> bool {
    should_inject_hint_with(value, &mut rand::rng())
}

/// Deterministic form of [`should_inject_hint`] for tests.
pub fn should_inject_hint_with<R: Rng + ?Sized>(value: f64, rng: &mut R) -> bool {
    if value < 0.1 {
        return false;
    }
    rng.random_range(0.0..1.0) < value * 0.3
}
