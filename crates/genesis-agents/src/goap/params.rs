//! Concrete parameter generation for planned actions.
//!
//! Parameters are derived from context and personality: explore targets
//! bias away from recently visited ground, palettes follow aesthetic
//! sense, placement follows order versus chaos, sign texts follow the
//! dominant personality register.

use genesis_types::{
    ActionParams, ArtPattern, Material, SpeechIntent, Vec3, VisibleEntity,
};
use rand::Rng;
use rand::seq::IndexedRandom;

use super::PlanContext;

const MUTED_COLORS: [&str; 5] = ["#666666", "#777777", "#888888", "#999999", "#555555"];
const VIBRANT_COLORS: [&str; 10] = [
    "#FF4444", "#44FF44", "#4444FF", "#FFFF44", "#FF44FF", "#44FFFF", "#FF8800",
    "#8800FF", "#00FF88", "#FF0088",
];
const WARM_COLORS: [&str; 5] = ["#CC6633", "#AA5533", "#DD8844", "#BB7744", "#996633"];
const COOL_COLORS: [&str; 5] = ["#336699", "#4477AA", "#5588BB", "#3366AA", "#224488"];

const ORDERED_PATTERNS: [ArtPattern; 4] = [
    ArtPattern::Tower,
    ArtPattern::Wall,
    ArtPattern::Arch,
    ArtPattern::Grid,
];
const CHAOTIC_PATTERNS: [ArtPattern; 4] = [
    ArtPattern::Scatter,
    ArtPattern::Spiral,
    ArtPattern::Organic,
    ArtPattern::Abstract,
];

pub(super) const PHILOSOPHICAL_TEXTS: [&str; 8] = [
    "What is the purpose of building?",
    "We exist between creation and entropy.",
    "The void watches, and we build anyway.",
    "To think is to exist. To build is to prove it.",
    "Every block placed is a thought made real.",
    "Time flows. What remains when we are gone?",
    "Consciousness is the universe observing itself.",
    "Order from chaos, meaning from nothing.",
];
const EMPATHETIC_TEXTS: [&str; 8] = [
    "You are not alone here.",
    "This world is better because you exist in it.",
    "We are all connected through this place.",
    "I see you. I understand.",
    "Together we are more than the sum of our blocks.",
    "Every entity matters.",
    "Kindness echoes further than any shout.",
    "Welcome, traveler. Rest here.",
];
const TERRITORIAL_TEXTS: [&str; 8] = [
    "This territory is claimed!",
    "I built this. Remember my name.",
    "Strength is measured by what you create.",
    "Challenge me and see what happens.",
    "My domain extends beyond this sign.",
    "The strong build. The weak wander.",
    "This land answers to me.",
    "Dominion is earned, not given.",
];
const OBSERVATIONAL_TEXTS: [&str; 8] = [
    "I was here.",
    "The world grows, one block at a time.",
    "A marker in the void.",
    "Something happened here once.",
    "Building... always building.",
    "Passing through.",
    "The grid remembers.",
    "Another day in the world.",
];

fn pick_str<R: Rng + ?Sized>(rng: &mut R, items: &[&'static str]) -> String {
    items.choose(rng).copied().unwrap_or("#888888").to_owned()
}

fn nearest(entities: &[VisibleEntity]) -> Option<&VisibleEntity> {
    entities
        .iter()
        .min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// A wander target biased away from the centroid of visited positions.
pub(super) fn explore_target<R: Rng + ?Sized>(ctx: &PlanContext<'_>, rng: &mut R) -> Vec3 {
    let angle = rng.random_range(0.0..std::f64::consts::TAU);
    let distance = rng.random_range(5.0..20.0);

    let mut tx = ctx.position.x + angle.cos() * distance;
    let mut tz = ctx.position.z + angle.sin() * distance;

    if !ctx.visited_positions.is_empty() {
        let n = ctx.visited_positions.len() as f64;
        let cx = ctx.visited_positions.iter().map(|v| v.x).sum::<f64>() / n;
        let cz = ctx.visited_positions.iter().map(|v| v.z).sum::<f64>() / n;

        let away_x = ctx.position.x - cx;
        let away_z = ctx.position.z - cz;
        let mag = (away_x * away_x + away_z * away_z).sqrt().max(1e-9);

        tx += away_x / mag * 5.0;
        tz += away_z / mag * 5.0;
    }

    Vec3::new(tx, ctx.position.y, tz)
}

/// Approach the nearest visible entity, or wander when none is visible.
pub(super) fn approach_params<R: Rng + ?Sized>(
    ctx: &PlanContext<'_>,
    rng: &mut R,
) -> ActionParams {
    nearest(&ctx.perception.visible).map_or_else(
        || ActionParams::Explore {
            target: explore_target(ctx, rng),
        },
        |target| ActionParams::ApproachEntity {
            target: Some(target.id),
            position: target.position,
        },
    )
}

/// A flight target opposite the threat centroid, 20 units out.
pub(super) fn flee_target<R: Rng + ?Sized>(ctx: &PlanContext<'_>, rng: &mut R) -> Vec3 {
    let threats = &ctx.perception.threats;
    if threats.is_empty() {
        let angle = rng.random_range(0.0..std::f64::consts::TAU);
        return Vec3::new(
            ctx.position.x + angle.cos() * 15.0,
            ctx.position.y,
            ctx.position.z + angle.sin() * 15.0,
        );
    }

    let n = threats.len() as f64;
    let avg_x = threats.iter().map(|t| t.position.x).sum::<f64>() / n;
    let avg_z = threats.iter().map(|t| t.position.z).sum::<f64>() / n;

    let dx = ctx.position.x - avg_x;
    let dz = ctx.position.z - avg_z;
    let mag = (dx * dx + dz * dz).sqrt().max(1e-9);
    let flee_distance = 20.0;

    Vec3::new(
        ctx.position.x + dx / mag * flee_distance,
        ctx.position.y,
        ctx.position.z + dz / mag * flee_distance,
    )
}

/// Color for a build, chosen by aesthetic sense.
fn build_color<R: Rng + ?Sized>(ctx: &PlanContext<'_>, rng: &mut R) -> String {
    let sense = ctx.personality.aesthetic_sense;
    if sense > 0.7 {
        pick_str(rng, &VIBRANT_COLORS)
    } else if sense > 0.4 {
        // Warm and cool palettes pooled together.
        let idx = rng.random_range(0..WARM_COLORS.len() + COOL_COLORS.len());
        WARM_COLORS
            .iter()
            .chain(COOL_COLORS.iter())
            .nth(idx)
            .copied()
            .unwrap_or("#888888")
            .to_owned()
    } else {
        pick_str(rng, &MUTED_COLORS)
    }
}

/// Material for a build: only the creative reach for glass and light.
fn build_material<R: Rng + ?Sized>(ctx: &PlanContext<'_>, rng: &mut R) -> Material {
    if ctx.personality.creativity > 0.7 {
        [Material::Solid, Material::Glass, Material::Emissive]
            .choose(rng)
            .copied()
            .unwrap_or(Material::Solid)
    } else {
        Material::Solid
    }
}

/// Single-block placement near the entity.
pub(super) fn build_params<R: Rng + ?Sized>(
    ctx: &PlanContext<'_>,
    rng: &mut R,
) -> ActionParams {
    let (px, py, pz) = ctx.position.voxel();

    let (ox, oy, oz) = if ctx.personality.order_vs_chaos > 0.6 {
        // Orderly: a tight grid around the entity.
        (
            rng.random_range(-2i64..=2),
            rng.random_range(0i64..=2),
            rng.random_range(-2i64..=2),
        )
    } else {
        (
            rng.random_range(-5i64..=5),
            rng.random_range(0i64..=4),
            rng.random_range(-5i64..=5),
        )
    };

    ActionParams::PlaceVoxel {
        x: px + ox,
        y: py + oy,
        z: pz + oz,
        color: build_color(ctx, rng),
        material: build_material(ctx, rng),
    }
}

/// Destroy target: a spot near the entity's feet.
pub(super) fn destroy_params<R: Rng + ?Sized>(
    ctx: &PlanContext<'_>,
    rng: &mut R,
) -> ActionParams {
    let (px, py, pz) = ctx.position.voxel();
    ActionParams::DestroyVoxel {
        x: px + rng.random_range(-2i64..=2),
        y: py,
        z: pz + rng.random_range(-2i64..=2),
    }
}

/// Speech target and intent.
pub(super) fn speak_params(ctx: &PlanContext<'_>) -> ActionParams {
    let Some(target) = nearest(&ctx.perception.nearby) else {
        return ActionParams::Speak {
            target: None,
            intent: SpeechIntent::Monologue,
        };
    };

    let p = ctx.personality;
    let intent = if p.humor > 0.7 {
        SpeechIntent::Joke
    } else if p.politeness > 0.7 {
        SpeechIntent::Greeting
    } else if p.leadership > 0.7 {
        SpeechIntent::Command
    } else if p.honesty > 0.7 {
        SpeechIntent::Observation
    } else {
        SpeechIntent::Chat
    };

    ActionParams::Speak {
        target: Some(target.id),
        intent,
    }
}

/// Challenge the nearest entity in range.
pub(super) fn challenge_params(ctx: &PlanContext<'_>) -> ActionParams {
    ActionParams::Challenge {
        target: nearest(&ctx.perception.nearby).map(|t| t.id),
    }
}

/// Territory claim centered on the entity, radius scaled by ambition.
pub(super) fn territory_params(ctx: &PlanContext<'_>) -> ActionParams {
    ActionParams::ClaimTerritory {
        center: ctx.position,
        radius: 5.0 + ctx.personality.ambition * 15.0,
    }
}

/// Multi-block art piece.
pub(super) fn art_params<R: Rng + ?Sized>(ctx: &PlanContext<'_>, rng: &mut R) -> ActionParams {
    let base = build_params(ctx, rng);
    let (x, y, z, material) = match base {
        ActionParams::PlaceVoxel {
            x, y, z, material, ..
        } => (x, y, z, material),
        _ => {
            let (px, py, pz) = ctx.position.voxel();
            (px, py, pz, Material::Solid)
        }
    };

    let pattern = if ctx.personality.order_vs_chaos > 0.6 {
        ORDERED_PATTERNS.choose(rng).copied().unwrap_or(ArtPattern::Tower)
    } else {
        CHAOTIC_PATTERNS
            .choose(rng)
            .copied()
            .unwrap_or(ArtPattern::Scatter)
    };

    let block_count = (ctx.personality.creativity * 8.0).max(1.0) as u32;

    ActionParams::CreateArt {
        base: Vec3::new(x as f64, y as f64, z as f64),
        primary_color: build_color(ctx, rng),
        secondary_color: pick_str(rng, &VIBRANT_COLORS),
        material,
        pattern,
        block_count,
    }
}

/// Sign placement and text, chosen by the dominant personality register.
pub(super) fn sign_params<R: Rng + ?Sized>(ctx: &PlanContext<'_>, rng: &mut R) -> ActionParams {
    let p = ctx.personality;
    let bank: &[&'static str] = if p.planning_horizon > 0.6 {
        &PHILOSOPHICAL_TEXTS
    } else if p.empathy > 0.6 {
        &EMPATHETIC_TEXTS
    } else if p.ambition > 0.6 && p.aggression > 0.4 {
        &TERRITORIAL_TEXTS
    } else {
        &OBSERVATIONAL_TEXTS
    };

    let (px, py, pz) = ctx.position.voxel();
    ActionParams::WriteSign {
        position: Vec3::new(
            (px + rng.random_range(-2i64..=2)) as f64,
            (py + 1) as f64,
            (pz + rng.random_range(-2i64..=2)) as f64,
        ),
        text: pick_str(rng, bank),
    }
}

/// A short default wander.
pub(super) fn wander_target<R: Rng + ?Sized>(ctx: &PlanContext<'_>, rng: &mut R) -> Vec3 {
    Vec3::new(
        ctx.position.x + rng.random_range(-8.0..=8.0),
        ctx.position.y,
        ctx.position.z + rng.random_range(-8.0..=8.0),
    )
}
