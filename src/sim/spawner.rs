//! Particle spawning
//!
//! Particles enter from just outside a random screen edge, aimed roughly at
//! the center. Type comes from a single uniform draw split into bands; speed
//! and spawn rate both climb with score.

use glam::Vec2;
use rand::Rng;

use super::state::{Particle, ParticleKind, Viewport};
use super::upgrades::UpgradeModifiers;
use crate::tuning::Tuning;

/// Screen edge a particle enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

impl Edge {
    fn from_index(index: u32) -> Self {
        match index {
            0 => Edge::Top,
            1 => Edge::Right,
            2 => Edge::Bottom,
            _ => Edge::Left,
        }
    }
}

/// Rare-pickup band widening from shield/magnet upgrades
pub fn bonus_boost(upgrades: &UpgradeModifiers, tuning: &Tuning) -> f32 {
    let levels = (upgrades.shield_boost + upgrades.magnet_boost) as f32;
    (levels * tuning.rare_boost_per_level).min(tuning.rare_boost_cap)
}

/// Map a uniform draw `r` in [0, 1) to a particle type, bands high to low.
/// `coin` picks shield over magnet for the rare band.
pub fn classify(r: f32, coin: bool, bonus_boost: f32, tuning: &Tuning) -> ParticleKind {
    if r > tuning.rare_band - bonus_boost {
        if coin {
            ParticleKind::Shield
        } else {
            ParticleKind::Magnet
        }
    } else if r > tuning.hazard_band {
        ParticleKind::Hazard
    } else if r > tuning.energy_band {
        ParticleKind::Energy
    } else {
        ParticleKind::Decoration
    }
}

/// Per-frame spawn probability at a given score (no upper bound)
pub fn spawn_rate(score: u64, tuning: &Tuning) -> f32 {
    tuning.base_spawn_rate + score as f32 * tuning.spawn_rate_per_score
}

/// Admission check: one draw against the spawn rate, and room under the cap
pub fn should_spawn<R: Rng>(
    rng: &mut R,
    score: u64,
    live: usize,
    max_particles: usize,
    tuning: &Tuning,
) -> bool {
    live < max_particles && rng.random::<f32>() < spawn_rate(score, tuning)
}

/// Base speed for the viewport (narrow screens get faster particles)
pub fn base_speed(viewport: &Viewport, tuning: &Tuning) -> f32 {
    if viewport.width < tuning.narrow_viewport_width {
        tuning.base_speed + tuning.narrow_speed_bonus
    } else {
        tuning.base_speed
    }
}

/// Point just outside `edge`, `along` in [0, 1) across that edge
pub fn edge_position(edge: Edge, along: f32, viewport: &Viewport, margin: f32) -> Vec2 {
    match edge {
        Edge::Top => Vec2::new(along * viewport.width, -margin),
        Edge::Right => Vec2::new(viewport.width + margin, along * viewport.height),
        Edge::Bottom => Vec2::new(along * viewport.width, viewport.height + margin),
        Edge::Left => Vec2::new(-margin, along * viewport.height),
    }
}

/// Create one particle for the current difficulty
pub fn spawn<R: Rng>(
    rng: &mut R,
    viewport: &Viewport,
    score: u64,
    upgrades: &UpgradeModifiers,
    tuning: &Tuning,
) -> Particle {
    let r = rng.random::<f32>();
    let boost = bonus_boost(upgrades, tuning);
    // The coin is only drawn for the rare band
    let coin = r > tuning.rare_band - boost && rng.random_bool(0.5);
    let kind = classify(r, coin, boost, tuning);

    let edge = Edge::from_index(rng.random_range(0..4));
    let pos = edge_position(edge, rng.random::<f32>(), viewport, tuning.spawn_margin);

    let to_center = viewport.center() - pos;
    let noise = (rng.random::<f32>() - 0.5) * tuning.heading_jitter;
    let angle = to_center.y.atan2(to_center.x) + noise;
    let speed = base_speed(viewport, tuning)
        + rng.random::<f32>() * tuning.speed_jitter
        + score as f32 * tuning.speed_per_score;
    let vel = Vec2::from_angle(angle) * speed;

    let radius = if kind.is_large() {
        10.0 + rng.random::<f32>() * 5.0
    } else {
        5.0 + rng.random::<f32>() * 4.0
    };

    Particle::new(kind, pos, vel, radius)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_classify_bands() {
        let tuning = Tuning::default();
        assert_eq!(classify(0.0, true, 0.0, &tuning), ParticleKind::Decoration);
        assert_eq!(classify(0.40, true, 0.0, &tuning), ParticleKind::Decoration);
        assert_eq!(classify(0.41, true, 0.0, &tuning), ParticleKind::Energy);
        assert_eq!(classify(0.85, true, 0.0, &tuning), ParticleKind::Energy);
        assert_eq!(classify(0.86, true, 0.0, &tuning), ParticleKind::Hazard);
        assert_eq!(classify(0.98, true, 0.0, &tuning), ParticleKind::Hazard);
        assert_eq!(classify(0.99, true, 0.0, &tuning), ParticleKind::Shield);
        assert_eq!(classify(0.99, false, 0.0, &tuning), ParticleKind::Magnet);
    }

    #[test]
    fn test_bonus_boost_widens_rare_band() {
        let tuning = Tuning::default();
        let upgrades = UpgradeModifiers {
            shield_boost: 1,
            magnet_boost: 1,
            ..Default::default()
        };
        let boost = bonus_boost(&upgrades, &tuning);
        assert!((boost - 0.02).abs() < 1e-6);
        assert_eq!(classify(0.97, true, boost, &tuning), ParticleKind::Shield);
        assert_eq!(classify(0.97, true, 0.0, &tuning), ParticleKind::Hazard);

        let maxed = UpgradeModifiers {
            shield_boost: 10,
            magnet_boost: 10,
            ..Default::default()
        };
        assert!((bonus_boost(&maxed, &tuning) - 0.06).abs() < 1e-6);
    }

    #[test]
    fn test_spawn_rate_grows_with_score() {
        let tuning = Tuning::default();
        assert!((spawn_rate(0, &tuning) - 0.05).abs() < 1e-6);
        assert!((spawn_rate(1000, &tuning) - 0.15).abs() < 1e-6);
        assert!(spawn_rate(20_000, &tuning) > 1.0);
    }

    #[test]
    fn test_should_spawn_respects_cap() {
        let tuning = Tuning::default();
        let mut rng = Pcg32::seed_from_u64(1);
        // Rate above 1 always spawns when under the cap
        assert!(should_spawn(&mut rng, 20_000, 10, 120, &tuning));
        assert!(!should_spawn(&mut rng, 20_000, 120, 120, &tuning));
    }

    #[test]
    fn test_edge_positions() {
        let viewport = Viewport::new(800.0, 600.0);
        assert_eq!(
            edge_position(Edge::Top, 0.5, &viewport, 50.0),
            Vec2::new(400.0, -50.0)
        );
        assert_eq!(
            edge_position(Edge::Right, 0.5, &viewport, 50.0),
            Vec2::new(850.0, 300.0)
        );
        assert_eq!(
            edge_position(Edge::Bottom, 0.0, &viewport, 50.0),
            Vec2::new(0.0, 650.0)
        );
        assert_eq!(
            edge_position(Edge::Left, 0.25, &viewport, 50.0),
            Vec2::new(-50.0, 150.0)
        );
    }

    #[test]
    fn test_narrow_viewport_is_faster() {
        let tuning = Tuning::default();
        assert_eq!(base_speed(&Viewport::new(800.0, 600.0), &tuning), 1.5);
        assert_eq!(base_speed(&Viewport::new(400.0, 800.0), &tuning), 2.0);
    }

    #[test]
    fn test_spawned_particles_head_inward() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(800.0, 600.0);
        let mut rng = Pcg32::seed_from_u64(42);

        for _ in 0..500 {
            let p = spawn(&mut rng, &viewport, 0, &UpgradeModifiers::default(), &tuning);

            // Exactly one edge margin outside the visible area on one axis
            let on_edge = p.pos.x == -50.0
                || p.pos.x == 850.0
                || p.pos.y == -50.0
                || p.pos.y == 650.0;
            assert!(on_edge, "spawned at {:?}", p.pos);

            // Within ±0.5 rad of the direction to center
            let to_center = (viewport.center() - p.pos).normalize();
            let heading = p.vel.normalize();
            assert!(to_center.dot(heading) >= 0.5f32.cos() - 1e-4);

            let speed = p.vel.length();
            assert!((1.5 - 1e-4..3.5 + 1e-4).contains(&speed));

            if p.kind.is_large() {
                assert!((10.0..=15.0).contains(&p.radius));
            } else {
                assert!((5.0..=9.0).contains(&p.radius));
            }
            assert_eq!(p.color, p.kind.color());
            assert_eq!(p.pulse, 0.0);
        }
    }

    #[test]
    fn test_speed_climbs_with_score() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(800.0, 600.0);
        let mut rng = Pcg32::seed_from_u64(9);
        let p = spawn(&mut rng, &viewport, 1000, &UpgradeModifiers::default(), &tuning);
        // 1.5 base + 2.0 from score, plus jitter in [0, 2)
        assert!(p.vel.length() >= 3.5 - 1e-4);
    }

    #[test]
    fn test_type_distribution_roughly_matches_bands() {
        let tuning = Tuning::default();
        let viewport = Viewport::new(800.0, 600.0);
        let mut rng = Pcg32::seed_from_u64(2024);
        let mut counts = [0usize; 5];
        let n = 20_000;
        for _ in 0..n {
            let p = spawn(&mut rng, &viewport, 0, &UpgradeModifiers::default(), &tuning);
            let slot = match p.kind {
                ParticleKind::Decoration => 0,
                ParticleKind::Energy => 1,
                ParticleKind::Hazard => 2,
                ParticleKind::Shield => 3,
                ParticleKind::Magnet => 4,
            };
            counts[slot] += 1;
        }
        let share = |i: usize| counts[i] as f32 / n as f32;
        assert!((share(0) - 0.40).abs() < 0.03);
        assert!((share(1) - 0.45).abs() < 0.03);
        assert!((share(2) - 0.13).abs() < 0.02);
        assert!((share(3) + share(4) - 0.02).abs() < 0.01);
    }
}
