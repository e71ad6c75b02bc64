//! Proximity tests between particles and the player
//!
//! Everything is a circle: a particle touches the player when the distance
//! between centers is strictly below the particle radius plus a margin.

use glam::Vec2;

use super::state::{Particle, ParticleKind};
use crate::tuning::Tuning;

/// Contact distance for a particle against the player
pub fn collision_radius(particle: &Particle, shield_active: bool, tuning: &Tuning) -> f32 {
    let margin = if shield_active && particle.kind == ParticleKind::Hazard {
        tuning.shielded_hazard_margin
    } else {
        tuning.collision_margin
    };
    particle.radius + margin
}

/// Strict test: exactly at the contact distance is a miss
pub fn touches_player(
    particle: &Particle,
    player: Vec2,
    shield_active: bool,
    tuning: &Tuning,
) -> bool {
    particle.pos.distance(player) < collision_radius(particle, shield_active, tuning)
}

/// Velocity change from the magnet for one frame
///
/// Only energy within the pull radius is attracted. The pull accumulates
/// frame over frame, so close particles accelerate toward the player.
pub fn magnet_pull(particle: &Particle, player: Vec2, tuning: &Tuning) -> Vec2 {
    if particle.kind != ParticleKind::Energy {
        return Vec2::ZERO;
    }
    let to_player = player - particle.pos;
    if to_player.length() < tuning.magnet_radius {
        to_player.normalize_or_zero() * tuning.magnet_strength
    } else {
        Vec2::ZERO
    }
}
