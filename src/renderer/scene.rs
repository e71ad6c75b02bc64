//! Frame tessellation
//!
//! Turns the game state into one triangle list in viewport pixels. Full
//! redraw every frame; the GPU side only clears and draws.

use glam::Vec2;

use super::shapes::{circle, dashed_ring, segments_for, stroke};
use super::vertex::{Vertex, colors};
use crate::consts::{
    MAGNET_AURA_RADIUS, PLAYER_HALO_RADIUS, PLAYER_RADIUS, SHIELD_AURA_RADIUS, palette,
};
use crate::settings::Settings;
use crate::sim::state::{GameState, Particle};

/// Glow spread around particles and auras, in pixels
const PARTICLE_GLOW: f32 = 15.0;
const PLAYER_GLOW: f32 = 20.0;
const GLOW_ALPHA: f32 = 0.25;

/// Particle core pulse amplitude
const PULSE_AMPLITUDE: f32 = 2.0;

const SHIELD_WIDTH: f32 = 4.0;
/// Shield wobble amplitude and period divisor (ms)
const SHIELD_WOBBLE: (f32, f64) = (3.0, 100.0);
const MAGNET_WIDTH: f32 = 1.0;
const MAGNET_WOBBLE: (f32, f64) = (10.0, 150.0);
const MAGNET_DASH: (f32, f32) = (5.0, 10.0);
const HALO_WIDTH: f32 = 2.0;
const HALO_ALPHA: f32 = 0.2;

/// Sine wobble at wall-clock time, zero when motion is reduced
fn wobble(time_ms: f64, (amplitude, divisor): (f32, f64), settings: &Settings) -> f32 {
    if settings.animate() {
        (time_ms / divisor).sin() as f32 * amplitude
    } else {
        0.0
    }
}

/// Soft disc drawn behind a shape
fn glow(out: &mut Vec<Vertex>, center: Vec2, radius: f32, spread: f32, hex: u32) {
    let r = radius + spread * 0.5;
    out.extend(circle(center, r, colors::from_hex(hex, GLOW_ALPHA), segments_for(r)));
}

/// Core radius for a particle this frame
pub fn particle_radius(particle: &Particle, settings: &Settings) -> f32 {
    let pulse = if settings.animate() {
        particle.pulse.sin() * PULSE_AMPLITUDE
    } else {
        0.0
    };
    (particle.radius + pulse).max(0.5)
}

fn draw_particle(out: &mut Vec<Vertex>, particle: &Particle, settings: &Settings) {
    let r = particle_radius(particle, settings);
    if settings.glow {
        glow(out, particle.pos, r, PARTICLE_GLOW, particle.color);
    }
    out.extend(circle(
        particle.pos,
        r,
        colors::from_hex(particle.color, 1.0),
        segments_for(r),
    ));
}

/// Build the vertex list for the current frame
pub fn build_frame(state: &GameState, time_ms: f64, settings: &Settings) -> Vec<Vertex> {
    let mut out = Vec::with_capacity(state.particles.len() * 96 + 1024);

    for particle in &state.particles {
        draw_particle(&mut out, particle, settings);
    }

    let player = state.player.pos;
    let bonuses = state.run.bonuses;

    if bonuses.shield_active() {
        let r = SHIELD_AURA_RADIUS + wobble(time_ms, SHIELD_WOBBLE, settings);
        if settings.glow {
            out.extend(stroke(
                player,
                r,
                SHIELD_WIDTH + PARTICLE_GLOW * 0.5,
                colors::from_hex(palette::SHIELD, GLOW_ALPHA),
            ));
        }
        out.extend(stroke(
            player,
            r,
            SHIELD_WIDTH,
            colors::from_hex(palette::SHIELD, 1.0),
        ));
    }

    if bonuses.magnet_active() {
        let r = MAGNET_AURA_RADIUS + wobble(time_ms, MAGNET_WOBBLE, settings);
        let (dash, gap) = MAGNET_DASH;
        out.extend(dashed_ring(
            player,
            r,
            MAGNET_WIDTH,
            dash,
            gap,
            colors::from_hex(palette::MAGNET, 1.0),
        ));
    }

    // Player
    if settings.glow {
        glow(&mut out, player, PLAYER_RADIUS, PLAYER_GLOW, palette::PLAYER);
    }
    out.extend(circle(
        player,
        PLAYER_RADIUS,
        colors::from_hex(palette::PLAYER, 1.0),
        segments_for(PLAYER_RADIUS),
    ));
    out.extend(stroke(
        player,
        PLAYER_HALO_RADIUS,
        HALO_WIDTH,
        colors::from_hex(palette::PLAYER, HALO_ALPHA),
    ));

    out
}
