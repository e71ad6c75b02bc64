//! Neon Pulse - steer a point of light, collect energy, dodge hazards
//!
//! Core modules:
//! - `sim`: Simulation (particles, collisions, energy/score, status machine)
//! - `tuning`: Data-driven game balance
//! - `session`: Host context tying the simulation to persistence
//! - `persistence`: Key-value storage and the high score / purchase bridge
//! - `shop`: Upgrade catalog and the payment flow
//! - `renderer`: Frame tessellation and the WebGPU pipeline
//! - `platform`: Browser listener and frame-loop lifetimes

#[cfg(target_arch = "wasm32")]
pub mod audio;
pub mod highscores;
pub mod persistence;
#[cfg(target_arch = "wasm32")]
pub mod platform;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod shop;
pub mod sim;
pub mod tuning;

pub use highscores::Leaderboard;
pub use session::{HudSnapshot, Session};
pub use settings::Settings;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Nominal display refresh rate, used to turn frame counts into seconds
    pub const FRAMES_PER_SECOND: f32 = 60.0;

    /// Player marker radius
    pub const PLAYER_RADIUS: f32 = 10.0;
    /// Faint halo around the player marker
    pub const PLAYER_HALO_RADIUS: f32 = 25.0;
    /// Shield aura base radius
    pub const SHIELD_AURA_RADIUS: f32 = 25.0;
    /// Magnet aura base radius
    pub const MAGNET_AURA_RADIUS: f32 = 40.0;

    /// Energy bar turns to hazard colour at or below this level
    pub const LOW_ENERGY_THRESHOLD: f32 = 30.0;

    /// Colours as 0xRRGGBB
    pub mod palette {
        pub const PLAYER: u32 = 0xf8fafc;
        pub const ENERGY: u32 = 0x22c55e;
        pub const HAZARD: u32 = 0xef4444;
        pub const DECORATION: u32 = 0x3b82f6;
        pub const SHIELD: u32 = 0xec4899;
        pub const MAGNET: u32 = 0xa855f7;
        pub const BACKGROUND: u32 = 0x020617;
    }
}

/// Whole seconds left on a frame countdown, rounded up (HUD display)
#[inline]
pub fn frames_to_seconds(frames: u32) -> u32 {
    (frames as f32 / consts::FRAMES_PER_SECOND).ceil() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_to_seconds_rounds_up() {
        assert_eq!(frames_to_seconds(0), 0);
        assert_eq!(frames_to_seconds(1), 1);
        assert_eq!(frames_to_seconds(60), 1);
        assert_eq!(frames_to_seconds(61), 2);
        assert_eq!(frames_to_seconds(500), 9);
    }
}
