//! Data-driven game balance
//!
//! Every number the simulation and the spawner use lives here, so difficulty
//! can be retuned (or loaded from JSON) without touching the algorithms.

use serde::{Deserialize, Serialize};

/// Errors from loading or validating tuning data
#[derive(Debug, thiserror::Error)]
pub enum TuningError {
    #[error("Tuning parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid tuning value for {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// Balance knobs for one game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Energy ===
    /// Max energy before upgrades
    pub initial_energy: f32,
    /// Floor for max energy regardless of upgrades
    pub min_max_energy: f32,
    /// Energy lost every simulated frame
    pub energy_decay: f32,
    /// Energy restored by one energy pickup
    pub energy_gain: f32,

    // === Score ===
    pub energy_score: u64,
    pub shielded_hazard_score: u64,

    // === Spawning ===
    /// Per-frame spawn probability at score 0
    pub base_spawn_rate: f32,
    /// Added to the spawn probability per score point
    pub spawn_rate_per_score: f32,
    /// Particle cap before the balls bonus
    pub base_max_particles: usize,
    /// Distance outside the edge where particles appear
    pub spawn_margin: f32,
    pub base_speed: f32,
    /// Extra speed on narrow viewports
    pub narrow_speed_bonus: f32,
    pub narrow_viewport_width: f32,
    /// Uniform extra speed in [0, jitter)
    pub speed_jitter: f32,
    pub speed_per_score: f32,
    /// Total width (radians) of the heading noise, centered on the aim
    pub heading_jitter: f32,

    // === Classification bands (single draw, high to low) ===
    pub rare_band: f32,
    pub hazard_band: f32,
    pub energy_band: f32,
    /// Rare band widening per shield/magnet upgrade level
    pub rare_boost_per_level: f32,
    pub rare_boost_cap: f32,

    // === Bonuses ===
    pub bonus_duration_frames: u32,
    /// Extra bonus frames per shield/magnet upgrade level
    pub boost_frames_per_level: u32,

    // === Collision / culling ===
    pub collision_margin: f32,
    /// Collision margin for hazards while shielded
    pub shielded_hazard_margin: f32,
    pub cull_margin: f32,

    // === Magnet ===
    pub magnet_radius: f32,
    pub magnet_strength: f32,

    // === Presentation cadence ===
    pub pulse_step: f32,
    /// Frames between bonus countdown publications
    pub hud_sync_interval: u64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            initial_energy: 50.0,
            min_max_energy: 10.0,
            energy_decay: 0.15,
            energy_gain: 15.0,

            energy_score: 10,
            shielded_hazard_score: 5,

            base_spawn_rate: 0.05,
            spawn_rate_per_score: 1.0 / 10_000.0,
            base_max_particles: 120,
            spawn_margin: 50.0,
            base_speed: 1.5,
            narrow_speed_bonus: 0.5,
            narrow_viewport_width: 600.0,
            speed_jitter: 2.0,
            speed_per_score: 1.0 / 500.0,
            heading_jitter: 1.0,

            rare_band: 0.98,
            hazard_band: 0.85,
            energy_band: 0.40,
            rare_boost_per_level: 0.01,
            rare_boost_cap: 0.06,

            bonus_duration_frames: 500,
            boost_frames_per_level: 120,

            collision_margin: 12.0,
            shielded_hazard_margin: 25.0,
            cull_margin: 200.0,

            magnet_radius: 250.0,
            magnet_strength: 0.6,

            pulse_step: 0.1,
            hud_sync_interval: 10,
        }
    }
}

impl Tuning {
    /// Parse tuning JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Reject values the simulation can't run with
    pub fn validate(&self) -> Result<(), TuningError> {
        let non_negative = [
            ("initial_energy", self.initial_energy),
            ("min_max_energy", self.min_max_energy),
            ("energy_decay", self.energy_decay),
            ("energy_gain", self.energy_gain),
            ("base_spawn_rate", self.base_spawn_rate),
            ("spawn_rate_per_score", self.spawn_rate_per_score),
            ("spawn_margin", self.spawn_margin),
            ("base_speed", self.base_speed),
            ("speed_jitter", self.speed_jitter),
            ("speed_per_score", self.speed_per_score),
            ("heading_jitter", self.heading_jitter),
            ("collision_margin", self.collision_margin),
            ("shielded_hazard_margin", self.shielded_hazard_margin),
            ("cull_margin", self.cull_margin),
            ("magnet_radius", self.magnet_radius),
            ("magnet_strength", self.magnet_strength),
            ("rare_boost_per_level", self.rare_boost_per_level),
            ("rare_boost_cap", self.rare_boost_cap),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(TuningError::Invalid {
                    field,
                    reason: "must be a finite, non-negative number",
                });
            }
        }

        if self.min_max_energy <= 0.0 {
            return Err(TuningError::Invalid {
                field: "min_max_energy",
                reason: "must be greater than zero",
            });
        }

        if !(self.energy_band <= self.hazard_band
            && self.hazard_band <= self.rare_band
            && self.rare_band <= 1.0)
        {
            return Err(TuningError::Invalid {
                field: "rare_band",
                reason: "bands must satisfy energy <= hazard <= rare <= 1",
            });
        }

        if self.hud_sync_interval == 0 {
            return Err(TuningError::Invalid {
                field: "hud_sync_interval",
                reason: "must be at least one frame",
            });
        }

        Ok(())
    }

    /// Shield/magnet duration at an upgrade level, saturating at `u32::MAX`
    pub fn bonus_frames(&self, level: u32) -> u32 {
        self.bonus_duration_frames
            .saturating_add(level.saturating_mul(self.boost_frames_per_level))
    }

    /// Max energy for a given upgrade energy bonus
    pub fn max_energy(&self, energy_bonus: f32) -> f32 {
        (self.initial_energy + energy_bonus).max(self.min_max_energy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "energy_decay": 0.3, "base_max_particles": 64 }"#)
            .expect("valid tuning");
        assert_eq!(tuning.energy_decay, 0.3);
        assert_eq!(tuning.base_max_particles, 64);
        assert_eq!(tuning.energy_gain, 15.0);
        assert_eq!(tuning.bonus_duration_frames, 500);
    }

    #[test]
    fn test_rejects_negative_decay() {
        let err = Tuning::from_json(r#"{ "energy_decay": -1.0 }"#).unwrap_err();
        assert!(matches!(
            err,
            TuningError::Invalid {
                field: "energy_decay",
                ..
            }
        ));
    }

    #[test]
    fn test_rejects_unordered_bands() {
        let err = Tuning::from_json(r#"{ "hazard_band": 0.99 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { .. }));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            Tuning::from_json("not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_bonus_frames() {
        let tuning = Tuning::default();
        assert_eq!(tuning.bonus_frames(0), 500);
        assert_eq!(tuning.bonus_frames(2), 740);

        let huge = Tuning {
            bonus_duration_frames: u32::MAX - 10,
            boost_frames_per_level: u32::MAX,
            ..Tuning::default()
        };
        assert_eq!(huge.bonus_frames(0), u32::MAX - 10);
        assert_eq!(huge.bonus_frames(3), u32::MAX);
    }

    #[test]
    fn test_max_energy_floor() {
        let tuning = Tuning::default();
        assert_eq!(tuning.max_energy(0.0), 50.0);
        assert_eq!(tuning.max_energy(30.0), 80.0);

        let tiny = Tuning {
            initial_energy: 2.0,
            ..Tuning::default()
        };
        assert_eq!(tiny.max_energy(0.0), 10.0);
    }
}
