//! Per-frame simulation step
//!
//! One call per display refresh. Only `Playing` advances the world; every
//! other status just handles the start/pause actions carried by the input.

use super::collision::{magnet_pull, touches_player};
use super::spawner;
use super::state::{
    GameEvent, GameState, GameStatus, Particle, ParticleKind, RunState, StatusAction,
};
use super::upgrades::UpgradeModifiers;
use crate::tuning::Tuning;

/// One-shot actions gathered between frames
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Start from the title screen, or restart after game over
    pub start: bool,
    /// Pause toggle
    pub pause: bool,
}

/// What a contact did to the run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Contact {
    /// No effect, particle stays
    Ignored,
    /// Particle consumed
    Consumed,
    /// Unshielded hazard: particle consumed, run over
    Fatal,
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput) {
    if input.pause {
        state.toggle_pause();
    }
    if input.start {
        state.start_or_restart();
    }

    if !state.status.is_simulating() {
        return;
    }

    // Energy decay
    state.run.frame += 1;
    if state.run.drain_energy(state.tuning.energy_decay) {
        log::info!("Energy depleted at score {}", state.run.score);
        end_run(state);
        return;
    }

    state.run.bonuses.decrement();
    if state.run.frame % state.tuning.hud_sync_interval == 0 {
        state.displayed_bonuses = state.run.bonuses;
    }

    // Spawn
    let max_particles = state.max_particles();
    if spawner::should_spawn(
        &mut state.rng,
        state.run.score,
        state.particles.len(),
        max_particles,
        &state.tuning,
    ) {
        let particle = spawner::spawn(
            &mut state.rng,
            &state.viewport,
            state.run.score,
            &state.upgrades,
            &state.tuning,
        );
        state.particles.push(particle);
    }

    let ended = update_particles(state);
    if ended {
        log::info!("Hazard hit at score {}", state.run.score);
        end_run(state);
    }
}

/// Move, collide and cull every live particle. Returns true on a fatal hit.
fn update_particles(state: &mut GameState) -> bool {
    let GameState {
        run,
        player,
        particles,
        viewport,
        upgrades,
        tuning,
        events,
        ..
    } = state;

    let player = player.pos;
    let mut ended = false;

    // Bonus state is read per particle so a pickup affects the rest of the frame
    particles.retain_mut(|p| {
        if run.bonuses.magnet_active() {
            p.vel += magnet_pull(p, player, tuning);
        }

        p.pos += p.vel;
        p.pulse += tuning.pulse_step;

        // Nothing resolves after the run has ended this frame
        if !ended && touches_player(p, player, run.bonuses.shield_active(), tuning) {
            match resolve_contact(p, run, upgrades, tuning, events) {
                Contact::Ignored => {}
                Contact::Consumed => return false,
                Contact::Fatal => {
                    ended = true;
                    return false;
                }
            }
        }

        viewport.contains_with_margin(p.pos, tuning.cull_margin)
    });

    ended
}

/// Apply a particle's effect on contact
fn resolve_contact(
    particle: &Particle,
    run: &mut RunState,
    upgrades: &UpgradeModifiers,
    tuning: &Tuning,
    events: &mut Vec<GameEvent>,
) -> Contact {
    match particle.kind {
        ParticleKind::Energy => {
            run.gain_energy(tuning.energy_gain);
            run.score += tuning.energy_score;
            events.push(GameEvent::Collect);
            Contact::Consumed
        }
        ParticleKind::Hazard => {
            if run.bonuses.shield_active() {
                run.score += tuning.shielded_hazard_score;
                events.push(GameEvent::Collect);
                Contact::Consumed
            } else {
                Contact::Fatal
            }
        }
        ParticleKind::Shield => {
            run.bonuses.shield = tuning.bonus_frames(upgrades.shield_boost);
            events.push(GameEvent::Bonus);
            Contact::Consumed
        }
        ParticleKind::Magnet => {
            run.bonuses.magnet = tuning.bonus_frames(upgrades.magnet_boost);
            events.push(GameEvent::Bonus);
            Contact::Consumed
        }
        ParticleKind::Decoration => Contact::Ignored,
    }
}

/// Playing -> GameOver, with the hit cue
fn end_run(state: &mut GameState) {
    if state.apply_action(StatusAction::End) {
        state.events.push(GameEvent::Hit);
        state.displayed_bonuses = state.run.bonuses;
    }
    debug_assert_eq!(state.status, GameStatus::GameOver);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{BonusTimers, Viewport};
    use glam::Vec2;
    use proptest::prelude::*;

    /// Tuning with spawning switched off so tests place particles by hand
    fn quiet_tuning() -> Tuning {
        Tuning {
            base_spawn_rate: 0.0,
            spawn_rate_per_score: 0.0,
            ..Tuning::default()
        }
    }

    fn playing_state(tuning: Tuning) -> GameState {
        let mut state = GameState::new(
            12345,
            Viewport::new(800.0, 600.0),
            tuning,
            UpgradeModifiers::default(),
        );
        state.start_or_restart();
        state.drain_events();
        state
    }

    /// Stationary particle at an offset from the player
    fn place(state: &mut GameState, kind: ParticleKind, offset: Vec2, radius: f32) {
        let pos = state.player.pos + offset;
        state.particles.push(Particle::new(kind, pos, Vec2::ZERO, radius));
    }

    #[test]
    fn test_start_and_pause_actions() {
        let mut state = GameState::new(
            1,
            Viewport::new(800.0, 600.0),
            quiet_tuning(),
            UpgradeModifiers::default(),
        );

        // Title screen doesn't simulate
        tick(&mut state, &TickInput::default());
        assert_eq!(state.status, GameStatus::Start);
        assert_eq!(state.run.frame, 0);

        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
        );
        assert_eq!(state.status, GameStatus::Playing);
        assert_eq!(state.run.frame, 1);
        assert_eq!(state.drain_events(), vec![GameEvent::Start]);

        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause);
        assert_eq!(state.status, GameStatus::Paused);
        let frozen_energy = state.run.energy;
        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.run.frame, 1);
        assert_eq!(state.run.energy, frozen_energy);

        tick(&mut state, &pause);
        assert_eq!(state.status, GameStatus::Playing);
        assert_eq!(state.run.frame, 2);
    }

    #[test]
    fn test_energy_pickup() {
        let mut state = playing_state(quiet_tuning());
        state.run.energy = 20.0;
        place(&mut state, ParticleKind::Energy, Vec2::new(5.0, 0.0), 6.0);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.run.score, 10);
        // 20 - 0.15 decay + 15
        assert!((state.run.energy - 34.85).abs() < 1e-4);
        assert!(state.particles.is_empty());
        assert_eq!(state.drain_events(), vec![GameEvent::Collect]);
    }

    #[test]
    fn test_energy_pickup_clamps_to_max() {
        let mut state = playing_state(quiet_tuning());
        let max = state.run.max_energy;
        assert_eq!(state.run.energy, max);
        place(&mut state, ParticleKind::Energy, Vec2::ZERO, 6.0);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.run.score, 10);
        assert_eq!(state.run.energy, max);
    }

    #[test]
    fn test_unshielded_hazard_ends_run() {
        let mut state = playing_state(quiet_tuning());
        place(&mut state, ParticleKind::Hazard, Vec2::new(0.0, 10.0), 12.0);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.status, GameStatus::GameOver);
        assert!(state.particles.is_empty());
        assert_eq!(state.run.score, 0);
        assert_eq!(state.drain_events(), vec![GameEvent::Hit]);

        // Game over is sticky until restart
        tick(&mut state, &TickInput::default());
        assert_eq!(state.status, GameStatus::GameOver);
        tick(
            &mut state,
            &TickInput {
                pause: true,
                ..Default::default()
            },
        );
        assert_eq!(state.status, GameStatus::GameOver);
    }

    #[test]
    fn test_nothing_resolves_after_fatal_hit() {
        let mut state = playing_state(quiet_tuning());
        place(&mut state, ParticleKind::Hazard, Vec2::ZERO, 12.0);
        place(&mut state, ParticleKind::Energy, Vec2::new(1.0, 0.0), 6.0);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.status, GameStatus::GameOver);
        assert_eq!(state.run.score, 0);
        assert_eq!(state.particles.len(), 1);
        assert_eq!(state.particles[0].kind, ParticleKind::Energy);
    }

    #[test]
    fn test_shielded_hazard_is_destroyed() {
        let mut state = playing_state(quiet_tuning());
        state.run.bonuses.shield = 100;
        // Outside the normal reach (12 + 12) but inside the shielded one (12 + 25)
        place(&mut state, ParticleKind::Hazard, Vec2::new(30.0, 0.0), 12.0);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.status, GameStatus::Playing);
        assert_eq!(state.run.score, 5);
        assert!(state.particles.is_empty());
        // Only the frame decrement, the contact itself doesn't touch the timer
        assert_eq!(state.run.bonuses.shield, 99);
        assert_eq!(state.drain_events(), vec![GameEvent::Collect]);
    }

    #[test]
    fn test_bonus_pickups_set_timers() {
        let tuning = quiet_tuning();
        let mut state = GameState::new(
            3,
            Viewport::new(800.0, 600.0),
            tuning,
            UpgradeModifiers {
                shield_boost: 1,
                magnet_boost: 2,
                ..Default::default()
            },
        );
        state.start_or_restart();
        state.drain_events();
        place(&mut state, ParticleKind::Shield, Vec2::new(3.0, 0.0), 10.0);
        place(&mut state, ParticleKind::Magnet, Vec2::new(-3.0, 0.0), 10.0);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.run.bonuses.shield, 500 + 120);
        assert_eq!(state.run.bonuses.magnet, 500 + 240);
        assert!(state.particles.is_empty());
        assert_eq!(state.drain_events(), vec![GameEvent::Bonus, GameEvent::Bonus]);
    }

    #[test]
    fn test_huge_bonus_tuning_saturates() {
        let tuning = Tuning::from_json(
            r#"{"boost_frames_per_level":4294967295,"base_spawn_rate":0.0,"spawn_rate_per_score":0.0}"#,
        )
        .expect("accepted tuning");
        let mut state = GameState::new(
            3,
            Viewport::new(800.0, 600.0),
            tuning,
            UpgradeModifiers {
                shield_boost: 1,
                ..Default::default()
            },
        );
        state.start_or_restart();
        state.drain_events();
        place(&mut state, ParticleKind::Shield, Vec2::ZERO, 10.0);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.run.bonuses.shield, u32::MAX);
        assert_eq!(state.status, GameStatus::Playing);
    }

    #[test]
    fn test_magnet_pickup_pulls_same_frame() {
        let mut state = playing_state(quiet_tuning());
        place(&mut state, ParticleKind::Magnet, Vec2::ZERO, 10.0);
        place(&mut state, ParticleKind::Energy, Vec2::new(200.0, 0.0), 5.0);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.particles.len(), 1);
        let energy = &state.particles[0];
        assert_eq!(energy.kind, ParticleKind::Energy);
        assert!((energy.vel - Vec2::new(-0.6, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_decorations_pass_through() {
        let mut state = playing_state(quiet_tuning());
        place(&mut state, ParticleKind::Decoration, Vec2::ZERO, 6.0);

        tick(&mut state, &TickInput::default());

        assert_eq!(state.particles.len(), 1);
        assert_eq!(state.run.score, 0);
        assert!(state.drain_events().is_empty());
    }

    #[test]
    fn test_contact_boundary_is_strict() {
        let mut state = playing_state(quiet_tuning());
        // radius 8 + margin 12 = 20 exactly
        place(&mut state, ParticleKind::Energy, Vec2::new(20.0, 0.0), 8.0);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.particles.len(), 1);
        assert_eq!(state.run.score, 0);

        state.particles.clear();
        place(&mut state, ParticleKind::Energy, Vec2::new(19.999, 0.0), 8.0);
        tick(&mut state, &TickInput::default());
        assert!(state.particles.is_empty());
        assert_eq!(state.run.score, 10);
    }

    #[test]
    fn test_decay_to_zero_ends_run() {
        let tuning = quiet_tuning();
        let decay = tuning.energy_decay;
        let mut state = playing_state(tuning);
        state.run.energy = decay * 3.0;

        let mut frames = 0;
        while state.status == GameStatus::Playing {
            let before = state.run.energy;
            tick(&mut state, &TickInput::default());
            frames += 1;
            if state.status == GameStatus::Playing {
                assert!(state.run.energy > 0.0);
            } else {
                assert!(before > 0.0);
            }
            assert!(frames <= 4, "decay never ended the run");
        }

        assert_eq!(state.status, GameStatus::GameOver);
        assert_eq!(state.run.energy, 0.0);
        assert_eq!(state.drain_events(), vec![GameEvent::Hit]);
    }

    #[test]
    fn test_exact_decay_hits_zero_in_one_frame() {
        let tuning = quiet_tuning();
        let decay = tuning.energy_decay;
        let mut state = playing_state(tuning);
        state.run.energy = decay;

        tick(&mut state, &TickInput::default());

        assert_eq!(state.run.energy, 0.0);
        assert_eq!(state.status, GameStatus::GameOver);
    }

    #[test]
    fn test_magnet_accelerates_energy() {
        let mut state = playing_state(quiet_tuning());
        state.run.bonuses.magnet = 50;
        place(&mut state, ParticleKind::Energy, Vec2::new(200.0, 0.0), 5.0);

        tick(&mut state, &TickInput::default());
        let v1 = state.particles[0].vel;
        assert!((v1 - Vec2::new(-0.6, 0.0)).length() < 1e-5);

        tick(&mut state, &TickInput::default());
        let v2 = state.particles[0].vel;
        assert!((v2 - Vec2::new(-1.2, 0.0)).length() < 1e-5);

        // Hazards ignore the magnet
        place(&mut state, ParticleKind::Hazard, Vec2::new(0.0, 150.0), 10.0);
        tick(&mut state, &TickInput::default());
        assert_eq!(state.particles[1].vel, Vec2::ZERO);
    }

    #[test]
    fn test_offscreen_particles_culled() {
        let mut state = playing_state(quiet_tuning());
        state.particles.push(Particle::new(
            ParticleKind::Energy,
            Vec2::new(-199.0, 300.0),
            Vec2::new(-2.0, 0.0),
            5.0,
        ));
        state.particles.push(Particle::new(
            ParticleKind::Decoration,
            Vec2::new(400.0, 799.0),
            Vec2::new(0.0, 1.0),
            5.0,
        ));

        tick(&mut state, &TickInput::default());

        // First left the margin, second sits exactly on it
        assert_eq!(state.particles.len(), 1);
        assert_eq!(state.particles[0].pos, Vec2::new(400.0, 800.0));
        assert_eq!(state.run.score, 0);
    }

    #[test]
    fn test_bonus_display_cadence() {
        let mut state = playing_state(quiet_tuning());
        state.run.bonuses.shield = 100;

        for _ in 0..9 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.displayed_bonuses, BonusTimers::default());

        tick(&mut state, &TickInput::default());
        assert_eq!(state.run.frame, 10);
        assert_eq!(state.displayed_bonuses.shield, 90);
    }

    #[test]
    fn test_particle_cap() {
        let tuning = Tuning {
            base_spawn_rate: 2.0,
            base_max_particles: 5,
            ..Tuning::default()
        };
        let mut state = playing_state(tuning);
        for _ in 0..20 {
            tick(&mut state, &TickInput::default());
            assert!(state.particles.len() <= 5);
            if state.status != GameStatus::Playing {
                break;
            }
        }
    }

    #[test]
    fn test_determinism() {
        let run = |seed| {
            let mut state = GameState::new(
                seed,
                Viewport::new(800.0, 600.0),
                Tuning::default(),
                UpgradeModifiers::default(),
            );
            state.start_or_restart();
            for i in 0..300 {
                let angle = i as f32 * 0.05;
                state.pointer_moved(Vec2::new(400.0 + angle.cos() * 150.0, 300.0 + angle.sin() * 150.0));
                tick(&mut state, &TickInput::default());
            }
            (state.run.score, state.run.energy, state.particles.len(), state.status)
        };

        assert_eq!(run(99999), run(99999));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_frame_invariants(
            seed in any::<u64>(),
            width in 200.0f32..1600.0,
            height in 200.0f32..1200.0,
            moves in proptest::collection::vec((0.0f32..1.0, 0.0f32..1.0), 1..50),
            shield in 0u32..300,
            magnet in 0u32..300,
        ) {
            let tuning = Tuning {
                // Busy screen so collisions actually happen
                base_spawn_rate: 0.5,
                ..Tuning::default()
            };
            let mut state = GameState::new(
                seed,
                Viewport::new(width, height),
                tuning,
                UpgradeModifiers::default(),
            );
            state.start_or_restart();
            state.run.bonuses.shield = shield;
            state.run.bonuses.magnet = magnet;

            for frame in 0..400usize {
                let (fx, fy) = moves[frame % moves.len()];
                state.pointer_moved(Vec2::new(fx * width, fy * height));
                let score_before = state.run.score;
                tick(&mut state, &TickInput::default());

                let run = &state.run;
                prop_assert!(run.energy >= 0.0 && run.energy <= run.max_energy);
                prop_assert!(run.score >= score_before);
                for p in &state.particles {
                    prop_assert!(state.viewport.contains_with_margin(p.pos, 200.0));
                }
                if state.status != GameStatus::Playing {
                    prop_assert_eq!(state.status, GameStatus::GameOver);
                    break;
                }
            }
        }
    }
}
