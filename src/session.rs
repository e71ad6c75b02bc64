//! Game session: the simulation plus everything around it
//!
//! Owns the `GameState`, the persistence bridge and the upgrade channel.
//! The host calls `frame` once per display refresh and forwards input; the
//! session handles the bookkeeping when a run ends.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

use crate::consts::LOW_ENERGY_THRESHOLD;
use crate::frames_to_seconds;
use crate::highscores::Leaderboard;
use crate::persistence::{KeyValueStore, PersistenceBridge};
use crate::settings::Settings;
use crate::shop::{self, PurchaseError};
use crate::sim::state::{GameEvent, GameState, GameStatus, Viewport};
use crate::sim::tick::{TickInput, tick};
use crate::sim::upgrades::{PurchaseSet, UpgradeChannel, UpgradeModifiers};

/// Everything the HUD shows for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HudSnapshot {
    pub status: GameStatus,
    pub score: u64,
    pub high_score: u64,
    pub energy: f32,
    pub max_energy: f32,
    /// 0.0 - 1.0
    pub energy_fraction: f32,
    /// Energy bar drawn in the hazard colour
    pub low_energy: bool,
    /// Whole seconds left, refreshed at the HUD cadence
    pub shield_seconds: u32,
    pub magnet_seconds: u32,
    /// Live particle cap
    pub max_balls: usize,
}

/// A game session bound to a store
pub struct Session<S: KeyValueStore> {
    state: GameState,
    bridge: PersistenceBridge<S>,
    channel: UpgradeChannel,
    /// Latest modifiers published on the channel, applied before the next tick
    pending_upgrades: Rc<Cell<Option<UpgradeModifiers>>>,
    high_score: u64,
    leaderboard: Leaderboard,
    settings: Settings,
    last_status: GameStatus,
}

impl<S: KeyValueStore> Session<S> {
    /// Load persisted data and sit on the title screen
    pub fn new(bridge: PersistenceBridge<S>, viewport: Viewport, seed: u64) -> Self {
        let tuning = bridge.tuning();
        let upgrades = bridge.upgrades();
        let high_score = bridge.high_score();
        let leaderboard = bridge.leaderboard();
        let settings = bridge.settings();

        let state = GameState::new(seed, viewport, tuning, upgrades);

        let mut channel = UpgradeChannel::new(upgrades);
        let pending_upgrades = Rc::new(Cell::new(None));
        let slot = Rc::clone(&pending_upgrades);
        channel.subscribe(move |m| slot.set(Some(*m)));

        log::info!(
            "Session ready: high score {}, {} purchases, seed {}",
            high_score,
            bridge.purchases().len(),
            seed
        );

        Self {
            last_status: state.status,
            state,
            bridge,
            channel,
            pending_upgrades,
            high_score,
            leaderboard,
            settings,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    pub fn high_score(&self) -> u64 {
        self.high_score
    }

    pub fn leaderboard(&self) -> &Leaderboard {
        &self.leaderboard
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn purchases(&self) -> PurchaseSet {
        self.bridge.purchases()
    }

    pub fn bridge(&self) -> &PersistenceBridge<S> {
        &self.bridge
    }

    /// For extra listeners (HUD, shop UI)
    pub fn channel_mut(&mut self) -> &mut UpgradeChannel {
        &mut self.channel
    }

    // === Input ===

    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.state.pointer_moved(pos);
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.state.resize(viewport);
    }

    /// Pause if a run is in progress (tab hidden, window blurred)
    pub fn auto_pause(&mut self) -> bool {
        if self.state.status == GameStatus::Playing {
            log::info!("Auto-pausing");
            self.state.toggle_pause()
        } else {
            false
        }
    }

    /// Flip mute and persist it; returns the new mute state
    pub fn toggle_mute(&mut self) -> bool {
        let muted = self.settings.toggle_mute();
        if let Err(e) = self.bridge.save_settings(&self.settings) {
            log::warn!("Failed to save settings: {}", e);
        }
        muted
    }

    // === Frame ===

    /// Run one frame and return the cues it raised
    pub fn frame(&mut self, input: &TickInput, now_ms: f64) -> Vec<GameEvent> {
        if let Some(upgrades) = self.pending_upgrades.take() {
            self.state.apply_upgrades(upgrades);
        }

        tick(&mut self.state, input);

        let status = self.state.status;
        if status == GameStatus::GameOver && self.last_status != GameStatus::GameOver {
            self.finish_run(now_ms);
        }
        self.last_status = status;

        self.state.drain_events()
    }

    /// High score and leaderboard writes for a run that just ended
    fn finish_run(&mut self, now_ms: f64) {
        let score = self.state.run.score;
        log::info!("Game over: score {} (best {})", score, self.high_score);

        if score > self.high_score {
            self.high_score = score;
            if let Err(e) = self.bridge.set_high_score(score) {
                log::warn!("Failed to save high score: {}", e);
            }
        }

        if score > 0 {
            if let Some(rank) = self.leaderboard.record_run(score, now_ms) {
                log::info!("Leaderboard rank {}", rank);
            }
            if let Err(e) = self.bridge.save_leaderboard(&self.leaderboard) {
                log::warn!("Failed to save leaderboard: {}", e);
            }
        }
    }

    /// Record a paid purchase; the new modifiers reach the game next frame
    pub fn complete_purchase(&mut self, id: &str) -> Result<UpgradeModifiers, PurchaseError> {
        shop::complete(&mut self.bridge, &mut self.channel, id)
    }

    pub fn hud(&self) -> HudSnapshot {
        let run = &self.state.run;
        HudSnapshot {
            status: self.state.status,
            score: run.score,
            high_score: self.high_score.max(run.score),
            energy: run.energy,
            max_energy: run.max_energy,
            energy_fraction: run.energy_fraction(),
            low_energy: run.energy <= LOW_ENERGY_THRESHOLD,
            shield_seconds: frames_to_seconds(self.state.displayed_bonuses.shield),
            magnet_seconds: frames_to_seconds(self.state.displayed_bonuses.magnet),
            max_balls: self.state.max_particles(),
        }
    }
}
