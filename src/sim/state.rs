//! Game state and core simulation types

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::upgrades::UpgradeModifiers;
use crate::consts::palette;
use crate::tuning::Tuning;

/// Lifecycle of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameStatus {
    /// Title screen, nothing simulated yet
    Start,
    /// Active gameplay
    Playing,
    /// Simulation frozen, input listeners still alive
    Paused,
    /// Run ended (energy ran out or unshielded hazard hit)
    GameOver,
}

/// Actions that drive `GameStatus`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusAction {
    Start,
    TogglePause,
    /// Energy depleted or unshielded hazard contact
    End,
    Restart,
}

impl GameStatus {
    /// Next status for an action, `None` if the action doesn't apply
    pub fn next(self, action: StatusAction) -> Option<GameStatus> {
        use GameStatus::*;
        match (self, action) {
            (Start, StatusAction::Start) => Some(Playing),
            (Playing, StatusAction::TogglePause) => Some(Paused),
            (Paused, StatusAction::TogglePause) => Some(Playing),
            (Playing, StatusAction::End) => Some(GameOver),
            (GameOver, StatusAction::Restart) => Some(Playing),
            _ => None,
        }
    }

    /// Only `Playing` runs the simulation step
    pub fn is_simulating(self) -> bool {
        self == GameStatus::Playing
    }
}

/// Side-effect notifications for audio (and anything else listening)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Energy collected, or hazard destroyed by the shield
    Collect,
    /// Run-ending hit (hazard contact or energy depleted)
    Hit,
    /// Shield or magnet picked up
    Bonus,
    /// A run started
    Start,
}

/// Particle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleKind {
    Energy,
    Hazard,
    /// Cosmetic only, never consumed by contact
    Decoration,
    Shield,
    Magnet,
}

impl ParticleKind {
    /// Display colour (0xRRGGBB)
    pub fn color(&self) -> u32 {
        match self {
            ParticleKind::Energy => palette::ENERGY,
            ParticleKind::Hazard => palette::HAZARD,
            ParticleKind::Decoration => palette::DECORATION,
            ParticleKind::Shield => palette::SHIELD,
            ParticleKind::Magnet => palette::MAGNET,
        }
    }

    /// Hazards and rare pickups are drawn larger
    pub fn is_large(&self) -> bool {
        matches!(
            self,
            ParticleKind::Hazard | ParticleKind::Shield | ParticleKind::Magnet
        )
    }
}

/// A live particle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Visual and collision radius
    pub radius: f32,
    pub color: u32,
    pub kind: ParticleKind,
    /// Animation phase, advanced every frame
    pub pulse: f32,
}

impl Particle {
    pub fn new(kind: ParticleKind, pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel,
            radius,
            color: kind.color(),
            kind,
            pulse: 0.0,
        }
    }
}

/// Play-area dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Zero or negative sizes are bumped to one unit
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    pub fn clamp(&self, pos: Vec2) -> Vec2 {
        Vec2::new(pos.x.clamp(0.0, self.width), pos.y.clamp(0.0, self.height))
    }

    /// Inside the play area grown by `margin` on every side (edges inclusive)
    pub fn contains_with_margin(&self, pos: Vec2, margin: f32) -> bool {
        pos.x >= -margin
            && pos.x <= self.width + margin
            && pos.y >= -margin
            && pos.y <= self.height + margin
    }
}

/// The player marker; only input moves it
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerState {
    pub pos: Vec2,
}

impl PlayerState {
    pub fn centered(viewport: &Viewport) -> Self {
        Self {
            pos: viewport.center(),
        }
    }

    /// Last write wins, clamped to the play area
    pub fn move_to(&mut self, pos: Vec2, viewport: &Viewport) {
        self.pos = viewport.clamp(pos);
    }
}

/// Shield/magnet countdowns in simulated frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusTimers {
    pub shield: u32,
    pub magnet: u32,
}

impl BonusTimers {
    /// One frame elapsed (saturating at zero)
    pub fn decrement(&mut self) {
        self.shield = self.shield.saturating_sub(1);
        self.magnet = self.magnet.saturating_sub(1);
    }

    pub fn shield_active(&self) -> bool {
        self.shield > 0
    }

    pub fn magnet_active(&self) -> bool {
        self.magnet > 0
    }
}

/// Per-run bookkeeping, rebuilt from scratch on every (re)start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunState {
    /// Always within [0, max_energy]
    pub energy: f32,
    pub max_energy: f32,
    pub score: u64,
    pub bonuses: BonusTimers,
    /// Simulated frames this run
    pub frame: u64,
}

impl RunState {
    pub fn new(max_energy: f32) -> Self {
        Self {
            energy: max_energy,
            max_energy,
            score: 0,
            bonuses: BonusTimers::default(),
            frame: 0,
        }
    }

    /// Add energy, clamped to max
    pub fn gain_energy(&mut self, amount: f32) {
        self.energy = (self.energy + amount).clamp(0.0, self.max_energy);
    }

    /// Remove energy, saturating at zero. Returns true once depleted.
    pub fn drain_energy(&mut self, amount: f32) -> bool {
        self.energy = (self.energy - amount).clamp(0.0, self.max_energy);
        self.energy <= 0.0
    }

    pub fn energy_fraction(&self) -> f32 {
        if self.max_energy > 0.0 {
            self.energy / self.max_energy
        } else {
            0.0
        }
    }
}

/// Complete session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub status: GameStatus,
    pub run: RunState,
    pub player: PlayerState,
    /// Live particles (no ordering requirement)
    pub particles: Vec<Particle>,
    pub viewport: Viewport,
    pub upgrades: UpgradeModifiers,
    pub tuning: Tuning,
    /// Bonus countdowns as last published to the HUD
    pub displayed_bonuses: BonusTimers,
    /// Events raised since the host last drained them
    pub events: Vec<GameEvent>,
    pub(crate) rng: Pcg32,
}

impl GameState {
    /// Create a session on the title screen
    pub fn new(seed: u64, viewport: Viewport, tuning: Tuning, upgrades: UpgradeModifiers) -> Self {
        let max_energy = tuning.max_energy(upgrades.energy_bonus as f32);
        Self {
            seed,
            status: GameStatus::Start,
            run: RunState::new(max_energy),
            player: PlayerState::centered(&viewport),
            particles: Vec::new(),
            viewport,
            upgrades,
            tuning,
            displayed_bonuses: BonusTimers::default(),
            events: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn max_energy(&self) -> f32 {
        self.tuning.max_energy(self.upgrades.energy_bonus as f32)
    }

    /// Live particle cap
    pub fn max_particles(&self) -> usize {
        self.tuning
            .base_max_particles
            .saturating_add(self.upgrades.balls_bonus as usize)
    }

    /// Apply an action to the status machine; returns whether it applied
    pub fn apply_action(&mut self, action: StatusAction) -> bool {
        let Some(next) = self.status.next(action) else {
            return false;
        };
        if matches!(action, StatusAction::Start | StatusAction::Restart) {
            self.begin_run();
        }
        log::debug!("Status {:?} -> {:?}", self.status, next);
        self.status = next;
        true
    }

    /// Start from the title screen or restart after game over
    pub fn start_or_restart(&mut self) -> bool {
        match self.status {
            GameStatus::Start => self.apply_action(StatusAction::Start),
            GameStatus::GameOver => self.apply_action(StatusAction::Restart),
            _ => false,
        }
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.apply_action(StatusAction::TogglePause)
    }

    /// Fresh run: new RunState, no particles, player centered
    fn begin_run(&mut self) {
        self.run = RunState::new(self.max_energy());
        self.particles.clear();
        self.player = PlayerState::centered(&self.viewport);
        self.displayed_bonuses = BonusTimers::default();
        self.events.push(GameEvent::Start);
        log::info!("Run started (max energy {})", self.run.max_energy);
    }

    /// Pointer/touch moved; only steers while playing
    pub fn pointer_moved(&mut self, pos: Vec2) {
        if self.status == GameStatus::Playing {
            self.player.move_to(pos, &self.viewport);
        }
    }

    /// Viewport changed size
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        let pos = self.player.pos;
        self.player.move_to(pos, &viewport);
    }

    /// New purchase-derived modifiers, possibly mid-run
    pub fn apply_upgrades(&mut self, upgrades: UpgradeModifiers) {
        let gained = upgrades.energy_bonus.saturating_sub(self.upgrades.energy_bonus);
        self.upgrades = upgrades;
        self.run.max_energy = self.max_energy();
        self.run.energy = self.run.energy.min(self.run.max_energy);
        if gained > 0 {
            self.run.gain_energy(gained as f32);
        }
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
