//! Deterministic simulation module
//!
//! All gameplay logic lives here. Seeded RNG only, no rendering or platform
//! dependencies. The host drives it with one `tick` per display frame.

pub mod collision;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod upgrades;

pub use collision::{collision_radius, magnet_pull, touches_player};
pub use spawner::spawn;
pub use state::{
    BonusTimers, GameEvent, GameState, GameStatus, Particle, ParticleKind, PlayerState, RunState,
    StatusAction, Viewport,
};
pub use tick::{TickInput, tick};
pub use upgrades::{
    PurchaseSet, SubscriptionId, UpgradeChannel, UpgradeItem, UpgradeModifiers, derive_upgrades,
};
