//! Persistence: key-value storage and the typed bridge the game talks to
//!
//! Reads never fail outward. Corrupt or missing data degrades to defaults
//! with a warning; only writes report errors.

pub mod bridge;
pub mod store;

pub use bridge::{PersistenceBridge, keys};
#[cfg(target_arch = "wasm32")]
pub use store::LocalStorage;
pub use store::{KeyValueStore, MemoryStore, StoreError};
