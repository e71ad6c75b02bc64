//! Typed access to persisted game data

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::store::{KeyValueStore, StoreError};
use crate::highscores::{Leaderboard, LeaderboardEntry};
use crate::settings::Settings;
use crate::sim::upgrades::{PurchaseSet, UpgradeModifiers, derive_upgrades};
use crate::tuning::Tuning;

/// Storage keys
pub mod keys {
    pub const HIGH_SCORE: &str = "neon-pulse-highscore";
    pub const PURCHASES: &str = "neon-pulse-purchases";
    /// Cache of the last derived modifiers, rewritten on every purchase
    pub const UPGRADES: &str = "neon-pulse-upgrades";
    pub const LEADERBOARD: &str = "neon-pulse-leaderboard";
    pub const TOTAL_BALLS: &str = "neon-pulse-total-balls";
    pub const BEST_RUN: &str = "neon-pulse-best-run";
    pub const SETTINGS: &str = "neon-pulse-settings";
    pub const TUNING: &str = "neon-pulse-tuning";
}

/// High score, purchases, leaderboard, settings and tuning over any store
pub struct PersistenceBridge<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> PersistenceBridge<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Raw read; failures are logged and treated as absent
    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.read(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("Ignoring corrupt {}: {}", key, e);
                None
            }
        }
    }

    fn write_json<T: Serialize>(&mut self, key: &str, value: &T) -> Result<(), StoreError> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }

    /// Non-negative integer stored as text. Accepts float text from older saves.
    fn read_count(&self, key: &str) -> u64 {
        let Some(raw) = self.read(key) else {
            return 0;
        };
        let raw = raw.trim();
        if let Ok(value) = raw.parse::<u64>() {
            return value;
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => value as u64,
            _ => {
                log::warn!("Ignoring corrupt {}: {:?}", key, raw);
                0
            }
        }
    }

    // === High score ===

    pub fn high_score(&self) -> u64 {
        self.read_count(keys::HIGH_SCORE)
    }

    pub fn set_high_score(&mut self, score: u64) -> Result<(), StoreError> {
        self.store.set(keys::HIGH_SCORE, &score.to_string())
    }

    // === Purchases ===

    pub fn purchases(&self) -> PurchaseSet {
        let Some(raw) = self.read(keys::PURCHASES) else {
            return PurchaseSet::new();
        };
        PurchaseSet::from_json(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring corrupt {}: {}", keys::PURCHASES, e);
            PurchaseSet::new()
        })
    }

    /// Modifiers derived from the stored purchases
    pub fn upgrades(&self) -> UpgradeModifiers {
        derive_upgrades(&self.purchases())
    }

    /// Mark an item owned, refresh the modifier cache and return the new modifiers
    pub fn apply_purchase(&mut self, id: &str) -> Result<UpgradeModifiers, StoreError> {
        let mut purchases = self.purchases();
        if !purchases.insert(id) {
            log::debug!("Purchase {} already recorded", id);
        }
        let json = purchases.to_json()?;
        self.store.set(keys::PURCHASES, &json)?;

        let upgrades = derive_upgrades(&purchases);
        self.write_json(keys::UPGRADES, &upgrades)?;
        log::info!("Purchase recorded: {}", id);
        Ok(upgrades)
    }

    // === Leaderboard ===

    pub fn leaderboard(&self) -> Leaderboard {
        let entries: Vec<LeaderboardEntry> =
            self.read_json(keys::LEADERBOARD).unwrap_or_default();
        Leaderboard::from_parts(
            entries,
            self.read_count(keys::TOTAL_BALLS),
            self.read_count(keys::BEST_RUN),
        )
    }

    pub fn save_leaderboard(&mut self, board: &Leaderboard) -> Result<(), StoreError> {
        self.store.set(keys::TOTAL_BALLS, &board.total_score.to_string())?;
        self.store.set(keys::BEST_RUN, &board.best_run.to_string())?;
        self.write_json(keys::LEADERBOARD, &board.entries)
    }

    // === Settings / tuning ===

    pub fn settings(&self) -> Settings {
        self.read_json(keys::SETTINGS).unwrap_or_default()
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<(), StoreError> {
        self.write_json(keys::SETTINGS, settings)
    }

    /// Optional balance override; invalid data falls back to defaults
    pub fn tuning(&self) -> Tuning {
        let Some(raw) = self.read(keys::TUNING) else {
            return Tuning::default();
        };
        Tuning::from_json(&raw).unwrap_or_else(|e| {
            log::warn!("Ignoring {}: {}", keys::TUNING, e);
            Tuning::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    /// Store that fails every operation
    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::Read {
                key: key.to_string(),
                reason: "denied".to_string(),
            })
        }

        fn set(&mut self, key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::Write {
                key: key.to_string(),
                reason: "quota".to_string(),
            })
        }

        fn remove(&mut self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable)
        }
    }

    fn bridge_with(pairs: &[(&str, &str)]) -> PersistenceBridge<MemoryStore> {
        let mut store = MemoryStore::new();
        for (key, value) in pairs {
            store.set(key, value).expect("seed");
        }
        PersistenceBridge::new(store)
    }

    #[test]
    fn test_empty_store_defaults() {
        let bridge = bridge_with(&[]);
        assert_eq!(bridge.high_score(), 0);
        assert!(bridge.purchases().is_empty());
        assert_eq!(bridge.upgrades(), UpgradeModifiers::default());
        assert!(bridge.leaderboard().is_empty());
        assert_eq!(bridge.settings(), Settings::default());
        assert_eq!(bridge.tuning(), Tuning::default());
    }

    #[test]
    fn test_corrupt_values_degrade() {
        let bridge = bridge_with(&[
            (keys::HIGH_SCORE, "lots"),
            (keys::PURCHASES, "{not json"),
            (keys::LEADERBOARD, "[{]"),
            (keys::TOTAL_BALLS, "-4"),
            (keys::SETTINGS, "null"),
            (keys::TUNING, r#"{"energy_decay":-1}"#),
        ]);
        assert_eq!(bridge.high_score(), 0);
        assert!(bridge.purchases().is_empty());
        assert!(bridge.leaderboard().is_empty());
        assert_eq!(bridge.leaderboard().total_score, 0);
        assert_eq!(bridge.settings(), Settings::default());
        assert_eq!(bridge.tuning(), Tuning::default());
    }

    #[test]
    fn test_broken_store_reads_default_and_writes_fail() {
        let mut bridge = PersistenceBridge::new(BrokenStore);
        assert_eq!(bridge.high_score(), 0);
        assert!(bridge.purchases().is_empty());
        assert!(bridge.set_high_score(10).is_err());
        assert!(bridge.apply_purchase("energy").is_err());
    }

    #[test]
    fn test_high_score_round_trip() {
        let mut bridge = bridge_with(&[]);
        bridge.set_high_score(340).expect("write");
        assert_eq!(bridge.high_score(), 340);
        assert_eq!(
            bridge.store().get(keys::HIGH_SCORE).expect("get").as_deref(),
            Some("340")
        );

        // Number text written by other clients
        let bridge = bridge_with(&[(keys::HIGH_SCORE, " 125.0 ")]);
        assert_eq!(bridge.high_score(), 125);
    }

    #[test]
    fn test_apply_purchase_updates_set_and_cache() {
        let mut bridge = bridge_with(&[(keys::PURCHASES, r#"["shield"]"#)]);
        let upgrades = bridge.apply_purchase("magnet").expect("purchase");
        assert_eq!(
            upgrades,
            UpgradeModifiers {
                energy_bonus: 0,
                shield_boost: 1,
                magnet_boost: 1,
                balls_bonus: 40,
            }
        );
        assert_eq!(bridge.upgrades(), upgrades);

        let stored = bridge.store().get(keys::PURCHASES).expect("get");
        assert_eq!(stored.as_deref(), Some(r#"{"magnet":true,"shield":true}"#));

        let cached = bridge.store().get(keys::UPGRADES).expect("get").expect("cache");
        let cached: UpgradeModifiers = serde_json::from_str(&cached).expect("parse");
        assert_eq!(cached, upgrades);

        // Applying twice changes nothing
        assert_eq!(bridge.apply_purchase("magnet").expect("again"), upgrades);
    }

    #[test]
    fn test_leaderboard_round_trip() {
        let mut bridge = bridge_with(&[]);
        let mut board = bridge.leaderboard();
        board.record_run(70, 1_000.0);
        board.record_run(30, 2_000.0);
        bridge.save_leaderboard(&board).expect("save");

        let loaded = bridge.leaderboard();
        assert_eq!(loaded, board);
        assert_eq!(loaded.total_score, 100);
        assert_eq!(loaded.best_run, 70);
        assert_eq!(
            bridge.store().get(keys::TOTAL_BALLS).expect("get").as_deref(),
            Some("100")
        );
    }

    #[test]
    fn test_settings_round_trip() {
        let mut bridge = bridge_with(&[]);
        let settings = Settings {
            muted: true,
            glow: false,
            ..Default::default()
        };
        bridge.save_settings(&settings).expect("save");
        assert_eq!(bridge.settings(), settings);
    }

    #[test]
    fn test_tuning_override() {
        let bridge = bridge_with(&[(keys::TUNING, r#"{"energy_decay":0.3}"#)]);
        let tuning = bridge.tuning();
        assert_eq!(tuning.energy_decay, 0.3);
        assert_eq!(tuning.energy_gain, 15.0);
    }
}
