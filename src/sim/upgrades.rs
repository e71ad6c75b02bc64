//! Purchase-derived gameplay modifiers
//!
//! `derive_upgrades` is the only place purchase ids turn into numbers.
//! `UpgradeChannel` broadcasts fresh modifiers to whoever runs the game.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Purchasable upgrade items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeItem {
    Energy,
    Shield,
    Magnet,
    Bundle,
}

impl UpgradeItem {
    pub const ALL: [UpgradeItem; 4] = [
        UpgradeItem::Energy,
        UpgradeItem::Shield,
        UpgradeItem::Magnet,
        UpgradeItem::Bundle,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            UpgradeItem::Energy => "energy",
            UpgradeItem::Shield => "shield",
            UpgradeItem::Magnet => "magnet",
            UpgradeItem::Bundle => "bundle",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "energy" => Some(UpgradeItem::Energy),
            "shield" => Some(UpgradeItem::Shield),
            "magnet" => Some(UpgradeItem::Magnet),
            "bundle" => Some(UpgradeItem::Bundle),
            _ => None,
        }
    }

    /// Fixed contribution of owning this item
    fn contribution(&self) -> UpgradeModifiers {
        match self {
            UpgradeItem::Energy => UpgradeModifiers {
                energy_bonus: 30,
                balls_bonus: 20,
                ..Default::default()
            },
            UpgradeItem::Shield => UpgradeModifiers {
                shield_boost: 1,
                balls_bonus: 20,
                ..Default::default()
            },
            UpgradeItem::Magnet => UpgradeModifiers {
                magnet_boost: 1,
                balls_bonus: 20,
                ..Default::default()
            },
            UpgradeItem::Bundle => UpgradeModifiers {
                energy_bonus: 30,
                shield_boost: 1,
                magnet_boost: 1,
                balls_bonus: 40,
            },
        }
    }
}

/// Additive bonuses from owned purchases
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeModifiers {
    /// Added to max energy
    pub energy_bonus: u32,
    /// Shield duration levels (and rare-pickup frequency)
    pub shield_boost: u32,
    /// Magnet duration levels (and rare-pickup frequency)
    pub magnet_boost: u32,
    /// Added to the live particle cap
    pub balls_bonus: u32,
}

impl std::ops::Add for UpgradeModifiers {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            energy_bonus: self.energy_bonus + rhs.energy_bonus,
            shield_boost: self.shield_boost + rhs.shield_boost,
            magnet_boost: self.magnet_boost + rhs.magnet_boost,
            balls_bonus: self.balls_bonus + rhs.balls_bonus,
        }
    }
}

/// Set of owned purchase ids
///
/// Stored as a JSON object of `id -> true`; unknown ids are kept so a newer
/// catalog never loses data written by an older one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PurchaseSet {
    ids: BTreeSet<String>,
}

impl PurchaseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Returns false if the id was already owned
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.ids.insert(id.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Parse either `{"energy": true}` or `["energy"]`
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Stored {
            Flags(BTreeMap<String, bool>),
            Ids(Vec<String>),
        }

        let ids = match serde_json::from_str::<Stored>(json)? {
            Stored::Flags(flags) => flags
                .into_iter()
                .filter_map(|(id, owned)| owned.then_some(id))
                .collect(),
            Stored::Ids(ids) => ids.into_iter().collect(),
        };
        Ok(Self { ids })
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let flags: BTreeMap<&str, bool> = self.iter().map(|id| (id, true)).collect();
        serde_json::to_string(&flags)
    }
}

impl<S: Into<String>> FromIterator<S> for PurchaseSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Derive gameplay modifiers from owned purchases (unknown ids are ignored)
pub fn derive_upgrades(purchases: &PurchaseSet) -> UpgradeModifiers {
    purchases
        .iter()
        .filter_map(UpgradeItem::from_id)
        .map(|item| item.contribution())
        .fold(UpgradeModifiers::default(), |acc, c| acc + c)
}

/// Handle returned by `UpgradeChannel::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&UpgradeModifiers)>;

/// Single-threaded publish/subscribe channel for modifier changes
pub struct UpgradeChannel {
    current: UpgradeModifiers,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl UpgradeChannel {
    pub fn new(initial: UpgradeModifiers) -> Self {
        Self {
            current: initial,
            next_id: 1,
            subscribers: Vec::new(),
        }
    }

    /// Last published modifiers
    pub fn current(&self) -> UpgradeModifiers {
        self.current
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&UpgradeModifiers) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(handler)));
        id
    }

    /// Returns false if the id was not subscribed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Store and broadcast new modifiers to every subscriber
    pub fn publish(&mut self, modifiers: UpgradeModifiers) {
        self.current = modifiers;
        log::info!(
            "Upgrades changed: energy +{}, shield +{}, magnet +{}, balls +{}",
            modifiers.energy_bonus,
            modifiers.shield_boost,
            modifiers.magnet_boost,
            modifiers.balls_bonus
        );
        for (_, handler) in self.subscribers.iter_mut() {
            handler(&modifiers);
        }
    }
}

impl Default for UpgradeChannel {
    fn default() -> Self {
        Self::new(UpgradeModifiers::default())
    }
}
