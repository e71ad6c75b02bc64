//! Upgrade shop
//!
//! Item catalog and the purchase flow. The wallet is an opaque
//! `PaymentProvider`; this module only decides whether a purchase may go
//! ahead and records it once the provider reports success. A failed payment
//! leaves stored purchases and the running game untouched.

use std::future::Future;

use crate::persistence::{KeyValueStore, PersistenceBridge, StoreError};
use crate::sim::upgrades::{PurchaseSet, UpgradeChannel, UpgradeItem, UpgradeModifiers};

/// Nano-units per TON
const NANO_PER_TON: u64 = 1_000_000_000;

/// A purchasable item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShopItem {
    pub item: UpgradeItem,
    pub title: &'static str,
    /// Payload opcode the payment contract dispatches on
    pub opcode: u32,
    /// Decimal TON amount
    pub price_ton: &'static str,
}

impl ShopItem {
    pub fn id(&self) -> &'static str {
        self.item.id()
    }
}

pub const CATALOG: [ShopItem; 4] = [
    ShopItem {
        item: UpgradeItem::Energy,
        title: "Energy cooldown reset",
        opcode: 0x01,
        price_ton: "2",
    },
    ShopItem {
        item: UpgradeItem::Shield,
        title: "Extra shields",
        opcode: 0x02,
        price_ton: "3",
    },
    ShopItem {
        item: UpgradeItem::Magnet,
        title: "Extra magnets",
        opcode: 0x03,
        price_ton: "3",
    },
    ShopItem {
        item: UpgradeItem::Bundle,
        title: "Bundle (1+2+3 discount)",
        opcode: 0x04,
        price_ton: "0.6",
    },
];

/// Look up a catalog item by id
pub fn find_item(id: &str) -> Option<&'static ShopItem> {
    CATALOG.iter().find(|item| item.id() == id)
}

/// What the provider is asked to pay for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    pub item_id: &'static str,
    pub opcode: u32,
    pub amount_ton: &'static str,
}

impl PaymentRequest {
    pub fn for_item(item: &ShopItem) -> Self {
        Self {
            item_id: item.id(),
            opcode: item.opcode,
            amount_ton: item.price_ton,
        }
    }

    /// Amount in nano-units, `None` if the price text is malformed
    pub fn amount_nano(&self) -> Option<u64> {
        parse_ton(self.amount_ton)
    }
}

/// Decimal TON text to nano-units (at most nine fractional digits)
pub fn parse_ton(text: &str) -> Option<u64> {
    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    if frac.len() > 9 || !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
        return None;
    }

    let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let frac: u64 = if frac.is_empty() {
        0
    } else {
        format!("{:0<9}", frac).parse().ok()?
    };
    whole.checked_mul(NANO_PER_TON)?.checked_add(frac)
}

/// Failures reported by a payment provider
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PaymentError {
    #[error("Transaction rejected: {0}")]
    Rejected(String),
}

/// Why a purchase didn't complete
#[derive(Debug, thiserror::Error)]
pub enum PurchaseError {
    #[error("Unknown item: {0}")]
    UnknownItem(String),
    #[error("Already owned: {0}")]
    AlreadyOwned(String),
    #[error("Wallet not connected")]
    WalletNotConnected,
    #[error("Payment failed: {0}")]
    PaymentRejected(#[from] PaymentError),
    #[error("Purchase could not be saved: {0}")]
    Storage(#[from] StoreError),
}

/// Wallet capability
pub trait PaymentProvider {
    fn is_connected(&self) -> bool;

    /// Resolves once the wallet has sent (or refused) the payment
    fn send_payment(
        &self,
        request: &PaymentRequest,
    ) -> impl Future<Output = Result<(), PaymentError>>;
}

/// Validate a purchase before asking the wallet
pub fn prepare<P: PaymentProvider>(
    id: &str,
    owned: &PurchaseSet,
    provider: &P,
) -> Result<PaymentRequest, PurchaseError> {
    let item = find_item(id).ok_or_else(|| PurchaseError::UnknownItem(id.to_string()))?;
    if owned.contains(id) {
        return Err(PurchaseError::AlreadyOwned(id.to_string()));
    }
    if !provider.is_connected() {
        return Err(PurchaseError::WalletNotConnected);
    }
    Ok(PaymentRequest::for_item(item))
}

/// Ask the provider to pay
pub async fn pay<P: PaymentProvider>(
    provider: &P,
    request: &PaymentRequest,
) -> Result<(), PurchaseError> {
    log::info!(
        "Requesting payment for {} ({} TON)",
        request.item_id,
        request.amount_ton
    );
    provider.send_payment(request).await.map_err(|e| {
        log::warn!("Payment for {} failed: {}", request.item_id, e);
        PurchaseError::from(e)
    })
}

/// Record a paid purchase and broadcast the new modifiers
pub fn complete<S: KeyValueStore>(
    bridge: &mut PersistenceBridge<S>,
    channel: &mut UpgradeChannel,
    id: &str,
) -> Result<UpgradeModifiers, PurchaseError> {
    let upgrades = bridge.apply_purchase(id)?;
    channel.publish(upgrades);
    Ok(upgrades)
}

/// Whole flow: validate, pay, record, publish
pub async fn purchase<P: PaymentProvider, S: KeyValueStore>(
    id: &str,
    provider: &P,
    bridge: &mut PersistenceBridge<S>,
    channel: &mut UpgradeChannel,
) -> Result<UpgradeModifiers, PurchaseError> {
    let request = prepare(id, &bridge.purchases(), provider)?;
    pay(provider, &request).await?;
    complete(bridge, channel, id)
}
