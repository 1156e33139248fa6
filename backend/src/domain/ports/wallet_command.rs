//! Driving port for wallet operations.
//!
//! Inbound adapters call [`WalletCommand`] with an already validated
//! [`ExternalId`]; the implementation owns rule lookups, outcome draws, and
//! error classification.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::{
    Error, ExternalId, GameId, InventoryItem, InventoryItemId, LedgerEntry, Money, Prize,
    PrizeRule, Profile, PromoCode, UserAccount, UserId,
};

/// Result of a committed spin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpinOutcome {
    /// Spin record; pass it to [`WalletCommand::keep_prize`] to keep the
    /// prize.
    pub game_id: GameId,
    /// Prize the wheel landed on.
    pub prize: Prize,
    /// Stake debited.
    pub stake: Money,
    /// Balance after the debit.
    pub new_balance: Money,
}

/// Result of a committed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleOutcome {
    /// Item removed from the inventory.
    pub item: InventoryItem,
    /// Balance after the credit.
    pub new_balance: Money,
}

/// Result of a committed promo redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoOutcome {
    /// Normalised code.
    pub code: PromoCode,
    /// Amount credited.
    pub amount: Money,
    /// Balance after the credit.
    pub new_balance: Money,
}

/// Public description of the wheel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WheelInfo {
    /// Stake charged per spin.
    pub spin_stake: Money,
    /// Prize table in configured order.
    pub prizes: Vec<PrizeRule>,
}

/// Driving port for wallet operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletCommand: Send + Sync {
    /// Fetch or create the account and list its inventory.
    async fn profile(&self, external_id: &ExternalId) -> Result<Profile, Error>;

    /// Debit the configured stake and draw a prize.
    async fn spin(&self, external_id: &ExternalId) -> Result<SpinOutcome, Error>;

    /// Keep the prize won by one of the account's spins. Each spin's prize
    /// can be kept once.
    async fn keep_prize(
        &self,
        external_id: &ExternalId,
        game_id: GameId,
    ) -> Result<InventoryItem, Error>;

    /// Sell an inventory item for its stored price.
    async fn sell_prize(
        &self,
        external_id: &ExternalId,
        item_id: InventoryItemId,
    ) -> Result<SaleOutcome, Error>;

    /// Redeem a promo code once per account.
    async fn apply_promo(
        &self,
        external_id: &ExternalId,
        code: &PromoCode,
    ) -> Result<PromoOutcome, Error>;

    /// Most recent ledger entries, newest first.
    async fn history(
        &self,
        external_id: &ExternalId,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, Error>;

    /// Stake and prize table.
    async fn wheel(&self) -> Result<WheelInfo, Error>;
}

/// Fixture command returning canned data without persistence.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureWalletCommand;

impl FixtureWalletCommand {
    fn account(external_id: &ExternalId) -> UserAccount {
        UserAccount {
            id: UserId::random(),
            external_id: external_id.clone(),
            username: external_id.default_username(),
            balance: Money::from_cents(500),
            created_at: Utc::now(),
        }
    }
}

#[async_trait]
impl WalletCommand for FixtureWalletCommand {
    async fn profile(&self, external_id: &ExternalId) -> Result<Profile, Error> {
        Ok(Profile {
            account: Self::account(external_id),
            inventory: Vec::new(),
        })
    }

    async fn spin(&self, external_id: &ExternalId) -> Result<SpinOutcome, Error> {
        Err(Error::user_not_found(format!("user {external_id} not found")))
    }

    async fn keep_prize(
        &self,
        _external_id: &ExternalId,
        game_id: GameId,
    ) -> Result<InventoryItem, Error> {
        Err(Error::game_not_found(format!("game {game_id} not found")))
    }

    async fn sell_prize(
        &self,
        _external_id: &ExternalId,
        item_id: InventoryItemId,
    ) -> Result<SaleOutcome, Error> {
        Err(Error::item_not_found(format!("item {item_id} not found")))
    }

    async fn apply_promo(
        &self,
        _external_id: &ExternalId,
        code: &PromoCode,
    ) -> Result<PromoOutcome, Error> {
        Err(Error::unknown_promo_code(format!("unknown promo code {code}")))
    }

    async fn history(
        &self,
        _external_id: &ExternalId,
        _limit: usize,
    ) -> Result<Vec<LedgerEntry>, Error> {
        Ok(Vec::new())
    }

    async fn wheel(&self) -> Result<WheelInfo, Error> {
        Ok(WheelInfo {
            spin_stake: Money::from_cents(100),
            prizes: Vec::new(),
        })
    }
}
