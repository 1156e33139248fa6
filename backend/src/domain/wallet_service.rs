//! Wallet service implementing the [`WalletCommand`] driving port.
//!
//! The service resolves rules (stake, prize table, promo catalogue), draws
//! spin outcomes before entering the store's atomic unit, and classifies
//! store failures into domain [`Error`] codes. Players never choose the
//! stake or the prize they keep: the stake comes from [`GameRules`] and a
//! kept prize comes from the player's own unclaimed spin.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, info};

use crate::domain::ports::{
    DrawSource, LedgerStore, LedgerStoreError, PromoOutcome, SaleOutcome, SpinOutcome,
    WalletCommand, WheelInfo,
};
use crate::domain::{
    AppliedMutation, BalanceMutation, Error, ExternalId, GameId, GameRules, InventoryItem,
    InventoryItemId, LedgerEntry, MutationRejection, Profile, PromoCode,
};

/// Largest page of ledger history returned in one call.
pub const HISTORY_LIMIT_MAX: usize = 100;

/// Wallet service over a [`LedgerStore`].
#[derive(Clone)]
pub struct WalletService<S> {
    store: Arc<S>,
    draws: Arc<dyn DrawSource>,
    rules: Arc<GameRules>,
}

impl<S> WalletService<S> {
    /// Create a service from its collaborators.
    pub fn new(store: Arc<S>, draws: Arc<dyn DrawSource>, rules: Arc<GameRules>) -> Self {
        Self {
            store,
            draws,
            rules,
        }
    }

    /// Rules the service runs against.
    #[must_use]
    pub fn rules(&self) -> &GameRules {
        &self.rules
    }
}

fn map_rejection(reason: MutationRejection) -> Error {
    match reason {
        MutationRejection::InsufficientBalance { balance, required } => {
            Error::insufficient_balance(format!(
                "balance {balance} does not cover {required}"
            ))
            .with_details(json!({
                "balance": balance,
                "required": required,
            }))
        }
        MutationRejection::AlreadyRedeemed { code } => {
            Error::already_redeemed(format!("promo code {code} already redeemed"))
        }
        MutationRejection::ItemNotFound { item_id } => {
            Error::item_not_found(format!("inventory item {item_id} not found"))
        }
        MutationRejection::AmountOutOfRange { amount } => {
            Error::invalid_request(format!("amount {amount} is out of range"))
        }
        MutationRejection::GameNotFound { game_id } => {
            Error::game_not_found(format!("game {game_id} not found"))
        }
        MutationRejection::PrizeAlreadyClaimed { game_id } => {
            Error::prize_already_claimed(format!("prize of game {game_id} already kept"))
        }
    }
}

fn map_store_error(error: LedgerStoreError) -> Error {
    match error {
        LedgerStoreError::Connection { message } => {
            Error::storage_unavailable(format!("ledger store unavailable: {message}"))
        }
        LedgerStoreError::Query { message } => {
            Error::internal(format!("ledger store error: {message}"))
        }
        LedgerStoreError::LockTimeout { message } => {
            Error::lock_timeout(format!("account is busy: {message}"))
        }
        LedgerStoreError::UserNotFound { external_id } => {
            Error::user_not_found(format!("user {external_id} not found"))
        }
        LedgerStoreError::Rejected { reason } => map_rejection(reason),
    }
}

impl<S> WalletService<S>
where
    S: LedgerStore,
{
    async fn apply(
        &self,
        external_id: &ExternalId,
        mutation: BalanceMutation,
    ) -> Result<AppliedMutation, Error> {
        let applied = self
            .store
            .apply_mutation(external_id, &mutation)
            .await
            .map_err(map_store_error)?;
        debug!(
            external_id = %external_id,
            kind = %applied.entry.kind,
            amount = %applied.entry.amount,
            balance = %applied.new_balance,
            "balance mutation committed"
        );
        Ok(applied)
    }
}

#[async_trait]
impl<S> WalletCommand for WalletService<S>
where
    S: LedgerStore,
{
    async fn profile(&self, external_id: &ExternalId) -> Result<Profile, Error> {
        let account = self
            .store
            .find_or_create_user(external_id, self.rules.starting_balance())
            .await
            .map_err(map_store_error)?;
        let inventory = self
            .store
            .list_inventory(&account.id)
            .await
            .map_err(map_store_error)?;
        Ok(Profile { account, inventory })
    }

    async fn spin(&self, external_id: &ExternalId) -> Result<SpinOutcome, Error> {
        let stake = self.rules.spin_stake();
        let prize = self.rules.prizes().pick(self.draws.as_ref()).clone();
        let applied = self
            .apply(external_id, BalanceMutation::spin(stake, prize.clone()))
            .await?;
        let game_id = applied.game_id.ok_or_else(|| {
            Error::internal(format!("spin for {external_id} committed without a game"))
        })?;
        info!(
            external_id = %external_id,
            game_id = %game_id,
            stake = %stake,
            prize = prize.name(),
            balance = %applied.new_balance,
            "spin settled"
        );
        Ok(SpinOutcome {
            game_id,
            prize,
            stake,
            new_balance: applied.new_balance,
        })
    }

    async fn keep_prize(
        &self,
        external_id: &ExternalId,
        game_id: GameId,
    ) -> Result<InventoryItem, Error> {
        let item = self
            .store
            .claim_prize(external_id, game_id)
            .await
            .map_err(map_store_error)?;
        info!(
            external_id = %external_id,
            game_id = %game_id,
            item_id = %item.id,
            prize = %item.name,
            "prize kept"
        );
        Ok(item)
    }

    async fn sell_prize(
        &self,
        external_id: &ExternalId,
        item_id: InventoryItemId,
    ) -> Result<SaleOutcome, Error> {
        let applied = self
            .apply(external_id, BalanceMutation::prize_sale(item_id))
            .await?;
        let item = applied.sold_item.ok_or_else(|| {
            Error::internal(format!("sale of {item_id} committed without an item"))
        })?;
        info!(external_id = %external_id, item_id = %item_id, price = %item.price, "prize sold");
        Ok(SaleOutcome {
            item,
            new_balance: applied.new_balance,
        })
    }

    async fn apply_promo(
        &self,
        external_id: &ExternalId,
        code: &PromoCode,
    ) -> Result<PromoOutcome, Error> {
        let amount = self
            .rules
            .promos()
            .amount_for(code)
            .ok_or_else(|| Error::unknown_promo_code(format!("unknown promo code {code}")))?;
        let applied = self
            .apply(external_id, BalanceMutation::promo(code.clone(), amount))
            .await?;
        info!(external_id = %external_id, code = %code, amount = %amount, "promo redeemed");
        Ok(PromoOutcome {
            code: code.clone(),
            amount,
            new_balance: applied.new_balance,
        })
    }

    async fn history(
        &self,
        external_id: &ExternalId,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, Error> {
        let limit = limit.clamp(1, HISTORY_LIMIT_MAX);
        self.store
            .list_entries(external_id, limit)
            .await
            .map_err(map_store_error)
    }

    async fn wheel(&self) -> Result<WheelInfo, Error> {
        Ok(WheelInfo {
            spin_stake: self.rules.spin_stake(),
            prizes: self.rules.prize_rules(),
        })
    }
}

#[cfg(test)]
#[path = "wallet_service_tests.rs"]
mod tests;
