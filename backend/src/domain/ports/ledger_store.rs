//! Port for account, inventory, and ledger persistence.
//!
//! [`LedgerStore::apply_mutation`] is the atomic unit every balance change
//! goes through. Adapters must:
//!
//! 1. open a transaction and bound lock waits;
//! 2. lock the account row for the external id;
//! 3. read the facts the mutation needs ([`MutationFacts`]) under the lock;
//! 4. call [`BalanceMutation::settle`] and abort on rejection;
//! 5. write the balance, the ledger entry, and the kind-specific rows;
//! 6. commit.
//!
//! Nothing is visible to other callers unless every step succeeds.
//!
//! [`LedgerStore::claim_prize`] follows the same locking discipline: it
//! reads the spin record under the account lock, asks
//! [`check_claim`](crate::domain::check_claim) whether it may be kept, then
//! marks it claimed and inserts the inventory item in one unit.
//!
//! [`MutationFacts`]: crate::domain::MutationFacts

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::{
    AppliedMutation, BalanceMutation, ExternalId, GameId, InventoryItem, LedgerEntry, Money,
    MutationRejection, UserAccount, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger store adapters.
    pub enum LedgerStoreError {
        /// The store could not be reached or a pooled connection failed.
        Connection { message: String } =>
            "ledger store connection failed: {message}",
        /// A query failed during execution.
        Query { message: String } =>
            "ledger store query failed: {message}",
        /// The account lock could not be acquired within the budget.
        LockTimeout { message: String } =>
            "timed out waiting for account lock: {message}",
        /// No account exists for the external id.
        UserNotFound { external_id: String } =>
            "user {external_id} not found",
        /// Settlement refused the mutation; nothing was written.
        Rejected { reason: MutationRejection } =>
            "mutation rejected: {reason}",
    }
}

/// Port for durable wallet state.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Fetch the account for `external_id`, creating it with
    /// `starting_balance` on first sight.
    async fn find_or_create_user(
        &self,
        external_id: &ExternalId,
        starting_balance: Money,
    ) -> Result<UserAccount, LedgerStoreError>;

    /// Inventory of an account, newest first.
    async fn list_inventory(&self, user_id: &UserId)
    -> Result<Vec<InventoryItem>, LedgerStoreError>;

    /// Move the prize of an unclaimed spin into the inventory. Does not
    /// touch the balance.
    async fn claim_prize(
        &self,
        external_id: &ExternalId,
        game_id: GameId,
    ) -> Result<InventoryItem, LedgerStoreError>;

    /// Run one balance mutation as a single atomic unit.
    async fn apply_mutation(
        &self,
        external_id: &ExternalId,
        mutation: &BalanceMutation,
    ) -> Result<AppliedMutation, LedgerStoreError>;

    /// Most recent ledger entries of an account, newest first.
    async fn list_entries(
        &self,
        external_id: &ExternalId,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, LedgerStoreError>;
}

/// Fixture store with no persisted accounts.
///
/// Lookups hand back a transient account; every operation that needs an
/// existing account reports [`LedgerStoreError::UserNotFound`].
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLedgerStore;

#[async_trait]
impl LedgerStore for FixtureLedgerStore {
    async fn find_or_create_user(
        &self,
        external_id: &ExternalId,
        starting_balance: Money,
    ) -> Result<UserAccount, LedgerStoreError> {
        Ok(UserAccount {
            id: UserId::random(),
            external_id: external_id.clone(),
            username: external_id.default_username(),
            balance: starting_balance,
            created_at: Utc::now(),
        })
    }

    async fn list_inventory(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<InventoryItem>, LedgerStoreError> {
        Ok(Vec::new())
    }

    async fn claim_prize(
        &self,
        external_id: &ExternalId,
        _game_id: GameId,
    ) -> Result<InventoryItem, LedgerStoreError> {
        Err(LedgerStoreError::user_not_found(external_id.as_ref()))
    }

    async fn apply_mutation(
        &self,
        external_id: &ExternalId,
        _mutation: &BalanceMutation,
    ) -> Result<AppliedMutation, LedgerStoreError> {
        Err(LedgerStoreError::user_not_found(external_id.as_ref()))
    }

    async fn list_entries(
        &self,
        external_id: &ExternalId,
        _limit: usize,
    ) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        Err(LedgerStoreError::user_not_found(external_id.as_ref()))
    }
}
