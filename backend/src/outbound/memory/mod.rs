//! In-process ledger store.
//!
//! Each account sits behind its own `tokio::sync::Mutex`, so mutations for
//! one account are serialised while different accounts proceed in
//! parallel. Lock acquisition is bounded by the configured timeout and
//! reported as [`LedgerStoreError::LockTimeout`]. All writes happen after
//! settlement succeeds and without an intervening `.await`, so a dropped
//! request future leaves the account untouched.
//!
//! State lives only as long as the process. Use it for tests and local runs
//! without a database.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use mockable::Clock;
use tokio::sync::{Mutex as AccountLock, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{LedgerStore, LedgerStoreError};
use crate::domain::{
    AppliedMutation, BalanceMutation, ExternalId, GameId, GameRecord, InventoryItem,
    InventoryItemId, LedgerEntry, Money, MutationFacts, MutationKind, PromoCode, UserAccount,
    UserId, check_claim,
};

/// Default bound on waiting for an account lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(2_000);

/// Copy of one account's stored state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSnapshot {
    /// Account row.
    pub account: UserAccount,
    /// Inventory, oldest first.
    pub inventory: Vec<InventoryItem>,
    /// Ledger, oldest first.
    pub entries: Vec<LedgerEntry>,
    /// Redeemed promo codes with their credited amounts.
    pub redemptions: HashMap<PromoCode, Money>,
    /// Spins, oldest first.
    pub games: Vec<GameRecord>,
}

type Slot = Arc<AccountLock<AccountSnapshot>>;

#[derive(Default)]
struct Directory {
    by_external: HashMap<ExternalId, Slot>,
    by_user: HashMap<UserId, Slot>,
}

/// [`LedgerStore`] held in process memory.
pub struct InMemoryLedgerStore {
    directory: Mutex<Directory>,
    clock: Arc<dyn Clock>,
    lock_timeout: Duration,
}

impl InMemoryLedgerStore {
    /// Empty store using `clock` for timestamps.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            directory: Mutex::new(Directory::default()),
            clock,
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }

    /// Override the account lock budget.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: Duration) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// Copy the state of one account, waiting for in-flight mutations.
    pub async fn snapshot(&self, external_id: &ExternalId) -> Option<AccountSnapshot> {
        let slot = self.slot_for_external(external_id)?;
        let guard = slot.lock().await;
        Some(guard.clone())
    }

    fn directory(&self) -> std::sync::MutexGuard<'_, Directory> {
        // The directory only maps ids to slots; a panicking holder cannot
        // leave it half-updated.
        self.directory.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn slot_for_external(&self, external_id: &ExternalId) -> Option<Slot> {
        self.directory().by_external.get(external_id).cloned()
    }

    fn slot_for_user(&self, user_id: &UserId) -> Option<Slot> {
        self.directory().by_user.get(user_id).cloned()
    }

    async fn lock(&self, slot: Slot) -> Result<OwnedMutexGuard<AccountSnapshot>, LedgerStoreError> {
        tokio::time::timeout(self.lock_timeout, slot.lock_owned())
            .await
            .map_err(|_| {
                LedgerStoreError::lock_timeout(format!(
                    "account lock not acquired within {}ms",
                    self.lock_timeout.as_millis()
                ))
            })
    }

    async fn lock_existing(
        &self,
        external_id: &ExternalId,
    ) -> Result<OwnedMutexGuard<AccountSnapshot>, LedgerStoreError> {
        let slot = self
            .slot_for_external(external_id)
            .ok_or_else(|| LedgerStoreError::user_not_found(external_id.as_ref()))?;
        self.lock(slot).await
    }

    fn facts_for(state: &AccountSnapshot, mutation: &BalanceMutation) -> MutationFacts {
        let facts = MutationFacts::new(state.account.balance);
        match mutation.kind() {
            MutationKind::SpinDebit { .. } => facts,
            MutationKind::PrizeSale { item_id } => facts.with_sale_item(
                state
                    .inventory
                    .iter()
                    .find(|item| item.id == *item_id)
                    .cloned(),
            ),
            MutationKind::PromoCredit { code, .. } => {
                facts.with_redemption(state.redemptions.contains_key(code))
            }
        }
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn find_or_create_user(
        &self,
        external_id: &ExternalId,
        starting_balance: Money,
    ) -> Result<UserAccount, LedgerStoreError> {
        let slot = {
            let mut directory = self.directory();
            if let Some(slot) = directory.by_external.get(external_id) {
                slot.clone()
            } else {
                let account = UserAccount {
                    id: UserId::random(),
                    external_id: external_id.clone(),
                    username: external_id.default_username(),
                    balance: starting_balance,
                    created_at: self.clock.utc(),
                };
                debug!(external_id = %external_id, user_id = %account.id, "account created");
                let user_id = account.id;
                let slot = Arc::new(AccountLock::new(AccountSnapshot {
                    account,
                    inventory: Vec::new(),
                    entries: Vec::new(),
                    redemptions: HashMap::new(),
                    games: Vec::new(),
                }));
                directory
                    .by_external
                    .insert(external_id.clone(), Arc::clone(&slot));
                directory.by_user.insert(user_id, Arc::clone(&slot));
                slot
            }
        };
        let guard = self.lock(slot).await?;
        Ok(guard.account.clone())
    }

    async fn list_inventory(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<InventoryItem>, LedgerStoreError> {
        let Some(slot) = self.slot_for_user(user_id) else {
            return Ok(Vec::new());
        };
        let guard = self.lock(slot).await?;
        Ok(guard.inventory.iter().rev().cloned().collect())
    }

    async fn claim_prize(
        &self,
        external_id: &ExternalId,
        game_id: GameId,
    ) -> Result<InventoryItem, LedgerStoreError> {
        let mut guard = self.lock_existing(external_id).await?;
        let state = &mut *guard;
        let game = state.games.iter_mut().find(|game| game.id == game_id);
        let prize = check_claim(game_id, game.as_deref())
            .map_err(LedgerStoreError::rejected)?
            .clone();
        let item = InventoryItem {
            id: InventoryItemId::random(),
            name: prize.name().to_owned(),
            emoji: prize.emoji().to_owned(),
            price: prize.price(),
            created_at: self.clock.utc(),
        };
        if let Some(game) = game {
            game.claimed = true;
        }
        state.inventory.push(item.clone());
        Ok(item)
    }

    async fn apply_mutation(
        &self,
        external_id: &ExternalId,
        mutation: &BalanceMutation,
    ) -> Result<AppliedMutation, LedgerStoreError> {
        let mut guard = self.lock_existing(external_id).await?;
        let facts = Self::facts_for(&guard, mutation);
        let settlement = mutation
            .settle(&facts)
            .map_err(LedgerStoreError::rejected)?;

        let state = &mut *guard;
        let now = self.clock.utc();
        let mut game_id = None;
        let mut sold_item = None;
        match mutation.kind() {
            MutationKind::SpinDebit { stake, prize } => {
                let id = GameId::random();
                state.games.push(GameRecord {
                    id,
                    stake: *stake,
                    prize: prize.clone(),
                    claimed: false,
                    created_at: now,
                });
                game_id = Some(id);
            }
            MutationKind::PrizeSale { item_id } => {
                let position = state.inventory.iter().position(|item| item.id == *item_id);
                sold_item = position.map(|index| state.inventory.remove(index));
            }
            MutationKind::PromoCredit { code, amount } => {
                state.redemptions.insert(code.clone(), *amount);
            }
        }

        let entry = LedgerEntry {
            id: Uuid::new_v4(),
            user_id: state.account.id,
            kind: mutation.kind().ledger_kind(),
            amount: settlement.amount,
            description: settlement.description,
            created_at: now,
        };
        state.account.balance = settlement.new_balance;
        state.entries.push(entry.clone());

        Ok(AppliedMutation {
            user_id: state.account.id,
            new_balance: settlement.new_balance,
            entry,
            sold_item,
            game_id,
        })
    }

    async fn list_entries(
        &self,
        external_id: &ExternalId,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        let guard = self.lock_existing(external_id).await?;
        Ok(guard.entries.iter().rev().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LedgerEntryKind, MutationRejection, Prize};
    use mockable::DefaultClock;
    use rstest::{fixture, rstest};

    #[fixture]
    fn store() -> InMemoryLedgerStore {
        InMemoryLedgerStore::new(Arc::new(DefaultClock))
    }

    fn external(raw: &str) -> ExternalId {
        ExternalId::new(raw).expect("valid id")
    }

    fn peach(price_cents: i64) -> Prize {
        Prize::new("Peach", "🍑", Money::from_cents(price_cents)).expect("prize")
    }

    async fn seeded(store: &InMemoryLedgerStore, id: &ExternalId, cents: i64) {
        store
            .find_or_create_user(id, Money::from_cents(cents))
            .await
            .expect("account created");
    }

    async fn kept(store: &InMemoryLedgerStore, id: &ExternalId, prize: Prize) -> InventoryItem {
        let applied = store
            .apply_mutation(id, &BalanceMutation::spin(Money::ZERO, prize))
            .await
            .expect("spin applies");
        let game_id = applied.game_id.expect("spin records a game");
        store.claim_prize(id, game_id).await.expect("prize kept")
    }

    #[rstest]
    #[tokio::test]
    async fn find_or_create_is_idempotent(store: InMemoryLedgerStore) {
        let id = external("1");
        let first = store
            .find_or_create_user(&id, Money::from_cents(500))
            .await
            .expect("created");
        let second = store
            .find_or_create_user(&id, Money::from_cents(900))
            .await
            .expect("found");
        assert_eq!(first, second);
        assert_eq!(second.balance, Money::from_cents(500));
    }

    #[rstest]
    #[tokio::test]
    async fn mutations_for_unknown_accounts_fail(store: InMemoryLedgerStore) {
        let mutation = BalanceMutation::spin(Money::from_cents(100), peach(0));
        let error = store
            .apply_mutation(&external("ghost"), &mutation)
            .await
            .expect_err("unknown account");
        assert_eq!(error, LedgerStoreError::user_not_found("ghost"));
    }

    #[rstest]
    #[tokio::test]
    async fn spin_writes_balance_entry_and_game(store: InMemoryLedgerStore) {
        let id = external("2");
        seeded(&store, &id, 500).await;

        let applied = store
            .apply_mutation(&id, &BalanceMutation::spin(Money::from_cents(100), peach(0)))
            .await
            .expect("spin applies");
        assert_eq!(applied.new_balance, Money::from_cents(400));
        assert_eq!(applied.entry.kind, LedgerEntryKind::Spin);
        assert_eq!(applied.entry.amount, Money::from_cents(-100));

        let snapshot = store.snapshot(&id).await.expect("account exists");
        assert_eq!(snapshot.account.balance, Money::from_cents(400));
        assert_eq!(snapshot.entries.len(), 1);
        assert_eq!(snapshot.games.len(), 1);
        assert_eq!(applied.game_id, snapshot.games.first().map(|game| game.id));
        assert!(snapshot.games.iter().all(|game| !game.claimed));
    }

    #[rstest]
    #[tokio::test]
    async fn prize_is_kept_at_most_once(store: InMemoryLedgerStore) {
        let id = external("7");
        seeded(&store, &id, 500).await;
        let applied = store
            .apply_mutation(&id, &BalanceMutation::spin(Money::from_cents(100), peach(40)))
            .await
            .expect("spin applies");
        let game_id = applied.game_id.expect("spin records a game");

        let item = store.claim_prize(&id, game_id).await.expect("first keep");
        assert_eq!(item.name, "Peach");
        assert_eq!(item.price, Money::from_cents(40));

        let error = store
            .claim_prize(&id, game_id)
            .await
            .expect_err("second keep");
        assert_eq!(
            error,
            LedgerStoreError::rejected(MutationRejection::PrizeAlreadyClaimed { game_id })
        );
        let snapshot = store.snapshot(&id).await.expect("account exists");
        assert_eq!(snapshot.inventory, vec![item]);
        assert_eq!(snapshot.account.balance, Money::from_cents(400));
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_or_foreign_games_cannot_be_kept(store: InMemoryLedgerStore) {
        let owner = external("8");
        let other = external("9");
        seeded(&store, &owner, 500).await;
        seeded(&store, &other, 500).await;
        let applied = store
            .apply_mutation(&owner, &BalanceMutation::spin(Money::from_cents(100), peach(0)))
            .await
            .expect("spin applies");
        let game_id = applied.game_id.expect("spin records a game");

        let foreign = store
            .claim_prize(&other, game_id)
            .await
            .expect_err("not the spinner");
        assert_eq!(
            foreign,
            LedgerStoreError::rejected(MutationRejection::GameNotFound { game_id })
        );

        let invented = GameId::random();
        let unknown = store
            .claim_prize(&owner, invented)
            .await
            .expect_err("never spun");
        assert_eq!(
            unknown,
            LedgerStoreError::rejected(MutationRejection::GameNotFound { game_id: invented })
        );
        let snapshot = store.snapshot(&other).await.expect("account exists");
        assert!(snapshot.inventory.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn rejected_mutation_leaves_state_untouched(store: InMemoryLedgerStore) {
        let id = external("3");
        seeded(&store, &id, 99).await;

        let error = store
            .apply_mutation(&id, &BalanceMutation::spin(Money::from_cents(100), peach(0)))
            .await
            .expect_err("one cent short");
        assert!(matches!(
            error,
            LedgerStoreError::Rejected {
                reason: MutationRejection::InsufficientBalance { .. }
            }
        ));

        let snapshot = store.snapshot(&id).await.expect("account exists");
        assert_eq!(snapshot.account.balance, Money::from_cents(99));
        assert!(snapshot.entries.is_empty());
        assert!(snapshot.games.is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn sale_removes_item_once(store: InMemoryLedgerStore) {
        let id = external("4");
        seeded(&store, &id, 0).await;
        let item = kept(&store, &id, peach(30)).await;

        let sale = BalanceMutation::prize_sale(item.id);
        let applied = store.apply_mutation(&id, &sale).await.expect("first sale");
        assert_eq!(applied.sold_item, Some(item.clone()));
        assert_eq!(applied.new_balance, Money::from_cents(30));

        let error = store
            .apply_mutation(&id, &sale)
            .await
            .expect_err("second sale");
        assert_eq!(
            error,
            LedgerStoreError::rejected(MutationRejection::ItemNotFound { item_id: item.id })
        );
    }

    #[rstest]
    #[tokio::test]
    async fn inventory_and_entries_list_newest_first(store: InMemoryLedgerStore) {
        let id = external("5");
        let account = store
            .find_or_create_user(&id, Money::from_cents(500))
            .await
            .expect("created");
        let older = kept(&store, &id, peach(1)).await;
        let newer = kept(&store, &id, peach(2)).await;
        let listed = store.list_inventory(&account.id).await.expect("listed");
        assert_eq!(listed, vec![newer, older]);

        for _ in 0..3 {
            store
                .apply_mutation(&id, &BalanceMutation::spin(Money::from_cents(10), peach(0)))
                .await
                .expect("spin");
        }
        let entries = store.list_entries(&id, 2).await.expect("entries");
        assert_eq!(entries.len(), 2);
        assert!(entries[0].created_at >= entries[1].created_at);
    }

    #[rstest]
    #[tokio::test]
    async fn held_lock_times_out(store: InMemoryLedgerStore) {
        let store = store.with_lock_timeout(Duration::from_millis(20));
        let id = external("6");
        seeded(&store, &id, 500).await;

        let slot = store.slot_for_external(&id).expect("slot exists");
        let _held = slot.lock().await;

        let error = store
            .apply_mutation(&id, &BalanceMutation::spin(Money::from_cents(100), peach(0)))
            .await
            .expect_err("lock held elsewhere");
        assert!(matches!(error, LedgerStoreError::LockTimeout { .. }));
    }
}
