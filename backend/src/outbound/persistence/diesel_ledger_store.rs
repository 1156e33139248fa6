//! PostgreSQL-backed [`LedgerStore`].
//!
//! Every balance mutation runs in one transaction: bound lock waits with
//! `SET LOCAL lock_timeout`, lock the account row with `SELECT ... FOR
//! UPDATE`, read the facts settlement needs, settle, then write the balance,
//! the ledger entry, and the kind-specific row before committing. Any error
//! or rejection rolls the whole unit back. Keeping a prize follows the same
//! discipline, additionally locking the game row it claims.

use std::time::Duration;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{LedgerStore, LedgerStoreError};
use crate::domain::{
    AppliedMutation, BalanceMutation, ExternalId, GameId, GameRecord, InventoryItem, LedgerEntry,
    Money, MutationFacts, MutationKind, MutationRejection, UserAccount, UserId, check_claim,
};

use super::ledger_error_mapping::{is_unique_violation, map_diesel_error, map_pool_error};
use super::models::{
    GameRow, InventoryItemRow, LedgerEntryRow, NewGameRow, NewInventoryItemRow, NewLedgerEntryRow,
    NewPromoRedemptionRow, NewUserRow, UserRow,
};
use super::pool::DbPool;
use super::schema::{games, inventory_items, ledger_entries, promo_redemptions, users};

const WHEEL_GAME: &str = "wheel";

/// Failure inside the mutation transaction.
#[derive(Debug)]
enum UnitError {
    Diesel(diesel::result::Error),
    Rejected(MutationRejection),
    UserNotFound,
    Corrupt(String),
}

impl From<diesel::result::Error> for UnitError {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

impl UnitError {
    fn into_store_error(self, external_id: &ExternalId) -> LedgerStoreError {
        match self {
            Self::Diesel(error) => map_diesel_error(error),
            Self::Rejected(reason) => {
                debug!(external_id = %external_id, %reason, "mutation rejected");
                LedgerStoreError::rejected(reason)
            }
            Self::UserNotFound => LedgerStoreError::user_not_found(external_id.as_ref()),
            Self::Corrupt(message) => LedgerStoreError::query(message),
        }
    }
}

/// Side effects of a settled mutation beyond balance and ledger.
#[derive(Default)]
struct SideRows {
    sold_item: Option<InventoryItem>,
    game_id: Option<GameId>,
}

fn lock_timeout_statement(lock_timeout: Duration) -> String {
    format!("SET LOCAL lock_timeout = '{}ms'", lock_timeout.as_millis())
}

/// Bound lock waits for the current transaction and lock the account row.
async fn lock_account(
    conn: &mut AsyncPgConnection,
    lock_statement: &str,
    external_id: &ExternalId,
) -> Result<UserRow, UnitError> {
    diesel::sql_query(lock_statement).execute(conn).await?;
    users::table
        .filter(users::external_id.eq(external_id.as_ref()))
        .select(UserRow::as_select())
        .for_update()
        .first(conn)
        .await
        .optional()?
        .ok_or(UnitError::UserNotFound)
}

/// Diesel-backed ledger store.
#[derive(Clone)]
pub struct DieselLedgerStore {
    pool: DbPool,
    lock_timeout: Duration,
}

impl DieselLedgerStore {
    /// Create a store over `pool`, bounding row-lock waits by
    /// `lock_timeout`.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use std::time::Duration;
    /// use wheel_backend::outbound::persistence::{DbPool, DieselLedgerStore, PoolConfig};
    ///
    /// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
    /// let pool = DbPool::new(PoolConfig::new("postgres://localhost/wheel")).await?;
    /// let store = DieselLedgerStore::new(pool, Duration::from_millis(2_000));
    /// # let _ = store;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(pool: DbPool, lock_timeout: Duration) -> Self {
        Self { pool, lock_timeout }
    }

    async fn user_id_for(
        conn: &mut AsyncPgConnection,
        external_id: &ExternalId,
    ) -> Result<Uuid, LedgerStoreError> {
        users::table
            .filter(users::external_id.eq(external_id.as_ref()))
            .select(users::id)
            .first::<Uuid>(conn)
            .await
            .optional()
            .map_err(map_diesel_error)?
            .ok_or_else(|| LedgerStoreError::user_not_found(external_id.as_ref()))
    }

    async fn gather_facts(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        balance: Money,
        mutation: &BalanceMutation,
    ) -> Result<MutationFacts, UnitError> {
        let facts = MutationFacts::new(balance);
        match mutation.kind() {
            MutationKind::SpinDebit { .. } => Ok(facts),
            MutationKind::PrizeSale { item_id } => {
                let item = inventory_items::table
                    .filter(inventory_items::id.eq(item_id.as_uuid()))
                    .filter(inventory_items::user_id.eq(user_id))
                    .select(InventoryItemRow::as_select())
                    .first(conn)
                    .await
                    .optional()?;
                Ok(facts.with_sale_item(item.map(InventoryItem::from)))
            }
            MutationKind::PromoCredit { code, .. } => {
                let exists = diesel::select(diesel::dsl::exists(
                    promo_redemptions::table
                        .filter(promo_redemptions::user_id.eq(user_id))
                        .filter(promo_redemptions::code.eq(code.as_ref())),
                ))
                .get_result::<bool>(conn)
                .await?;
                Ok(facts.with_redemption(exists))
            }
        }
    }

    async fn write_side_rows(
        conn: &mut AsyncPgConnection,
        user_id: Uuid,
        mutation: &BalanceMutation,
    ) -> Result<SideRows, UnitError> {
        match mutation.kind() {
            MutationKind::SpinDebit { stake, prize } => {
                let prize = serde_json::to_value(prize)
                    .map_err(|err| UnitError::Corrupt(format!("encode prize: {err}")))?;
                let id = diesel::insert_into(games::table)
                    .values(NewGameRow {
                        id: Uuid::new_v4(),
                        user_id,
                        game: WHEEL_GAME,
                        bet_cents: stake.cents(),
                        prize,
                    })
                    .returning(games::id)
                    .get_result::<Uuid>(conn)
                    .await?;
                Ok(SideRows {
                    game_id: Some(GameId::from_uuid(id)),
                    ..SideRows::default()
                })
            }
            MutationKind::PrizeSale { item_id } => {
                let removed = diesel::delete(
                    inventory_items::table
                        .filter(inventory_items::id.eq(item_id.as_uuid()))
                        .filter(inventory_items::user_id.eq(user_id)),
                )
                .returning(InventoryItemRow::as_returning())
                .get_result(conn)
                .await
                .optional()?
                .ok_or_else(|| {
                    UnitError::Rejected(MutationRejection::ItemNotFound { item_id: *item_id })
                })?;
                Ok(SideRows {
                    sold_item: Some(removed.into()),
                    ..SideRows::default()
                })
            }
            MutationKind::PromoCredit { code, amount } => {
                let inserted = diesel::insert_into(promo_redemptions::table)
                    .values(NewPromoRedemptionRow {
                        user_id,
                        code: code.as_ref(),
                        amount_cents: amount.cents(),
                    })
                    .execute(conn)
                    .await;
                match inserted {
                    Ok(_) => Ok(SideRows::default()),
                    Err(error) if is_unique_violation(&error) => {
                        Err(UnitError::Rejected(MutationRejection::AlreadyRedeemed {
                            code: code.clone(),
                        }))
                    }
                    Err(error) => Err(error.into()),
                }
            }
        }
    }
}

#[async_trait]
impl LedgerStore for DieselLedgerStore {
    async fn find_or_create_user(
        &self,
        external_id: &ExternalId,
        starting_balance: Money,
    ) -> Result<UserAccount, LedgerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let username = external_id.default_username();

        let inserted = diesel::insert_into(users::table)
            .values(NewUserRow {
                id: Uuid::new_v4(),
                external_id: external_id.as_ref(),
                username: &username,
                balance_cents: starting_balance.cents(),
            })
            .on_conflict(users::external_id)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        if inserted > 0 {
            debug!(external_id = %external_id, "account created");
        }

        let row = users::table
            .filter(users::external_id.eq(external_id.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        UserAccount::try_from(row).map_err(LedgerStoreError::query)
    }

    async fn list_inventory(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<InventoryItem>, LedgerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows = inventory_items::table
            .filter(inventory_items::user_id.eq(user_id.as_uuid()))
            .order((inventory_items::created_at.desc(), inventory_items::id.desc()))
            .select(InventoryItemRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(InventoryItem::from).collect())
    }

    async fn claim_prize(
        &self,
        external_id: &ExternalId,
        game_id: GameId,
    ) -> Result<InventoryItem, LedgerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lock_statement = lock_timeout_statement(self.lock_timeout);

        let result: Result<InventoryItem, UnitError> = conn
            .transaction(|conn| {
                async move {
                    let user = lock_account(conn, &lock_statement, external_id).await?;

                    let game = games::table
                        .filter(games::id.eq(game_id.as_uuid()))
                        .filter(games::user_id.eq(user.id))
                        .select(GameRow::as_select())
                        .for_update()
                        .first(conn)
                        .await
                        .optional()?
                        .map(GameRecord::try_from)
                        .transpose()
                        .map_err(UnitError::Corrupt)?;
                    let prize = check_claim(game_id, game.as_ref()).map_err(UnitError::Rejected)?;

                    diesel::update(games::table.find(*game_id.as_uuid()))
                        .set(games::claimed_at.eq(diesel::dsl::now))
                        .execute(conn)
                        .await?;

                    let row = diesel::insert_into(inventory_items::table)
                        .values(NewInventoryItemRow {
                            id: Uuid::new_v4(),
                            user_id: user.id,
                            name: prize.name(),
                            emoji: prize.emoji(),
                            price_cents: prize.price().cents(),
                        })
                        .returning(InventoryItemRow::as_returning())
                        .get_result(conn)
                        .await?;
                    Ok(InventoryItem::from(row))
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|error| error.into_store_error(external_id))
    }

    async fn apply_mutation(
        &self,
        external_id: &ExternalId,
        mutation: &BalanceMutation,
    ) -> Result<AppliedMutation, LedgerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let lock_statement = lock_timeout_statement(self.lock_timeout);

        let result: Result<AppliedMutation, UnitError> = conn
            .transaction(|conn| {
                async move {
                    let user = lock_account(conn, &lock_statement, external_id).await?;

                    let balance = Money::from_cents(user.balance_cents);
                    let facts = Self::gather_facts(conn, user.id, balance, mutation).await?;
                    let settlement = mutation.settle(&facts).map_err(UnitError::Rejected)?;
                    let side = Self::write_side_rows(conn, user.id, mutation).await?;

                    diesel::update(users::table.find(user.id))
                        .set((
                            users::balance_cents.eq(settlement.new_balance.cents()),
                            users::updated_at.eq(diesel::dsl::now),
                        ))
                        .execute(conn)
                        .await?;

                    let entry = diesel::insert_into(ledger_entries::table)
                        .values(NewLedgerEntryRow {
                            id: Uuid::new_v4(),
                            user_id: user.id,
                            kind: mutation.kind().ledger_kind().as_str(),
                            amount_cents: settlement.amount.cents(),
                            description: &settlement.description,
                        })
                        .returning(LedgerEntryRow::as_returning())
                        .get_result(conn)
                        .await?;
                    let entry = LedgerEntry::try_from(entry).map_err(UnitError::Corrupt)?;

                    Ok(AppliedMutation {
                        user_id: UserId::from_uuid(user.id),
                        new_balance: settlement.new_balance,
                        entry,
                        sold_item: side.sold_item,
                        game_id: side.game_id,
                    })
                }
                .scope_boxed()
            })
            .await;

        result.map_err(|error| error.into_store_error(external_id))
    }

    async fn list_entries(
        &self,
        external_id: &ExternalId,
        limit: usize,
    ) -> Result<Vec<LedgerEntry>, LedgerStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let user_id = Self::user_id_for(&mut conn, external_id).await?;
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = ledger_entries::table
            .filter(ledger_entries::user_id.eq(user_id))
            .order((ledger_entries::created_at.desc(), ledger_entries::id.desc()))
            .limit(limit)
            .select(LedgerEntryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        rows.into_iter()
            .map(LedgerEntry::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(LedgerStoreError::query)
    }
}
