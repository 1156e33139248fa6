//! Internal Diesel row structs.
//!
//! These never leave the persistence layer; conversions into domain types
//! live next to the rows.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    ExternalId, GameId, GameRecord, InventoryItem, InventoryItemId, LedgerEntry, Money, Prize,
    UserAccount, UserId,
};

use super::schema::{games, inventory_items, ledger_entries, promo_redemptions, users};

/// Row read from `users`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub external_id: String,
    pub username: String,
    pub balance_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let external_id = ExternalId::new(&row.external_id)
            .map_err(|err| format!("stored external id {:?}: {err}", row.external_id))?;
        Ok(Self {
            id: UserId::from_uuid(row.id),
            external_id,
            username: row.username,
            balance: Money::from_cents(row.balance_cents),
            created_at: row.created_at,
        })
    }
}

/// Insertable `users` row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub external_id: &'a str,
    pub username: &'a str,
    pub balance_cents: i64,
}

/// Row read from `inventory_items`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = inventory_items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct InventoryItemRow {
    pub id: Uuid,
    pub name: String,
    pub emoji: String,
    pub price_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<InventoryItemRow> for InventoryItem {
    fn from(row: InventoryItemRow) -> Self {
        Self {
            id: InventoryItemId::from_uuid(row.id),
            name: row.name,
            emoji: row.emoji,
            price: Money::from_cents(row.price_cents),
            created_at: row.created_at,
        }
    }
}

/// Insertable `inventory_items` row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = inventory_items)]
pub(crate) struct NewInventoryItemRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: &'a str,
    pub emoji: &'a str,
    pub price_cents: i64,
}

/// Row read from `ledger_entries`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ledger_entries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LedgerEntryRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub amount_cents: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<LedgerEntryRow> for LedgerEntry {
    type Error = String;

    fn try_from(row: LedgerEntryRow) -> Result<Self, Self::Error> {
        let kind = row.kind.parse().map_err(|err| format!("{err}"))?;
        Ok(Self {
            id: row.id,
            user_id: UserId::from_uuid(row.user_id),
            kind,
            amount: Money::from_cents(row.amount_cents),
            description: row.description,
            created_at: row.created_at,
        })
    }
}

/// Insertable `ledger_entries` row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = ledger_entries)]
pub(crate) struct NewLedgerEntryRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kind: &'a str,
    pub amount_cents: i64,
    pub description: &'a str,
}

/// Insertable `promo_redemptions` row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = promo_redemptions)]
pub(crate) struct NewPromoRedemptionRow<'a> {
    pub user_id: Uuid,
    pub code: &'a str,
    pub amount_cents: i64,
}

/// Insertable `games` row.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = games)]
pub(crate) struct NewGameRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub game: &'a str,
    pub bet_cents: i64,
    pub prize: serde_json::Value,
}

/// Row read from `games`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = games)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GameRow {
    pub id: Uuid,
    pub bet_cents: i64,
    pub prize: serde_json::Value,
    pub claimed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<GameRow> for GameRecord {
    type Error = String;

    fn try_from(row: GameRow) -> Result<Self, Self::Error> {
        let prize: Prize = serde_json::from_value(row.prize)
            .map_err(|err| format!("stored prize for game {}: {err}", row.id))?;
        Ok(Self {
            id: GameId::from_uuid(row.id),
            stake: Money::from_cents(row.bet_cents),
            prize,
            claimed: row.claimed_at.is_some(),
            created_at: row.created_at,
        })
    }
}
