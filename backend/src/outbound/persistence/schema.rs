//! Diesel table definitions for the wallet schema.
//!
//! These must match `backend/migrations` exactly.

diesel::table! {
    /// Player accounts keyed by a surrogate UUID.
    users (id) {
        id -> Uuid,
        /// Telegram user id; unique.
        external_id -> Varchar,
        username -> Varchar,
        /// Cached ledger projection; never negative.
        balance_cents -> Int8,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Kept prizes.
    inventory_items (id) {
        id -> Uuid,
        user_id -> Uuid,
        name -> Varchar,
        emoji -> Varchar,
        price_cents -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Append-only balance changes.
    ledger_entries (id) {
        id -> Uuid,
        user_id -> Uuid,
        /// One of `spin`, `prize_sell`, `promo`.
        kind -> Varchar,
        amount_cents -> Int8,
        description -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// One row per redeemed (user, code) pair.
    promo_redemptions (user_id, code) {
        user_id -> Uuid,
        code -> Varchar,
        amount_cents -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Spin log written with each spin debit.
    games (id) {
        id -> Uuid,
        user_id -> Uuid,
        game -> Varchar,
        bet_cents -> Int8,
        prize -> Jsonb,
        /// Set once the prize has been moved to the inventory.
        claimed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(inventory_items -> users (user_id));
diesel::joinable!(ledger_entries -> users (user_id));
diesel::joinable!(promo_redemptions -> users (user_id));
diesel::joinable!(games -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    inventory_items,
    ledger_entries,
    promo_redemptions,
    games,
);
