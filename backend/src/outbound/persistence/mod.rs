//! PostgreSQL persistence for the wallet.
//!
//! - **Thin adapter**: [`DieselLedgerStore`] translates between Diesel rows
//!   and domain types and runs the locked transaction; settlement rules stay
//!   in the domain.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Async pooling**: `bb8` over `diesel-async` connections.
//! - **Embedded migrations**: applied at startup by
//!   [`run_pending_migrations`].

mod diesel_ledger_store;
mod ledger_error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_ledger_store::DieselLedgerStore;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
