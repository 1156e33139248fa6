//! Builders wiring the wallet port to a ledger store.

use std::sync::Arc;

use mockable::DefaultClock;
use tracing::{info, warn};

use wheel_backend::domain::WalletService;
use wheel_backend::domain::ports::WalletCommand;
use wheel_backend::outbound::memory::InMemoryLedgerStore;
use wheel_backend::outbound::persistence::DieselLedgerStore;
use wheel_backend::outbound::random::ThreadRngDrawSource;

use super::ServerConfig;

/// Build the wallet service over PostgreSQL when a pool is configured.
///
/// Without a pool, debug builds fall back to the in-memory store so the API
/// can be exercised locally; release builds refuse to start because balances
/// would not survive a restart.
///
/// # Errors
/// Returns [`std::io::Error`] in release builds when no pool is configured.
pub(crate) fn build_wallet(config: &ServerConfig) -> std::io::Result<Arc<dyn WalletCommand>> {
    let draws = Arc::new(ThreadRngDrawSource);
    match &config.db_pool {
        Some(pool) => {
            info!("wallet backed by PostgreSQL");
            let store = DieselLedgerStore::new(pool.clone(), config.lock_timeout);
            Ok(Arc::new(WalletService::new(
                Arc::new(store),
                draws,
                Arc::clone(&config.rules),
            )))
        }
        None if cfg!(debug_assertions) => {
            warn!("no database configured; wallet state is held in memory");
            let store = InMemoryLedgerStore::new(Arc::new(DefaultClock))
                .with_lock_timeout(config.lock_timeout);
            Ok(Arc::new(WalletService::new(
                Arc::new(store),
                draws,
                Arc::clone(&config.rules),
            )))
        }
        None => Err(std::io::Error::other(
            "WHEEL_DATABASE_URL must be set in release builds",
        )),
    }
}
