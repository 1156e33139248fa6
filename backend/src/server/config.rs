//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use wheel_backend::domain::GameRules;
use wheel_backend::outbound::persistence::DbPool;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) rules: Arc<GameRules>,
    pub(crate) lock_timeout: std::time::Duration,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    /// Construct a server configuration from validated rules.
    #[must_use]
    pub fn new(
        bind_addr: SocketAddr,
        rules: GameRules,
        lock_timeout: std::time::Duration,
    ) -> Self {
        Self {
            bind_addr,
            rules: Arc::new(rules),
            lock_timeout,
            db_pool: None,
        }
    }

    /// Attach a database connection pool.
    ///
    /// When provided, the wallet persists to PostgreSQL; otherwise debug
    /// builds keep balances in memory.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
