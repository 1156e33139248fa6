//! Backend entry-point: loads settings, applies migrations, and serves the
//! wallet API.

mod server;

use actix_web::web;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use wheel_backend::inbound::http::health::HealthState;
use wheel_backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use wheel_backend::settings::AppSettings;

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| std::io::Error::other(err.to_string()))?;
    let rules = settings.game_rules().map_err(std::io::Error::other)?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    info!(
        %bind_addr,
        spin_stake = %rules.spin_stake(),
        starting_balance = %rules.starting_balance(),
        "configuration loaded"
    );

    let mut config = ServerConfig::new(bind_addr, rules, settings.lock_timeout());
    if let Some(url) = settings.database_url() {
        run_pending_migrations(url).await.map_err(std::io::Error::other)?;
        let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.pool_max_size()))
            .await
            .map_err(std::io::Error::other)?;
        config = config.with_db_pool(pool);
    }

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, config)?;
    info!(%bind_addr, "server listening");
    server.await
}
