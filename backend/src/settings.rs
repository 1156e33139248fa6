//! Application configuration loaded via OrthoConfig.
//!
//! Values come from CLI flags, `WHEEL_*` environment variables, or a
//! configuration file. Game rules start from the stock game, are replaced
//! wholesale by an optional JSON rules file, and then have the stake and
//! starting balance overridden by explicit settings.

use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{GameRules, Money, RulesDocument, RulesError};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3001;
const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2000;

/// Errors raised while turning settings into runtime values.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The bind host is not an IP address.
    #[error("host {value:?} is not a valid IP address")]
    InvalidHost { value: String },
    /// The rules file could not be read.
    #[error("failed to read rules file {path}: {source}")]
    ReadRules {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The rules file is not valid JSON for a rules document.
    #[error("failed to parse rules file {path}: {source}")]
    ParseRules {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    /// The resulting rules are unusable.
    #[error("invalid game rules: {0}")]
    Rules(#[from] RulesError),
}

/// Server, storage, and game configuration.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "WHEEL")]
pub struct AppSettings {
    /// IP address to bind.
    #[ortho_config(default = String::from(DEFAULT_HOST))]
    pub host: String,
    /// TCP port to bind.
    #[ortho_config(default = DEFAULT_PORT)]
    pub port: u16,
    /// PostgreSQL connection string. Without one, debug builds fall back to
    /// the in-memory store.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    #[ortho_config(default = DEFAULT_POOL_MAX_SIZE)]
    pub pool_max_size: u32,
    /// Milliseconds to wait for an account lock.
    #[ortho_config(default = DEFAULT_LOCK_TIMEOUT_MS)]
    pub lock_timeout_ms: u64,
    /// Balance granted to new accounts, as a number or a string such as
    /// `"5.00"`.
    pub starting_balance: Option<Money>,
    /// Stake charged per spin.
    pub spin_stake: Option<Money>,
    /// JSON rules file with prizes and promo codes.
    pub rules_path: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            database_url: None,
            pool_max_size: DEFAULT_POOL_MAX_SIZE,
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
            starting_balance: None,
            spin_stake: None,
            rules_path: None,
        }
    }
}

/// Read a rules document from a JSON file.
///
/// # Errors
/// Returns [`SettingsError::ReadRules`] or [`SettingsError::ParseRules`].
pub fn read_rules_file(path: &Path) -> Result<RulesDocument, SettingsError> {
    let raw = std::fs::read_to_string(path).map_err(|source| SettingsError::ReadRules {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| SettingsError::ParseRules {
        path: path.to_path_buf(),
        source,
    })
}

impl AppSettings {
    /// Socket address to bind, `0.0.0.0:3001` unless overridden.
    ///
    /// # Errors
    /// Returns [`SettingsError::InvalidHost`] when the host is not an IP.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let ip = IpAddr::from_str(self.host.trim()).map_err(|_| SettingsError::InvalidHost {
            value: self.host.clone(),
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// Configured database URL, ignoring blank values.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Maximum pooled database connections.
    pub const fn pool_max_size(&self) -> u32 {
        self.pool_max_size
    }

    /// Bound on account lock acquisition.
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Assemble the rules document from the rules file and overrides.
    ///
    /// # Errors
    /// Returns [`SettingsError`] when the rules file cannot be read.
    pub fn rules_document(&self) -> Result<RulesDocument, SettingsError> {
        let mut document = match &self.rules_path {
            Some(path) => read_rules_file(path)?,
            None => RulesDocument::default(),
        };
        if let Some(amount) = self.starting_balance {
            document.starting_balance = amount;
        }
        if let Some(amount) = self.spin_stake {
            document.spin_stake = amount;
        }
        Ok(document)
    }

    /// Validated game rules.
    ///
    /// # Errors
    /// Returns [`SettingsError`] when the document cannot be assembled or
    /// fails validation.
    pub fn game_rules(&self) -> Result<GameRules, SettingsError> {
        Ok(GameRules::try_from(self.rules_document()?)?)
    }
}
