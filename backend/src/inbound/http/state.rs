//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::WalletCommand;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub wallet: Arc<dyn WalletCommand>,
}

impl HttpState {
    /// Construct state from the wallet port.
    pub fn new(wallet: Arc<dyn WalletCommand>) -> Self {
        Self { wallet }
    }
}
