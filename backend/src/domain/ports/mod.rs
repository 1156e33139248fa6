//! Domain ports for the hexagonal boundary.
//!
//! Driven ports ([`LedgerStore`], [`DrawSource`]) are implemented by
//! outbound adapters. The driving port ([`WalletCommand`]) is implemented by
//! the wallet service and consumed by inbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod draw_source;
mod ledger_store;
mod wallet_command;

#[cfg(test)]
pub use draw_source::MockDrawSource;
pub use draw_source::{DrawSource, FixtureDrawSource};
#[cfg(test)]
pub use ledger_store::MockLedgerStore;
pub use ledger_store::{FixtureLedgerStore, LedgerStore, LedgerStoreError};
#[cfg(test)]
pub use wallet_command::MockWalletCommand;
pub use wallet_command::{
    FixtureWalletCommand, PromoOutcome, SaleOutcome, SpinOutcome, WalletCommand, WheelInfo,
};
