//! Domain primitives, aggregates, ports, and services.
//!
//! Purpose: define the strongly typed wallet model used by the HTTP and
//! persistence adapters, plus the pure rules that decide every balance
//! change. Adapters depend on this module; it depends on none of them.
//!
//! Public surface:
//! - [`Money`]: two-decimal currency in integer cents.
//! - [`UserAccount`], [`InventoryItem`], [`LedgerEntry`]: persisted state.
//! - [`BalanceMutation`]: the debit/credit variants and their settlement.
//! - [`OutcomeSelector`]: weighted prize draws.
//! - [`GameRecord`]: committed spins and the prize-claim guard.
//! - [`PromoCatalogue`]: promo codes and the redemption guard.
//! - [`WalletService`]: the [`ports::WalletCommand`] implementation.
//! - [`Error`] / [`ErrorCode`]: transport-agnostic failures.

pub mod account;
pub mod error;
pub mod game;
pub mod ledger;
pub mod money;
pub mod mutation;
pub mod outcome;
pub mod ports;
pub mod promo;
pub mod rules;
pub mod trace_id;
pub mod wallet_service;

pub use self::account::{
    AccountValidationError, EXTERNAL_ID_MAX, ExternalId, InventoryItem, InventoryItemId, Prize,
    Profile, UserAccount, UserId,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::game::{GameId, GameRecord, check_claim};
pub use self::ledger::{LedgerEntry, LedgerEntryKind, UnknownLedgerEntryKind};
pub use self::money::{Money, MoneyError};
pub use self::mutation::{
    AppliedMutation, BalanceMutation, MutationFacts, MutationKind, MutationRejection, Settlement,
};
pub use self::outcome::{OutcomeSelector, SelectorError, WeightedOutcome};
pub use self::promo::{
    PROMO_CODE_MAX, PromoCatalogue, PromoCode, PromoValidationError, check_redemption,
};
pub use self::rules::{GameRules, PrizeRule, PromoRule, RulesDocument, RulesError};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::wallet_service::{HISTORY_LIMIT_MAX, WalletService};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use wheel_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<()> {
///     Err(Error::user_not_found("no such player"))
/// }
/// # assert!(handler().is_err());
/// ```
pub type ApiResult<T> = Result<T, Error>;
