//! Append-only ledger entries.
//!
//! The ledger is the source of truth for balances: for every account,
//! `balance == starting_balance + sum(entry.amount)`. Entries are never
//! updated or deleted.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Money, UserId};

/// Category of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// Stake debited for a wheel spin.
    Spin,
    /// Price credited for selling a kept prize.
    PrizeSell,
    /// Amount credited by redeeming a promo code.
    Promo,
}

impl LedgerEntryKind {
    /// Stable storage tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Spin => "spin",
            Self::PrizeSell => "prize_sell",
            Self::Promo => "promo",
        }
    }
}

impl fmt::Display for LedgerEntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored tag is not a known [`LedgerEntryKind`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ledger entry kind `{0}`")]
pub struct UnknownLedgerEntryKind(pub String);

impl FromStr for LedgerEntryKind {
    type Err = UnknownLedgerEntryKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spin" => Ok(Self::Spin),
            "prize_sell" => Ok(Self::PrizeSell),
            "promo" => Ok(Self::Promo),
            other => Err(UnknownLedgerEntryKind(other.to_owned())),
        }
    }
}

/// One committed balance change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// Surrogate key.
    pub id: Uuid,
    /// Owning account.
    pub user_id: UserId,
    /// Change category.
    pub kind: LedgerEntryKind,
    /// Signed amount: negative for debits.
    pub amount: Money,
    /// Human-readable description.
    pub description: String,
    /// Commit time.
    pub created_at: DateTime<Utc>,
}
