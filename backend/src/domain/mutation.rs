//! Balance mutations and their settlement rules.
//!
//! A [`BalanceMutation`] describes one debit or credit. Ledger store
//! adapters lock the account, gather [`MutationFacts`] under the lock, and
//! call [`BalanceMutation::settle`] to decide whether the unit commits. The
//! decision is pure so every adapter applies identical rules.

use serde::{Deserialize, Serialize};

use crate::domain::{
    GameId, InventoryItem, InventoryItemId, LedgerEntry, LedgerEntryKind, Money, Prize, PromoCode, UserId,
    check_redemption,
};

/// Reasons a mutation is refused. Refusals roll the unit back untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationRejection {
    /// The debit would take the balance below zero.
    #[error("insufficient balance: have {balance}, need {required}")]
    InsufficientBalance { balance: Money, required: Money },
    /// The promo code already has a redemption marker for this account.
    #[error("promo code {code} already redeemed")]
    AlreadyRedeemed { code: PromoCode },
    /// The inventory item is not owned by this account.
    #[error("inventory item {item_id} not found")]
    ItemNotFound { item_id: InventoryItemId },
    /// The amount is negative or overflows the balance.
    #[error("amount {amount} is out of range")]
    AmountOutOfRange { amount: Money },
    /// No spin with this id belongs to the account.
    #[error("game {game_id} not found")]
    GameNotFound { game_id: GameId },
    /// The prize of this spin was already kept.
    #[error("prize of game {game_id} already claimed")]
    PrizeAlreadyClaimed { game_id: GameId },
}

/// Tagged mutation variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MutationKind {
    /// Debit the stake for a wheel spin that landed on `prize`.
    SpinDebit {
        /// Stake to debit; zero is allowed.
        stake: Money,
        /// Outcome recorded with the game log.
        prize: Prize,
    },
    /// Remove an inventory item and credit its stored price.
    PrizeSale {
        /// Item to sell.
        item_id: InventoryItemId,
    },
    /// Credit a promo amount and record the redemption marker.
    PromoCredit {
        /// Normalised code.
        code: PromoCode,
        /// Catalogue amount.
        amount: Money,
    },
}

impl MutationKind {
    /// Ledger category written for this mutation.
    #[must_use]
    pub const fn ledger_kind(&self) -> LedgerEntryKind {
        match self {
            Self::SpinDebit { .. } => LedgerEntryKind::Spin,
            Self::PrizeSale { .. } => LedgerEntryKind::PrizeSell,
            Self::PromoCredit { .. } => LedgerEntryKind::Promo,
        }
    }
}

/// One balance change request.
///
/// # Examples
/// ```
/// use wheel_backend::domain::{BalanceMutation, Money, MutationFacts, Prize};
///
/// let prize = Prize::new("Pepe", "🐸", Money::ZERO).expect("prize");
/// let mutation = BalanceMutation::spin(Money::from_cents(100), prize);
/// let settlement = mutation
///     .settle(&MutationFacts::new(Money::from_cents(500)))
///     .expect("enough balance");
/// assert_eq!(settlement.new_balance, Money::from_cents(400));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceMutation {
    kind: MutationKind,
    description: Option<String>,
}

impl BalanceMutation {
    /// Wrap a mutation kind with the default description.
    #[must_use]
    pub const fn new(kind: MutationKind) -> Self {
        Self {
            kind,
            description: None,
        }
    }

    /// Spin debit.
    #[must_use]
    pub const fn spin(stake: Money, prize: Prize) -> Self {
        Self::new(MutationKind::SpinDebit { stake, prize })
    }

    /// Sale of a kept prize.
    #[must_use]
    pub const fn prize_sale(item_id: InventoryItemId) -> Self {
        Self::new(MutationKind::PrizeSale { item_id })
    }

    /// Promo credit.
    #[must_use]
    pub const fn promo(code: PromoCode, amount: Money) -> Self {
        Self::new(MutationKind::PromoCredit { code, amount })
    }

    /// Override the ledger description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The tagged variant.
    #[must_use]
    pub const fn kind(&self) -> &MutationKind {
        &self.kind
    }

    /// Decide the outcome of this mutation against facts read under lock.
    ///
    /// # Errors
    /// Returns a [`MutationRejection`] when a precondition fails; the caller
    /// must then abort the unit without writing anything.
    pub fn settle(&self, facts: &MutationFacts) -> Result<Settlement, MutationRejection> {
        let (amount, default_description) = match &self.kind {
            MutationKind::SpinDebit { stake, .. } => {
                if stake.is_negative() {
                    return Err(MutationRejection::AmountOutOfRange { amount: *stake });
                }
                if facts.balance < *stake {
                    return Err(MutationRejection::InsufficientBalance {
                        balance: facts.balance,
                        required: *stake,
                    });
                }
                let debit = stake
                    .checked_neg()
                    .ok_or(MutationRejection::AmountOutOfRange { amount: *stake })?;
                (debit, "Spin wheel".to_owned())
            }
            MutationKind::PrizeSale { item_id } => {
                let item = facts
                    .sale_item
                    .as_ref()
                    .filter(|item| item.id == *item_id)
                    .ok_or(MutationRejection::ItemNotFound { item_id: *item_id })?;
                if item.price.is_negative() {
                    return Err(MutationRejection::AmountOutOfRange { amount: item.price });
                }
                (item.price, format!("Sold {}", item.name))
            }
            MutationKind::PromoCredit { code, amount } => {
                check_redemption(code, facts.redemption_exists)?;
                if amount.is_negative() {
                    return Err(MutationRejection::AmountOutOfRange { amount: *amount });
                }
                (*amount, format!("Promo code: {code}"))
            }
        };

        let new_balance = facts
            .balance
            .checked_add(amount)
            .ok_or(MutationRejection::AmountOutOfRange { amount })?;

        Ok(Settlement {
            new_balance,
            amount,
            description: self.description.clone().unwrap_or(default_description),
        })
    }
}

/// State observed under the account lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationFacts {
    /// Balance re-read under the lock.
    pub balance: Money,
    /// Whether a redemption marker exists for the promo being applied.
    pub redemption_exists: bool,
    /// The inventory row targeted by a sale, if it exists for this account.
    pub sale_item: Option<InventoryItem>,
}

impl MutationFacts {
    /// Facts for a plain balance change.
    #[must_use]
    pub const fn new(balance: Money) -> Self {
        Self {
            balance,
            redemption_exists: false,
            sale_item: None,
        }
    }

    /// Record the redemption marker state.
    #[must_use]
    pub const fn with_redemption(mut self, exists: bool) -> Self {
        self.redemption_exists = exists;
        self
    }

    /// Record the inventory row targeted by a sale.
    #[must_use]
    pub fn with_sale_item(mut self, item: Option<InventoryItem>) -> Self {
        self.sale_item = item;
        self
    }
}

/// Accepted outcome of [`BalanceMutation::settle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settlement {
    /// Balance to write.
    pub new_balance: Money,
    /// Signed ledger amount.
    pub amount: Money,
    /// Ledger description.
    pub description: String,
}

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMutation {
    /// Account the mutation applied to.
    pub user_id: UserId,
    /// Balance after commit.
    pub new_balance: Money,
    /// Ledger entry written in the same unit.
    pub entry: LedgerEntry,
    /// Inventory row removed by a sale.
    pub sold_item: Option<InventoryItem>,
    /// Spin recorded by a spin debit.
    pub game_id: Option<GameId>,
}
