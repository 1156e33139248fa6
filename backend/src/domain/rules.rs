//! Game rules: stake, starting balance, prize table, and promo catalogue.
//!
//! [`RulesDocument`] is the serialisable shape read from configuration.
//! [`GameRules`] is the validated form the wallet service runs against.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    AccountValidationError, Money, OutcomeSelector, Prize, PromoCatalogue, PromoCode,
    PromoValidationError, SelectorError, WeightedOutcome,
};

/// Errors raised while validating a [`RulesDocument`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RulesError {
    /// Starting balance below zero.
    #[error("starting balance must not be negative, got {0}")]
    NegativeStartingBalance(Money),
    /// Spin stake below zero.
    #[error("spin stake must not be negative, got {0}")]
    NegativeSpinStake(Money),
    /// Prize price below zero.
    #[error("prize {name} must not have a negative price")]
    NegativePrizePrice { name: String },
    /// Two prizes share a name.
    #[error("prize {name} is configured more than once")]
    DuplicatePrize { name: String },
    /// A prize entry is malformed.
    #[error(transparent)]
    Prize(#[from] AccountValidationError),
    /// The weight table cannot be drawn from.
    #[error(transparent)]
    Outcomes(#[from] SelectorError),
    /// A promo entry is malformed.
    #[error(transparent)]
    Promo(#[from] PromoValidationError),
}

/// One prize table row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrizeRule {
    /// Prize name; unique within the table.
    #[schema(example = "Pepe")]
    pub name: String,
    /// Display glyph.
    #[schema(example = "🐸")]
    pub emoji: String,
    /// Price credited when a kept copy is sold.
    #[serde(default)]
    #[schema(value_type = f64, example = 0.0)]
    pub price: Money,
    /// Relative likelihood.
    #[schema(example = 50)]
    pub weight: u32,
}

/// One promo catalogue row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoRule {
    /// Code as configured; normalised on validation.
    pub code: String,
    /// Credit granted on first redemption.
    pub amount: Money,
}

/// Serialisable rules, as loaded from a JSON rules file.
///
/// Missing fields fall back to the stock game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RulesDocument {
    /// Balance granted to new accounts.
    pub starting_balance: Money,
    /// Stake debited per spin when the request does not name one.
    pub spin_stake: Money,
    /// Prize table.
    pub prizes: Vec<PrizeRule>,
    /// Promo catalogue.
    pub promo_codes: Vec<PromoRule>,
}

fn units(whole: i64) -> Money {
    Money::from_cents(whole * 100)
}

impl Default for RulesDocument {
    fn default() -> Self {
        let prize = |name: &str, emoji: &str| PrizeRule {
            name: name.to_owned(),
            emoji: emoji.to_owned(),
            price: Money::ZERO,
            weight: 50,
        };
        let promo = |code: &str, amount: i64| PromoRule {
            code: code.to_owned(),
            amount: units(amount),
        };
        Self {
            starting_balance: units(5),
            spin_stake: units(1),
            prizes: vec![prize("Pepe", "🐸"), prize("Peach", "🍑")],
            promo_codes: vec![
                promo("FREEEFORADMIN", 100),
                promo("GIFT1", 1),
                promo("GIFT5", 5),
                promo("BONUS", 2),
            ],
        }
    }
}

/// Validated game rules.
///
/// # Examples
/// ```
/// use wheel_backend::domain::{GameRules, Money, RulesDocument};
///
/// let rules = GameRules::try_from(RulesDocument::default()).expect("stock rules");
/// assert_eq!(rules.spin_stake(), Money::from_cents(100));
/// assert!(rules.prize_named("Peach").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct GameRules {
    starting_balance: Money,
    spin_stake: Money,
    prizes: OutcomeSelector<Prize>,
    promos: PromoCatalogue,
}

impl GameRules {
    /// Balance granted to new accounts.
    #[must_use]
    pub const fn starting_balance(&self) -> Money {
        self.starting_balance
    }

    /// Default spin stake.
    #[must_use]
    pub const fn spin_stake(&self) -> Money {
        self.spin_stake
    }

    /// Weighted prize table.
    #[must_use]
    pub const fn prizes(&self) -> &OutcomeSelector<Prize> {
        &self.prizes
    }

    /// Promo catalogue.
    #[must_use]
    pub const fn promos(&self) -> &PromoCatalogue {
        &self.promos
    }

    /// Look up a configured prize by exact name.
    #[must_use]
    pub fn prize_named(&self, name: &str) -> Option<&Prize> {
        let name = name.trim();
        self.prizes
            .iter()
            .map(|entry| &entry.outcome)
            .find(|prize| prize.name() == name)
    }

    /// Table rows for display, in configured order.
    #[must_use]
    pub fn prize_rules(&self) -> Vec<PrizeRule> {
        self.prizes
            .iter()
            .map(|entry| PrizeRule {
                name: entry.outcome.name().to_owned(),
                emoji: entry.outcome.emoji().to_owned(),
                price: entry.outcome.price(),
                weight: entry.weight,
            })
            .collect()
    }
}

impl TryFrom<RulesDocument> for GameRules {
    type Error = RulesError;

    fn try_from(document: RulesDocument) -> Result<Self, Self::Error> {
        if document.starting_balance.is_negative() {
            return Err(RulesError::NegativeStartingBalance(
                document.starting_balance,
            ));
        }
        if document.spin_stake.is_negative() {
            return Err(RulesError::NegativeSpinStake(document.spin_stake));
        }

        let mut seen = HashSet::new();
        let mut outcomes = Vec::with_capacity(document.prizes.len());
        for rule in document.prizes {
            if rule.price.is_negative() {
                return Err(RulesError::NegativePrizePrice { name: rule.name });
            }
            let prize = Prize::new(rule.name, rule.emoji, rule.price)?;
            if !seen.insert(prize.name().to_owned()) {
                return Err(RulesError::DuplicatePrize {
                    name: prize.name().to_owned(),
                });
            }
            outcomes.push(WeightedOutcome::new(prize, rule.weight));
        }
        let prizes = OutcomeSelector::new(outcomes)?;

        let entries = document
            .promo_codes
            .into_iter()
            .map(|rule| PromoCode::new(&rule.code).map(|code| (code, rule.amount)))
            .collect::<Result<Vec<_>, _>>()?;
        let promos = PromoCatalogue::new(entries)?;

        Ok(Self {
            starting_balance: document.starting_balance,
            spin_stake: document.spin_stake,
            prizes,
            promos,
        })
    }
}
