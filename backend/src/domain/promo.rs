//! Promo codes and the one-redemption-per-user guard.
//!
//! The catalogue maps normalised codes to credit amounts. Whether a user has
//! already consumed a code is only known under the account lock, so the
//! guard itself ([`check_redemption`]) is a pure decision the ledger store
//! evaluates inside the atomic unit before it writes the redemption marker.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{Money, MutationRejection};

/// Maximum accepted length of a promo code.
pub const PROMO_CODE_MAX: usize = 32;

/// Validation errors for promo codes and catalogues.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromoValidationError {
    /// The code was blank.
    #[error("promo code must not be empty")]
    Empty,
    /// The code exceeded [`PROMO_CODE_MAX`].
    #[error("promo code must be at most {max} characters")]
    TooLong { max: usize },
    /// A catalogue entry credits zero or a negative amount.
    #[error("promo code {code} must credit a positive amount")]
    NonPositiveAmount { code: String },
}

/// Case-normalised promo code.
///
/// # Examples
/// ```
/// use wheel_backend::domain::PromoCode;
///
/// let code = PromoCode::new(" gift5 ").expect("valid code");
/// assert_eq!(code.as_ref(), "GIFT5");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PromoCode(String);

impl PromoCode {
    /// Trim, upper-case, and validate a code.
    ///
    /// # Errors
    /// Rejects blank codes and codes longer than [`PROMO_CODE_MAX`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PromoValidationError> {
        let normalised = raw.as_ref().trim().to_uppercase();
        if normalised.is_empty() {
            return Err(PromoValidationError::Empty);
        }
        if normalised.chars().count() > PROMO_CODE_MAX {
            return Err(PromoValidationError::TooLong {
                max: PROMO_CODE_MAX,
            });
        }
        Ok(Self(normalised))
    }
}

impl AsRef<str> for PromoCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PromoCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<PromoCode> for String {
    fn from(value: PromoCode) -> Self {
        value.0
    }
}

impl TryFrom<String> for PromoCode {
    type Error = PromoValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Lookup table of redeemable codes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromoCatalogue {
    amounts: HashMap<PromoCode, Money>,
}

impl PromoCatalogue {
    /// Build a catalogue, rejecting entries that do not credit anything.
    ///
    /// Later duplicates of the same normalised code replace earlier ones.
    ///
    /// # Errors
    /// Returns [`PromoValidationError::NonPositiveAmount`] for zero or
    /// negative credits.
    pub fn new(
        entries: impl IntoIterator<Item = (PromoCode, Money)>,
    ) -> Result<Self, PromoValidationError> {
        let mut amounts = HashMap::new();
        for (code, amount) in entries {
            if amount <= Money::ZERO {
                return Err(PromoValidationError::NonPositiveAmount {
                    code: code.to_string(),
                });
            }
            amounts.insert(code, amount);
        }
        Ok(Self { amounts })
    }

    /// Credit amount for `code`, or `None` when the code is unknown.
    #[must_use]
    pub fn amount_for(&self, code: &PromoCode) -> Option<Money> {
        self.amounts.get(code).copied()
    }

    /// Number of configured codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    /// Whether no codes are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

/// Decide whether `code` may be credited given the marker state observed
/// under the account lock.
///
/// # Errors
/// Returns [`MutationRejection::AlreadyRedeemed`] when a marker exists.
pub fn check_redemption(code: &PromoCode, already_redeemed: bool) -> Result<(), MutationRejection> {
    if already_redeemed {
        return Err(MutationRejection::AlreadyRedeemed { code: code.clone() });
    }
    Ok(())
}
