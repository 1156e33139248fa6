//! Player accounts, prizes, and inventory.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Money;

/// Maximum accepted length of an external (platform) identifier.
pub const EXTERNAL_ID_MAX: usize = 64;

/// Validation errors for account-level identifiers and prizes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountValidationError {
    /// The external identifier was blank.
    #[error("telegramId must not be empty")]
    EmptyExternalId,
    /// The external identifier exceeded [`EXTERNAL_ID_MAX`].
    #[error("telegramId must be at most {max} characters")]
    ExternalIdTooLong { max: usize },
    /// The prize name was blank.
    #[error("prize name must not be empty")]
    EmptyPrizeName,
}

/// Platform-assigned player identifier (the Telegram user id).
///
/// Surrounding whitespace is trimmed on construction.
///
/// # Examples
/// ```
/// use wheel_backend::domain::ExternalId;
///
/// let id = ExternalId::new(" 42 ").expect("valid id");
/// assert_eq!(id.as_ref(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExternalId(String);

impl ExternalId {
    /// Validate and construct an [`ExternalId`].
    ///
    /// # Errors
    /// Rejects blank values and values longer than [`EXTERNAL_ID_MAX`].
    pub fn new(raw: impl AsRef<str>) -> Result<Self, AccountValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(AccountValidationError::EmptyExternalId);
        }
        if trimmed.chars().count() > EXTERNAL_ID_MAX {
            return Err(AccountValidationError::ExternalIdTooLong {
                max: EXTERNAL_ID_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Default username assigned to freshly created accounts.
    #[must_use]
    pub fn default_username(&self) -> String {
        format!("User_{}", self.0)
    }
}

impl AsRef<str> for ExternalId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ExternalId> for String {
    fn from(value: ExternalId) -> Self {
        value.0
    }
}

impl TryFrom<String> for ExternalId {
    type Error = AccountValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Surrogate key of a stored account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A player account with its cached balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Surrogate key.
    pub id: UserId,
    /// Platform identifier the account was created for.
    pub external_id: ExternalId,
    /// Display username.
    pub username: String,
    /// Cached projection of the ledger.
    pub balance: Money,
    /// When the account was first seen.
    pub created_at: DateTime<Utc>,
}

/// A wheel prize as configured in the game rules.
///
/// # Examples
/// ```
/// use wheel_backend::domain::{Money, Prize};
///
/// let prize = Prize::new("Pepe", "🐸", Money::ZERO).expect("valid prize");
/// assert_eq!(prize.name(), "Pepe");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    name: String,
    emoji: String,
    price: Money,
}

impl Prize {
    /// Validate and construct a prize.
    ///
    /// # Errors
    /// Rejects blank names.
    pub fn new(
        name: impl Into<String>,
        emoji: impl Into<String>,
        price: Money,
    ) -> Result<Self, AccountValidationError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(AccountValidationError::EmptyPrizeName);
        }
        Ok(Self {
            name,
            emoji: emoji.into(),
            price,
        })
    }

    /// Prize name; unique within a prize table.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Display glyph.
    #[must_use]
    pub fn emoji(&self) -> &str {
        &self.emoji
    }

    /// Resale price credited when an inventory copy is sold.
    #[must_use]
    pub const fn price(&self) -> Money {
        self.price
    }
}

/// Identifier of an inventory row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InventoryItemId(Uuid);

impl InventoryItemId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a new random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for InventoryItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A prize a player chose to keep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    /// Row identifier used to sell the item.
    pub id: InventoryItemId,
    /// Prize name.
    pub name: String,
    /// Display glyph.
    pub emoji: String,
    /// Price credited on sale.
    pub price: Money,
    /// When the prize was kept.
    pub created_at: DateTime<Utc>,
}

/// Account plus inventory, newest item first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Account snapshot.
    pub account: UserAccount,
    /// Kept prizes, newest first.
    pub inventory: Vec<InventoryItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn external_id_rejects_blank(#[case] raw: &str) {
        assert_eq!(
            ExternalId::new(raw),
            Err(AccountValidationError::EmptyExternalId)
        );
    }

    #[rstest]
    fn external_id_rejects_overlong_values() {
        let raw = "9".repeat(EXTERNAL_ID_MAX + 1);
        assert_eq!(
            ExternalId::new(raw),
            Err(AccountValidationError::ExternalIdTooLong {
                max: EXTERNAL_ID_MAX
            })
        );
    }

    #[rstest]
    fn default_username_uses_external_id() {
        let id = ExternalId::new("12345").expect("valid id");
        assert_eq!(id.default_username(), "User_12345");
    }

    #[rstest]
    fn prize_trims_name_and_rejects_blank() {
        let prize = Prize::new("  Peach ", "🍑", Money::from_cents(25)).expect("valid");
        assert_eq!(prize.name(), "Peach");
        assert_eq!(
            Prize::new(" ", "🍑", Money::ZERO),
            Err(AccountValidationError::EmptyPrizeName)
        );
    }
}
