//! Spin records and prize claims.
//!
//! Every committed spin leaves a [`GameRecord`] holding the drawn prize. A
//! player keeps a prize by claiming that record; [`check_claim`] is the
//! pure guard the ledger store evaluates under the account lock before it
//! marks the record claimed and inserts the inventory item.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Money, MutationRejection, Prize};

/// Identifier of a recorded spin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
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

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A committed spin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    /// Record identifier returned to the player with the spin.
    pub id: GameId,
    /// Stake debited.
    pub stake: Money,
    /// Prize drawn.
    pub prize: Prize,
    /// Whether the prize has already been moved to the inventory.
    pub claimed: bool,
    /// When the spin committed.
    pub created_at: DateTime<Utc>,
}

/// Decide whether the prize of `game` may be kept.
///
/// `game` is the record with `game_id` owned by the locked account, if any.
///
/// # Errors
/// [`MutationRejection::GameNotFound`] when no such record belongs to the
/// account and [`MutationRejection::PrizeAlreadyClaimed`] when it was kept
/// before.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use wheel_backend::domain::{GameId, GameRecord, Money, Prize, check_claim};
///
/// let game = GameRecord {
///     id: GameId::random(),
///     stake: Money::from_cents(100),
///     prize: Prize::new("Pepe", "🐸", Money::ZERO).expect("prize"),
///     claimed: false,
///     created_at: Utc::now(),
/// };
/// assert_eq!(check_claim(game.id, Some(&game)).map(Prize::name), Ok("Pepe"));
/// ```
pub fn check_claim(game_id: GameId, game: Option<&GameRecord>) -> Result<&Prize, MutationRejection> {
    let game = game
        .filter(|game| game.id == game_id)
        .ok_or(MutationRejection::GameNotFound { game_id })?;
    if game.claimed {
        return Err(MutationRejection::PrizeAlreadyClaimed { game_id });
    }
    Ok(&game.prize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn won() -> GameRecord {
        GameRecord {
            id: GameId::random(),
            stake: Money::from_cents(100),
            prize: Prize::new("Peach", "🍑", Money::from_cents(40)).expect("prize"),
            claimed: false,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    fn unclaimed_game_yields_its_prize(won: GameRecord) {
        let prize = check_claim(won.id, Some(&won)).expect("claimable");
        assert_eq!(prize.price(), Money::from_cents(40));
    }

    #[rstest]
    fn claimed_game_is_refused(mut won: GameRecord) {
        won.claimed = true;
        assert_eq!(
            check_claim(won.id, Some(&won)),
            Err(MutationRejection::PrizeAlreadyClaimed { game_id: won.id })
        );
    }

    #[rstest]
    fn missing_or_mismatched_game_is_not_found(won: GameRecord) {
        let other = GameId::random();
        assert_eq!(
            check_claim(other, Some(&won)),
            Err(MutationRejection::GameNotFound { game_id: other })
        );
        assert_eq!(
            check_claim(other, None),
            Err(MutationRejection::GameNotFound { game_id: other })
        );
    }
}
