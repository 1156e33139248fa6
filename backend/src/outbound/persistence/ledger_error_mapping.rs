//! Mapping from pool and Diesel failures to [`LedgerStoreError`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::ports::LedgerStoreError;

use super::pool::PoolError;

/// Server messages raised with SQLSTATE 55P03 (`lock_not_available`).
///
/// diesel-async reports that state as [`DatabaseErrorKind::Unknown`] and its
/// error wrapper does not expose the code, so the message is the only
/// signal left. `lock_timeout` expiry yields the first form, `NOWAIT` the
/// second.
const LOCK_NOT_AVAILABLE_MESSAGES: [&str; 2] = ["lock timeout", "could not obtain lock"];

fn is_lock_timeout(kind: &DatabaseErrorKind, message: &str) -> bool {
    if !matches!(kind, DatabaseErrorKind::Unknown) {
        return false;
    }
    let message = message.to_lowercase();
    LOCK_NOT_AVAILABLE_MESSAGES
        .iter()
        .any(|needle| message.contains(needle))
}

/// Map pool checkout and build failures to connection errors.
pub(crate) fn map_pool_error(error: PoolError) -> LedgerStoreError {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => {
            LedgerStoreError::connection(message)
        }
    }
}

/// Map Diesel errors to ledger store errors.
pub(crate) fn map_diesel_error(error: DieselError) -> LedgerStoreError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(kind, info) if is_lock_timeout(&kind, info.message()) => {
            LedgerStoreError::lock_timeout(info.message().to_owned())
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, info) => {
            LedgerStoreError::connection(info.message().to_owned())
        }
        DieselError::DatabaseError(_, info) => LedgerStoreError::query(info.message().to_owned()),
        DieselError::BrokenTransactionManager => {
            LedgerStoreError::connection("transaction manager is broken")
        }
        DieselError::NotFound => LedgerStoreError::query("record not found"),
        other => LedgerStoreError::query(other.to_string()),
    }
}

/// Whether `error` is a unique violation, used to detect a concurrent
/// redemption marker insert.
pub(crate) fn is_unique_violation(error: &DieselError) -> bool {
    matches!(
        error,
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    )
}
