use sqlx::error::DatabaseError;

/// Failure modes the Store surfaces to its callers (spec §4.1, §7).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Concurrent modification, serialization failure, or deadlock. The
    /// caller MAY retry; [`crate::ledger::BalanceLedger`] does, internally.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("not found")]
    NotFound,

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a raw `sqlx::Error` by Postgres error code, distinguishing
    /// retryable conflicts from fatal constraint violations.
    pub fn classify(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if let Some(code) = db_err.code() {
                match code.as_ref() {
                    // deadlock_detected, serialization_failure
                    "40P01" | "40001" => return StoreError::Conflict(db_err.message().to_string()),
                    // unique_violation, foreign_key_violation, check_violation
                    "23505" | "23503" | "23514" => {
                        return StoreError::IntegrityViolation(db_err.message().to_string())
                    }
                    _ => {}
                }
            }
        }
        if matches!(err, sqlx::Error::RowNotFound) {
            return StoreError::NotFound;
        }
        StoreError::Db(err)
    }
}
