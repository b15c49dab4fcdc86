use crate::store::error::StoreError;

/// The error taxonomy the matching core returns (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("instrument not found")]
    InstrumentNotFound,

    #[error("insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("insufficient asset: required {required}, available {available}")]
    InsufficientAsset { required: i64, available: i64 },

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("not found")]
    NotFound,

    #[error("conflict, retry")]
    Conflict,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => EngineError::NotFound,
            StoreError::Conflict(_) => EngineError::Conflict,
            StoreError::IntegrityViolation(msg) => EngineError::StoreUnavailable(msg),
            StoreError::Db(e) => EngineError::StoreUnavailable(e.to_string()),
        }
    }
}
