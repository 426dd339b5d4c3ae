use std::time::Duration;

use thiserror::Error;

use crate::convert::ConversionError;
use crate::schema::SchemaError;
use crate::store::StoreError;

/// Errors surfaced by every dynamap operation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Conversion error: {0}")]
    Conversion(#[from] ConversionError),
    /// A store error the caller asked to see unchanged.
    #[error("Store error: {0}")]
    Store(StoreError),
    /// The store rejected the request and its code is not retryable.
    #[error("Request rejected by store: {0}")]
    ClientRejected(StoreError),
    #[error("Retry budget of {elapsed:?} exhausted after {attempts} attempts; first error: {first}")]
    Timeout {
        first: StoreError,
        attempts: u32,
        elapsed: Duration,
    },
}

impl Error {
    /// The store error code behind this error, if any.
    pub fn store_code(&self) -> Option<&str> {
        match self {
            Self::Store(err) | Self::ClientRejected(err) => Some(&err.code),
            Self::Timeout { first, .. } => Some(&first.code),
            Self::Schema(_) | Self::Conversion(_) => None,
        }
    }
}

/// Result type for dynamap operations.
pub type Result<T> = std::result::Result<T, Error>;
