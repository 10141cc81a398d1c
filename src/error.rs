//! Crate-wide error taxonomy.
//!
//! Each module keeps its own `thiserror` enum; this aggregate is what
//! crosses the crate boundary. Callers must be able to tell a missing
//! object (`NotFound`) from one they may not touch (`Forbidden`), and
//! a rejected submission (`Validation`) from a store outage
//! (`Store(Unavailable)`, which is retryable).

use thiserror::Error;

use crate::annotation::ValidationError;
use crate::mapping::MappingError;
use crate::store::StoreError;

/// Errors surfaced by cardex operations.
#[derive(Error, Debug)]
pub enum Error {
    /// A submission was rejected before anything was written:
    /// malformed shape, missing required relation, duplicate
    /// identifier.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The identified object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The object exists but the caller lacks access to its scope.
    /// Produced by callers that enforce scopes; never conflated with
    /// `NotFound`.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Gateway failure. `StoreError::Unavailable` is retryable.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Typed decoding or relation-kind violation.
    #[error(transparent)]
    Mapping(#[from] MappingError),
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e.to_string())
    }
}

impl Error {
    /// Whether retrying the same call may succeed without any change
    /// on the caller's side.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Store(StoreError::Unavailable(_)))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
