//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The email is already registered.
    #[error("email already registered")]
    DuplicateIdentity,
    /// No identity matches the email and secret.
    #[error("invalid credentials")]
    InvalidCredentials,
    /// The remote backend could not be initialized.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),
    /// A backend call was rejected (network failure, permission denial, weak password, ...).
    #[error("backend operation failed: {0}")]
    BackendOperationFailed(String),
    /// Caller input failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(#[from] sportsbuddy_model::ValidationError),
    /// Local key/value file error.
    #[error("local storage error: {0}")]
    Local(#[from] sportsbuddy_kv::KvError),
    /// A stored or fetched document does not have the expected shape.
    #[error("malformed document: {0}")]
    Decode(String),
    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::BackendOperationFailed(e.to_string())
    }
}

/// Result alias used across the store API.
pub type StoreResult<T> = Result<T, StoreError>;
