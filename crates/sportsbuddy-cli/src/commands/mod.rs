//! Command implementations.

pub mod account;
pub mod backend;
pub mod event;
pub mod taxonomy;

use sportsbuddy_model::Identity;
use sportsbuddy_store::{StoreError, StoreHandle};
use thiserror::Error;

/// Failures raised by the CLI itself, on top of store errors.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("not signed in; run `sportsbuddy login` first")]
    NoSession,

    #[error("permission denied: {0}")]
    Forbidden(&'static str),

    #[error("event not found: {0}")]
    EventNotFound(String),

    #[error("invalid {field}: {reason}")]
    InvalidArgument { field: &'static str, reason: String },
}

/// Returns the signed-in identity or fails with [`CliError::NoSession`].
pub async fn require_session(store: &StoreHandle) -> Result<Identity, CliError> {
    store
        .identity()
        .current_session()
        .await?
        .ok_or(CliError::NoSession)
}
