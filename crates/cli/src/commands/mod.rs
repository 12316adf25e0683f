//! Subcommand implementations.

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod navigation;
pub mod purchases;

use fitwear_client::api::ApiError;
use fitwear_client::error::{ClientError, ValidationError};
use thiserror::Error;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A store operation failed; the message is already user-facing.
    #[error("{0}")]
    Client(#[from] ClientError),

    /// A direct API call failed.
    #[error("{0}")]
    Api(#[from] ApiError),
}

impl From<ValidationError> for CommandError {
    fn from(err: ValidationError) -> Self {
        Self::Client(err.into())
    }
}
