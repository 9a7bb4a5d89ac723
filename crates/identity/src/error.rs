//! Identity provider error types

use thiserror::Error;

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Errors returned by identity provider calls
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Network-level failure talking to the provider
    #[error("identity provider request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with a non-success status
    #[error("identity provider returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The provider answered 2xx but the body did not match the expected shape
    #[error("unexpected identity provider response: {0}")]
    Decode(String),

    /// Configuration problem (missing env var etc.)
    #[error("identity configuration error: {0}")]
    Configuration(String),
}
