//! Error types for the session adapter.
//!
//! Uses `thiserror` for library-style errors with automatic `Display` and `Error` implementations.

use thiserror::Error;

/// Errors surfaced by [`AuthSession`](crate::auth::session::AuthSession).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The configuration is missing a required value or carries an invalid one.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Session used before initialize() was called")]
    NotInitialized,

    #[error("Session is already initialized")]
    AlreadyInitialized,

    /// Token or user retrieval failed. Carries the provider's error message.
    #[error("{0}")]
    Acquisition(String),
}

impl SessionError {
    /// Returns a user-friendly message for display in the UI.
    pub fn user_message(&self) -> &str {
        match self {
            Self::Configuration(_) => "Configuration error. Please check settings.",
            Self::NotInitialized | Self::AlreadyInitialized => {
                "Authentication is not set up correctly."
            }
            Self::Acquisition(_) => "Could not get a token. Please sign in again.",
        }
    }

    /// Returns true if this error should trigger a new interactive sign-in.
    pub fn requires_sign_in(&self) -> bool {
        matches!(self, Self::Acquisition(_))
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
