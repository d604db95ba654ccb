//! Session adapter for ADAL-style implicit-flow authentication.
//!
//! The token cache, login and renewal state machines live in an
//! [`AuthenticationContext`](auth::context::AuthenticationContext) supplied by
//! the host. [`AuthSession`](auth::session::AuthSession) forwards to it,
//! handles redirect callbacks, and keeps an identity snapshot for quick reads.

#![deny(clippy::all)]

pub mod auth;
pub mod browser;
pub mod config;
pub mod error;
pub mod secret;

#[cfg(test)]
mod testing;

pub use auth::context::{AuthenticationContext, ContextProvider, ContextRef, User};
pub use auth::identity::IdentitySnapshot;
pub use auth::session::{AuthSession, CallbackOutcome, IgnoreReason};
pub use config::{CacheLocation, SessionConfig};
pub use error::SessionError;
