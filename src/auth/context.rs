//! The authentication context the session delegates to.
//!
//! The context is the system of record for tokens: it owns the cache, the
//! login and renewal state machines, and the diagnostic log. The session only
//! forwards to it.

use crate::auth::fragment::{is_callback_fragment, RequestInfo};
use crate::config::SessionConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Shared handle to a context.
pub type ContextRef = Arc<dyn AuthenticationContext>;

/// Completion of a silent token request: the token, or the provider's error.
pub type TokenCallback = Box<dyn FnOnce(Result<String, String>) + Send>;

/// Completion of a user lookup.
pub type UserCallback = Box<dyn FnOnce(Result<User, String>) + Send>;

/// User decoded from the cached id token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_name: String,
    /// Claims from the id token.
    #[serde(default)]
    pub profile: Map<String, Value>,
}

/// Operations the session needs from the authentication library.
pub trait AuthenticationContext: Send + Sync {
    /// Start an interactive login (full-page redirect or popup).
    fn login(&self);

    fn login_in_progress(&self) -> bool;

    /// Redirect to the provider's logout endpoint.
    fn logout(&self);

    /// Whether `hash` is an authentication response.
    fn is_callback(&self, hash: &str) -> bool {
        is_callback_fragment(hash)
    }

    /// Decode and classify a callback fragment against this context's pending requests.
    fn request_info(&self, hash: &str) -> RequestInfo;

    /// Persist tokens or errors carried by a callback into the cache.
    fn save_token_from_hash(&self, info: &RequestInfo);

    /// Cached, unexpired token for `resource`.
    fn cached_token(&self, resource: &str) -> Option<String>;

    fn cached_user(&self) -> Option<User>;

    /// Error recorded by the last login attempt.
    fn login_error(&self) -> Option<String>;

    /// Error description stored by the last callback.
    fn error_description(&self) -> Option<String>;

    /// Flag a failed silent renewal.
    fn mark_renew_failed(&self);

    fn renew_failed(&self) -> bool;

    /// Silently acquire a token for `resource`. `callback` runs exactly once.
    fn acquire_token(&self, resource: &str, callback: TokenCallback);

    /// Look up the signed-in user. `callback` runs exactly once.
    fn get_user(&self, callback: UserCallback);

    fn clear_cache(&self);

    fn clear_cache_for_resource(&self, resource: &str);

    fn info(&self, message: &str);

    fn verbose(&self, message: &str);

    fn error(&self, message: &str, detail: &str);

    /// Resource configured for `url` in the endpoint map.
    fn resource_for_endpoint(&self, url: &str) -> Option<String>;
}

/// Builds the authentication context from the finalized configuration.
pub trait ContextProvider: Send + Sync {
    fn create(&self, config: &SessionConfig) -> anyhow::Result<ContextRef>;
}

impl<F> ContextProvider for F
where
    F: Fn(&SessionConfig) -> anyhow::Result<ContextRef> + Send + Sync,
{
    fn create(&self, config: &SessionConfig) -> anyhow::Result<ContextRef> {
        self(config)
    }
}
