//! Session adapter over an authentication context.
//!
//! `AuthSession` owns the context for the lifetime of the application,
//! forwards login, logout and cache calls to it, turns its callback-style
//! token and user lookups into futures, and keeps an [`IdentitySnapshot`]
//! in sync with the cache.

use crate::auth::context::{AuthenticationContext, ContextProvider, ContextRef, User};
use crate::auth::fragment::{RequestInfo, RequestType};
use crate::auth::identity::{IdentitySnapshot, IdentityStore};
use crate::browser::{
    resolve_owning_context, ContinuationRegistry, Location, MemoryLocation, MemoryRegistry,
    TopLevelWindow, WindowHost,
};
use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use once_cell::sync::OnceCell;
use std::sync::{Arc, Weak};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info, warn};

/// What `handle_redirect_callback` did with the current fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// The fragment is not an authentication response. Nothing was touched.
    NotCallback,
    /// A login response was stored and the identity refreshed.
    Login,
    /// A renewal continuation received its token.
    Renewed { state: String },
    /// A renewal continuation received the provider's error.
    RenewFailed { state: String },
    /// The response could not be correlated. Expected when renewals race.
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    UnknownRequest,
    StateMismatch,
    NoContinuation,
    /// Neither a token nor an error in the response.
    EmptyResponse,
}

struct Initialized {
    config: SessionConfig,
    context: ContextRef,
}

/// Application-wide authentication session.
pub struct AuthSession {
    location: Arc<dyn Location>,
    windows: Arc<dyn WindowHost>,
    registry: Arc<dyn ContinuationRegistry>,
    identity: IdentityStore,
    inner: OnceCell<Initialized>,
}

impl AuthSession {
    pub fn new(
        location: Arc<dyn Location>,
        windows: Arc<dyn WindowHost>,
        registry: Arc<dyn ContinuationRegistry>,
    ) -> Self {
        Self {
            location,
            windows,
            registry,
            identity: IdentityStore::new(),
            inner: OnceCell::new(),
        }
    }

    /// Session for a top-level window at `href` with in-process collaborators.
    pub fn detached(href: impl Into<String>) -> Self {
        Self::new(
            Arc::new(MemoryLocation::new(href)),
            Arc::new(TopLevelWindow::new()),
            Arc::new(MemoryRegistry::new()),
        )
    }

    /// Finalize `config`, build the context and load the identity from the cache.
    ///
    /// Unset redirect URIs default to the current page without its fragment.
    pub fn initialize<P>(&self, mut config: SessionConfig, provider: &P) -> Result<()>
    where
        P: ContextProvider + ?Sized,
    {
        if self.inner.get().is_some() {
            return Err(SessionError::AlreadyInitialized);
        }

        config.apply_default_redirects(&self.location.href());
        config.validate()?;

        let context = provider
            .create(&config)
            .map_err(|e| SessionError::Configuration(format!("{:#}", e)))?;

        self.windows.install_context(Arc::clone(&context));

        let client_id = config.client_id.clone();
        self.inner
            .set(Initialized { config, context })
            .map_err(|_| SessionError::AlreadyInitialized)?;

        self.refresh_identity()?;
        info!("Authentication session initialized for client {}", client_id);

        Ok(())
    }

    fn initialized(&self) -> Result<&Initialized> {
        self.inner.get().ok_or(SessionError::NotInitialized)
    }

    fn context(&self) -> Result<&dyn AuthenticationContext> {
        Ok(self.initialized()?.context.as_ref())
    }

    pub fn config(&self) -> Result<&SessionConfig> {
        Ok(&self.initialized()?.config)
    }

    /// Copy of the current identity.
    pub fn identity(&self) -> IdentitySnapshot {
        self.identity.current()
    }

    /// Live view of the identity; every refresh publishes a new snapshot.
    pub fn subscribe(&self) -> watch::Receiver<IdentitySnapshot> {
        self.identity.subscribe()
    }

    /// Registry that renewal continuations are parked in.
    pub fn registry(&self) -> &Arc<dyn ContinuationRegistry> {
        &self.registry
    }

    pub fn login(&self) -> Result<()> {
        self.context()?.login();
        Ok(())
    }

    pub fn is_login_in_progress(&self) -> Result<bool> {
        Ok(self.context()?.login_in_progress())
    }

    pub fn logout(&self) -> Result<()> {
        self.context()?.logout();
        Ok(())
    }

    /// Process an authentication response in the current URL fragment.
    ///
    /// Called on every page load. Responses that cannot be correlated with a
    /// pending request are ignored, not reported as errors.
    pub fn handle_redirect_callback(&self) -> Result<CallbackOutcome> {
        let init = self.initialized()?;
        let hash = self.location.hash();

        if !init.context.is_callback(&hash) {
            return Ok(CallbackOutcome::NotCallback);
        }

        let owner = resolve_owning_context(self.windows.as_ref());
        debug!("Handling authentication callback with {} context", owner.label());

        let request = owner.or_own(&init.context).request_info(&hash);
        init.context.save_token_from_hash(&request);

        let outcome = match request.request_type {
            RequestType::Login => {
                self.refresh_from_cache(init);
                CallbackOutcome::Login
            }
            RequestType::RenewToken => self.complete_renewal(init.context.as_ref(), &request),
            RequestType::Unknown => CallbackOutcome::Ignored(IgnoreReason::UnknownRequest),
        };

        if let CallbackOutcome::Ignored(reason) = &outcome {
            debug!("Ignoring authentication callback: {:?}", reason);
        }

        self.location.clear_hash();

        Ok(outcome)
    }

    fn complete_renewal(
        &self,
        context: &dyn AuthenticationContext,
        request: &RequestInfo,
    ) -> CallbackOutcome {
        if !request.state_match {
            return CallbackOutcome::Ignored(IgnoreReason::StateMismatch);
        }

        let token = request
            .access_token()
            .or_else(|| request.id_token())
            .map(str::to_string);

        if token.is_none() && request.error().is_none() {
            return CallbackOutcome::Ignored(IgnoreReason::EmptyResponse);
        }

        let state = request.state_response.clone();
        let Some(continuation) = self.registry.take(&state) else {
            return CallbackOutcome::Ignored(IgnoreReason::NoContinuation);
        };

        let error_description = context.error_description();
        match token {
            Some(token) => {
                continuation(error_description, Some(token));
                CallbackOutcome::Renewed { state }
            }
            None => {
                continuation(error_description, None);
                context.mark_renew_failed();
                warn!("Token renewal failed for state {}", state);
                CallbackOutcome::RenewFailed { state }
            }
        }
    }

    pub fn cached_token(&self, resource: &str) -> Result<Option<String>> {
        Ok(self.context()?.cached_token(resource))
    }

    /// Silently acquire a token for `resource`.
    ///
    /// Resolves once with the token, or with [`SessionError::Acquisition`]
    /// carrying the provider's message after it was logged by the context.
    pub async fn acquire_token(&self, resource: &str) -> Result<String> {
        let context = Arc::clone(&self.initialized()?.context);
        let (tx, rx) = oneshot::channel();

        let logger = Arc::downgrade(&context);
        let target = resource.to_string();
        context.acquire_token(
            resource,
            Box::new(move |result: Result<String, String>| {
                if let Err(e) = &result {
                    log_context_error(
                        &logger,
                        &format!("Error when acquiring token for resource: {}", target),
                        e,
                    );
                }
                let _ = tx.send(result);
            }),
        );

        match rx.await {
            Ok(Ok(token)) => Ok(token),
            Ok(Err(e)) => {
                warn!("Token acquisition failed for {}", resource);
                Err(SessionError::Acquisition(e))
            }
            Err(_) => Err(SessionError::Acquisition(format!(
                "token request for {} was dropped without a result",
                resource
            ))),
        }
    }

    /// Look up the signed-in user. Failures are logged and yield `None`.
    pub async fn get_user(&self) -> Result<Option<User>> {
        let context = Arc::clone(&self.initialized()?.context);
        let (tx, rx) = oneshot::channel();

        let logger = Arc::downgrade(&context);
        context.get_user(Box::new(move |result: Result<User, String>| {
            let user = match result {
                Ok(user) => Some(user),
                Err(e) => {
                    log_context_error(&logger, "Error when getting user", &e);
                    None
                }
            };
            let _ = tx.send(user);
        }));

        Ok(rx.await.ok().flatten())
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.context()?.clear_cache();
        Ok(())
    }

    pub fn clear_cache_for_resource(&self, resource: &str) -> Result<()> {
        self.context()?.clear_cache_for_resource(resource);
        Ok(())
    }

    pub fn info(&self, message: &str) -> Result<()> {
        self.context()?.info(message);
        Ok(())
    }

    pub fn verbose(&self, message: &str) -> Result<()> {
        self.context()?.verbose(message);
        Ok(())
    }

    pub fn resolve_resource_for_endpoint(&self, url: &str) -> Result<Option<String>> {
        Ok(self.context()?.resource_for_endpoint(url))
    }

    /// Recompute the identity from the cache using the login resource.
    pub fn refresh_identity(&self) -> Result<()> {
        let init = self.initialized()?;
        self.refresh_from_cache(init);
        Ok(())
    }

    fn refresh_from_cache(&self, init: &Initialized) {
        let snapshot = snapshot_from_cache(init.context.as_ref(), init.config.login_resource());
        debug!("Identity refreshed, authenticated: {}", snapshot.authenticated);
        self.identity.replace(snapshot);
    }
}

/// Build a complete snapshot from what the context has cached.
fn snapshot_from_cache(context: &dyn AuthenticationContext, resource: &str) -> IdentitySnapshot {
    let token = context.cached_token(resource).unwrap_or_default();
    let user = context.cached_user().unwrap_or_default();

    IdentitySnapshot {
        authenticated: !token.is_empty(),
        username: user.user_name,
        profile: user.profile,
        token: token.into(),
        error: context.login_error().unwrap_or_default(),
    }
}

fn log_context_error(context: &Weak<dyn AuthenticationContext>, message: &str, detail: &str) {
    if let Some(context) = context.upgrade() {
        context.error(message, detail);
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("initialized", &self.inner.get().is_some())
            .field("identity", &self.identity.current())
            .finish_non_exhaustive()
    }
}
