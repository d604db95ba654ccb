//! Scriptable fakes shared by the unit tests.

use crate::auth::context::{AuthenticationContext, ContextRef, TokenCallback, User, UserCallback};
use crate::auth::fragment::RequestInfo;
use crate::browser::WindowHost;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct FakeState {
    pub tokens: HashMap<String, String>,
    pub user: Option<User>,
    pub login_error: Option<String>,
    pub error_description: Option<String>,
    pub login_state: Option<String>,
    pub renew_states: Vec<String>,
    pub renew_failed: bool,
    pub login_in_progress: bool,
    /// Outcome handed to the next `acquire_token` callback.
    pub acquire_result: Option<Result<String, String>>,
    pub user_result: Option<Result<User, String>>,
    pub endpoints: HashMap<String, String>,
    /// Every call, in order, for assertions.
    pub calls: Vec<String>,
    pub saved: Vec<RequestInfo>,
    pub logs: Vec<(String, String)>,
}

#[derive(Default)]
pub struct FakeContext {
    pub name: String,
    pub state: Mutex<FakeState>,
}

impl FakeContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    fn record(&self, call: impl Into<String>) {
        self.with(|s| s.calls.push(call.into()));
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn logs(&self) -> Vec<(String, String)> {
        self.with(|s| s.logs.clone())
    }
}

impl AuthenticationContext for FakeContext {
    fn login(&self) {
        self.record("login");
        self.with(|s| s.login_in_progress = true);
    }

    fn login_in_progress(&self) -> bool {
        self.with(|s| s.login_in_progress)
    }

    fn logout(&self) {
        self.record("logout");
    }

    fn request_info(&self, hash: &str) -> RequestInfo {
        self.record(format!("request_info:{}", self.name));
        self.with(|s| RequestInfo::from_hash(hash, s.login_state.as_deref(), &s.renew_states))
    }

    fn save_token_from_hash(&self, info: &RequestInfo) {
        self.record("save_token_from_hash");
        self.with(|s| s.saved.push(info.clone()));
    }

    fn cached_token(&self, resource: &str) -> Option<String> {
        self.with(|s| s.tokens.get(resource).cloned())
    }

    fn cached_user(&self) -> Option<User> {
        self.with(|s| s.user.clone())
    }

    fn login_error(&self) -> Option<String> {
        self.with(|s| s.login_error.clone())
    }

    fn error_description(&self) -> Option<String> {
        self.with(|s| s.error_description.clone())
    }

    fn mark_renew_failed(&self) {
        self.with(|s| s.renew_failed = true);
    }

    fn renew_failed(&self) -> bool {
        self.with(|s| s.renew_failed)
    }

    fn acquire_token(&self, resource: &str, callback: TokenCallback) {
        self.record(format!("acquire_token:{}", resource));
        let result = self.with(|s| s.acquire_result.take());
        if let Some(result) = result {
            callback(result);
        }
    }

    fn get_user(&self, callback: UserCallback) {
        self.record("get_user");
        let result = self.with(|s| s.user_result.take());
        if let Some(result) = result {
            callback(result);
        }
    }

    fn clear_cache(&self) {
        self.record("clear_cache");
        self.with(|s| s.tokens.clear());
    }

    fn clear_cache_for_resource(&self, resource: &str) {
        self.record(format!("clear_cache_for_resource:{}", resource));
        self.with(|s| s.tokens.remove(resource));
    }

    fn info(&self, message: &str) {
        self.with(|s| s.logs.push(("info".into(), message.into())));
    }

    fn verbose(&self, message: &str) {
        self.with(|s| s.logs.push(("verbose".into(), message.into())));
    }

    fn error(&self, message: &str, detail: &str) {
        self.with(|s| s.logs.push(("error".into(), format!("{} {}", message, detail))));
    }

    fn resource_for_endpoint(&self, url: &str) -> Option<String> {
        self.with(|s| {
            s.endpoints
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix.as_str()))
                .map(|(_, resource)| resource.clone())
        })
    }
}

/// Window host with configurable opener and parent contexts.
#[derive(Default)]
pub struct FakeWindows {
    pub opener: Option<ContextRef>,
    pub parent: Option<ContextRef>,
    pub installed: Mutex<Option<ContextRef>>,
}

impl WindowHost for FakeWindows {
    fn opener_context(&self) -> Option<ContextRef> {
        self.opener.clone()
    }

    fn parent_context(&self) -> Option<ContextRef> {
        self.parent.clone()
    }

    fn install_context(&self, context: ContextRef) {
        *self.installed.lock().unwrap() = Some(context);
    }
}

/// Whether two handles point at the same context instance.
pub fn same_context(a: &ContextRef, b: &ContextRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}
