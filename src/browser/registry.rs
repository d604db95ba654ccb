//! State-keyed registry of pending renewal continuations.
//!
//! A silent renewal finishes in a hidden iframe or popup, so the caller that
//! started it parks its continuation here under the request's state token.
//! The window that receives the response takes it back out and runs it.

use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

/// Continuation for a renewal: `(error_description, token)`.
pub type RenewContinuation = Box<dyn FnOnce(Option<String>, Option<String>) + Send>;

/// Store shared by every window taking part in a renewal.
///
/// State tokens must be unique per outstanding request.
pub trait ContinuationRegistry: Send + Sync {
    /// Register `continuation` under `state`, replacing any previous entry.
    fn insert(&self, state: &str, continuation: RenewContinuation);

    /// Remove and return the continuation for `state`.
    fn take(&self, state: &str) -> Option<RenewContinuation>;

    fn contains(&self, state: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop the continuation for `state` without running it.
    fn remove(&self, state: &str) -> bool {
        self.take(state).is_some()
    }
}

/// In-process registry.
#[derive(Default)]
pub struct MemoryRegistry {
    entries: Mutex<HashMap<String, RenewContinuation>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, RenewContinuation>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ContinuationRegistry for MemoryRegistry {
    fn insert(&self, state: &str, continuation: RenewContinuation) {
        if self.entries().insert(state.to_string(), continuation).is_some() {
            debug!("Replaced pending continuation for state {}", state);
        }
    }

    fn take(&self, state: &str) -> Option<RenewContinuation> {
        self.entries().remove(state)
    }

    fn contains(&self, state: &str) -> bool {
        self.entries().contains_key(state)
    }

    fn len(&self) -> usize {
        self.entries().len()
    }
}

impl std::fmt::Debug for MemoryRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryRegistry")
            .field("pending", &self.len())
            .finish()
    }
}
