//! Denormalized view of the signed-in identity.

use crate::secret::SecretString;
use serde_json::{Map, Value};
use tokio::sync::watch;

/// Snapshot of the authenticated identity.
///
/// Always replaced as a whole; fields are never updated one at a time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentitySnapshot {
    /// True iff a non-empty token is cached for the login resource.
    pub authenticated: bool,
    pub username: String,
    pub profile: Map<String, Value>,
    pub token: SecretString,
    pub error: String,
}

impl IdentitySnapshot {
    pub fn error_message(&self) -> Option<&str> {
        if self.error.is_empty() {
            None
        } else {
            Some(&self.error)
        }
    }
}

/// State container for the current [`IdentitySnapshot`].
///
/// Readers either take a copy with [`IdentityStore::current`] or hold a
/// [`watch::Receiver`] that sees every published snapshot.
#[derive(Debug)]
pub struct IdentityStore {
    tx: watch::Sender<IdentitySnapshot>,
}

impl IdentityStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(IdentitySnapshot::default());
        Self { tx }
    }

    pub fn current(&self) -> IdentitySnapshot {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<IdentitySnapshot> {
        self.tx.subscribe()
    }

    /// Publish a complete snapshot.
    pub fn replace(&self, snapshot: IdentitySnapshot) {
        self.tx.send_replace(snapshot);
    }
}

impl Default for IdentityStore {
    fn default() -> Self {
        Self::new()
    }
}
