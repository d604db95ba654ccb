//! Window topology and owning-context resolution.
//!
//! A renewal response can land in a popup or a hidden iframe. It must be
//! decoded by the context that issued the request, which lives in the
//! opener or the parent window.

use crate::auth::context::ContextRef;
use std::sync::Mutex;

/// The window the session runs in, and its relatives.
pub trait WindowHost: Send + Sync {
    /// Context held by the opener of the most recently opened child window.
    fn opener_context(&self) -> Option<ContextRef>;

    /// Context held by the parent frame, if this window is framed.
    fn parent_context(&self) -> Option<ContextRef>;

    /// Publish this window's context so child frames and popups can reach it.
    fn install_context(&self, context: ContextRef);
}

/// Which context owns an incoming callback.
#[derive(Clone)]
pub enum OwningContext {
    /// The session's own context (top-level redirect flow).
    Own,
    /// The opener's context (popup renewal).
    Opener(ContextRef),
    /// The parent frame's context (iframe renewal).
    Parent(ContextRef),
}

impl OwningContext {
    /// The context to decode with, falling back to `own`.
    pub fn or_own(self, own: &ContextRef) -> ContextRef {
        match self {
            Self::Own => ContextRef::clone(own),
            Self::Opener(ctx) | Self::Parent(ctx) => ctx,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Own => "own",
            Self::Opener(_) => "opener",
            Self::Parent(_) => "parent",
        }
    }
}

impl std::fmt::Debug for OwningContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Opener first, then parent, then the session's own context.
pub fn resolve_owning_context(windows: &dyn WindowHost) -> OwningContext {
    if let Some(ctx) = windows.opener_context() {
        OwningContext::Opener(ctx)
    } else if let Some(ctx) = windows.parent_context() {
        OwningContext::Parent(ctx)
    } else {
        OwningContext::Own
    }
}

/// A window with no opener and no parent.
#[derive(Default)]
pub struct TopLevelWindow {
    installed: Mutex<Option<ContextRef>>,
}

impl TopLevelWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// The context published by [`WindowHost::install_context`].
    pub fn installed_context(&self) -> Option<ContextRef> {
        self.installed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl WindowHost for TopLevelWindow {
    fn opener_context(&self) -> Option<ContextRef> {
        None
    }

    fn parent_context(&self) -> Option<ContextRef> {
        None
    }

    fn install_context(&self, context: ContextRef) {
        *self
            .installed
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(context);
    }
}
