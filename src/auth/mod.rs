//! Authentication session built on an external authentication context.
//!
//! Provides the context trait, implicit-flow fragment handling, the identity
//! state container, and the session adapter itself.

pub mod context;
pub mod fragment;
pub mod identity;
pub mod session;
