//! Browser collaborators the session talks to.
//!
//! Each is a trait so hosts without a real browser (and tests) can supply
//! their own location, window topology, and continuation registry.

pub mod location;
pub mod registry;
pub mod window;

pub use location::{Location, MemoryLocation};
pub use registry::{ContinuationRegistry, MemoryRegistry, RenewContinuation};
pub use window::{resolve_owning_context, OwningContext, TopLevelWindow, WindowHost};
