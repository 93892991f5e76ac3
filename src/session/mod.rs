//! Session management module.
//!
//! This module provides the session registry: identifiers, attribute
//! values, the resource contract the registry relies on, an in-memory
//! session implementation and the concurrent store itself.

mod attribute;
mod handle;
mod id;
mod listener;
mod record;
mod state;
mod store;

pub use attribute::{
    AttributeValue, Attributes, MESSAGE_KEY, SESSION_FOUND, SESSION_NOT_FOUND,
};
pub use handle::SessionHandle;
pub use id::SessionId;
pub use listener::SessionListener;
pub use record::{DestroyHook, Session, SessionConfig, DEFAULT_MAX_INACTIVE_INTERVAL};
pub use state::SessionState;
pub use store::{SessionStore, SweepOutcome};
