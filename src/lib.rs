//! # session-registry
//!
//! In-memory registry of HTTP sessions with scheduled eviction.
//!
//! A web layer registers each session it creates in a [`SessionStore`] and
//! unregisters it when the session is destroyed. Background policies reclaim
//! sessions so the registry never grows without bound.
//!
//! ## Features
//!
//! - **Concurrent store**: Sharded locking, per-entry writes, safe to call
//!   from any request handler
//! - **Invalidate before remove**: Evicting a session always releases its
//!   resource first, and destroy hooks may call back into the store
//! - **Three eviction policies**: Inactivity sweep, full flush and a daily
//!   flush at a fixed local time
//! - **Lightweight**: Minimal dependencies, small binary size
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_registry::{
//!     handlers, ClientInfo, EvictionConfig, EvictionScheduler, SessionConfig, SessionHandle,
//!     SessionStore,
//! };
//!
//! #[tokio::main]
//! async fn main() -> session_registry::Result<()> {
//!     // Initialize logging
//!     session_registry::logging::try_init().ok();
//!
//!     // Create a session store and start eviction
//!     let store = Arc::new(SessionStore::new());
//!     let scheduler = EvictionScheduler::new(Arc::clone(&store), EvictionConfig::default());
//!     let handle = scheduler.start()?;
//!
//!     // Open a session for an incoming request
//!     let client = ClientInfo::new("127.0.0.1", None);
//!     let session = handlers::open_session(&store, None, &client, &SessionConfig::default())?;
//!     println!("Session {} opened, {} registered", session.id(), store.count());
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod eviction;
pub mod handlers;
pub mod logging;
pub mod session;

// Re-export commonly used types
pub use error::{RegistryError, Result};
pub use eviction::{
    run_policy, EvictionConfig, EvictionPolicy, EvictionReport, EvictionScheduler,
    SchedulerHandle,
};
pub use handlers::ClientInfo;
pub use session::{
    AttributeValue, Attributes, Session, SessionConfig, SessionHandle, SessionId,
    SessionListener, SessionState, SessionStore,
};
