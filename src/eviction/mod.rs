//! Session eviction.
//!
//! Three independent policies reclaim sessions:
//!
//! - **Inactivity sweep**: evicts sessions idle past their inactive interval
//!   (hourly by default).
//! - **Full flush**: evicts every session on a short period (every minute by
//!   default).
//! - **Daily flush**: evicts every session once a day at a fixed local time
//!   (05:00 by default).
//!
//! Every eviction invalidates the session resource before removing its
//! store entry. Each policy can be run synchronously through
//! [`run_policy`], or on its schedule through [`EvictionScheduler`].
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use session_registry::{EvictionConfig, EvictionScheduler, SessionStore};
//!
//! #[tokio::main]
//! async fn main() -> session_registry::Result<()> {
//!     let store: Arc<SessionStore> = Arc::new(SessionStore::new());
//!     let handle = EvictionScheduler::new(Arc::clone(&store), EvictionConfig::default()).start()?;
//!
//!     // ... serve requests ...
//!
//!     handle.shutdown().await;
//!     Ok(())
//! }
//! ```

mod policy;
mod scheduler;

pub use policy::{
    daily_flush, evict_inactive, evict_inactive_at, full_flush, run_policy, EvictionPolicy,
    EvictionReport,
};
pub use scheduler::{
    next_daily_run, EvictionConfig, EvictionScheduler, SchedulerHandle,
    DEFAULT_DAILY_FLUSH_HOUR, DEFAULT_FULL_FLUSH, DEFAULT_INACTIVITY_SWEEP,
};
