//! Contract for the resource that backs a registered session.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use super::{Attributes, SessionId};
use crate::Result;

/// A session resource whose lifecycle is owned outside the registry.
///
/// The store only keeps shared handles to these. When a session is evicted
/// the store calls [`SessionHandle::invalidate`] to release the resource,
/// so implementations must tolerate being invalidated more than once.
pub trait SessionHandle: Send + Sync {
    /// Unique identifier; the store key.
    fn id(&self) -> &SessionId;

    /// Time the session was created.
    fn creation_time(&self) -> DateTime<Utc>;

    /// Time of the most recent access.
    fn last_accessed_time(&self) -> DateTime<Utc>;

    /// Maximum idle time before the session may be evicted.
    fn max_inactive_interval(&self) -> Duration;

    /// Snapshot of every attribute.
    fn attributes(&self) -> Result<Attributes>;

    /// Remove every attribute, keeping the session itself.
    fn clear_attributes(&self) -> Result<()>;

    /// Release the resource. Calling this on an already invalidated
    /// session must succeed or fail without side effects.
    fn invalidate(&self) -> Result<()>;

    /// Whether the idle time at `now` exceeds the inactive interval.
    fn is_inactive_at(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now - self.last_accessed_time();
        match TimeDelta::from_std(self.max_inactive_interval()) {
            Ok(limit) => elapsed > limit,
            // Interval too large to represent: never idle out.
            Err(_) => false,
        }
    }
}
