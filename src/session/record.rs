//! In-memory session resource.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::{AttributeValue, Attributes, SessionHandle, SessionId, SessionState};
use crate::error::RegistryError;
use crate::Result;

/// Default idle timeout, matching the common servlet container default.
pub const DEFAULT_MAX_INACTIVE_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Called once with the session ID when a session is invalidated.
pub type DestroyHook = Box<dyn Fn(&SessionId) + Send + Sync>;

/// Configuration for creating a new session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Idle time after which the inactivity sweep may evict the session.
    pub max_inactive_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_inactive_interval: DEFAULT_MAX_INACTIVE_INTERVAL,
        }
    }
}

impl SessionConfig {
    /// Set the idle timeout.
    pub fn with_max_inactive_interval(mut self, interval: Duration) -> Self {
        self.max_inactive_interval = interval;
        self
    }
}

#[derive(Debug)]
struct SessionInner {
    state: SessionState,
    last_accessed: DateTime<Utc>,
    attributes: Attributes,
}

/// An HTTP session held in memory.
///
/// All mutable state sits behind one mutex, so a `Session` can be shared
/// through an `Arc` between request handlers and the eviction sweeps.
pub struct Session {
    id: SessionId,
    created_at: DateTime<Utc>,
    max_inactive_interval: Duration,
    inner: Mutex<SessionInner>,
    on_destroy: Option<DestroyHook>,
}

impl Session {
    /// Create a new session with the given ID and configuration.
    pub fn new(id: SessionId, config: SessionConfig) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            max_inactive_interval: config.max_inactive_interval,
            inner: Mutex::new(SessionInner {
                state: SessionState::Active,
                last_accessed: now,
                attributes: Attributes::new(),
            }),
            on_destroy: None,
        }
    }

    /// Create a session with a freshly generated ID.
    pub fn create(config: SessionConfig) -> Self {
        Self::new(SessionId::generate(), config)
    }

    /// Register a hook fired when the session is invalidated.
    ///
    /// This is where a container reports "session destroyed" back to the
    /// registry. The hook runs without any session or store lock held.
    pub fn with_destroy_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SessionId) + Send + Sync + 'static,
    {
        self.on_destroy = Some(Box::new(hook));
        self
    }

    /// Override the last access time, e.g. when adopting a session that
    /// was already in use elsewhere.
    pub fn with_last_accessed(self, at: DateTime<Utc>) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.last_accessed = at;
        }
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, SessionInner>> {
        self.inner.lock().map_err(|_| RegistryError::LockPoisoned)
    }

    fn lock_live(&self) -> Result<MutexGuard<'_, SessionInner>> {
        let inner = self.lock()?;
        if inner.state.is_terminal() {
            return Err(RegistryError::SessionInvalidated(self.id.to_string()));
        }
        Ok(inner)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.lock()
            .map(|inner| inner.state)
            .unwrap_or(SessionState::Invalidated)
    }

    /// Whether the session has not been invalidated.
    pub fn is_valid(&self) -> bool {
        self.state().is_live()
    }

    /// Record an access. The timestamp never moves backwards.
    pub fn touch(&self) -> Result<()> {
        self.touch_at(Utc::now())
    }

    /// Record an access at the given time. Older timestamps are ignored.
    pub fn touch_at(&self, at: DateTime<Utc>) -> Result<()> {
        let mut inner = self.lock_live()?;
        if at > inner.last_accessed {
            inner.last_accessed = at;
        }
        Ok(())
    }

    /// Get a single attribute.
    pub fn attribute(&self, name: &str) -> Result<Option<AttributeValue>> {
        Ok(self.lock_live()?.attributes.get(name).cloned())
    }

    /// Set an attribute, replacing any previous value.
    pub fn set_attribute(
        &self,
        name: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Result<()> {
        self.lock_live()?
            .attributes
            .insert(name.into(), value.into());
        Ok(())
    }

    /// Remove a single attribute, returning its previous value.
    pub fn remove_named_attribute(&self, name: &str) -> Result<Option<AttributeValue>> {
        Ok(self.lock_live()?.attributes.remove(name))
    }

    /// Names of every attribute currently set.
    pub fn attribute_names(&self) -> Result<Vec<String>> {
        Ok(self.lock_live()?.attributes.keys().cloned().collect())
    }
}

impl SessionHandle for Session {
    fn id(&self) -> &SessionId {
        &self.id
    }

    fn creation_time(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn last_accessed_time(&self) -> DateTime<Utc> {
        self.lock()
            .map(|inner| inner.last_accessed)
            .unwrap_or(self.created_at)
    }

    fn max_inactive_interval(&self) -> Duration {
        self.max_inactive_interval
    }

    fn attributes(&self) -> Result<Attributes> {
        Ok(self.lock_live()?.attributes.clone())
    }

    fn clear_attributes(&self) -> Result<()> {
        self.lock_live()?.attributes.clear();
        Ok(())
    }

    fn invalidate(&self) -> Result<()> {
        {
            let mut inner = self.lock()?;
            if inner.state.is_terminal() {
                return Ok(());
            }
            debug_assert!(inner.state.can_transition_to(SessionState::Invalidated));
            inner.state = SessionState::Invalidated;
            inner.attributes.clear();
        }

        debug!(session_id = %self.id, "Session invalidated");
        if let Some(hook) = &self.on_destroy {
            hook(&self.id);
        }
        Ok(())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("created_at", &self.created_at)
            .field("max_inactive_interval", &self.max_inactive_interval)
            .field("inner", &self.inner)
            .field("on_destroy", &self.on_destroy.is_some())
            .finish()
    }
}
