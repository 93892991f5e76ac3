//! Session storage and management.

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, trace, warn};

use super::attribute::{MESSAGE_KEY, SESSION_FOUND, SESSION_NOT_FOUND};
use super::{Attributes, Session, SessionHandle, SessionId};
use crate::error::RegistryError;

/// Outcome of one eviction pass over the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Sessions looked at.
    pub scanned: usize,
    /// Sessions invalidated and removed.
    pub evicted: usize,
    /// Sessions whose invalidation failed. They are removed anyway.
    pub failed: usize,
}

/// Thread-safe registry of live sessions.
///
/// Rows live in a sharded map, so operations on one identifier are
/// serialized while different identifiers rarely contend. The store holds
/// shared handles; a handle returned by [`SessionStore::get_session`] may be
/// invalidated by a concurrent eviction at any time.
pub struct SessionStore<S = Session> {
    sessions: DashMap<SessionId, Arc<S>>,
}

impl<S: SessionHandle> SessionStore<S> {
    /// Create a new empty session store.
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a session under its own identifier.
    ///
    /// An existing entry with the same identifier is replaced.
    pub fn add_session(&self, session: Arc<S>) {
        let id = session.id().clone();
        debug!(session_id = %id, "Session registered");
        if self.sessions.insert(id, session).is_some() {
            trace!("Replaced existing session entry");
        }
    }

    /// Get the session with the given ID.
    pub fn get_session(&self, id: &str) -> Option<Arc<S>> {
        let found = self.sessions.get(id).map(|entry| Arc::clone(entry.value()));
        trace!(session_id = %id, found = found.is_some(), "Session lookup");
        found
    }

    /// Check if a session exists.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.contains_key(id)
    }

    /// Remove a session from the store.
    ///
    /// Removing an unknown ID is a no-op. The backing resource is left
    /// alone; use [`SessionStore::invalidate_session`] to release it too.
    pub fn remove_session(&self, id: &str) -> Option<Arc<S>> {
        let removed = self.sessions.remove(id).map(|(_, session)| session);
        if removed.is_some() {
            debug!(session_id = %id, "Session removed");
        }
        removed
    }

    /// Remove `session` only if it is still the entry under its ID.
    ///
    /// A different handle registered under the same ID is left in place.
    /// Returns whether the entry was removed.
    pub fn remove_session_if(&self, session: &Arc<S>) -> bool {
        let removed = self
            .sessions
            .remove_if(session.id().as_str(), |_, current| Arc::ptr_eq(current, session))
            .is_some();
        if removed {
            debug!(session_id = %session.id(), "Session removed");
        }
        removed
    }

    /// Invalidate a session and remove it from the store.
    ///
    /// Returns whether a session was found. An invalidation failure is
    /// logged and the entry is removed regardless.
    pub fn invalidate_session(&self, id: &str) -> bool {
        let Some(session) = self.get_session(id) else {
            return false;
        };
        if self.evict(session).is_err() {
            warn!(session_id = %id, "Session removed after failed invalidation");
        }
        true
    }

    /// Remove every attribute from a session, keeping the session live.
    ///
    /// No-op if the session is unknown.
    pub fn remove_attribute(&self, id: &str) {
        let Some(session) = self.get_session(id) else {
            return;
        };
        if let Err(e) = session.clear_attributes() {
            debug!(session_id = %id, error = %e, "Could not clear session attributes");
        }
    }

    /// Snapshot every attribute of a session plus a lookup status.
    ///
    /// The result always carries a `message` entry: `"Session found"`
    /// alongside the attributes, or `"Session not found"` on its own when
    /// the session is unknown or evicted. A registered handle that turns out
    /// to be invalidated already is unregistered here, so a later
    /// [`SessionStore::get_session`] agrees that it is gone.
    pub fn get_all_attributes(&self, id: &str) -> Attributes {
        let snapshot = self
            .get_session(id)
            .and_then(|session| match session.attributes() {
                Ok(attributes) => Some(attributes),
                Err(RegistryError::SessionInvalidated(_)) => {
                    debug!(session_id = %id, "Dropping invalidated session");
                    self.remove_session_if(&session);
                    None
                }
                Err(e) => {
                    debug!(session_id = %id, error = %e, "Session present but unreadable");
                    None
                }
            });

        match snapshot {
            Some(mut attributes) => {
                attributes.insert(MESSAGE_KEY.to_string(), SESSION_FOUND.into());
                attributes
            }
            None => {
                let mut attributes = Attributes::with_capacity(1);
                attributes.insert(MESSAGE_KEY.to_string(), SESSION_NOT_FOUND.into());
                attributes
            }
        }
    }

    /// Get the number of sessions in the store.
    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Check whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// List all session IDs.
    pub fn list_ids(&self) -> Vec<SessionId> {
        self.sessions.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Invalidate and remove every session matching a predicate.
    ///
    /// Handles are snapshotted first, so no shard lock is held while the
    /// predicate or `invalidate` run; an `invalidate` that calls back into
    /// the store cannot deadlock. Each entry is removed only if the map
    /// still holds the same handle that was invalidated, so a session
    /// registered concurrently under the same ID survives. A failed
    /// invalidation is counted and logged without stopping the sweep.
    pub fn evict_matching<F>(&self, predicate: F) -> SweepOutcome
    where
        F: Fn(&S) -> bool,
    {
        let snapshot: Vec<Arc<S>> = self
            .sessions
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();

        let mut outcome = SweepOutcome {
            scanned: snapshot.len(),
            ..SweepOutcome::default()
        };

        for session in snapshot {
            if !predicate(session.as_ref()) {
                continue;
            }
            if self.evict(session).is_err() {
                outcome.failed += 1;
            }
            outcome.evicted += 1;
        }

        outcome
    }

    /// Invalidate one handle, then drop its entry if it is still current.
    fn evict(&self, session: Arc<S>) -> crate::Result<()> {
        let result = session.invalidate();
        if let Err(ref e) = result {
            warn!(session_id = %session.id(), error = %e, "Failed to invalidate session");
        }
        self.remove_session_if(&session);
        result
    }
}

impl<S: SessionHandle> Default for SessionStore<S> {
    fn default() -> Self {
        Self::new()
    }
}
