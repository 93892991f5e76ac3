//! Lifecycle notifications from the request-handling layer.

use std::sync::Arc;

use super::{SessionHandle, SessionStore};

/// Receives session lifecycle events from whoever owns the sessions.
///
/// A web container calls `session_created` once per new identifier and
/// `session_destroyed` once the underlying resource has been torn down.
pub trait SessionListener<S>: Send + Sync {
    /// A new session was established.
    fn session_created(&self, session: Arc<S>);

    /// The session resource was destroyed; forget it.
    fn session_destroyed(&self, id: &str);
}

impl<S: SessionHandle> SessionListener<S> for SessionStore<S> {
    fn session_created(&self, session: Arc<S>) {
        self.add_session(session);
    }

    fn session_destroyed(&self, id: &str) {
        // The resource is already gone, so only the entry is dropped.
        self.remove_session(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Session, SessionConfig};

    #[test]
    fn test_created_then_destroyed() {
        let store: SessionStore = SessionStore::new();
        let session = Arc::new(Session::create(SessionConfig::default()));
        let id = session.id().to_string();

        store.session_created(Arc::clone(&session));
        assert!(store.get_session(&id).is_some());

        store.session_destroyed(&id);
        assert!(store.get_session(&id).is_none());

        // Destroy notifications for unknown sessions are harmless.
        store.session_destroyed(&id);
    }

    #[test]
    fn test_destroy_hook_notifies_listener() {
        let store: Arc<SessionStore> = Arc::new(SessionStore::new());
        let listener: Arc<dyn SessionListener<Session>> = store.clone();

        let session = Arc::new(
            Session::create(SessionConfig::default())
                .with_destroy_hook(move |id| listener.session_destroyed(id.as_str())),
        );
        let id = session.id().to_string();
        store.session_created(Arc::clone(&session));

        session.invalidate().unwrap();
        assert!(!store.contains(&id));
    }
}
