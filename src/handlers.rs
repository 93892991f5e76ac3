//! Transport-agnostic request handlers.
//!
//! These are the calls a web layer makes on each request: open (or reuse)
//! the caller's session, and read-then-clear its attributes. They take the
//! request details as plain values, so any HTTP framework can wrap them.

use std::sync::{Arc, Weak};

use chrono::Utc;
use tracing::{debug, info};

use crate::session::{
    Attributes, Session, SessionConfig, SessionHandle, SessionListener, SessionStore,
};
use crate::Result;

/// Attribute holding the short user identifier.
pub const ATTR_USER_ID: &str = "userId";
/// Attribute marking the session as single-sign-on checked.
pub const ATTR_SSO_CHECK: &str = "ssoCheck";
/// Attribute holding the client address.
pub const ATTR_USER_IP: &str = "userIp";
/// Attribute holding the client user agent.
pub const ATTR_USER_AGENT: &str = "UserAgent";
/// Attribute holding the login timestamp.
pub const ATTR_LOGIN_TIME: &str = "loginTime";

/// What the request layer knows about the caller.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// Remote address of the client.
    pub remote_addr: String,
    /// `User-Agent` header, if sent.
    pub user_agent: Option<String>,
}

impl ClientInfo {
    pub fn new(remote_addr: impl Into<String>, user_agent: Option<String>) -> Self {
        Self {
            remote_addr: remote_addr.into(),
            user_agent,
        }
    }
}

/// Resume the caller's session, or create and register a new one.
///
/// A live session matching `existing` is touched and returned unchanged.
/// Otherwise a fresh session is created, seeded with the login attributes,
/// and announced to the store through [`SessionListener::session_created`].
/// Invalidating the new session later unregisters that handle, and only
/// that handle, from the store.
pub fn open_session(
    store: &Arc<SessionStore<Session>>,
    existing: Option<&str>,
    client: &ClientInfo,
    config: &SessionConfig,
) -> Result<Arc<Session>> {
    if let Some(session) = existing.and_then(|id| store.get_session(id)) {
        if session.touch().is_ok() {
            debug!(session_id = %session.id(), "Resumed session");
            return Ok(session);
        }
    }

    let registry = Arc::downgrade(store);
    let session = Arc::new_cyclic(|this: &Weak<Session>| {
        let this = this.clone();
        Session::create(config.clone()).with_destroy_hook(move |_| {
            // Only this handle is unregistered; a newer session under the
            // same ID stays.
            if let (Some(store), Some(session)) = (registry.upgrade(), this.upgrade()) {
                store.remove_session_if(&session);
            }
        })
    });

    let id = session.id().as_str();
    let user_id = id.get(3..10).unwrap_or(id).to_string();
    session.set_attribute(ATTR_USER_ID, user_id)?;
    session.set_attribute(ATTR_SSO_CHECK, true)?;
    session.set_attribute(ATTR_USER_IP, client.remote_addr.as_str())?;
    if let Some(agent) = &client.user_agent {
        session.set_attribute(ATTR_USER_AGENT, agent.as_str())?;
    }
    session.set_attribute(ATTR_LOGIN_TIME, Utc::now())?;

    store.session_created(Arc::clone(&session));
    info!(session_id = %session.id(), remote_addr = %client.remote_addr, "Session opened");
    Ok(session)
}

/// Return every attribute of a session with its lookup status, then clear
/// the attributes. The session itself stays registered.
pub fn take_attributes<S: SessionHandle>(store: &SessionStore<S>, id: &str) -> Attributes {
    let attributes = store.get_all_attributes(id);
    store.remove_attribute(id);
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{AttributeValue, MESSAGE_KEY, SESSION_FOUND, SESSION_NOT_FOUND};

    fn client() -> ClientInfo {
        ClientInfo::new("10.0.0.7", Some("Mozilla/5.0".to_string()))
    }

    #[test]
    fn test_open_session_seeds_attributes() {
        let store = Arc::new(SessionStore::new());
        let session = open_session(&store, None, &client(), &SessionConfig::default()).unwrap();
        let id = session.id().as_str();

        assert!(store.contains(id));
        let attrs = session.attributes().unwrap();
        assert_eq!(attrs[ATTR_USER_ID], AttributeValue::from(&id[3..10]));
        assert_eq!(attrs[ATTR_SSO_CHECK], AttributeValue::Bool(true));
        assert_eq!(attrs[ATTR_USER_IP], AttributeValue::from("10.0.0.7"));
        assert_eq!(attrs[ATTR_USER_AGENT], AttributeValue::from("Mozilla/5.0"));
        assert!(attrs[ATTR_LOGIN_TIME].as_timestamp().is_some());
    }

    #[test]
    fn test_open_session_without_user_agent() {
        let store = Arc::new(SessionStore::new());
        let info = ClientInfo::new("10.0.0.8", None);
        let session = open_session(&store, None, &info, &SessionConfig::default()).unwrap();

        assert!(session.attribute(ATTR_USER_AGENT).unwrap().is_none());
    }

    #[test]
    fn test_open_session_resumes_live_session() {
        let store = Arc::new(SessionStore::new());
        let first = open_session(&store, None, &client(), &SessionConfig::default()).unwrap();
        let again = open_session(
            &store,
            Some(first.id().as_str()),
            &client(),
            &SessionConfig::default(),
        )
        .unwrap();

        assert!(Arc::ptr_eq(&first, &again));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_open_session_replaces_unknown_id() {
        let store = Arc::new(SessionStore::new());
        let session = open_session(
            &store,
            Some("expired-session"),
            &client(),
            &SessionConfig::default(),
        )
        .unwrap();

        assert_ne!(session.id().as_str(), "expired-session");
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_invalidation_unregisters_session() {
        let store = Arc::new(SessionStore::new());
        let session = open_session(&store, None, &client(), &SessionConfig::default()).unwrap();

        session.invalidate().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_eviction_keeps_session_reregistered_under_same_id() {
        let store = Arc::new(SessionStore::new());
        let old = open_session(&store, None, &client(), &SessionConfig::default()).unwrap();
        let replacement = Arc::new(Session::new(old.id().clone(), SessionConfig::default()));

        // The old handle's destroy hook fires after the ID was taken over.
        let outcome = store.evict_matching(|_| {
            store.add_session(Arc::clone(&replacement));
            true
        });

        assert_eq!(outcome.evicted, 1);
        assert!(!old.is_valid());
        assert!(replacement.is_valid());
        let current = store.get_session(old.id().as_str()).unwrap();
        assert!(Arc::ptr_eq(&current, &replacement));
    }

    #[test]
    fn test_take_attributes() {
        let store = Arc::new(SessionStore::new());
        let session = open_session(&store, None, &client(), &SessionConfig::default()).unwrap();
        let id = session.id().to_string();

        let first = take_attributes(&store, &id);
        assert_eq!(first[MESSAGE_KEY], AttributeValue::from(SESSION_FOUND));
        assert_eq!(first.len(), 6);

        // Attributes are gone but the session is still there.
        let second = take_attributes(&store, &id);
        assert_eq!(second.len(), 1);
        assert_eq!(second[MESSAGE_KEY], AttributeValue::from(SESSION_FOUND));

        let missing = take_attributes(&store, "missing");
        assert_eq!(missing[MESSAGE_KEY], AttributeValue::from(SESSION_NOT_FOUND));
    }
}
