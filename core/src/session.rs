//! The single source of truth for "is this client authenticated".
//!
//! Views never touch the storage backend directly: they go through
//! [`SessionStore`], which writes the session fields as one unit and
//! publishes a [`SessionEvent`] to every subscriber after each change.
//!
//! Changes made by another tab reach this store only through
//! [`SessionStore::sync_external_change`], which the browser build wires to
//! the `storage` event. That path is eventually consistent: the last writer
//! wins and there is no ordering guarantee relative to this tab's own reads.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::storage::{
    KeyValueStore, StorageError, AUTH_TOKEN_KEY, SESSION_ID_KEY, SESSION_KEYS, SIGNUP_DRAFT_KEYS,
    SIGNUP_EMAIL_KEY, SIGNUP_NAME_KEY, SIGNUP_NUMBER_KEY, USER_EMAIL_KEY, USER_ID_KEY,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub auth_token: String,
    pub user_id: String,
    pub session_id: String,
    pub user_email: String,
}

/// Registration fields kept while the account waits for verification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupDraft {
    pub name: String,
    pub email: String,
    pub number: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Established,
    Cleared,
    /// The backend rejected the stored token.
    TokenEvicted,
    /// Another tab mutated persistent storage.
    ExternalChange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(SessionEvent)>;

struct Inner {
    backend: Box<dyn KeyValueStore>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
    next_id: Cell<u64>,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Rc<Inner>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("authenticated", &self.is_authenticated())
            .field("subscribers", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl SessionStore {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            inner: Rc::new(Inner {
                backend: Box::new(backend),
                listeners: RefCell::new(Vec::new()),
                next_id: Cell::new(0),
            }),
        }
    }

    /// Authentication is exactly token presence. A revoked token still
    /// counts until the backend answers 401.
    pub fn is_authenticated(&self) -> bool {
        matches!(self.token(), Some(token) if !token.is_empty())
    }

    pub fn token(&self) -> Option<String> {
        self.read(AUTH_TOKEN_KEY)
    }

    pub fn user_id(&self) -> Option<String> {
        self.read(USER_ID_KEY)
    }

    /// A blank id counts as missing.
    pub fn session_id(&self) -> Option<String> {
        self.read(SESSION_ID_KEY).filter(|id| !id.is_empty())
    }

    pub fn user_email(&self) -> Option<String> {
        self.read(USER_EMAIL_KEY)
    }

    /// Returns the full session when all four fields are stored.
    pub fn get(&self) -> Option<Session> {
        Some(Session {
            auth_token: self.token()?,
            user_id: self.user_id()?,
            session_id: self.read(SESSION_ID_KEY)?,
            user_email: self.user_email()?,
        })
    }

    pub fn set_session(&self, session: &Session) -> Result<(), StorageError> {
        let backend = &self.inner.backend;
        backend.set(USER_ID_KEY, &session.user_id)?;
        backend.set(SESSION_ID_KEY, &session.session_id)?;
        backend.set(USER_EMAIL_KEY, &session.user_email)?;
        // token last: a half-written session is never reported as authenticated
        backend.set(AUTH_TOKEN_KEY, &session.auth_token)?;

        tracing::info!(user_id = %session.user_id, "session established");
        self.publish(SessionEvent::Established);
        Ok(())
    }

    /// Removes every session and signup-draft key. All removals are attempted
    /// even if one fails; the first failure is returned.
    pub fn clear(&self) -> Result<(), StorageError> {
        let mut first_error = None;
        for key in SESSION_KEYS.iter().chain(SIGNUP_DRAFT_KEYS.iter()) {
            if let Err(e) = self.inner.backend.remove(key) {
                tracing::warn!(key, error = %e, "failed to remove session key");
                first_error.get_or_insert(e);
            }
        }

        tracing::info!("session cleared");
        self.publish(SessionEvent::Cleared);
        first_error.map_or(Ok(()), Err)
    }

    pub fn evict_token(&self) -> Result<(), StorageError> {
        self.inner.backend.remove(AUTH_TOKEN_KEY)?;
        tracing::warn!("stored token evicted after 401");
        self.publish(SessionEvent::TokenEvicted);
        Ok(())
    }

    pub fn sync_external_change(&self) {
        tracing::debug!("storage changed in another tab");
        self.publish(SessionEvent::ExternalChange);
    }

    pub fn save_signup_draft(&self, draft: &SignupDraft) -> Result<(), StorageError> {
        let backend = &self.inner.backend;
        backend.set(SIGNUP_NAME_KEY, &draft.name)?;
        backend.set(SIGNUP_EMAIL_KEY, &draft.email)?;
        backend.set(SIGNUP_NUMBER_KEY, &draft.number)
    }

    pub fn signup_draft(&self) -> Option<SignupDraft> {
        Some(SignupDraft {
            name: self.read(SIGNUP_NAME_KEY)?,
            email: self.read(SIGNUP_EMAIL_KEY)?,
            number: self.read(SIGNUP_NUMBER_KEY)?,
        })
    }

    pub fn clear_signup_draft(&self) -> Result<(), StorageError> {
        for key in SIGNUP_DRAFT_KEYS {
            self.inner.backend.remove(key)?;
        }
        Ok(())
    }

    pub fn subscribe(&self, listener: impl Fn(SessionEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.inner.next_id.get());
        self.inner.next_id.set(id.0 + 1);
        self.inner
            .listeners
            .borrow_mut()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(existing, _)| *existing != id);
    }

    fn publish(&self, event: SessionEvent) {
        // snapshot so listeners may subscribe or unsubscribe while handling
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.inner.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read session key");
                None
            }
        }
    }
}
