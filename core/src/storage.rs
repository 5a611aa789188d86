use std::cell::RefCell;
use std::collections::BTreeMap;

use thiserror::Error;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const USER_ID_KEY: &str = "userId";
pub const SESSION_ID_KEY: &str = "sessionId";
pub const USER_EMAIL_KEY: &str = "userEmail";

pub const SIGNUP_NAME_KEY: &str = "signup_name";
pub const SIGNUP_EMAIL_KEY: &str = "signup_email";
pub const SIGNUP_NUMBER_KEY: &str = "signup_number";

/// Every key that belongs to an established session.
pub const SESSION_KEYS: [&str; 4] = [AUTH_TOKEN_KEY, USER_ID_KEY, SESSION_ID_KEY, USER_EMAIL_KEY];

/// Keys holding an in-flight registration.
pub const SIGNUP_DRAFT_KEYS: [&str; 3] = [SIGNUP_NAME_KEY, SIGNUP_EMAIL_KEY, SIGNUP_NUMBER_KEY];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to write {key}: {reason}")]
    Write { key: String, reason: String },
    #[error("Failed to remove {key}: {reason}")]
    Remove { key: String, reason: String },
}

/// Persistent string key/value storage.
///
/// The browser build backs this with `localStorage`; everything else uses
/// [`MemoryStore`].
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::rc::Rc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }
}
