use chatdesk_core::storage::{KeyValueStore, StorageError};
use gloo_storage::errors::StorageError as BrowserStorageError;
use gloo_storage::{LocalStorage, Storage};

/// `localStorage`, shared by every tab on the origin.
pub struct BrowserStorage;

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match LocalStorage::get::<String>(key) {
            Ok(value) => Ok(Some(value)),
            Err(BrowserStorageError::KeyNotFound(_)) => Ok(None),
            Err(e) => Err(StorageError::Unavailable(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        LocalStorage::set(key, value).map_err(|e| StorageError::Write {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        LocalStorage::delete(key);
        Ok(())
    }
}
