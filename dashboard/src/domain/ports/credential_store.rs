//! Persistence of the session token and user record.
//!
//! Two seams live here. [`KeyValueStorage`] is the raw string store an
//! adapter provides (in memory, or one file per key on disk).
//! [`CredentialStore`] is what the session resolver talks to; it keeps the
//! `token` and `user` keys paired.
//!
//! `set` writes `user` first and `token` second. A reader that lands between
//! the two writes sees a `user` with no `token`, so that state reads as
//! absent but is left in place for the writer to complete.

use std::sync::Arc;

use tracing::{debug, warn};

use super::define_port_error;
use crate::domain::{AuthToken, CredentialRecord, Session};

/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "token";
/// Storage key holding the JSON-serialised [`Session`].
pub const USER_KEY: &str = "user";

define_port_error! {
    /// Errors surfaced by storage adapters.
    pub enum StorageError {
        /// Reading or writing the backing medium failed.
        Io { message: String } => "credential storage i/o failed: {message}",
        /// A record could not be serialised for storage.
        Serialization { message: String } => "credential serialisation failed: {message}",
    }
}

/// String key/value storage, modelled on browser local storage.
#[cfg_attr(test, mockall::automock)]
pub trait KeyValueStorage: Send + Sync {
    /// Value stored under `key`, if any.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Paired persistence of the [`CredentialRecord`].
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    /// The persisted record, or `None` when nothing valid is stored.
    fn get(&self) -> Option<CredentialRecord>;

    /// Persist `record`, replacing any previous one.
    fn set(&self, record: &CredentialRecord) -> Result<(), StorageError>;

    /// Remove the persisted record.
    fn clear(&self) -> Result<(), StorageError>;
}

/// [`CredentialStore`] over an optional [`KeyValueStorage`].
///
/// Without storage every read is `None` and every write is a no-op.
#[derive(Clone, Default)]
pub struct StorageCredentialStore {
    storage: Option<Arc<dyn KeyValueStorage>>,
}

impl StorageCredentialStore {
    /// Store records in `storage`.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    /// A store for hosts with no persistent storage.
    pub fn unavailable() -> Self {
        Self::default()
    }

    fn discard(storage: &dyn KeyValueStorage, reason: &str) {
        warn!(reason, "discarding stored credentials");
        if let Err(error) = clear_keys(storage) {
            warn!(%error, "failed to discard stored credentials");
        }
    }
}

fn clear_keys(storage: &dyn KeyValueStorage) -> Result<(), StorageError> {
    let token = storage.remove(TOKEN_KEY);
    let user = storage.remove(USER_KEY);
    token.and(user)
}

impl CredentialStore for StorageCredentialStore {
    fn get(&self) -> Option<CredentialRecord> {
        let storage = self.storage.as_deref()?;
        let read = storage
            .read(TOKEN_KEY)
            .and_then(|token| Ok((token, storage.read(USER_KEY)?)));
        let (token, user) = match read {
            Ok(pair) => pair,
            Err(error) => {
                warn!(%error, "failed to read stored credentials");
                return None;
            }
        };
        match (token, user) {
            (None, None) => None,
            (Some(token), Some(user)) => {
                let Some(token) = AuthToken::new(token) else {
                    Self::discard(storage, "stored token is blank");
                    return None;
                };
                match serde_json::from_str::<Session>(&user) {
                    Ok(user) => Some(CredentialRecord::new(token, user)),
                    Err(error) => {
                        warn!(%error, "stored user record does not decode");
                        Self::discard(storage, "stored user record is corrupt");
                        None
                    }
                }
            }
            (Some(_), None) => {
                Self::discard(storage, "token stored without a user record");
                None
            }
            (None, Some(_)) => {
                debug!("user record stored without a token; treating as absent");
                None
            }
        }
    }

    fn set(&self, record: &CredentialRecord) -> Result<(), StorageError> {
        let Some(storage) = self.storage.as_deref() else {
            return Ok(());
        };
        let user = serde_json::to_string(record.user())
            .map_err(|err| StorageError::serialization(err.to_string()))?;
        storage.write(USER_KEY, &user)?;
        if let Err(error) = storage.write(TOKEN_KEY, record.token().expose()) {
            if let Err(rollback) = storage.remove(USER_KEY) {
                warn!(error = %rollback, "failed to roll back user record");
            }
            return Err(error);
        }
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        match self.storage.as_deref() {
            Some(storage) => clear_keys(storage),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Pairing guarantees of the storage-backed credential store.
    use super::*;
    use crate::domain::{Role, UserId};
    use mockall::predicate::eq;
    use rstest::{fixture, rstest};
    use std::collections::BTreeMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MapStorage(Mutex<BTreeMap<String, String>>);

    impl MapStorage {
        fn with(entries: &[(&str, &str)]) -> Self {
            let map = entries
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect();
            Self(Mutex::new(map))
        }

        fn keys(&self) -> Vec<String> {
            self.0.lock().expect("storage lock").keys().cloned().collect()
        }
    }

    impl KeyValueStorage for MapStorage {
        fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.0.lock().expect("storage lock").get(key).cloned())
        }

        fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0
                .lock()
                .expect("storage lock")
                .insert(key.to_owned(), value.to_owned());
            Ok(())
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.0.lock().expect("storage lock").remove(key);
            Ok(())
        }
    }

    #[fixture]
    fn record() -> CredentialRecord {
        let user = Session::new(
            UserId::new("u-1").expect("user id"),
            "ops@example.com",
            None,
            Role::Admin,
        );
        CredentialRecord::new(AuthToken::new("tok-1").expect("token"), user)
    }

    #[rstest]
    fn set_then_get_returns_the_pair(record: CredentialRecord) {
        let storage = Arc::new(MapStorage::default());
        let store = StorageCredentialStore::new(storage.clone());
        store.set(&record).expect("set");
        assert_eq!(store.get(), Some(record));
        assert_eq!(storage.keys(), ["token", "user"]);
    }

    #[rstest]
    fn clear_removes_both_keys(record: CredentialRecord) {
        let storage = Arc::new(MapStorage::default());
        let store = StorageCredentialStore::new(storage.clone());
        store.set(&record).expect("set");
        store.clear().expect("clear");
        assert!(storage.keys().is_empty());
        assert_eq!(store.get(), None);
    }

    #[rstest]
    #[case(&[("token", "tok-1")])]
    #[case(&[("token", "tok-1"), ("user", "{not json")])]
    #[case(&[("token", " "), ("user", r#"{"userId":"u-1","email":"a@b.co","role":"admin"}"#)])]
    fn orphaned_or_corrupt_entries_read_as_absent_and_are_cleaned(
        #[case] entries: &[(&str, &str)],
    ) {
        let storage = Arc::new(MapStorage::with(entries));
        let store = StorageCredentialStore::new(storage.clone());
        assert_eq!(store.get(), None);
        assert!(storage.keys().is_empty());
    }

    #[rstest]
    fn user_without_token_is_absent_but_kept_for_the_writer(record: CredentialRecord) {
        let storage = Arc::new(MapStorage::default());
        let store = StorageCredentialStore::new(storage.clone());
        let user = serde_json::to_string(record.user()).expect("serialize user");
        storage.write(USER_KEY, &user).expect("user write");

        assert_eq!(store.get(), None);
        assert_eq!(storage.keys(), ["user"]);

        storage
            .write(TOKEN_KEY, record.token().expose())
            .expect("token write");
        assert_eq!(store.get(), Some(record));
    }

    #[rstest]
    fn unavailable_storage_is_inert(record: CredentialRecord) {
        let store = StorageCredentialStore::unavailable();
        assert_eq!(store.get(), None);
        store.set(&record).expect("set is a no-op");
        store.clear().expect("clear is a no-op");
        assert_eq!(store.get(), None);
    }

    #[rstest]
    fn failed_token_write_rolls_back_the_user(record: CredentialRecord) {
        let mut storage = MockKeyValueStorage::new();
        storage
            .expect_write()
            .with(eq(USER_KEY), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Ok(()));
        storage
            .expect_write()
            .with(eq(TOKEN_KEY), mockall::predicate::always())
            .times(1)
            .returning(|_, _| Err(StorageError::io("disk full")));
        storage
            .expect_remove()
            .with(eq(USER_KEY))
            .times(1)
            .returning(|_| Ok(()));
        let store = StorageCredentialStore::new(Arc::new(storage));
        let err = store.set(&record).expect_err("token write fails");
        assert_eq!(err, StorageError::io("disk full"));
    }

    #[rstest]
    fn clear_attempts_both_keys_when_one_fails() {
        let mut storage = MockKeyValueStorage::new();
        storage
            .expect_remove()
            .with(eq(TOKEN_KEY))
            .times(1)
            .returning(|_| Err(StorageError::io("locked")));
        storage
            .expect_remove()
            .with(eq(USER_KEY))
            .times(1)
            .returning(|_| Ok(()));
        let store = StorageCredentialStore::new(Arc::new(storage));
        assert_eq!(store.clear(), Err(StorageError::io("locked")));
    }

    #[rstest]
    fn read_failures_are_treated_as_absent() {
        let mut storage = MockKeyValueStorage::new();
        storage
            .expect_read()
            .returning(|_| Err(StorageError::io("permission denied")));
        storage.expect_remove().times(0);
        let store = StorageCredentialStore::new(Arc::new(storage));
        assert_eq!(store.get(), None);
    }
}
