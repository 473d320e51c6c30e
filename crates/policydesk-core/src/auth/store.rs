//! Token store: the single owner of the persisted session.
//!
//! The session is written as three storage keys. Every operation runs under
//! one lock so readers never observe a half-written session, and a failed
//! write removes what it managed to write. Storage failures are logged and
//! reported as "no session" rather than returned to callers.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use super::session::{Session, UserIdentity};
use super::storage::{StorageBackend, StorageError};

const ACCESS_TOKEN_KEY: &str = "accessToken";
const REFRESH_TOKEN_KEY: &str = "refreshToken";
const USER_KEY: &str = "user";

const SESSION_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY];

pub struct TokenStore {
    backend: Arc<dyn StorageBackend>,
    lock: Mutex<()>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
        }
    }

    /// Store backed by process memory only.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(super::storage::MemoryStorage::new()))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The lock protects no data of its own, so a poisoned guard is still usable.
        self.lock.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace any existing session with `session`.
    pub fn save(&self, session: &Session) {
        let _guard = self.guard();
        if let Err(e) = self.write_session(session) {
            warn!(error = %e, "Failed to persist session, discarding partial write");
            self.remove_all();
        } else {
            debug!(user_id = session.user.id, "Session saved");
        }
    }

    /// The current session, or `None` if absent, incomplete, or unreadable.
    pub fn read(&self) -> Option<Session> {
        let _guard = self.guard();
        self.read_unlocked()
    }

    /// Remove the session. Safe to call when nothing is stored.
    pub fn clear(&self) {
        let _guard = self.guard();
        self.remove_all();
        debug!("Session cleared");
    }

    /// Overwrite the tokens after a refresh, keeping the stored identity.
    ///
    /// Returns `false` when there is no session to update (for example the
    /// user logged out while the exchange was in flight) or the write failed.
    pub fn update_tokens(&self, access_token: &str, refresh_token: Option<&str>) -> bool {
        let _guard = self.guard();
        let Some(mut session) = self.read_unlocked() else {
            return false;
        };
        session.access_token = access_token.to_string();
        if let Some(refresh) = refresh_token {
            session.refresh_token = refresh.to_string();
        }
        match self.write_session(&session) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "Failed to persist refreshed tokens, clearing session");
                self.remove_all();
                false
            }
        }
    }

    pub fn access_token(&self) -> Option<String> {
        self.read().map(|s| s.access_token)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read().map(|s| s.refresh_token)
    }

    pub fn user(&self) -> Option<UserIdentity> {
        self.read().map(|s| s.user)
    }

    fn write_session(&self, session: &Session) -> Result<(), StorageError> {
        let user = serde_json::to_string(&session.user)?;
        self.backend.set(ACCESS_TOKEN_KEY, &session.access_token)?;
        self.backend.set(REFRESH_TOKEN_KEY, &session.refresh_token)?;
        self.backend.set(USER_KEY, &user)?;
        Ok(())
    }

    fn read_unlocked(&self) -> Option<Session> {
        let fetch = |key: &str| match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "Session storage unreadable");
                None
            }
        };

        let access_token = fetch(ACCESS_TOKEN_KEY)?;
        let refresh_token = fetch(REFRESH_TOKEN_KEY)?;
        let user_blob = fetch(USER_KEY)?;
        let user = match serde_json::from_str::<UserIdentity>(&user_blob) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Stored user identity is corrupt");
                return None;
            }
        };

        Some(Session {
            access_token,
            refresh_token,
            user,
        })
    }

    fn remove_all(&self) {
        for key in SESSION_KEYS {
            if let Err(e) = self.backend.remove(key) {
                warn!(key, error = %e, "Failed to remove session key");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::auth::{FileStorage, MemoryStorage};

    fn session(access: &str) -> Session {
        Session {
            access_token: access.to_string(),
            refresh_token: "refresh-1".to_string(),
            user: UserIdentity {
                id: 42,
                email: "sam@example.com".to_string(),
                full_name: "Sam Lee".to_string(),
                roles: BTreeSet::from(["CUSTOMER".to_string()]),
            },
        }
    }

    /// Storage that can be switched to fail every write of one key.
    struct FlakyStorage {
        inner: MemoryStorage,
        fail_user_writes: AtomicBool,
    }

    impl StorageBackend for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            if key == USER_KEY && self.fail_user_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Unavailable("disk full".to_string()));
            }
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.inner.remove(key)
        }
    }

    struct BrokenStorage;

    impl StorageBackend for BrokenStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("no medium".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("no medium".to_string()))
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("no medium".to_string()))
        }
    }

    #[test]
    fn test_save_then_read() {
        let store = TokenStore::in_memory();
        assert!(store.read().is_none());
        store.save(&session("a1"));
        assert_eq!(store.read(), Some(session("a1")));
        store.save(&session("a2"));
        assert_eq!(store.access_token().as_deref(), Some("a2"));
    }

    #[test]
    fn test_save_clear_read_is_absent() {
        let store = TokenStore::in_memory();
        store.save(&session("a1"));
        store.clear();
        assert!(store.read().is_none());
        store.clear();
        assert!(store.read().is_none());
    }

    #[test]
    fn test_partial_write_is_rolled_back() {
        let backend = Arc::new(FlakyStorage {
            inner: MemoryStorage::new(),
            fail_user_writes: AtomicBool::new(true),
        });
        let store = TokenStore::new(backend.clone());
        store.save(&session("a1"));
        assert!(store.read().is_none());
        assert_eq!(backend.inner.get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert_eq!(backend.inner.get(REFRESH_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_token_without_identity_reads_absent() {
        let backend = Arc::new(MemoryStorage::new());
        backend.set(ACCESS_TOKEN_KEY, "a1").unwrap();
        backend.set(REFRESH_TOKEN_KEY, "r1").unwrap();
        let store = TokenStore::new(backend.clone());
        assert!(store.read().is_none());

        backend.set(USER_KEY, "{broken").unwrap();
        assert!(store.read().is_none());
    }

    #[test]
    fn test_unavailable_storage_fails_open() {
        let store = TokenStore::new(Arc::new(BrokenStorage));
        store.save(&session("a1"));
        assert!(store.read().is_none());
        store.clear();
        assert!(!store.update_tokens("a2", None));
    }

    #[test]
    fn test_update_tokens_preserves_identity() {
        let store = TokenStore::in_memory();
        store.save(&session("a1"));
        assert!(store.update_tokens("a2", None));
        let updated = store.read().unwrap();
        assert_eq!(updated.access_token, "a2");
        assert_eq!(updated.refresh_token, "refresh-1");
        assert_eq!(updated.user, session("a1").user);

        assert!(store.update_tokens("a3", Some("refresh-2")));
        assert_eq!(store.refresh_token().as_deref(), Some("refresh-2"));
    }

    #[test]
    fn test_update_tokens_without_session() {
        let store = TokenStore::in_memory();
        assert!(!store.update_tokens("a1", Some("r1")));
        assert!(store.read().is_none());
    }

    #[test]
    fn test_corrupt_session_file_can_be_cleared_and_replaced() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("session.json"), r#"{"accessToken":"a"#).unwrap();
        let store = TokenStore::new(Arc::new(FileStorage::new(dir.path().to_path_buf())));
        assert!(store.read().is_none());

        store.clear();
        assert!(!dir.path().join("session.json").exists());

        std::fs::write(dir.path().join("session.json"), "{").unwrap();
        store.save(&session("a1"));
        assert_eq!(store.read(), Some(session("a1")));
    }
}
