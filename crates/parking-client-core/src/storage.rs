//! Persistence of the session and list preferences between runs
//!
//! Values are kept as strings under fixed keys. Every value is validated when
//! read back and anything malformed is discarded rather than trusted

use std::{
    collections::BTreeMap,
    fmt::Debug,
    sync::{Arc, Mutex},
};

use parking_shared::{
    const_config::{
        client::CLIENT_PAGE_SIZE_OPTIONS,
        storage::{
            STORAGE_ALL_KEYS, STORAGE_KEY_ACCOUNT, STORAGE_KEY_CHOSEN_USER_LEVEL,
            STORAGE_KEY_CURRENT_PAGE, STORAGE_KEY_ETAG, STORAGE_KEY_PAGE_SIZE,
            STORAGE_KEY_REFRESH_TOKEN, STORAGE_KEY_SORT_CONFIG, STORAGE_KEY_TOKEN,
            STORAGE_KEY_VERSION, STORAGE_SESSION_KEYS, STORAGE_VERSION,
        },
    },
    log_err_as_warn,
    req_args::{PageRequest, SortConfig},
    time::Timestamp,
    token::decode_claims,
    uac::{Account, Role, Session},
};
use secrecy::{ExposeSecret as _, SecretString};
use tracing::{info, instrument, warn};

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage is not available: {0}")]
    Unavailable(String),
    #[error("failed to write to storage: {0}")]
    Write(String),
}

/// Minimal string key value store the client persists through
pub trait KeyValueStore: Debug + Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Store that lives only as long as the process. Clones share the same data
#[derive(Clone, Default)]
pub struct MemoryStore {
    values: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything currently stored
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.values.lock().expect("mutex poisoned").clone()
    }
}

impl Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("keys", &stored_keys(&self.values))
            .finish()
    }
}

/// Names of the keys present. Values are never printed as they include the
/// tokens
fn stored_keys(values: &Mutex<BTreeMap<String, String>>) -> Vec<String> {
    values
        .lock()
        .map(|guard| guard.keys().cloned().collect())
        .unwrap_or_default()
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().expect("mutex poisoned").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .expect("mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().expect("mutex poisoned").remove(key);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use file_store::FileStore;

#[cfg(not(target_arch = "wasm32"))]
mod file_store {
    use std::{
        collections::BTreeMap,
        path::{Path, PathBuf},
        sync::Mutex,
    };

    use anyhow::Context as _;
    use tracing::warn;

    use super::{stored_keys, KeyValueStore, StorageError};

    /// Keeps the values as a json object in a single file. Every change is
    /// written through immediately
    pub struct FileStore {
        path: PathBuf,
        values: Mutex<BTreeMap<String, String>>,
    }

    impl FileStore {
        /// Opens the store at `path`. A missing file starts an empty store and
        /// an unreadable one is replaced on the next write
        #[tracing::instrument]
        pub fn open(path: &Path) -> anyhow::Result<Self> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create storage folder: {parent:?}"))?;
            }
            let values = match std::fs::read_to_string(path) {
                Ok(text) => serde_json::from_str(&text).unwrap_or_else(|err| {
                    warn!(?err, ?path, "ignoring unreadable storage file");
                    BTreeMap::new()
                }),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
                Err(err) => {
                    return Err(err).with_context(|| format!("failed to read {path:?}"));
                }
            };
            Ok(Self {
                path: path.to_path_buf(),
                values: Mutex::new(values),
            })
        }

        fn update<F>(&self, edit: F) -> Result<(), StorageError>
        where
            F: FnOnce(&mut BTreeMap<String, String>),
        {
            let mut guard = self.values.lock().expect("mutex poisoned");
            edit(&mut guard);
            let text = serde_json::to_string_pretty(&*guard)
                .map_err(|e| StorageError::Write(e.to_string()))?;
            std::fs::write(&self.path, text).map_err(|e| StorageError::Write(e.to_string()))
        }
    }

    impl std::fmt::Debug for FileStore {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("FileStore")
                .field("path", &self.path)
                .field("keys", &stored_keys(&self.values))
                .finish()
        }
    }

    impl KeyValueStore for FileStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Ok(self.values.lock().expect("mutex poisoned").get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            self.update(|values| {
                values.insert(key.to_string(), value.to_string());
            })
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            self.update(|values| {
                values.remove(key);
            })
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorage;

#[cfg(target_arch = "wasm32")]
mod local_storage {
    use super::{KeyValueStore, StorageError};

    /// The browser's local storage. Looked up on each use as the handle
    /// cannot be shared between threads
    #[derive(Debug, Default, Clone, Copy)]
    pub struct LocalStorage;

    impl LocalStorage {
        fn storage() -> Result<web_sys::Storage, StorageError> {
            web_sys::window()
                .ok_or_else(|| StorageError::Unavailable("no window".into()))?
                .local_storage()
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))?
                .ok_or_else(|| StorageError::Unavailable("local storage disabled".into()))
        }
    }

    impl KeyValueStore for LocalStorage {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            Self::storage()?
                .get_item(key)
                .map_err(|e| StorageError::Unavailable(format!("{e:?}")))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
            Self::storage()?
                .set_item(key, value)
                .map_err(|e| StorageError::Write(format!("{e:?}")))
        }

        fn remove(&self, key: &str) -> Result<(), StorageError> {
            Self::storage()?
                .remove_item(key)
                .map_err(|e| StorageError::Write(format!("{e:?}")))
        }
    }
}

/// What was recovered from storage at startup
#[derive(Debug)]
pub struct StoredSession {
    pub session: Session,
    pub account: Account,
    pub etag: Option<String>,
}

/// Typed access to the persisted values
pub struct PersistentState {
    store: Box<dyn KeyValueStore>,
}

impl Debug for PersistentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentState")
            .field("store", &self.store)
            .finish()
    }
}

impl PersistentState {
    /// Wraps `store`, wiping it first if it was written by an incompatible
    /// version
    #[instrument(name = "OPEN PERSISTENT STATE")]
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        let result = Self { store };
        let version = result.read(STORAGE_KEY_VERSION);
        if version.as_deref() != Some(STORAGE_VERSION) {
            if version.is_some() {
                info!(?version, expected = STORAGE_VERSION, "storage version changed");
            }
            for key in STORAGE_ALL_KEYS {
                result.delete(key);
            }
            result.write(STORAGE_KEY_VERSION, STORAGE_VERSION);
        }
        result
    }

    /// Current access token if any, used to authenticate requests
    pub fn token(&self) -> Option<SecretString> {
        self.read(STORAGE_KEY_TOKEN)
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
    }

    pub fn refresh_token(&self) -> Option<SecretString> {
        self.read(STORAGE_KEY_REFRESH_TOKEN)
            .filter(|token| !token.is_empty())
            .map(SecretString::from)
    }

    /// Rebuilds the session saved by a previous run
    ///
    /// Returns `None` and clears the session keys if anything is missing,
    /// malformed or already expired at `now`
    #[instrument(skip(self))]
    pub fn load_session(&self, now: Timestamp) -> Option<StoredSession> {
        let token = self.read(STORAGE_KEY_TOKEN)?;
        match self.try_load_session(token, now) {
            Ok(stored) => Some(stored),
            Err(reason) => {
                warn!(?reason, "discarding stored session");
                self.clear_session();
                None
            }
        }
    }

    fn try_load_session(&self, token: String, now: Timestamp) -> anyhow::Result<StoredSession> {
        use anyhow::Context as _;
        let claims = decode_claims(&token).context("stored token is unreadable")?;
        if now.has_reached(claims.expires_at()) {
            anyhow::bail!("stored token expired at {}", claims.expires_at());
        }
        let refresh_token = self
            .read(STORAGE_KEY_REFRESH_TOKEN)
            .context("refresh token missing")?;
        let account: Account = serde_json::from_str(
            &self
                .read(STORAGE_KEY_ACCOUNT)
                .context("account missing")?,
        )
        .context("stored account is malformed")?;
        let session = Session::new(
            &account,
            SecretString::from(token),
            SecretString::from(refresh_token),
            &claims,
            self.chosen_role(),
        )?;
        Ok(StoredSession {
            session,
            account,
            etag: self.etag(),
        })
    }

    #[instrument(skip_all, fields(login = %session.login))]
    pub fn save_session(&self, session: &Session, account: &Account, etag: Option<&str>) {
        self.save_tokens(&session.access_token, &session.refresh_token);
        self.save_account(account, etag);
        self.save_chosen_role(session.active_role);
    }

    pub fn save_tokens(&self, access_token: &SecretString, refresh_token: &SecretString) {
        self.write(STORAGE_KEY_TOKEN, access_token.expose_secret());
        self.write(STORAGE_KEY_REFRESH_TOKEN, refresh_token.expose_secret());
    }

    pub fn save_account(&self, account: &Account, etag: Option<&str>) {
        match serde_json::to_string(account) {
            Ok(json) => self.write(STORAGE_KEY_ACCOUNT, &json),
            Err(err) => warn!(?err, "failed to serialize account"),
        }
        match etag {
            Some(etag) => self.write(STORAGE_KEY_ETAG, etag),
            None => self.delete(STORAGE_KEY_ETAG),
        }
    }

    pub fn etag(&self) -> Option<String> {
        self.read(STORAGE_KEY_ETAG)
    }

    /// The role the user last chose. Kept across logins
    pub fn chosen_role(&self) -> Option<Role> {
        let text = self.read(STORAGE_KEY_CHOSEN_USER_LEVEL)?;
        match text.parse() {
            Ok(role) => Some(role),
            Err(_) => {
                warn!(?text, "discarding unknown stored role");
                self.delete(STORAGE_KEY_CHOSEN_USER_LEVEL);
                None
            }
        }
    }

    pub fn save_chosen_role(&self, role: Role) {
        self.write(STORAGE_KEY_CHOSEN_USER_LEVEL, role.as_ref());
    }

    /// Removes the credentials and the cached account
    #[instrument(skip(self))]
    pub fn clear_session(&self) {
        for key in STORAGE_SESSION_KEYS {
            self.delete(key);
        }
    }

    /// Paging preferences, falling back to defaults for anything invalid
    pub fn page_request(&self) -> PageRequest {
        let mut result = PageRequest::default();
        if let Some(page_number) = self
            .read(STORAGE_KEY_CURRENT_PAGE)
            .and_then(|text| text.parse().ok())
        {
            result.page_number = page_number;
        }
        if let Some(page_size) = self
            .read(STORAGE_KEY_PAGE_SIZE)
            .and_then(|text| text.parse().ok())
            .filter(|size| CLIENT_PAGE_SIZE_OPTIONS.contains(size))
        {
            result.page_size = page_size;
        }
        result.sort = self
            .read(STORAGE_KEY_SORT_CONFIG)
            .and_then(|text| serde_json::from_str::<SortConfig>(&text).ok());
        result
    }

    pub fn save_page_request(&self, page: &PageRequest) {
        self.write(STORAGE_KEY_CURRENT_PAGE, &page.page_number.to_string());
        self.write(STORAGE_KEY_PAGE_SIZE, &page.page_size.to_string());
        match page
            .sort
            .as_ref()
            .and_then(|sort| serde_json::to_string(sort).ok())
        {
            Some(json) => self.write(STORAGE_KEY_SORT_CONFIG, &json),
            None => self.delete(STORAGE_KEY_SORT_CONFIG),
        }
    }

    /// Storage failures are not fatal, the app keeps working for this run
    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(?err, key, "failed to read from storage");
                None
            }
        }
    }

    fn write(&self, key: &str, value: &str) {
        log_err_as_warn!(self.store.set(key, value));
    }

    fn delete(&self, key: &str) {
        log_err_as_warn!(self.store.remove(key));
    }
}

#[cfg(test)]
mod tests {
    use parking_shared::{
        req_args::SortDirection, time::Seconds, token::expose_internal::make_unsigned_token,
    };
    use rstest::{fixture, rstest};

    use super::*;

    const ACCOUNT_JSON: &str = r#"{
        "id": "0f8fad5b-d9cb-469f-a165-70867728950e",
        "login": "jerzybem",
        "email": "jerzy.bem@example.com",
        "firstName": "Jerzy",
        "lastName": "Bem",
        "userLevels": [
            {"level": "CLIENT", "active": true},
            {"level": "STAFF", "active": true}
        ],
        "active": true,
        "blocked": false,
        "verified": true
    }"#;

    const NOW: Timestamp = Timestamp::from_unix_secs(1_000);

    #[fixture]
    fn store() -> MemoryStore {
        MemoryStore::new()
    }

    fn fill_session(store: &MemoryStore, expires_at: Timestamp) {
        let token = make_unsigned_token("jerzybem", expires_at);
        store.set(STORAGE_KEY_VERSION, STORAGE_VERSION).unwrap();
        store.set(STORAGE_KEY_TOKEN, &token).unwrap();
        store.set(STORAGE_KEY_REFRESH_TOKEN, "r1").unwrap();
        store.set(STORAGE_KEY_ACCOUNT, ACCOUNT_JSON).unwrap();
        store.set(STORAGE_KEY_ETAG, "\"v1\"").unwrap();
    }

    #[rstest]
    fn valid_session_is_restored(store: MemoryStore) {
        fill_session(&store, NOW + Seconds::new(60));
        store.set(STORAGE_KEY_CHOSEN_USER_LEVEL, "STAFF").unwrap();
        let state = PersistentState::new(Box::new(store));

        let actual = state.load_session(NOW).unwrap();

        assert_eq!(actual.session.login.as_ref(), "jerzybem");
        assert_eq!(actual.session.active_role, Role::Staff);
        assert_eq!(actual.etag.as_deref(), Some("\"v1\""));
    }

    #[rstest]
    fn expired_session_is_discarded(store: MemoryStore) {
        fill_session(&store, NOW);
        let state = PersistentState::new(Box::new(store.clone()));

        let actual = state.load_session(NOW);

        assert!(actual.is_none());
        for key in STORAGE_SESSION_KEYS {
            assert!(store.get(key).unwrap().is_none(), "{key} not cleared");
        }
    }

    #[rstest]
    #[case::token(STORAGE_KEY_TOKEN, "not-a-jwt")]
    #[case::account(STORAGE_KEY_ACCOUNT, "{\"login\": 5}")]
    fn malformed_values_are_discarded(
        store: MemoryStore,
        #[case] key: &str,
        #[case] value: &str,
    ) {
        fill_session(&store, NOW + Seconds::new(60));
        store.set(key, value).unwrap();
        let state = PersistentState::new(Box::new(store.clone()));

        assert!(state.load_session(NOW).is_none());
        assert!(store.get(STORAGE_KEY_TOKEN).unwrap().is_none());
    }

    #[rstest]
    fn unknown_version_wipes_store(store: MemoryStore) {
        fill_session(&store, NOW + Seconds::new(60));
        store.set(STORAGE_KEY_VERSION, "0").unwrap();
        store.set(STORAGE_KEY_PAGE_SIZE, "20").unwrap();

        let state = PersistentState::new(Box::new(store.clone()));

        assert!(state.load_session(NOW).is_none());
        assert_eq!(state.page_request().page_size, 10);
        assert_eq!(
            store.get(STORAGE_KEY_VERSION).unwrap().as_deref(),
            Some(STORAGE_VERSION)
        );
    }

    #[rstest]
    fn clearing_session_keeps_preferences(store: MemoryStore) {
        fill_session(&store, NOW + Seconds::new(60));
        let state = PersistentState::new(Box::new(store.clone()));
        state.save_chosen_role(Role::Staff);

        state.clear_session();

        assert_eq!(state.chosen_role(), Some(Role::Staff));
        assert!(state.token().is_none());
        assert!(state.etag().is_none());
    }

    #[rstest]
    fn unknown_role_is_dropped(store: MemoryStore) {
        store.set(STORAGE_KEY_CHOSEN_USER_LEVEL, "OWNER").unwrap();
        store.set(STORAGE_KEY_VERSION, STORAGE_VERSION).unwrap();
        let state = PersistentState::new(Box::new(store.clone()));

        assert_eq!(state.chosen_role(), None);
        assert!(store.get(STORAGE_KEY_CHOSEN_USER_LEVEL).unwrap().is_none());
    }

    #[rstest]
    fn page_request_survives_reload(store: MemoryStore) {
        let state = PersistentState::new(Box::new(store.clone()));
        let mut page = PageRequest::default();
        page.sort_by("login");
        page.page_number = 4;
        page.page_size = 20;

        state.save_page_request(&page);
        let reloaded = PersistentState::new(Box::new(store));

        let actual = reloaded.page_request();
        assert_eq!(actual, page);
        assert_eq!(actual.sort.unwrap().direction, SortDirection::Asc);
    }

    #[rstest]
    #[case::not_offered("7")]
    #[case::not_a_number("lots")]
    fn invalid_page_size_falls_back(store: MemoryStore, #[case] size: &str) {
        store.set(STORAGE_KEY_VERSION, STORAGE_VERSION).unwrap();
        store.set(STORAGE_KEY_PAGE_SIZE, size).unwrap();
        let state = PersistentState::new(Box::new(store));

        assert_eq!(state.page_request().page_size, 10);
    }

    #[rstest]
    fn debug_output_hides_tokens(store: MemoryStore) {
        let state = PersistentState::new(Box::new(store.clone()));
        state.save_tokens(
            &SecretString::from("ACCESS-SECRET".to_string()),
            &SecretString::from("REFRESH-SECRET".to_string()),
        );

        let actual = format!("{state:?} {store:?}");

        assert!(!actual.contains("ACCESS-SECRET"), "{actual}");
        assert!(!actual.contains("REFRESH-SECRET"), "{actual}");
        assert!(actual.contains(STORAGE_KEY_REFRESH_TOKEN), "{actual}");
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn file_store_persists_between_opens() {
        let path = std::env::temp_dir()
            .join(format!("parking-client-core-{}", std::process::id()))
            .join("storage.json");
        {
            let store = FileStore::open(&path).unwrap();
            store.set("a", "1").unwrap();
            store.set("b", "2").unwrap();
            store.remove("b").unwrap();
        }

        let reopened = FileStore::open(&path).unwrap();

        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(reopened.get("b").unwrap(), None);
        assert!(!format!("{reopened:?}").contains("\"1\""));
        std::fs::remove_file(&path).unwrap();
    }
}
