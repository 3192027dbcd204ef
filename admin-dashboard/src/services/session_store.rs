use crate::models::Identity;
use crate::services::identity::IdentityLookup;
use crate::services::session_storage::SessionStorage;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;
use time::{Duration, OffsetDateTime};

/// Name of both the session cookie and the durable storage entry.
pub const SESSION_KEY: &str = "adminUser";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Loading,
    Ready(Option<Identity>),
}

/// Attributes of the `adminUser` cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub max_age: Duration,
    pub secure: bool,
}

impl Default for SessionCookie {
    fn default() -> Self {
        Self {
            max_age: Duration::hours(24),
            secure: false,
        }
    }
}

impl SessionCookie {
    pub fn issue(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_KEY, value))
            .path("/")
            .max_age(self.max_age)
            .secure(self.secure)
            .build()
    }

    pub fn expired(&self) -> Cookie<'static> {
        Cookie::build((SESSION_KEY, ""))
            .path("/")
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }
}

/// Authentication state of one client, mirrored into durable storage (read by
/// pages) and the `adminUser` cookie (read by the route guard).
///
/// Cookie changes accumulate in the jar; return [`SessionStore::into_jar`]
/// with the response so they reach the browser.
pub struct SessionStore<S> {
    identities: Arc<dyn IdentityLookup>,
    storage: S,
    jar: CookieJar,
    cookie: SessionCookie,
    state: SessionState,
}

impl<S: SessionStorage> SessionStore<S> {
    pub fn new(
        identities: Arc<dyn IdentityLookup>,
        storage: S,
        jar: CookieJar,
        cookie: SessionCookie,
    ) -> Self {
        Self {
            identities,
            storage,
            jar,
            cookie,
            state: SessionState::Uninitialized,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            SessionState::Ready(identity) => identity.as_ref(),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        !matches!(self.state, SessionState::Ready(_))
    }

    pub fn jar(&self) -> &CookieJar {
        &self.jar
    }

    pub fn into_jar(self) -> CookieJar {
        self.jar
    }

    /// Resolve the session from durable storage. Missing or unreadable data
    /// means "no session"; the loading flag is cleared either way.
    pub async fn restore_session(&mut self) {
        self.state = SessionState::Loading;

        let identity = match self.storage.read(SESSION_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Identity>(&raw) {
                Ok(identity) => Some(identity),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to restore session: stored identity is malformed");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::error!(error = %e, "Failed to restore session");
                None
            }
        };

        self.state = SessionState::Ready(identity);
    }

    /// Returns `false` without touching the session, storage or cookie when
    /// the credentials do not match or the identity cannot be persisted.
    pub async fn login(&mut self, email: &str, password: &str) -> bool {
        let previous = std::mem::replace(&mut self.state, SessionState::Loading);

        match self.establish(email, password).await {
            Some(identity) => {
                tracing::info!(
                    user_id = %identity.id,
                    email = %identity.email,
                    role = %identity.role,
                    "User logged in successfully"
                );
                self.state = SessionState::Ready(Some(identity));
                true
            }
            None => {
                self.state = previous;
                false
            }
        }
    }

    async fn establish(&mut self, email: &str, password: &str) -> Option<Identity> {
        let identity = match self.identities.find_by_credentials(email, password).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                tracing::info!(email = %email, "Login rejected: invalid email or password");
                return None;
            }
            Err(e) => {
                tracing::error!(error = %e, "Login failed: identity lookup error");
                return None;
            }
        };

        let serialized = match serde_json::to_string(&identity) {
            Ok(serialized) => serialized,
            Err(e) => {
                tracing::error!(error = %e, "Login failed: identity could not be serialized");
                return None;
            }
        };

        // Storage first: the cookie is only issued once the durable copy exists.
        if let Err(e) = self.storage.write(SESSION_KEY, serialized.clone()).await {
            tracing::error!(error = %e, "Login failed: session could not be stored");
            return None;
        }

        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(self.cookie.issue(serialized));

        Some(identity)
    }

    pub async fn logout(&mut self) {
        if let Some(identity) = self.identity() {
            tracing::info!(user_id = %identity.id, "User logged out");
        }

        self.state = SessionState::Ready(None);

        if let Err(e) = self.storage.remove(SESSION_KEY).await {
            tracing::warn!(error = %e, "Failed to remove stored session during logout");
        }

        let jar = std::mem::take(&mut self.jar);
        self.jar = jar.add(self.cookie.expired());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::route_guard::{self, GuardDecision};
    use crate::models::Role;
    use crate::services::identity::MockCredentialTable;
    use crate::services::session_storage::{MemoryStorage, StorageError};
    use async_trait::async_trait;

    fn store(storage: MemoryStorage) -> SessionStore<MemoryStorage> {
        SessionStore::new(
            Arc::new(MockCredentialTable::new(std::time::Duration::ZERO)),
            storage,
            CookieJar::new(),
            SessionCookie::default(),
        )
    }

    fn guard(jar: &CookieJar, path: &str) -> GuardDecision {
        route_guard::evaluate(path, jar.get(SESSION_KEY).map(|c| c.value()))
    }

    #[test]
    fn test_new_store_is_loading_without_identity() {
        let store = store(MemoryStorage::new());
        assert_eq!(store.state(), &SessionState::Uninitialized);
        assert!(store.is_loading());
        assert!(store.identity().is_none());
    }

    #[tokio::test]
    async fn test_login_sets_session_storage_and_cookie() {
        let storage = MemoryStorage::new();
        let mut store = store(storage.clone());
        store.restore_session().await;

        assert!(store.login("admin@example.com", "password").await);

        let identity = store.identity().cloned().expect("identity set");
        assert_eq!(identity.id, "1");
        assert_eq!(identity.role, Role::Admin);
        assert!(!store.is_loading());

        let stored: Identity = serde_json::from_str(&storage.get(SESSION_KEY).unwrap()).unwrap();
        assert_eq!(stored, identity);

        let cookie = store.jar().get(SESSION_KEY).expect("cookie set");
        let from_cookie: Identity = serde_json::from_str(cookie.value()).unwrap();
        assert_eq!(from_cookie, identity);
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(86_400)));
    }

    #[tokio::test]
    async fn test_login_with_wrong_password_changes_nothing() {
        let storage = MemoryStorage::new();
        let mut store = store(storage.clone());
        store.restore_session().await;

        assert!(!store.login("admin@example.com", "wrong").await);

        assert_eq!(store.state(), &SessionState::Ready(None));
        assert!(storage.get(SESSION_KEY).is_none());
        assert!(store.jar().get(SESSION_KEY).is_none());
    }

    #[tokio::test]
    async fn test_failed_login_keeps_existing_identity() {
        let mut store = store(MemoryStorage::new());
        assert!(store.login("user@example.com", "password").await);
        assert!(!store.login("admin@example.com", "nope").await);

        assert_eq!(store.identity().map(|i| i.id.as_str()), Some("2"));
    }

    #[tokio::test]
    async fn test_logout_clears_everything_and_guard_redirects() {
        let storage = MemoryStorage::new();
        let mut store = store(storage.clone());
        store.restore_session().await;
        assert!(store.login("admin@example.com", "password").await);
        assert_eq!(guard(store.jar(), "/dashboard"), GuardDecision::Allow);

        store.logout().await;

        assert_eq!(store.state(), &SessionState::Ready(None));
        assert!(storage.get(SESSION_KEY).is_none());

        let cookie = store.jar().get(SESSION_KEY).expect("expiring cookie");
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));

        assert_eq!(
            guard(store.jar(), "/dashboard"),
            GuardDecision::RedirectToLogin {
                callback_url: "/dashboard".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_logout_without_session_is_harmless() {
        let mut store = store(MemoryStorage::new());
        store.logout().await;
        assert_eq!(store.state(), &SessionState::Ready(None));
    }

    #[tokio::test]
    async fn test_restore_reads_stored_identity() {
        let storage = MemoryStorage::new();
        storage.set(
            SESSION_KEY,
            r#"{"id":"2","name":"Jane Smith","email":"user@example.com","role":"user"}"#,
        );

        let mut store = store(storage);
        store.restore_session().await;

        assert!(!store.is_loading());
        assert_eq!(store.identity().map(|i| i.email.as_str()), Some("user@example.com"));
    }

    #[tokio::test]
    async fn test_restore_with_corrupted_data_is_logged_out() {
        let storage = MemoryStorage::new();
        storage.set(SESSION_KEY, "{not json");

        let mut store = store(storage);
        store.restore_session().await;

        assert_eq!(store.state(), &SessionState::Ready(None));
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_restore_with_partial_identity_is_logged_out() {
        let storage = MemoryStorage::new();
        storage.set(SESSION_KEY, r#"{"id":"1","role":"admin"}"#);

        let mut store = store(storage);
        store.restore_session().await;

        assert!(store.identity().is_none());
    }

    struct BrokenStorage;

    #[async_trait]
    impl SessionStorage for BrokenStorage {
        async fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("store offline".to_string()))
        }

        async fn write(&self, _key: &str, _value: String) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("store offline".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("store offline".to_string()))
        }
    }

    fn broken_store() -> SessionStore<BrokenStorage> {
        SessionStore::new(
            Arc::new(MockCredentialTable::new(std::time::Duration::ZERO)),
            BrokenStorage,
            CookieJar::new(),
            SessionCookie::default(),
        )
    }

    #[tokio::test]
    async fn test_restore_with_unavailable_storage_is_logged_out() {
        let mut store = broken_store();
        store.restore_session().await;
        assert_eq!(store.state(), &SessionState::Ready(None));
    }

    #[tokio::test]
    async fn test_login_does_not_issue_cookie_when_storage_fails() {
        let mut store = broken_store();
        store.restore_session().await;

        assert!(!store.login("admin@example.com", "password").await);
        assert!(store.identity().is_none());
        assert!(store.jar().get(SESSION_KEY).is_none());
    }

    #[tokio::test]
    async fn test_logout_still_expires_cookie_when_storage_fails() {
        let mut store = broken_store();
        store.logout().await;

        let cookie = store.into_jar().get(SESSION_KEY).cloned().expect("expiring cookie");
        assert_eq!(cookie.value(), "");
    }
}
