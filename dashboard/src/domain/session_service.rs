//! Session resolver: owns the session lifecycle.
//!
//! State moves `Unknown` → `Authenticated` | `Anonymous` when storage is first
//! consulted, and between `Authenticated` and `Anonymous` on login, logout and
//! invalidation. Subscribers (the route guard layer) observe every transition
//! through a `watch` channel.

use std::sync::{Arc, Mutex, Once};

use tokio::sync::watch;
use tracing::{info, warn};

use crate::domain::ports::{AccessTokenSource, AuthGateway, CredentialStore};
use crate::domain::{AuthToken, Error, LoginCredentials, Role, Session, SessionState};

#[derive(Debug, Default)]
struct Current {
    token: Option<AuthToken>,
    last_role: Option<Role>,
}

/// Single owner of the authenticated session.
///
/// # Examples
/// ```
/// # use std::sync::Arc;
/// # use dashboard::domain::{SessionResolver, SessionState};
/// # use dashboard::domain::ports::{FixtureAuthGateway, StorageCredentialStore};
/// let resolver = SessionResolver::new(
///     Arc::new(StorageCredentialStore::unavailable()),
///     Arc::new(FixtureAuthGateway),
/// );
/// assert_eq!(resolver.restore(), SessionState::Anonymous);
/// ```
pub struct SessionResolver {
    store: Arc<dyn CredentialStore>,
    gateway: Arc<dyn AuthGateway>,
    state: watch::Sender<SessionState>,
    current: Mutex<Current>,
    restored: Once,
}

impl SessionResolver {
    /// Build a resolver in the `Unknown` state.
    pub fn new(store: Arc<dyn CredentialStore>, gateway: Arc<dyn AuthGateway>) -> Self {
        let (state, _) = watch::channel(SessionState::Unknown);
        Self {
            store,
            gateway,
            state,
            current: Mutex::new(Current::default()),
            restored: Once::new(),
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Subscribe to state transitions.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    /// Resolve the boot state from the credential store.
    ///
    /// Storage is read on the first call only; later calls return the
    /// current state.
    pub fn restore(&self) -> SessionState {
        self.restored.call_once(|| {
            if *self.state.borrow() != SessionState::Unknown {
                return;
            }
            let next = match self.store.get() {
                Some(record) => {
                    let (token, session) = record.into_parts();
                    self.remember(Some(token), Some(session.role()));
                    info!(role = %session.role(), "restored stored session");
                    SessionState::Authenticated(session)
                }
                None => {
                    info!("no stored session");
                    SessionState::Anonymous
                }
            };
            self.state.send_replace(next);
        });
        self.state()
    }

    /// Log in through `role`'s endpoint.
    ///
    /// On success the record is persisted and subscribers see
    /// `Authenticated`. On failure the store is untouched, an `Unknown` state
    /// settles to `Anonymous`, and the returned error carries the message to
    /// show the user.
    pub async fn login(&self, role: Role, credentials: &LoginCredentials) -> Result<Session, Error> {
        let record = match self.gateway.login(role, credentials).await {
            Ok(record) => record,
            Err(error) => {
                info!(%role, code = ?error.code(), "login rejected");
                self.state.send_if_modified(|state| {
                    if *state == SessionState::Unknown {
                        *state = SessionState::Anonymous;
                        true
                    } else {
                        false
                    }
                });
                return Err(error);
            }
        };
        if let Err(error) = self.store.set(&record) {
            warn!(%error, "failed to persist session; continuing in memory");
        }
        let (token, session) = record.into_parts();
        self.remember(Some(token), Some(session.role()));
        info!(%role, user_id = %session.user_id(), "login succeeded");
        self.state
            .send_replace(SessionState::Authenticated(session.clone()));
        Ok(session)
    }

    /// End the session and return the login page to redirect to.
    pub fn logout(&self) -> &'static str {
        let redirect = self.end("logout");
        info!(redirect, "logged out");
        redirect
    }

    /// Drop the session after the backend rejected it.
    ///
    /// Behaves like [`SessionResolver::logout`].
    pub fn invalidate(&self) -> &'static str {
        let redirect = self.end("invalidation");
        warn!(redirect, "session invalidated");
        redirect
    }

    fn end(&self, reason: &'static str) -> &'static str {
        if let Err(error) = self.store.clear() {
            warn!(%error, reason, "failed to clear stored credentials");
        }
        let role = self
            .state
            .borrow()
            .role()
            .or_else(|| self.current.lock().ok().and_then(|current| current.last_role));
        self.remember(None, role);
        self.state.send_replace(SessionState::Anonymous);
        role.unwrap_or(Role::Client).login_path()
    }

    fn remember(&self, token: Option<AuthToken>, role: Option<Role>) {
        match self.current.lock() {
            Ok(mut current) => {
                current.token = token;
                if role.is_some() {
                    current.last_role = role;
                }
            }
            Err(_) => warn!("session token lock poisoned"),
        }
    }
}

impl AccessTokenSource for SessionResolver {
    fn access_token(&self) -> Option<AuthToken> {
        self.current
            .lock()
            .ok()
            .and_then(|current| current.token.clone())
    }
}

#[cfg(test)]
mod tests {
    //! Lifecycle coverage for the session resolver.
    use super::*;
    use crate::domain::ports::{MockAuthGateway, MockCredentialStore, StorageError};
    use crate::domain::{CredentialRecord, ErrorCode, UserId};
    use rstest::{fixture, rstest};

    fn session(role: Role) -> Session {
        Session::new(
            UserId::new("u-1").expect("user id"),
            "ops@example.com",
            Some("Ops".to_owned()),
            role,
        )
    }

    fn record(role: Role) -> CredentialRecord {
        CredentialRecord::new(AuthToken::new("tok-1").expect("token"), session(role))
    }

    #[fixture]
    fn creds() -> LoginCredentials {
        LoginCredentials::try_from_parts("ops@example.com", "secret").expect("credentials")
    }

    fn resolver(store: MockCredentialStore, gateway: MockAuthGateway) -> SessionResolver {
        SessionResolver::new(Arc::new(store), Arc::new(gateway))
    }

    #[rstest]
    fn restore_reads_storage_exactly_once() {
        let mut store = MockCredentialStore::new();
        store
            .expect_get()
            .times(1)
            .returning(|| Some(record(Role::Client)));
        let resolver = resolver(store, MockAuthGateway::new());

        let first = resolver.restore();
        let second = resolver.restore();

        assert_eq!(first, SessionState::Authenticated(session(Role::Client)));
        assert_eq!(second, first);
        assert_eq!(
            resolver.access_token().map(|t| t.expose().to_owned()),
            Some("tok-1".to_owned())
        );
    }

    #[rstest]
    fn restore_without_record_is_anonymous() {
        let mut store = MockCredentialStore::new();
        store.expect_get().times(1).returning(|| None);
        let resolver = resolver(store, MockAuthGateway::new());
        assert_eq!(resolver.restore(), SessionState::Anonymous);
        assert!(resolver.access_token().is_none());
    }

    #[rstest]
    #[tokio::test]
    async fn admin_login_persists_one_record_and_notifies(creds: LoginCredentials) {
        let mut store = MockCredentialStore::new();
        store.expect_get().returning(|| None);
        store
            .expect_set()
            .withf(|record| record.user().role() == Role::Admin)
            .times(1)
            .returning(|_| Ok(()));
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_login()
            .withf(|role, _| *role == Role::Admin)
            .times(1)
            .returning(|_, _| Ok(record(Role::Admin)));
        let resolver = resolver(store, gateway);
        resolver.restore();
        let mut updates = resolver.subscribe();

        let session = resolver.login(Role::Admin, &creds).await.expect("login");

        assert_eq!(session.role(), Role::Admin);
        assert!(updates.has_changed().expect("sender alive"));
        assert_eq!(
            *updates.borrow_and_update(),
            SessionState::Authenticated(session)
        );
    }

    #[rstest]
    #[tokio::test]
    async fn failed_login_leaves_store_untouched(creds: LoginCredentials) {
        let mut store = MockCredentialStore::new();
        store.expect_set().times(0);
        store.expect_clear().times(0);
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_login()
            .returning(|_, _| Err(Error::unauthorized("Invalid email or password")));
        let resolver = resolver(store, gateway);

        let err = resolver
            .login(Role::Client, &creds)
            .await
            .expect_err("rejected");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
        assert_eq!(err.message(), "Invalid email or password");
        assert_eq!(resolver.state(), SessionState::Anonymous);
    }

    #[rstest]
    #[tokio::test]
    async fn persist_failure_keeps_session_in_memory(creds: LoginCredentials) {
        let mut store = MockCredentialStore::new();
        store
            .expect_set()
            .returning(|_| Err(StorageError::io("read-only")));
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_login()
            .returning(|_, _| Ok(record(Role::Client)));
        let resolver = resolver(store, gateway);

        resolver.login(Role::Client, &creds).await.expect("login");

        assert_eq!(resolver.state().role(), Some(Role::Client));
    }

    #[rstest]
    #[case(Role::Admin, "/admin/login")]
    #[case(Role::Client, "/client/login")]
    #[tokio::test]
    async fn logout_redirects_by_last_role(
        creds: LoginCredentials,
        #[case] role: Role,
        #[case] expected: &str,
    ) {
        let mut store = MockCredentialStore::new();
        store.expect_set().returning(|_| Ok(()));
        store.expect_clear().times(1).returning(|| Ok(()));
        let mut gateway = MockAuthGateway::new();
        gateway
            .expect_login()
            .returning(move |_, _| Ok(record(role)));
        let resolver = resolver(store, gateway);
        resolver.login(role, &creds).await.expect("login");

        assert_eq!(resolver.logout(), expected);
        assert_eq!(resolver.state(), SessionState::Anonymous);
        assert!(resolver.access_token().is_none());
    }

    #[rstest]
    fn invalidate_without_session_defaults_to_client_login() {
        let mut store = MockCredentialStore::new();
        store
            .expect_clear()
            .times(1)
            .returning(|| Err(StorageError::io("gone")));
        let resolver = resolver(store, MockAuthGateway::new());
        assert_eq!(resolver.invalidate(), "/client/login");
        assert_eq!(resolver.state(), SessionState::Anonymous);
    }
}
