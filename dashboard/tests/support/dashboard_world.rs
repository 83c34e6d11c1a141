//! Shared world for the dashboard behaviour suites.
//!
//! The world owns a single-threaded Tokio runtime plus a `LocalSet` because
//! the stub backend runs on Actix, which uses `spawn_local` internally. The
//! application state is built against the stub with credentials persisted to
//! a temporary directory, so a restart can observe what a previous state
//! wrote. Dropping the world shuts the state down and stops the server.

use std::cell::RefCell;
use std::future::Future;
use std::path::Path;
use std::rc::Rc;

use dashboard::app::{
    API_BASE_URL_ENV, AppState, DashboardSettings, PROJECT_ID_ENV, RequiredEnv,
};
use dashboard::domain::{
    BrandDraft, Error, FormDialog, GuardDecision, LoginCredentials, Navigator, Role, SessionState,
};
use mockable::MockEnv;
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tokio::task::LocalSet;

use crate::stub_backend::{ADMIN_EMAIL, BackendData, CLIENT_EMAIL, PROJECT_ID, StubBackend};

pub struct DashboardWorld {
    runtime: Runtime,
    local: LocalSet,
    backend: StubBackend,
    storage: TempDir,
    state: RefCell<Rc<AppState>>,
    pub navigator: RefCell<Option<Navigator>>,
    pub last_decision: RefCell<Option<GuardDecision>>,
    pub last_redirect: RefCell<Option<&'static str>>,
    pub last_error: RefCell<Option<Error>>,
    pub dialog: RefCell<FormDialog<BrandDraft>>,
}

impl DashboardWorld {
    pub fn new() -> Self {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");
        let local = LocalSet::new();
        let backend = local
            .block_on(&runtime, async { StubBackend::start() })
            .expect("stub backend should start");
        let storage = TempDir::new().expect("credential directory");
        let state = build_state(&backend, storage.path());
        Self {
            runtime,
            local,
            backend,
            storage,
            state: RefCell::new(Rc::new(state)),
            navigator: RefCell::new(None),
            last_decision: RefCell::new(None),
            last_redirect: RefCell::new(None),
            last_error: RefCell::new(None),
            dialog: RefCell::new(FormDialog::new("Brand created successfully")),
        }
    }

    /// Drive `future` to completion on the world's runtime.
    ///
    /// The future must not borrow the world's `RefCell`s mutably.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.local.block_on(&self.runtime, future)
    }

    pub fn state(&self) -> Rc<AppState> {
        Rc::clone(&self.state.borrow())
    }

    pub fn backend(&self) -> &BackendData {
        &self.backend.data
    }

    pub fn storage_dir(&self) -> &Path {
        self.storage.path()
    }

    /// Replace the state with a fresh one reading the same credential
    /// directory, as a reopened dashboard would.
    pub fn restart(&self) -> SessionState {
        let next = Rc::new(build_state(&self.backend, self.storage.path()));
        let previous = self.state.replace(Rc::clone(&next));
        previous.shutdown();
        next.session.restore()
    }

    /// Log in through `role`'s endpoint, recording any failure.
    pub fn login(&self, role: Role, password: &str) {
        let email = match role {
            Role::Admin => ADMIN_EMAIL,
            Role::Client => CLIENT_EMAIL,
        };
        let credentials =
            LoginCredentials::try_from_parts(email, password).expect("well-formed credentials");
        let state = self.state();
        state.session.restore();
        let result = self.block_on(async move { state.session.login(role, &credentials).await });
        *self.last_error.borrow_mut() = result.err();
    }

    /// Open `path` in a navigator observing the current session.
    pub fn open(&self, path: &str) {
        let state = self.state();
        state.session.restore();
        let mut navigator = Navigator::new("/", state.session.subscribe());
        let decision = navigator.navigate(path);
        *self.last_decision.borrow_mut() = Some(decision);
        *self.navigator.borrow_mut() = Some(navigator);
    }

    /// Seed a client whose id is its lower-cased name.
    pub fn seed_client(&self, name: &str) {
        let id = name.to_lowercase();
        self.backend().seed(
            "clients",
            json!({ "_id": id, "name": name, "email": format!("buyer@{id}.example") }),
        );
    }

    pub fn fail_next(&self, status: u16, message: &str) {
        self.backend()
            .fail_next(status, json!({ "message": message }));
    }

    pub fn fail_next_without_body(&self, status: u16) {
        self.backend().fail_next(status, Value::Null);
    }

    pub fn credential_files_exist(&self) -> bool {
        ["token", "user"]
            .iter()
            .any(|key| self.storage_dir().join(key).exists())
    }
}

impl Drop for DashboardWorld {
    fn drop(&mut self) {
        self.state.borrow().shutdown();
        let server = self.backend.handle.clone();
        self.local.block_on(&self.runtime, async move {
            server.stop(true).await;
        });
    }
}

fn build_state(backend: &StubBackend, storage_dir: &Path) -> AppState {
    let base_url = backend.base_url.clone();
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |name| match name {
            API_BASE_URL_ENV => Some(base_url.clone()),
            PROJECT_ID_ENV => Some(PROJECT_ID.to_owned()),
            _ => None,
        });
    let required = RequiredEnv::from_env(&env).expect("stub environment");
    let settings = DashboardSettings {
        storage_dir: Some(storage_dir.to_path_buf()),
        invalidation_window_ms: 16,
    };
    AppState::build(&required, &settings).expect("state should build")
}
