//! Access-control decisions mapping (session state, path) to render or
//! redirect.
//!
//! [`decide`] is a pure function; [`Navigator`] re-runs it whenever the
//! current path or the observed session state changes.

use tokio::sync::watch;

use super::auth::Role;
use super::session::SessionState;

/// Login and registration pages reachable without a session.
pub const PUBLIC_PATHS: [&str; 3] = ["/admin/login", "/client/login", "/client/register"];

/// Outcome of a guard evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session restoration is still pending; show a loading indicator.
    Loading,
    /// Render the requested page.
    Render,
    /// Navigate to another page instead.
    RedirectTo(&'static str),
}

/// Strip query string, fragment and trailing slashes.
fn normalise(path: &str) -> &str {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    let trimmed = path.get(..end).unwrap_or(path).trim_end_matches('/');
    if trimmed.is_empty() { "/" } else { trimmed }
}

/// Role whose section contains `path`, matched on the first whole segment.
fn section_of(path: &str) -> Option<Role> {
    let first = path.trim_start_matches('/').split('/').next()?;
    match first {
        "admin" => Some(Role::Admin),
        "client" => Some(Role::Client),
        _ => None,
    }
}

/// Whether `path` is a login or registration page.
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.contains(&normalise(path))
}

/// Decide whether to render `path` for the given session state.
///
/// Rules, first match wins:
/// 1. unknown session → loading
/// 2. anonymous on a private page → that section's login page
/// 3. authenticated on a public page → role dashboard
/// 4. authenticated in the other role's section → own dashboard
/// 5. otherwise → render
///
/// # Examples
/// ```
/// use dashboard::domain::{decide, GuardDecision, Role, Session, SessionState, UserId};
///
/// let session = Session::new(UserId::new("u-1").unwrap(), "c@example.com", None, Role::Client);
/// let state = SessionState::Authenticated(session);
/// assert_eq!(
///     decide(&state, "/admin/clients"),
///     GuardDecision::RedirectTo("/client/dashboard")
/// );
/// ```
pub fn decide(state: &SessionState, path: &str) -> GuardDecision {
    let path = normalise(path);
    let public = is_public_path(path);
    match state {
        SessionState::Unknown => GuardDecision::Loading,
        SessionState::Anonymous if public => GuardDecision::Render,
        SessionState::Anonymous => {
            let login = section_of(path).unwrap_or(Role::Client).login_path();
            GuardDecision::RedirectTo(login)
        }
        SessionState::Authenticated(session) => {
            let role = session.role();
            if public {
                return GuardDecision::RedirectTo(role.dashboard_path());
            }
            match section_of(path) {
                Some(section) if section != role => GuardDecision::RedirectTo(role.dashboard_path()),
                _ => GuardDecision::Render,
            }
        }
    }
}

/// Tracks the current path and re-evaluates the guard on every path or
/// session change.
pub struct Navigator {
    path: String,
    session: watch::Receiver<SessionState>,
}

impl Navigator {
    /// Start at `path`, observing session changes through `session`.
    pub fn new(path: impl Into<String>, session: watch::Receiver<SessionState>) -> Self {
        Self {
            path: path.into(),
            session,
        }
    }

    /// Path most recently navigated to.
    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    /// Decision for the current path and session.
    pub fn decision(&self) -> GuardDecision {
        decide(&self.session.borrow(), &self.path)
    }

    /// Move to `path` and evaluate the guard there. A redirect updates the
    /// current path to its target.
    pub fn navigate(&mut self, path: impl Into<String>) -> GuardDecision {
        self.path = path.into();
        self.settle()
    }

    /// Wait for the next session change and re-evaluate.
    ///
    /// Returns `None` once the session resolver has been dropped.
    pub async fn session_changed(&mut self) -> Option<GuardDecision> {
        self.session.changed().await.ok()?;
        Some(self.settle())
    }

    fn settle(&mut self) -> GuardDecision {
        let decision = self.decision();
        if let GuardDecision::RedirectTo(target) = decision {
            target.clone_into(&mut self.path);
        }
        decision
    }
}
