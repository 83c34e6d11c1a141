//! Session model: the authenticated identity, its lifecycle states and the
//! persisted credential record.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::auth::{AuthToken, Role};

/// Validation errors for opaque identifiers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdValidationError {
    /// Identifier was empty.
    #[error("identifier must not be empty")]
    Empty,
    /// Identifier carried leading or trailing whitespace.
    #[error("identifier must not contain surrounding whitespace")]
    ContainsWhitespace,
}

pub(crate) fn check_identifier(raw: &str) -> Result<(), IdValidationError> {
    if raw.trim().is_empty() {
        return Err(IdValidationError::Empty);
    }
    if raw.trim() != raw {
        return Err(IdValidationError::ContainsWhitespace);
    }
    Ok(())
}

/// Backend-issued account identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Validate and construct a [`UserId`].
    pub fn new(id: impl Into<String>) -> Result<Self, IdValidationError> {
        let id = id.into();
        check_identifier(&id)?;
        Ok(Self(id))
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0
    }
}

impl TryFrom<String> for UserId {
    type Error = IdValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// The currently authenticated identity and role.
///
/// Serialises to the `user` storage entry:
/// `{"userId": "...", "email": "...", "displayName": "...", "role": "admin"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(alias = "id")]
    user_id: UserId,
    email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    display_name: Option<String>,
    role: Role,
}

impl Session {
    /// Build a session from its parts. Blank display names are dropped.
    pub fn new(
        user_id: UserId,
        email: impl Into<String>,
        display_name: Option<String>,
        role: Role,
    ) -> Self {
        Self {
            user_id,
            email: email.into(),
            display_name: display_name.filter(|name| !name.trim().is_empty()),
            role,
        }
    }

    /// Account identifier.
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Account email.
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Optional display name.
    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    /// Name to greet the user with, falling back to the email.
    pub fn greeting_name(&self) -> &str {
        self.display_name().unwrap_or(self.email())
    }

    /// Account role.
    pub fn role(&self) -> Role {
        self.role
    }
}

/// Observable lifecycle of the session resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Storage has not been consulted yet.
    Unknown,
    /// No one is logged in.
    Anonymous,
    /// A user is logged in.
    Authenticated(Session),
}

impl SessionState {
    /// The active session, if any.
    pub fn session(&self) -> Option<&Session> {
        match self {
            Self::Authenticated(session) => Some(session),
            Self::Unknown | Self::Anonymous => None,
        }
    }

    /// Role of the active session, if any.
    pub fn role(&self) -> Option<Role> {
        self.session().map(Session::role)
    }
}

/// Token and identity persisted together in the credential store.
///
/// The pair is only ever written or cleared as a unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    token: AuthToken,
    user: Session,
}

impl CredentialRecord {
    /// Pair a token with the identity it authenticates.
    pub fn new(token: AuthToken, user: Session) -> Self {
        Self { token, user }
    }

    /// Bearer token.
    pub fn token(&self) -> &AuthToken {
        &self.token
    }

    /// Authenticated identity.
    pub fn user(&self) -> &Session {
        &self.user
    }

    /// Split into token and identity.
    pub fn into_parts(self) -> (AuthToken, Session) {
        (self.token, self.user)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for session types.
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn admin_session() -> Session {
        Session::new(
            UserId::new("u-1").expect("user id"),
            "ops@example.com",
            Some("Ops".to_owned()),
            Role::Admin,
        )
    }

    #[rstest]
    #[case("", IdValidationError::Empty)]
    #[case("   ", IdValidationError::Empty)]
    #[case(" u-1", IdValidationError::ContainsWhitespace)]
    fn user_id_rejects_bad_input(#[case] raw: &str, #[case] expected: IdValidationError) {
        assert_eq!(UserId::new(raw).expect_err("invalid id"), expected);
    }

    #[rstest]
    fn session_serialises_to_storage_shape() {
        let value = serde_json::to_value(admin_session()).expect("serialise");
        assert_eq!(
            value,
            json!({"userId": "u-1", "email": "ops@example.com", "displayName": "Ops", "role": "admin"})
        );
    }

    #[rstest]
    fn session_accepts_id_alias_and_missing_display_name() {
        let session: Session = serde_json::from_value(
            json!({"id": "u-2", "email": "c@example.com", "role": "client"}),
        )
        .expect("deserialise");
        assert_eq!(session.user_id().as_ref(), "u-2");
        assert_eq!(session.display_name(), None);
        assert_eq!(session.greeting_name(), "c@example.com");
        assert_eq!(session.role(), Role::Client);
    }

    #[rstest]
    fn blank_display_names_are_dropped() {
        let session = Session::new(
            UserId::new("u-3").expect("user id"),
            "x@example.com",
            Some("  ".to_owned()),
            Role::Client,
        );
        assert_eq!(session.display_name(), None);
    }

    #[rstest]
    #[case(SessionState::Unknown, None)]
    #[case(SessionState::Anonymous, None)]
    #[case(SessionState::Authenticated(admin_session()), Some(Role::Admin))]
    fn state_exposes_role(#[case] state: SessionState, #[case] expected: Option<Role>) {
        assert_eq!(state.role(), expected);
    }
}
