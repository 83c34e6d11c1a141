//! Source of the bearer token attached to resource requests.

use crate::domain::AuthToken;

/// Supplies the current session's token, if a session exists.
#[cfg_attr(test, mockall::automock)]
pub trait AccessTokenSource: Send + Sync {
    /// Token to send as `Authorization: Bearer <token>`.
    fn access_token(&self) -> Option<AuthToken>;
}

/// A token that never changes; `None` sends unauthenticated requests.
#[derive(Debug, Clone, Default)]
pub struct StaticAccessToken(Option<AuthToken>);

impl StaticAccessToken {
    /// Always supply `token`.
    pub fn new(token: AuthToken) -> Self {
        Self(Some(token))
    }

    /// Never supply a token.
    pub fn anonymous() -> Self {
        Self(None)
    }
}

impl AccessTokenSource for StaticAccessToken {
    fn access_token(&self) -> Option<AuthToken> {
        self.0.clone()
    }
}
