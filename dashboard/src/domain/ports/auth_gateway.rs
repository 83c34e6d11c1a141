//! Driven port for the role-specific login endpoints.
//!
//! Admin and client logins are separate backend endpoints; the role passed in
//! selects which one is called. Adapters never fall back from one to the
//! other.

use async_trait::async_trait;

use crate::domain::{AuthToken, CredentialRecord, Error, LoginCredentials, Role, Session, UserId};

/// Exchanges credentials for a token and user record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Log in through the endpoint belonging to `role`.
    async fn login(
        &self,
        role: Role,
        credentials: &LoginCredentials,
    ) -> Result<CredentialRecord, Error>;
}

struct FixtureAccount {
    user_id: &'static str,
    email: &'static str,
    display_name: &'static str,
    role: Role,
}

const FIXTURE_PASSWORD: &str = "password";

const FIXTURE_ACCOUNTS: [FixtureAccount; 2] = [
    FixtureAccount {
        user_id: "admin-1",
        email: "admin@example.com",
        display_name: "Dashboard Admin",
        role: Role::Admin,
    },
    FixtureAccount {
        user_id: "client-1",
        email: "client@example.com",
        display_name: "Northwind Buyer",
        role: Role::Client,
    },
];

/// In-memory gateway with one admin and one client account.
///
/// `admin@example.com` and `client@example.com` both use the password
/// `password`, and each only logs in through its own role's endpoint.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAuthGateway;

#[async_trait]
impl AuthGateway for FixtureAuthGateway {
    async fn login(
        &self,
        role: Role,
        credentials: &LoginCredentials,
    ) -> Result<CredentialRecord, Error> {
        let account = FIXTURE_ACCOUNTS
            .iter()
            .find(|account| {
                account.role == role
                    && account.email == credentials.email()
                    && credentials.password() == FIXTURE_PASSWORD
            })
            .ok_or_else(|| Error::unauthorized("Invalid email or password"))?;
        let user_id = UserId::new(account.user_id)
            .map_err(|err| Error::internal(format!("invalid fixture user id: {err}")))?;
        let token = AuthToken::new(format!("fixture-{}-{}", role, account.user_id))
            .ok_or_else(|| Error::internal("fixture token is blank"))?;
        let session = Session::new(
            user_id,
            account.email,
            Some(account.display_name.to_owned()),
            account.role,
        );
        Ok(CredentialRecord::new(token, session))
    }
}
