//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod access_token;
mod auth_gateway;
mod cache_key;
mod credential_store;
mod entity_api;

#[cfg(test)]
pub use access_token::MockAccessTokenSource;
pub use access_token::{AccessTokenSource, StaticAccessToken};
#[cfg(test)]
pub use auth_gateway::MockAuthGateway;
pub use auth_gateway::{AuthGateway, FixtureAuthGateway};
pub use cache_key::{CacheKey, CacheKeyValidationError};
#[cfg(test)]
pub use credential_store::{MockCredentialStore, MockKeyValueStorage};
pub use credential_store::{
    CredentialStore, KeyValueStorage, StorageCredentialStore, StorageError, TOKEN_KEY, USER_KEY,
};
pub use entity_api::{EntityApi, FixtureEntityApi};
