//! Dashboard backend HTTP adapters.
//!
//! This module provides thin reqwest implementations of the `AuthGateway` and
//! `EntityApi` ports. They own transport details only: URL building, bearer
//! headers, status mapping and envelope decoding.

mod auth;
mod dto;
mod resources;
mod transport;

pub use auth::HttpAuthGateway;
pub use dto::WireEntity;
pub use resources::HttpEntityApi;
pub use transport::HttpTransport;
