//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **http**: reqwest-backed login and entity CRUD against the dashboard
//!   backend
//! - **storage**: in-memory and directory-backed credential storage
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod http;
pub mod storage;
