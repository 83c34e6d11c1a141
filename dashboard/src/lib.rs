//! Consumer-insights dashboard core.
//!
//! Session resolution, route guarding, typed resource access and a
//! deduplicating query cache, arranged as domain services behind ports with
//! HTTP and storage adapters at the edges.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

pub mod app;
pub mod domain;
pub mod inbound;
pub mod outbound;
