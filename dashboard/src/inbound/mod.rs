//! Inbound adapters that translate operator requests into domain service
//! calls while keeping presentation details at the edge.
//!
//! The terminal front end lives under [`cli`].

pub mod cli;
