//! `KeyValueStorage` adapters for persisted credentials.

mod dir;
mod memory;

pub use dir::DirStorage;
pub use memory::MemoryStorage;
