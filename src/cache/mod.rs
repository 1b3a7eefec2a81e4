//! Configuration caches
//!
//! - [`ConfigCache`]: in-memory namespace map that answers every read
//! - [`LocalCacheStore`]: per-namespace files holding the last snapshot
//!   fetched from the server, used when the server cannot be reached

pub mod local;
pub mod memory;

pub use local::{record_file_name, LocalCacheStore};
pub use memory::{ConfigCache, ConfigSnapshot};
