//! Synchronization engine
//!
//! [`Synchronizer`] performs one refresh pass; [`Poller`] repeats it in
//! the background.

pub mod poller;
pub mod synchronizer;

pub use poller::Poller;
pub use synchronizer::{NamespaceOutcome, SyncReport, Synchronizer};
