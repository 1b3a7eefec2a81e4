//! CLI command implementations

pub mod clusters;
pub mod config;
pub mod dump;
pub mod get;
pub mod watch;

pub use clusters::execute as clusters;
pub use config::execute as config;
pub use dump::execute as dump;
pub use get::execute as get;
pub use watch::execute as watch;
