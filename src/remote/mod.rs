//! Remote config service access
//!
//! - [`Transport`]: opaque `GET url -> (status, body)` collaborator
//! - [`RemoteConfigSource`]: namespace discovery and release retrieval

pub mod source;
#[cfg(test)]
pub(crate) mod test_support;
pub mod transport;

pub use source::{FetchFailure, NamespaceInfo, Release, RemoteConfigSource, ServerAddress};
pub use transport::{HttpResponse, Transport, TransportError, UreqTransport};
