//! Fleet Client - persistence collaborator for the zone engine
//!
//! - [`ZoneBackend`]: the operations the zone engine consumes
//! - [`RestZoneBackend`]: REST implementation over [`HttpClient`]
//! - [`InMemoryZoneBackend`]: in-process implementation with the server's
//!   exclusivity semantics, a call journal and failure injection

pub mod backend;
pub mod config;
pub mod error;
pub mod http;
pub mod memory;
pub mod rest;

pub use backend::ZoneBackend;
pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::{HttpClient, NetworkHttpClient};
pub use memory::{BackendCall, BackendOp, InMemoryZoneBackend};
pub use rest::RestZoneBackend;
