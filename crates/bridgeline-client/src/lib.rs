//! HTTP client and resource services for the Bridgeline admin backend
//!
//! [`ResourceService`] is the contract the controllers are written against.
//! [`RestResource`] talks to the REST API through [`HttpClient`];
//! [`MemoryResource`] keeps records in process for tests and offline use.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod api_client;
pub mod auth;
pub mod memory;
pub mod rest;
pub mod service;

pub use api_client::HttpClient;
pub use auth::{AuthContext, Credentials};
pub use memory::{CallCounts, MemoryResource};
pub use rest::RestResource;
pub use service::ResourceService;

use bridgeline_core::{Config, ResourceKind, Result};

/// Build a REST service for `kind` from configuration
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn connect(config: &Config, auth: AuthContext, kind: ResourceKind) -> Result<RestResource> {
    let http = HttpClient::new(&config.api, auth)?;
    Ok(RestResource::new(http, kind.def()))
}
