//! Core types and utilities for the Bridgeline admin
//!
//! Everything here is synchronous and free of network I/O: the error
//! taxonomy, configuration, the entity model, field schemas, payload
//! assembly and rich-text sanitization.

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod config;
pub mod draft;
pub mod error;
pub mod payload;
pub mod resources;
pub mod sanitize;
pub mod schema;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::Config;
pub use draft::{Draft, FieldInput, LocalFile, UploadRef};
pub use error::{Error, FieldErrors, Result};
pub use payload::{FilePart, Payload};
pub use resources::{ResourceDef, ResourceKind, UpdateMethod};
pub use sanitize::TrustedHtml;
pub use schema::{EntitySchema, FieldKind, FieldSpec, FormMode};
pub use types::{CollectionQuery, CollectionResult, Entity, Fields, PageMeta};

/// Initialize the logging system
///
/// `RUST_LOG` takes precedence over `level`. `json` selects the JSON
/// formatter, otherwise the pretty one is used.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(level: &str, json: bool) -> Result<()> {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let subscriber = tracing_subscriber::registry().with(env_filter);

    let result = if json {
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()
    };

    result.map_err(|e| Error::configuration(format!("failed to initialize logging: {e}")))
}
