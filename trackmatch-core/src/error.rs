//! Error types for trackmatch-core
//!
//! - `ProviderError`: raised by provider adapters. The engine logs it and
//!   treats the affected search round or candidate as empty.
//! - `TaxonomyError`: malformed taxonomy data. Fatal at load time.
//!
//! A missing match and an unresolvable genre tag are not errors: the first is
//! `None`, the second is silently dropped.

use std::path::PathBuf;
use thiserror::Error;

/// Provider adapter error
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network communication error
    #[error("Network error: {0}")]
    Network(String),

    /// Missing or rejected credentials
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Rate limit still exhausted after retrying
    #[error("Rate limit exceeded after {retries} retries")]
    RateLimited { retries: u32 },

    /// Non-success HTTP status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response
    #[error("Parse error: {0}")]
    Parse(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Taxonomy loading error
#[derive(Debug, Error)]
pub enum TaxonomyError {
    #[error("failed to read taxonomy data at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse taxonomy data from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// Tree contains something other than mappings, lists and names
    #[error("invalid genre tree: {0}")]
    InvalidTree(String),

    /// Alias table is not a mapping of names to name lists
    #[error("invalid genre aliases: {0}")]
    InvalidAliases(String),
}
