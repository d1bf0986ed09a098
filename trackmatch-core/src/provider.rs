//! Catalog provider capability
//!
//! The engine talks to catalogs only through this trait. Adapters own all
//! transport concerns (authentication, rate limiting, retries, pagination) and
//! the provider-specific record type carried in each [`Candidate`].
//!
//! # Example
//! ```rust,ignore
//! use trackmatch_core::{Candidate, GenreTag, Provider, ProviderError};
//!
//! struct StaticCatalog;
//!
//! #[async_trait::async_trait]
//! impl Provider for StaticCatalog {
//!     type Record = Vec<String>;
//!
//!     fn name(&self) -> &'static str { "static" }
//!
//!     async fn search_artists(
//!         &self,
//!         names: &[String],
//!     ) -> Result<Vec<Candidate<Self::Record>>, ProviderError> {
//!         Ok(vec![])
//!     }
//!
//!     async fn search_tracks(
//!         &self,
//!         artists: &[String],
//!         title: &str,
//!         already_seen: &[Candidate<Self::Record>],
//!     ) -> Result<Vec<Candidate<Self::Record>>, ProviderError> {
//!         Ok(vec![])
//!     }
//!
//!     async fn extract_genre_tags(
//!         &self,
//!         candidate: &Candidate<Self::Record>,
//!     ) -> Result<Vec<GenreTag>, ProviderError> {
//!         Ok(candidate.record.iter().map(GenreTag::unweighted).collect())
//!     }
//! }
//! ```

use crate::error::ProviderError;
use crate::types::{Candidate, GenreTag};
use async_trait::async_trait;

/// Search and genre capability of one catalog
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider-specific payload carried through candidates
    type Record: Clone + Send + Sync;

    /// Provider name for logging
    fn name(&self) -> &'static str;

    /// Search for artist records matching the given names (primary first)
    async fn search_artists(
        &self,
        names: &[String],
    ) -> Result<Vec<Candidate<Self::Record>>, ProviderError>;

    /// Search for track records
    ///
    /// `already_seen` holds the candidates returned by earlier rounds of the
    /// same resolution; adapters may use it to avoid refetching full records.
    async fn search_tracks(
        &self,
        artists: &[String],
        title: &str,
        already_seen: &[Candidate<Self::Record>],
    ) -> Result<Vec<Candidate<Self::Record>>, ProviderError>;

    /// Genre tags attached to a candidate's record
    async fn extract_genre_tags(
        &self,
        candidate: &Candidate<Self::Record>,
    ) -> Result<Vec<GenreTag>, ProviderError>;
}
