//! trackmatch-core - fuzzy track/artist resolution and genre canonicalization
//!
//! Resolves loosely specified artist/title metadata against a catalog
//! [`Provider`], picks the best-matching record and maps its free-form genre
//! tags onto a fixed genre taxonomy.
//!
//! This crate performs no network I/O itself; catalogs plug in through the
//! [`Provider`] trait.
//!
//! # Example
//! ```rust,ignore
//! use std::sync::Arc;
//! use trackmatch_core::{GenreTaxonomy, Query, ResolutionEngine};
//!
//! let taxonomy = Arc::new(GenreTaxonomy::bundled()?);
//! let engine = ResolutionEngine::new(provider, taxonomy, Default::default());
//!
//! let query = Query::new("Nirvana", "Smells Like Teen Spirit");
//! if let Some(found) = engine.resolve_track(&query).await {
//!     println!("{} → {:?}", found.track.title, found.canonical_genres);
//! }
//! ```

pub mod engine;
pub mod error;
pub mod normalize;
pub mod provider;
pub mod scoring;
pub mod selector;
pub mod taxonomy;
pub mod types;

pub use crate::engine::ResolutionEngine;
pub use crate::error::{ProviderError, TaxonomyError};
pub use crate::normalize::{normalize_title_and_artists, split_artists};
pub use crate::provider::Provider;
pub use crate::scoring::{best_matching_title, score_string, CandidateScorer};
pub use crate::selector::{MatchSelector, Selection};
pub use crate::taxonomy::GenreTaxonomy;
pub use crate::types::{
    ArtistResolution, CanonicalPath, Candidate, GenreTag, NormalizedQuery, Query,
    ResolvedArtist, ResolvedTrack, ScoredCandidate, TrackResolution,
};
