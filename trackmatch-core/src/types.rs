//! Core Types for trackmatch
//!
//! Queries flow in as raw user text, get normalized, are matched against
//! provider candidates and leave as resolutions carrying canonical genres.
//!
//! ```text
//! Query → NormalizedQuery → Candidate<R> → ScoredCandidate<R> → TrackResolution
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Queries
// ============================================================================

/// Raw user input for a track lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    /// Artist string, possibly naming several artists
    pub artist: String,
    /// Track title, possibly carrying a "feat." clause
    pub title: String,
    /// Optional subtitle (version, mix name, featured artists)
    pub subtitle: Option<String>,
}

impl Query {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
            subtitle: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }
}

/// Query after artist splitting and "feat." extraction
///
/// `artists[0]` is always the primary artist and the list is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedQuery {
    pub title: String,
    pub subtitle: Option<String>,
    pub artists: Vec<String>,
}

// ============================================================================
// Candidates
// ============================================================================

/// Search result returned by a provider, not yet confirmed as the match
///
/// `record` is owned by the provider adapter. The engine never looks inside it;
/// only the adapter unpacks it again when extracting genre tags.
#[derive(Debug, Clone)]
pub struct Candidate<R> {
    /// Display title (absent for artist candidates)
    pub display_title: Option<String>,
    /// Credited artists, primary first
    pub artists: Vec<String>,
    /// Link to the record on the provider's site
    pub source_url: String,
    /// Provider-specific payload
    pub record: R,
}

/// Candidate with its match score
#[derive(Debug, Clone)]
pub struct ScoredCandidate<R> {
    pub candidate: Candidate<R>,
    /// Title term (tracks only) plus artist term; never negative
    pub score: f64,
}

// ============================================================================
// Genres
// ============================================================================

/// Free-text genre tag with a non-negative weight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreTag {
    pub name: String,
    pub score: f64,
}

impl GenreTag {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score: score.max(0.0),
        }
    }

    /// Tag from a provider without native weighting
    pub fn unweighted(name: impl Into<String>) -> Self {
        Self::new(name, 1.0)
    }
}

/// One taxonomy lineage, most specific genre first and root-most genre last
pub type CanonicalPath = Vec<GenreTag>;

// ============================================================================
// Resolutions
// ============================================================================

/// Matched track as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTrack {
    pub title: String,
    pub artists: Vec<String>,
    pub source_url: String,
}

/// Matched artist as reported to callers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedArtist {
    pub artists: Vec<String>,
    pub source_url: String,
}

/// Result of a successful track resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackResolution {
    pub track: ResolvedTrack,
    /// Raw tags pooled from the winner and its near ties
    pub genres: Vec<GenreTag>,
    pub canonical_genres: Vec<CanonicalPath>,
}

/// Result of a successful artist resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistResolution {
    pub artist: ResolvedArtist,
    pub genres: Vec<GenreTag>,
    pub canonical_genres: Vec<CanonicalPath>,
}
