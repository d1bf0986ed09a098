//! Candidate scoring
//!
//! A track candidate scores `title term + artist term`; an artist candidate
//! scores the artist term alone. A term at or below its cutoff counts as zero
//! instead of disqualifying the candidate.
//!
//! The artist term is a weighted sum of three comparisons:
//!
//! | Term        | Compares                                             | Weight |
//! |-------------|------------------------------------------------------|--------|
//! | all artists | sorted, space-joined lists                           | 1.0    |
//! | main artist | `result[0]` vs `query[0]`                            | 0.5    |
//! | any artist  | every query artist vs `result[0]`, strong hits only  | 0.25   |
//!
//! The any-artist term covers providers that disagree about who the primary
//! artist is.

use crate::types::{Candidate, NormalizedQuery};
use tracing::trace;
use trackmatch_common::config::MatchingConfig;

/// Case-insensitive, whitespace-trimmed similarity in `[0, 1]`
///
/// Symmetric; identical strings score 1.0.
pub fn score_string(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    strsim::normalized_levenshtein(&a, &b)
}

/// Pick the entry of `titles` most similar to `query`
///
/// Used by release-oriented providers to find the queried track inside a
/// tracklist. Returns `None` when no title scores above `cutoff`. Ties keep
/// the earliest title.
pub fn best_matching_title<'a>(query: &str, titles: &'a [String], cutoff: f64) -> Option<&'a str> {
    let mut best: Option<(&str, f64)> = None;
    for title in titles {
        let score = score_string(title, query);
        if score > cutoff && best.map_or(true, |(_, s)| score > s) {
            best = Some((title.as_str(), score));
        }
    }
    best.map(|(title, _)| title)
}

/// Weighted string-similarity scorer
#[derive(Debug, Clone, Default)]
pub struct CandidateScorer {
    config: MatchingConfig,
}

impl CandidateScorer {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Score a candidate's artist list against the queried artists
    ///
    /// Empty lists score 0.0.
    pub fn score_artist_sets(&self, result_artists: &[String], query_artists: &[String]) -> f64 {
        let (Some(result_main), Some(query_main)) = (result_artists.first(), query_artists.first())
        else {
            return 0.0;
        };

        let all_artists =
            score_string(&sorted_join(result_artists), &sorted_join(query_artists))
                * self.config.all_artists_weight;

        let main_artist = score_string(result_main, query_main) * self.config.main_artist_weight;

        let any_cutoff = self.config.any_artist_cutoff_factor * self.config.artist_cutoff;
        let any_artist: f64 = query_artists
            .iter()
            .map(|artist| score_string(result_main, artist))
            .filter(|score| *score >= any_cutoff)
            .sum::<f64>()
            * self.config.any_artist_weight;

        trace!(
            result = ?result_artists,
            query = ?query_artists,
            all_artists,
            main_artist,
            any_artist,
            "Scored artist sets"
        );

        all_artists + main_artist + any_artist
    }

    /// Score a track candidate against the query
    ///
    /// The title is compared against the raw (un-normalized) title the user
    /// supplied. A candidate without a display title gets no title term.
    pub fn score_track<R>(
        &self,
        candidate: &Candidate<R>,
        query: &NormalizedQuery,
        raw_title: &str,
    ) -> f64 {
        let title_score = candidate
            .display_title
            .as_deref()
            .map(|title| score_string(title, raw_title))
            .unwrap_or(0.0);
        let title_score = self.apply_cutoff(title_score, self.config.title_cutoff);

        title_score + self.score_artist(candidate, &query.artists)
    }

    /// Score an artist candidate (artist term only)
    pub fn score_artist<R>(&self, candidate: &Candidate<R>, query_artists: &[String]) -> f64 {
        let artist_score = self.score_artist_sets(&candidate.artists, query_artists);
        self.apply_cutoff(artist_score, self.config.artist_cutoff)
    }

    fn apply_cutoff(&self, score: f64, cutoff: f64) -> f64 {
        if score <= cutoff {
            0.0
        } else {
            score
        }
    }
}

fn sorted_join(artists: &[String]) -> String {
    let mut sorted: Vec<&str> = artists.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.join(" ")
}
