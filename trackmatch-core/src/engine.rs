//! Resolution Engine
//!
//! Orchestrates one lookup end to end:
//!
//! 1. Normalize the query (artist splitting, "feat." extraction)
//! 2. Search the provider in several rounds and pool the candidates
//! 3. Score every candidate and select the winner plus its near ties
//! 4. Pool genre tags from the winner and near ties
//! 5. Canonicalize the pooled tags through the taxonomy
//!
//! # Search Rounds
//! Track searches use up to four (artists, title) combinations so that both
//! normalized and raw spellings get a chance to hit:
//!
//! | Round | Artists            | Title                  |
//! |-------|--------------------|------------------------|
//! | 1     | normalized list    | normalized title       |
//! | 2     | normalized list    | title + " " + subtitle |
//! | 3     | raw artist string  | raw title              |
//! | 4     | raw artist string  | raw title + subtitle   |
//!
//! Rounds 2 and 4 only run when a subtitle is present, and a round identical
//! to an earlier one is skipped. Rounds run one after another so each round
//! sees the candidates already collected. A failed round contributes nothing.

use crate::normalize::{normalize_query, split_artists};
use crate::provider::Provider;
use crate::scoring::CandidateScorer;
use crate::selector::{MatchSelector, Selection};
use crate::taxonomy::GenreTaxonomy;
use crate::types::{
    ArtistResolution, Candidate, GenreTag, NormalizedQuery, Query, ResolvedArtist,
    ResolvedTrack, ScoredCandidate, TrackResolution,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trackmatch_common::config::MatchingConfig;

/// Fuzzy track/artist resolver over one provider
pub struct ResolutionEngine<P: Provider> {
    provider: P,
    taxonomy: Arc<GenreTaxonomy>,
    scorer: CandidateScorer,
    selector: MatchSelector,
}

impl<P: Provider> ResolutionEngine<P> {
    pub fn new(provider: P, taxonomy: Arc<GenreTaxonomy>, config: MatchingConfig) -> Self {
        let selector = MatchSelector::new(config.near_tie_ratio);
        Self {
            provider,
            taxonomy,
            scorer: CandidateScorer::new(config),
            selector,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Resolve a track and its genres
    ///
    /// Returns `None` when no candidate scores above zero.
    pub async fn resolve_track(&self, query: &Query) -> Option<TrackResolution> {
        let normalized = normalize_query(query);
        debug!(
            provider = self.provider.name(),
            artists = ?normalized.artists,
            title = %normalized.title,
            subtitle = ?normalized.subtitle,
            "Resolving track"
        );

        let candidates = self.search_track_candidates(query, &normalized).await;
        let scored: Vec<ScoredCandidate<P::Record>> = candidates
            .into_iter()
            .map(|candidate| {
                let score = self.scorer.score_track(&candidate, &normalized, &query.title);
                debug!(
                    title = ?candidate.display_title,
                    artists = ?candidate.artists,
                    score,
                    "Scored track candidate"
                );
                ScoredCandidate { candidate, score }
            })
            .collect();

        let Some(Selection {
            winner,
            contributing,
        }) = self.selector.select_best(&scored)
        else {
            info!(
                artist = %query.artist,
                title = %query.title,
                candidates = scored.len(),
                "No matching track found"
            );
            return None;
        };

        let genres = self.collect_genres(&contributing).await;
        let canonical_genres = self.taxonomy.resolve_genres(&genres);

        let track = ResolvedTrack {
            title: winner
                .candidate
                .display_title
                .clone()
                .unwrap_or_else(|| normalized.title.clone()),
            artists: winner.candidate.artists.clone(),
            source_url: winner.candidate.source_url.clone(),
        };

        info!(
            title = %track.title,
            artists = ?track.artists,
            score = winner.score,
            source = %track.source_url,
            genres = genres.len(),
            canonical = canonical_genres.len(),
            "Resolved track"
        );

        Some(TrackResolution {
            track,
            genres,
            canonical_genres,
        })
    }

    /// Resolve an artist and its genres
    ///
    /// Only the artist term is scored; the same cutoff and selection rules
    /// apply as for tracks.
    pub async fn resolve_artist(&self, artist: &str) -> Option<ArtistResolution> {
        let names = split_artists(artist);
        debug!(provider = self.provider.name(), artists = ?names, "Resolving artist");

        let candidates = match self.provider.search_artists(&names).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "Artist search failed");
                Vec::new()
            }
        };

        let scored: Vec<ScoredCandidate<P::Record>> = candidates
            .into_iter()
            .map(|candidate| {
                let score = self.scorer.score_artist(&candidate, &names);
                debug!(artists = ?candidate.artists, score, "Scored artist candidate");
                ScoredCandidate { candidate, score }
            })
            .collect();

        let Some(Selection {
            winner,
            contributing,
        }) = self.selector.select_best(&scored)
        else {
            info!(artist = %artist, candidates = scored.len(), "No matching artist found");
            return None;
        };

        let genres = self.collect_genres(&contributing).await;
        let canonical_genres = self.taxonomy.resolve_genres(&genres);

        info!(
            artists = ?winner.candidate.artists,
            score = winner.score,
            source = %winner.candidate.source_url,
            "Resolved artist"
        );

        Some(ArtistResolution {
            artist: ResolvedArtist {
                artists: winner.candidate.artists,
                source_url: winner.candidate.source_url,
            },
            genres,
            canonical_genres,
        })
    }

    /// Run every search round and concatenate the results in round order
    pub async fn search_track_candidates(
        &self,
        query: &Query,
        normalized: &NormalizedQuery,
    ) -> Vec<Candidate<P::Record>> {
        let mut pooled: Vec<Candidate<P::Record>> = Vec::new();

        for (round, (artists, title)) in search_rounds(query, normalized).into_iter().enumerate() {
            match self.provider.search_tracks(&artists, &title, &pooled).await {
                Ok(found) => {
                    debug!(
                        round = round + 1,
                        artists = ?artists,
                        title = %title,
                        found = found.len(),
                        "Search round complete"
                    );
                    pooled.extend(found);
                }
                Err(e) => {
                    warn!(
                        provider = self.provider.name(),
                        round = round + 1,
                        error = %e,
                        "Search round failed, continuing with remaining rounds"
                    );
                }
            }
        }

        pooled
    }

    /// Pool genre tags from every contributing candidate
    ///
    /// A candidate whose tags cannot be fetched is logged and skipped.
    async fn collect_genres(&self, contributing: &[ScoredCandidate<P::Record>]) -> Vec<GenreTag> {
        let mut genres = Vec::new();
        for scored in contributing {
            match self.provider.extract_genre_tags(&scored.candidate).await {
                Ok(tags) => genres.extend(tags),
                Err(e) => warn!(
                    source = %scored.candidate.source_url,
                    error = %e,
                    "Failed to fetch genre tags, skipping candidate"
                ),
            }
        }
        genres
    }
}

/// Distinct (artists, title) combinations to search, in priority order
fn search_rounds(query: &Query, normalized: &NormalizedQuery) -> Vec<(Vec<String>, String)> {
    let raw_artists = vec![query.artist.clone()];
    let mut rounds = vec![(normalized.artists.clone(), normalized.title.clone())];

    if let Some(subtitle) = &normalized.subtitle {
        rounds.push((
            normalized.artists.clone(),
            format!("{} {}", normalized.title, subtitle),
        ));
    }

    rounds.push((raw_artists.clone(), query.title.clone()));

    if let Some(subtitle) = &query.subtitle {
        rounds.push((raw_artists, format!("{} {}", query.title, subtitle)));
    }

    let mut distinct: Vec<(Vec<String>, String)> = Vec::with_capacity(rounds.len());
    for round in rounds {
        if !distinct.contains(&round) {
            distinct.push(round);
        }
    }
    distinct
}
