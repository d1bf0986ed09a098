//! Discogs implementation of the `Provider` capability
//!
//! Discogs has no per-track records, so a track candidate is a full release
//! whose tracklist contains a title close to the queried one.

use crate::client::{DiscogsClient, SearchParams};
use crate::models::{absolute_web_url, strip_disambiguation, Release, SearchResult};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, warn};
use trackmatch_core::{best_matching_title, Candidate, GenreTag, Provider, ProviderError};

/// Record carried by a Discogs candidate
#[derive(Debug, Clone)]
pub enum DiscogsRecord {
    Release(Box<Release>),
    /// Artist search hit (search results carry no genre data)
    Artist(SearchResult),
}

impl DiscogsRecord {
    pub fn release_id(&self) -> Option<u64> {
        match self {
            DiscogsRecord::Release(release) => release.id,
            DiscogsRecord::Artist(_) => None,
        }
    }
}

pub struct DiscogsProvider {
    client: DiscogsClient,
    title_cutoff: f64,
    per_page: u32,
}

impl DiscogsProvider {
    pub fn new(client: DiscogsClient, title_cutoff: f64, per_page: u32) -> Self {
        Self {
            client,
            title_cutoff,
            per_page,
        }
    }

    pub fn client(&self) -> &DiscogsClient {
        &self.client
    }
}

/// Turn a release into a track candidate
///
/// The candidate's title is the tracklist entry most similar to `title`;
/// returns `None` when no entry scores above `title_cutoff`.
pub fn release_to_candidate(
    release: Release,
    title: &str,
    title_cutoff: f64,
) -> Option<Candidate<DiscogsRecord>> {
    let titles = release.track_titles();
    let matched = best_matching_title(title, &titles, title_cutoff)?.to_string();

    Some(Candidate {
        display_title: Some(matched),
        artists: release.artist_names(),
        source_url: release
            .uri
            .as_deref()
            .or(release.resource_url.as_deref())
            .map(absolute_web_url)
            .unwrap_or_default(),
        record: DiscogsRecord::Release(Box::new(release)),
    })
}

/// Turn an artist search hit into an artist candidate
pub fn artist_result_to_candidate(result: SearchResult) -> Option<Candidate<DiscogsRecord>> {
    let name = result.title.as_deref().map(strip_disambiguation)?;
    Some(Candidate {
        display_title: None,
        artists: vec![name],
        source_url: result.web_url().unwrap_or_default(),
        record: DiscogsRecord::Artist(result),
    })
}

#[async_trait]
impl Provider for DiscogsProvider {
    type Record = DiscogsRecord;

    fn name(&self) -> &'static str {
        "discogs"
    }

    async fn search_artists(
        &self,
        names: &[String],
    ) -> Result<Vec<Candidate<DiscogsRecord>>, ProviderError> {
        let Some(main_artist) = names.first() else {
            return Ok(Vec::new());
        };

        let params = SearchParams {
            query: Some(main_artist.clone()),
            result_type: Some("artist".to_string()),
            per_page: Some(self.per_page),
            ..Default::default()
        };
        let results = self.client.search(&params).await?;
        debug!(artist = %main_artist, hits = results.results.len(), "Discogs artist search");

        Ok(results
            .results
            .into_iter()
            .filter_map(artist_result_to_candidate)
            .collect())
    }

    async fn search_tracks(
        &self,
        artists: &[String],
        title: &str,
        already_seen: &[Candidate<DiscogsRecord>],
    ) -> Result<Vec<Candidate<DiscogsRecord>>, ProviderError> {
        let Some(main_artist) = artists.first() else {
            return Ok(Vec::new());
        };

        let params = SearchParams {
            result_type: Some("release".to_string()),
            artist: Some(main_artist.clone()),
            track: Some(title.to_string()),
            per_page: Some(self.per_page),
            ..Default::default()
        };
        let results = self.client.search(&params).await?;
        debug!(
            artist = %main_artist,
            title = %title,
            hits = results.results.len(),
            "Discogs release search"
        );

        let mut seen: HashSet<u64> = already_seen
            .iter()
            .filter_map(|c| c.record.release_id())
            .collect();

        let mut candidates = Vec::new();
        for result in results.results {
            let Some(release_id) = result.id else {
                continue;
            };
            if !seen.insert(release_id) {
                debug!(release_id, "Release already fetched, skipping");
                continue;
            }

            let release = match self.client.get_release(release_id).await {
                Ok(release) => release,
                Err(e) => {
                    warn!(release_id, error = %e, "Failed to fetch Discogs release, skipping");
                    continue;
                }
            };

            match release_to_candidate(release, title, self.title_cutoff) {
                Some(candidate) => candidates.push(candidate),
                None => debug!(release_id, title = %title, "No matching track on release"),
            }
        }

        Ok(candidates)
    }

    async fn extract_genre_tags(
        &self,
        candidate: &Candidate<DiscogsRecord>,
    ) -> Result<Vec<GenreTag>, ProviderError> {
        Ok(match &candidate.record {
            DiscogsRecord::Release(release) => release
                .genres
                .iter()
                .chain(release.styles.iter())
                .map(GenreTag::unweighted)
                .collect(),
            DiscogsRecord::Artist(_) => Vec::new(),
        })
    }
}
