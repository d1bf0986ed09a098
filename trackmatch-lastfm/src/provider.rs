//! Last.fm implementation of the `Provider` capability

use crate::client::LastfmClient;
use crate::models::{ArtistMatch, Tag, TrackMatch};
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::debug;
use trackmatch_core::{Candidate, GenreTag, Provider, ProviderError};

/// Record carried by a Last.fm candidate
#[derive(Debug, Clone)]
pub enum LastfmRecord {
    Track(TrackMatch),
    Artist(ArtistMatch),
}

impl LastfmRecord {
    /// Identity used to skip hits already returned by an earlier round
    fn key(&self) -> Option<String> {
        match self {
            LastfmRecord::Track(track) => match (&track.artist, &track.name) {
                (Some(artist), Some(name)) => Some(format!(
                    "{}\u{1f}{}",
                    artist.to_lowercase(),
                    name.to_lowercase()
                )),
                _ => None,
            },
            LastfmRecord::Artist(artist) => artist.name.as_ref().map(|n| n.to_lowercase()),
        }
    }
}

pub struct LastfmProvider {
    client: LastfmClient,
    limit: u32,
    min_weight: u32,
}

impl LastfmProvider {
    pub fn new(client: LastfmClient, limit: u32, min_weight: u32) -> Self {
        Self {
            client,
            limit,
            min_weight,
        }
    }
}

/// Turn top tags into weighted genre tags
///
/// Tags with a count below `min_weight` (a missing count is 0) are dropped.
/// Names are lower-cased and the count becomes the score.
pub fn weighted_tags(tags: Vec<Tag>, min_weight: u32) -> Vec<GenreTag> {
    tags.into_iter()
        .filter_map(|tag| {
            let count = tag.count.unwrap_or(0);
            let name = tag.name?.trim().to_lowercase();
            (count >= u64::from(min_weight) && !name.is_empty())
                .then(|| GenreTag::new(name, count as f64))
        })
        .collect()
}

/// Turn a track search hit into a track candidate
pub fn track_match_to_candidate(track: TrackMatch) -> Option<Candidate<LastfmRecord>> {
    let title = track.name.clone().filter(|n| !n.trim().is_empty())?;
    let artist = track.artist.clone().filter(|a| !a.trim().is_empty())?;
    Some(Candidate {
        display_title: Some(title),
        artists: vec![artist],
        source_url: track.url.clone().unwrap_or_default(),
        record: LastfmRecord::Track(track),
    })
}

/// Turn an artist search hit into an artist candidate
pub fn artist_match_to_candidate(artist: ArtistMatch) -> Option<Candidate<LastfmRecord>> {
    let name = artist.name.clone().filter(|n| !n.trim().is_empty())?;
    Some(Candidate {
        display_title: None,
        artists: vec![name],
        source_url: artist.url.clone().unwrap_or_default(),
        record: LastfmRecord::Artist(artist),
    })
}

#[async_trait]
impl Provider for LastfmProvider {
    type Record = LastfmRecord;

    fn name(&self) -> &'static str {
        "lastfm"
    }

    async fn search_artists(
        &self,
        names: &[String],
    ) -> Result<Vec<Candidate<LastfmRecord>>, ProviderError> {
        let Some(main_artist) = names.first() else {
            return Ok(Vec::new());
        };

        let results = self.client.search_artists(main_artist, self.limit).await?;
        debug!(
            artist = %main_artist,
            hits = results.matches.artist.len(),
            "Last.fm artist search"
        );

        Ok(results
            .matches
            .artist
            .into_iter()
            .filter_map(artist_match_to_candidate)
            .collect())
    }

    async fn search_tracks(
        &self,
        artists: &[String],
        title: &str,
        already_seen: &[Candidate<LastfmRecord>],
    ) -> Result<Vec<Candidate<LastfmRecord>>, ProviderError> {
        let Some(main_artist) = artists.first() else {
            return Ok(Vec::new());
        };

        let results = self.client.search_tracks(main_artist, title, self.limit).await?;
        debug!(
            artist = %main_artist,
            title = %title,
            hits = results.matches.track.len(),
            "Last.fm track search"
        );

        let mut seen: HashSet<String> = already_seen
            .iter()
            .filter_map(|c| c.record.key())
            .collect();

        Ok(results
            .matches
            .track
            .into_iter()
            .filter_map(track_match_to_candidate)
            .filter(|candidate| match candidate.record.key() {
                Some(key) => seen.insert(key),
                None => true,
            })
            .collect())
    }

    async fn extract_genre_tags(
        &self,
        candidate: &Candidate<LastfmRecord>,
    ) -> Result<Vec<GenreTag>, ProviderError> {
        let tags = match &candidate.record {
            LastfmRecord::Track(track) => {
                let (Some(artist), Some(name)) = (&track.artist, &track.name) else {
                    return Ok(Vec::new());
                };
                self.client.track_top_tags(artist, name).await?
            }
            LastfmRecord::Artist(artist) => {
                let Some(name) = &artist.name else {
                    return Ok(Vec::new());
                };
                self.client.artist_top_tags(name).await?
            }
        };
        Ok(weighted_tags(tags, self.min_weight))
    }
}
