//! Discogs API response models
//!
//! Only the fields used for matching and genre extraction are modelled. Every
//! field is optional on the wire, so structs default missing fields, and
//! numeric ids and years accept either JSON numbers or numeric strings.

use serde::{Deserialize, Deserializer, Serialize};

/// Public website root for relative `uri` values in search results
pub const WEB_BASE_URL: &str = "https://www.discogs.com";

/// Accept a number or numeric string, anything else becomes `None`
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_u64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Artist credit on a release or track, or a full artist record
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Artist {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    pub name: Option<String>,
    /// Artist name variation used on this credit
    pub anv: Option<String>,
    /// Joining text to the next credit (e.g. "&", "feat.")
    pub join: Option<String>,
    pub role: Option<String>,
    pub resource_url: Option<String>,
    pub uri: Option<String>,
    pub profile: Option<String>,
}

impl Artist {
    /// Name without the numeric disambiguation suffix Discogs appends to
    /// duplicate names ("Nirvana (2)" → "Nirvana")
    pub fn display_name(&self) -> Option<String> {
        self.name.as_deref().map(strip_disambiguation)
    }
}

/// Remove a trailing " (N)" where N is all digits
pub fn strip_disambiguation(name: &str) -> String {
    let trimmed = name.trim();
    if let Some((base, suffix)) = trimmed
        .strip_suffix(')')
        .and_then(|rest| rest.rsplit_once(" ("))
    {
        if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
            return base.trim_end().to_string();
        }
    }
    trimmed.to_string()
}

/// Tracklist entry
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Track {
    pub position: Option<String>,
    pub title: Option<String>,
    pub duration: Option<String>,
    /// "track", "heading" or "index"
    #[serde(rename = "type_")]
    pub track_type: Option<String>,
    pub artists: Vec<Artist>,
    #[serde(rename = "extraartists")]
    pub credits: Vec<Artist>,
}

/// Record label credit
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Label {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    pub name: Option<String>,
    pub catno: Option<String>,
    pub resource_url: Option<String>,
}

/// Full release record (`GET /releases/{id}`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Release {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub year: Option<u64>,
    pub country: Option<String>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    /// Website URL of the release page
    pub uri: Option<String>,
    pub resource_url: Option<String>,
    pub artists: Vec<Artist>,
    pub artists_sort: Option<String>,
    #[serde(rename = "extraartists")]
    pub credits: Vec<Artist>,
    pub tracklist: Vec<Track>,
    pub labels: Vec<Label>,
    #[serde(deserialize_with = "lenient_u64")]
    pub master_id: Option<u64>,
    pub data_quality: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub thumb: Option<String>,
}

impl Release {
    /// Artist names with disambiguation suffixes removed
    pub fn artist_names(&self) -> Vec<String> {
        self.artists.iter().filter_map(Artist::display_name).collect()
    }

    /// Titles of the playable tracks (headings and index entries skipped)
    pub fn track_titles(&self) -> Vec<String> {
        self.tracklist
            .iter()
            .filter(|t| t.track_type.as_deref().map_or(true, |kind| kind == "track"))
            .filter_map(|t| t.title.clone())
            .collect()
    }
}

/// Master release record (`GET /masters/{id}`)
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Master {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub year: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub main_release: Option<u64>,
    pub genres: Vec<String>,
    pub styles: Vec<String>,
    pub uri: Option<String>,
    pub artists: Vec<Artist>,
    pub tracklist: Vec<Track>,
}

/// One entry of a database search
///
/// Search results carry partial data; fetch the full record by `id`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchResult {
    #[serde(deserialize_with = "lenient_u64")]
    pub id: Option<u64>,
    /// "release", "master", "artist" or "label"
    #[serde(rename = "type")]
    pub result_type: Option<String>,
    /// "Artist - Title" for releases, the name for artists
    pub title: Option<String>,
    pub resource_url: Option<String>,
    /// Website path, relative to [`WEB_BASE_URL`]
    pub uri: Option<String>,
    pub thumb: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub year: Option<u64>,
    pub country: Option<String>,
    pub format: Vec<String>,
    pub genre: Vec<String>,
    pub style: Vec<String>,
}

impl SearchResult {
    /// Absolute website URL of the result
    pub fn web_url(&self) -> Option<String> {
        self.uri.as_deref().map(absolute_web_url)
    }
}

/// Prefix relative website paths with [`WEB_BASE_URL`]
pub fn absolute_web_url(uri: &str) -> String {
    if uri.starts_with("http://") || uri.starts_with("https://") {
        uri.to_string()
    } else {
        format!("{}/{}", WEB_BASE_URL, uri.trim_start_matches('/'))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PaginationUrls {
    pub first: Option<String>,
    pub prev: Option<String>,
    pub next: Option<String>,
    pub last: Option<String>,
}

/// Paging information of a search response
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Pagination {
    #[serde(deserialize_with = "lenient_u64")]
    pub page: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub pages: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub per_page: Option<u64>,
    #[serde(deserialize_with = "lenient_u64")]
    pub items: Option<u64>,
    pub urls: PaginationUrls,
}

/// `GET /database/search` response
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SearchResults {
    pub pagination: Pagination,
    pub results: Vec<SearchResult>,
}
