//! Last.fm API response models
//!
//! Last.fm's JSON is converted from XML: a list with a single entry arrives
//! as a bare object, an empty list may arrive as a string, and counts are
//! often numeric strings. The deserializers below accept all of these.

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Accept a number or numeric string, anything else becomes `None`
fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Accept a list, a single object, or nothing
fn one_or_many<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(D::Error::custom))
            .collect(),
        Some(item @ Value::Object(_)) => serde_json::from_value(item)
            .map(|one| vec![one])
            .map_err(D::Error::custom),
        _ => Ok(Vec::new()),
    }
}

/// Error body returned in place of a result
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    pub error: Option<u32>,
    pub message: Option<String>,
}

/// Folksonomy tag
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Tag {
    pub name: Option<String>,
    /// Relative popularity of the tag on this item (0-100)
    #[serde(deserialize_with = "lenient_u64")]
    pub count: Option<u64>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TopTags {
    #[serde(deserialize_with = "one_or_many")]
    pub tag: Vec<Tag>,
}

/// `track.getTopTags` and `artist.getTopTags`
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TopTagsResponse {
    pub toptags: TopTags,
}

/// `track.search` hit
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackMatch {
    pub name: Option<String>,
    /// Artist name (search hits carry a plain string)
    pub artist: Option<String>,
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub listeners: Option<u64>,
    pub mbid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackMatches {
    #[serde(deserialize_with = "one_or_many")]
    pub track: Vec<TrackMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackSearchResults {
    #[serde(rename = "opensearch:totalResults", deserialize_with = "lenient_u64")]
    pub total_results: Option<u64>,
    #[serde(rename = "trackmatches", deserialize_with = "matches_or_empty")]
    pub matches: TrackMatches,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackSearchResponse {
    pub results: TrackSearchResults,
}

/// `artist.search` hit
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtistMatch {
    pub name: Option<String>,
    pub url: Option<String>,
    #[serde(deserialize_with = "lenient_u64")]
    pub listeners: Option<u64>,
    pub mbid: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtistMatches {
    #[serde(deserialize_with = "one_or_many")]
    pub artist: Vec<ArtistMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtistSearchResults {
    #[serde(rename = "opensearch:totalResults", deserialize_with = "lenient_u64")]
    pub total_results: Option<u64>,
    #[serde(rename = "artistmatches", deserialize_with = "matches_or_empty")]
    pub matches: ArtistMatches,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ArtistSearchResponse {
    pub results: ArtistSearchResults,
}

/// An empty match list arrives as a whitespace string
fn matches_or_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match Option::<Value>::deserialize(deserializer)? {
        Some(value @ Value::Object(_)) => serde_json::from_value(value).map_err(D::Error::custom),
        _ => Ok(T::default()),
    }
}
