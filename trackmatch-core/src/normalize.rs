//! Artist splitting and "feat." extraction
//!
//! Artist tags often name several artists ("Srezcat [feat. blaxervant &
//! Shinonome I/F]") and titles often carry featured artists ("Some Song (ft.
//! Artist2)"). Both are turned into an ordered artist list, primary artist
//! first, so searches and scoring see every credited name.

use crate::types::{NormalizedQuery, Query};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::trace;

/// Separators between artist names, applied in this order
const ARTIST_SEPARATORS: &[&str] = &[
    " & ", " + ", " feat. ", " feat ", " ft. ", "vs. ", " vs ", ", ", " x ",
];

/// Bracket characters replaced with spaces before splitting
const BRACKETS: &[char] = &['(', ')', '[', ']'];

const SENTINEL: &str = "\u{1f}";

static SEPARATOR_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    ARTIST_SEPARATORS
        .iter()
        .map(|sep| Regex::new(&format!("(?i){}", regex::escape(sep))).unwrap())
        .collect()
});

/// "(feat. X)", "(feat X)", "(ft. X)"
static FEAT_PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\((?:feat|ft)(?:\.\s*|\s+)(.*?)\)").unwrap());

/// " feat. X", " feat X", " ft. X" running to the end of the text
static FEAT_TRAILING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s(?:feat|ft)(?:\.\s*|\s+)(.*)$").unwrap());

/// Split a raw artist string into individual artist names
///
/// Order is preserved. Never returns an empty list: if nothing survives the
/// split, the original string is returned as the only element.
pub fn split_artists(raw: &str) -> Vec<String> {
    let mut text = raw.replace(BRACKETS, " ");

    for pattern in SEPARATOR_PATTERNS.iter() {
        text = pattern.replace_all(&text, SENTINEL).into_owned();
    }

    let artists: Vec<String> = text
        .split(SENTINEL)
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect();

    if artists.is_empty() {
        return vec![raw.to_string()];
    }
    artists
}

/// Separate a "feat." clause from a title or subtitle
///
/// Returns the cleaned text and the featured artists. Text without a
/// "feat"/"ft" keyword passes through unchanged with no artists.
pub fn separate_featured_artists(text: &str) -> (String, Vec<String>) {
    let captures = FEAT_PARENTHESIZED
        .captures(text)
        .or_else(|| FEAT_TRAILING.captures(text));

    let Some(captures) = captures else {
        return (text.to_string(), Vec::new());
    };

    let (Some(clause), Some(contents)) = (captures.get(0), captures.get(1)) else {
        return (text.to_string(), Vec::new());
    };

    let artists = if contents.as_str().trim().is_empty() {
        Vec::new()
    } else {
        split_artists(contents.as_str())
    };

    let before = text[..clause.start()].trim_end();
    let after = text[clause.end()..].trim_start();
    let cleaned = match (before.is_empty(), after.is_empty()) {
        (false, false) => format!("{} {}", before, after),
        _ => format!("{}{}", before, after),
    };

    trace!(text = %text, cleaned = %cleaned, featured = ?artists, "Separated featured artists");
    (cleaned.trim().to_string(), artists)
}

/// Normalize artist, title and subtitle into a structured query
///
/// Featured artists found in the title or subtitle are appended after the
/// artists from the artist string. A featured artist already credited (case
/// insensitive) is not added twice.
pub fn normalize_title_and_artists(
    artist: &str,
    title: &str,
    subtitle: Option<&str>,
) -> NormalizedQuery {
    let mut artists = split_artists(artist);

    let (title, title_artists) = separate_featured_artists(title);
    merge_artists(&mut artists, title_artists);

    let subtitle = subtitle.and_then(|s| {
        let (cleaned, subtitle_artists) = separate_featured_artists(s);
        merge_artists(&mut artists, subtitle_artists);
        (!cleaned.is_empty()).then_some(cleaned)
    });

    NormalizedQuery {
        title,
        subtitle,
        artists,
    }
}

/// Normalize a [`Query`]
pub fn normalize_query(query: &Query) -> NormalizedQuery {
    normalize_title_and_artists(&query.artist, &query.title, query.subtitle.as_deref())
}

fn merge_artists(artists: &mut Vec<String>, extra: Vec<String>) {
    for name in extra {
        if !artists.iter().any(|a| a.eq_ignore_ascii_case(&name)) {
            artists.push(name);
        }
    }
}
