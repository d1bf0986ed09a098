//! Discogs client and provider tests against a local fake Discogs API

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use trackmatch_common::config::{DiscogsConfig, MatchingConfig};
use trackmatch_core::{
    GenreTaxonomy, Provider, ProviderError, Query as TrackQuery, ResolutionEngine,
};
use trackmatch_discogs::{DiscogsClient, DiscogsProvider, SearchParams};

const TOKEN: &str = "test-token";

#[derive(Clone, Default)]
struct FakeDiscogs {
    /// Number of upcoming requests answered with 429
    throttled: Arc<AtomicUsize>,
    /// Number of upcoming requests answered with 500
    failing: Arc<AtomicUsize>,
    /// Number of upcoming successful responses reporting an empty budget
    exhausted: Arc<AtomicUsize>,
    search_params: Arc<Mutex<Vec<HashMap<String, String>>>>,
    release_calls: Arc<Mutex<Vec<u64>>>,
}

fn take(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// Common auth and failure injection; `None` means serve normally
fn gate(state: &FakeDiscogs, headers: &HeaderMap) -> Option<Response> {
    let auth = headers.get("authorization").and_then(|v| v.to_str().ok());
    if auth != Some("Discogs token=test-token") {
        return Some((StatusCode::UNAUTHORIZED, "invalid token").into_response());
    }
    if take(&state.throttled) {
        return Some(
            (
                StatusCode::TOO_MANY_REQUESTS,
                [
                    ("retry-after", "0"),
                    ("x-discogs-ratelimit", "60"),
                    ("x-discogs-ratelimit-used", "60"),
                    ("x-discogs-ratelimit-remaining", "0"),
                ],
                "slow down",
            )
                .into_response(),
        );
    }
    if take(&state.failing) {
        return Some((StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response());
    }
    None
}

fn ok(state: &FakeDiscogs, body: Value) -> Response {
    let (used, remaining) = if take(&state.exhausted) {
        ("60", "0")
    } else {
        ("1", "59")
    };
    (
        [
            ("x-discogs-ratelimit", "60"),
            ("x-discogs-ratelimit-used", used),
            ("x-discogs-ratelimit-remaining", remaining),
        ],
        Json(body),
    )
        .into_response()
}

async fn search(
    State(state): State<FakeDiscogs>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(response) = gate(&state, &headers) {
        return response;
    }
    state.search_params.lock().unwrap().push(params.clone());

    let results = match params.get("type").map(String::as_str) {
        Some("artist") => json!([
            {
                "id": 125246,
                "type": "artist",
                "title": "Nirvana",
                "uri": "/artist/125246-Nirvana"
            },
            {
                "id": 307513,
                "type": "artist",
                "title": "Nirvana (2)",
                "uri": "/artist/307513-Nirvana-2"
            }
        ]),
        _ => json!([
            {"id": 1, "type": "release", "title": "Nirvana - Nevermind"},
            {"id": 2, "type": "release", "title": "Nirvana - Smells Like Teen Spirit"},
            {"id": 404, "type": "release", "title": "Deleted"},
            {"id": 3, "type": "release", "title": "Nirvana - Unrelated"},
            {"id": 1, "type": "release", "title": "Nirvana - Nevermind"}
        ]),
    };

    ok(&state, json!({
        "pagination": {"page": 1, "pages": 1, "per_page": 10, "items": 5, "urls": {}},
        "results": results
    }))
}

async fn release(
    State(state): State<FakeDiscogs>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if let Some(response) = gate(&state, &headers) {
        return response;
    }
    state.release_calls.lock().unwrap().push(id);

    match id {
        1 => ok(&state, json!({
            "id": 1,
            "title": "Nevermind",
            "year": 1991,
            "genres": ["Rock"],
            "styles": ["Grunge"],
            "uri": "https://www.discogs.com/release/1-Nirvana-Nevermind",
            "artists": [{"id": 125246, "name": "Nirvana"}],
            "tracklist": [
                {"position": "A1", "type_": "track", "title": "Smells Like Teen Spirit"},
                {"position": "A2", "type_": "track", "title": "In Bloom"}
            ]
        })),
        2 => ok(&state, json!({
            "id": 2,
            "title": "Smells Like Teen Spirit",
            "genres": [],
            "styles": ["Alternative Rock"],
            "uri": "https://www.discogs.com/release/2-Nirvana-Smells-Like-Teen-Spirit",
            "artists": [{"id": 125246, "name": "Nirvana"}],
            "tracklist": [
                {"position": "1", "type_": "track", "title": "Smells Like Teen Spirit (Edit)"},
                {"position": "2", "type_": "track", "title": "Even In His Youth"}
            ]
        })),
        3 => ok(&state, json!({
            "id": 3,
            "title": "Unrelated",
            "artists": [{"id": 125246, "name": "Nirvana"}],
            "tracklist": [
                {"position": "1", "type_": "track", "title": "Xyzzy Plugh Frobozz Quux"}
            ]
        })),
        _ => (StatusCode::NOT_FOUND, "Release not found.").into_response(),
    }
}

async fn master(
    State(state): State<FakeDiscogs>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if let Some(response) = gate(&state, &headers) {
        return response;
    }
    ok(
        &state,
        json!({
            "id": id,
            "title": "Nevermind",
            "year": 1991,
            "main_release": 1,
            "genres": ["Rock"]
        }),
    )
}

async fn artist(
    State(state): State<FakeDiscogs>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if let Some(response) = gate(&state, &headers) {
        return response;
    }
    ok(
        &state,
        json!({
            "id": id,
            "name": "Nirvana",
            "profile": "American rock band",
            "uri": "https://www.discogs.com/artist/125246-Nirvana"
        }),
    )
}

async fn spawn_server(state: FakeDiscogs) -> String {
    let app = Router::new()
        .route("/database/search", get(search))
        .route("/releases/:id", get(release))
        .route("/masters/:id", get(master))
        .route("/artists/:id", get(artist))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn config(base_url: &str, max_retries: u32) -> DiscogsConfig {
    DiscogsConfig {
        token: Some(TOKEN.to_string()),
        base_url: base_url.to_string(),
        max_retries,
        ..Default::default()
    }
}

async fn provider(state: FakeDiscogs) -> DiscogsProvider {
    let url = spawn_server(state).await;
    let client = DiscogsClient::new(&config(&url, 3)).unwrap();
    DiscogsProvider::new(client, 0.4, 10)
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_search_tracks_converts_matching_releases() {
    let state = FakeDiscogs::default();
    let provider = provider(state.clone()).await;

    let candidates = provider
        .search_tracks(&strings(&["Nirvana", "Dave Grohl"]), "Smells Like Teen Spirit", &[])
        .await
        .unwrap();

    let titles: Vec<_> = candidates.iter().map(|c| c.display_title.clone().unwrap()).collect();
    assert_eq!(
        titles,
        vec!["Smells Like Teen Spirit", "Smells Like Teen Spirit (Edit)"]
    );
    assert_eq!(candidates[0].artists, vec!["Nirvana"]);
    assert_eq!(
        candidates[0].source_url,
        "https://www.discogs.com/release/1-Nirvana-Nevermind"
    );

    // missing release skipped, duplicate id fetched once
    assert_eq!(*state.release_calls.lock().unwrap(), vec![1, 2, 404, 3]);

    let params = state.search_params.lock().unwrap()[0].clone();
    assert_eq!(params.get("type").map(String::as_str), Some("release"));
    assert_eq!(params.get("artist").map(String::as_str), Some("Nirvana"));
    assert_eq!(params.get("track").map(String::as_str), Some("Smells Like Teen Spirit"));
    assert_eq!(params.get("per_page").map(String::as_str), Some("10"));
}

#[tokio::test]
async fn test_search_tracks_skips_already_seen_releases() {
    let state = FakeDiscogs::default();
    let provider = provider(state.clone()).await;
    let artists = strings(&["Nirvana"]);

    let first = provider
        .search_tracks(&artists, "Smells Like Teen Spirit", &[])
        .await
        .unwrap();
    state.release_calls.lock().unwrap().clear();

    let second = provider
        .search_tracks(&artists, "Smells Like Teen Spirit", &first)
        .await
        .unwrap();

    assert!(second.is_empty());
    assert_eq!(*state.release_calls.lock().unwrap(), vec![404, 3]);
}

#[tokio::test]
async fn test_search_artists() {
    let state = FakeDiscogs::default();
    let provider = provider(state.clone()).await;

    let candidates = provider.search_artists(&strings(&["Nirvana"])).await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert_eq!(candidates[1].artists, vec!["Nirvana"]);
    assert_eq!(
        candidates[0].source_url,
        "https://www.discogs.com/artist/125246-Nirvana"
    );
    assert!(provider.extract_genre_tags(&candidates[0]).await.unwrap().is_empty());

    let params = state.search_params.lock().unwrap()[0].clone();
    assert_eq!(params.get("type").map(String::as_str), Some("artist"));
    assert_eq!(params.get("q").map(String::as_str), Some("Nirvana"));
}

#[tokio::test]
async fn test_release_genre_tags() {
    let provider = provider(FakeDiscogs::default()).await;
    let candidates = provider
        .search_tracks(&strings(&["Nirvana"]), "Smells Like Teen Spirit", &[])
        .await
        .unwrap();

    let tags = provider.extract_genre_tags(&candidates[0]).await.unwrap();
    let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Rock", "Grunge"]);
    assert!(tags.iter().all(|t| t.score == 1.0));
}

#[tokio::test]
async fn test_retries_after_rate_limit() {
    let state = FakeDiscogs::default();
    state.throttled.store(1, Ordering::SeqCst);
    let url = spawn_server(state.clone()).await;
    let client = DiscogsClient::new(&config(&url, 3)).unwrap();

    let release = client.get_release(1).await.unwrap();
    assert_eq!(release.title.as_deref(), Some("Nevermind"));

    let status = client.rate_limit().await;
    assert_eq!(status.limit, Some(60));
    assert_eq!(status.used, Some(1));
    assert_eq!(status.remaining, Some(59));
}

#[tokio::test]
async fn test_rate_limit_with_empty_budget_waits_only_retry_after() {
    // 429 reports remaining 0 and Retry-After 0; the default one-minute
    // quota window must not be slept on the retry
    let state = FakeDiscogs::default();
    state.throttled.store(2, Ordering::SeqCst);
    let url = spawn_server(state.clone()).await;
    let client = DiscogsClient::new(&config(&url, 3)).unwrap();

    let master = tokio::time::timeout(Duration::from_secs(10), client.get_master(13814))
        .await
        .expect("retry after 429 waited out the quota window")
        .unwrap();
    assert_eq!(master.main_release, Some(1));
    assert_eq!(client.rate_limit().await.remaining, Some(59));
}

#[tokio::test]
async fn test_empty_budget_delays_next_request() {
    let window = Duration::from_millis(300);
    let state = FakeDiscogs::default();
    state.exhausted.store(1, Ordering::SeqCst);
    let url = spawn_server(state.clone()).await;
    let client = DiscogsClient::new(&config(&url, 0))
        .unwrap()
        .with_quota_window(window);

    let started = Instant::now();
    client.get_release(1).await.unwrap();
    assert!(started.elapsed() < window);
    assert_eq!(client.rate_limit().await.remaining, Some(0));

    let started = Instant::now();
    let artist = client.get_artist(125246).await.unwrap();
    assert!(started.elapsed() >= window);
    assert_eq!(artist.name.as_deref(), Some("Nirvana"));
    assert_eq!(client.rate_limit().await.remaining, Some(59));
}

#[tokio::test]
async fn test_rate_limit_gives_up() {
    let state = FakeDiscogs::default();
    state.throttled.store(10, Ordering::SeqCst);
    let url = spawn_server(state).await;
    let client = DiscogsClient::new(&config(&url, 1)).unwrap();

    let result = client.search(&SearchParams::default()).await;
    assert!(matches!(result, Err(ProviderError::RateLimited { retries: 1 })));
}

#[tokio::test]
async fn test_server_error_retried() {
    let state = FakeDiscogs::default();
    state.failing.store(1, Ordering::SeqCst);
    let url = spawn_server(state).await;
    let client = DiscogsClient::new(&config(&url, 1)).unwrap();

    let master = client.get_master(13814).await.unwrap();
    assert_eq!(master.main_release, Some(1));
}

#[tokio::test]
async fn test_server_error_gives_up() {
    let state = FakeDiscogs::default();
    state.failing.store(10, Ordering::SeqCst);
    let url = spawn_server(state).await;
    let client = DiscogsClient::new(&config(&url, 0)).unwrap();

    let result = client.get_artist(125246).await;
    assert!(matches!(result, Err(ProviderError::Api { status: 500, .. })));
}

#[tokio::test]
async fn test_not_found() {
    let url = spawn_server(FakeDiscogs::default()).await;
    let client = DiscogsClient::new(&config(&url, 0)).unwrap();
    assert!(matches!(
        client.get_release(404).await,
        Err(ProviderError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_rejected_token() {
    let url = spawn_server(FakeDiscogs::default()).await;
    let mut config = config(&url, 0);
    config.token = Some("wrong".to_string());
    let client = DiscogsClient::new(&config).unwrap();
    assert!(matches!(
        client.get_release(1).await,
        Err(ProviderError::Auth(_))
    ));
}

#[tokio::test]
async fn test_get_artist() {
    let url = spawn_server(FakeDiscogs::default()).await;
    let client = DiscogsClient::new(&config(&url, 0)).unwrap();
    let artist = client.get_artist(125246).await.unwrap();
    assert_eq!(artist.name.as_deref(), Some("Nirvana"));
    assert_eq!(artist.profile.as_deref(), Some("American rock band"));
}

#[tokio::test]
async fn test_engine_resolves_track_through_discogs() {
    let provider = provider(FakeDiscogs::default()).await;
    let taxonomy = Arc::new(GenreTaxonomy::bundled().unwrap());
    let engine = ResolutionEngine::new(provider, taxonomy, MatchingConfig::default());

    let resolution = engine
        .resolve_track(&TrackQuery::new("Nirvana", "Smells Like Teen Spirit"))
        .await
        .unwrap();

    assert_eq!(resolution.track.title, "Smells Like Teen Spirit");
    assert_eq!(
        resolution.track.source_url,
        "https://www.discogs.com/release/1-Nirvana-Nevermind"
    );

    let paths: Vec<Vec<&str>> = resolution
        .canonical_genres
        .iter()
        .map(|p| p.iter().map(|t| t.name.as_str()).collect())
        .collect();
    assert_eq!(paths, vec![vec!["Grunge", "Alternative Rock", "Rock"]]);
}

#[tokio::test]
async fn test_engine_resolves_artist_without_genres() {
    let provider = provider(FakeDiscogs::default()).await;
    let taxonomy = Arc::new(GenreTaxonomy::bundled().unwrap());
    let engine = ResolutionEngine::new(provider, taxonomy, MatchingConfig::default());

    let resolution = engine.resolve_artist("Nirvana").await.unwrap();
    assert_eq!(resolution.artist.artists, vec!["Nirvana"]);
    assert_eq!(
        resolution.artist.source_url,
        "https://www.discogs.com/artist/125246-Nirvana"
    );
    assert!(resolution.genres.is_empty());
    assert!(resolution.canonical_genres.is_empty());
}
