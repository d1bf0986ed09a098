//! # trackmatch-discogs
//!
//! Discogs catalog adapter for `trackmatch-core`:
//! - [`DiscogsClient`]: authenticated HTTP client with rate-limit tracking
//! - [`models`]: response types for search, release, master and artist
//! - [`DiscogsProvider`]: the `Provider` implementation used by the engine

pub mod client;
pub mod models;
pub mod provider;

pub use client::{DiscogsClient, RateLimitStatus, SearchParams};
pub use provider::{DiscogsProvider, DiscogsRecord};
