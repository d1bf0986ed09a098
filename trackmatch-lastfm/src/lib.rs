//! # trackmatch-lastfm
//!
//! Last.fm adapter for `trackmatch-core`. Last.fm is the one catalog whose
//! genre tags carry a native weight (the number of listeners who applied the
//! tag), so its tags feed weighted scores into genre resolution.
//!
//! - [`LastfmClient`]: API-key client for the `?method=` web service
//! - [`models`]: search and top-tag response types
//! - [`LastfmProvider`]: the `Provider` implementation used by the engine

pub mod client;
pub mod models;
pub mod provider;

pub use client::LastfmClient;
pub use provider::{weighted_tags, LastfmProvider, LastfmRecord};
