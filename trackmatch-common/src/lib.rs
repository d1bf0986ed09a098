//! # trackmatch-common
//!
//! Shared code for the trackmatch crates:
//! - Error and result types
//! - TOML configuration loading and config file resolution
//! - Logging initialisation

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
