//! Configuration loading and config file resolution
//!
//! Settings come from a single TOML file. Every section and field is optional;
//! missing values fall back to built-in defaults defined in code.
//!
//! # Config File Priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `TRACKMATCH_CONFIG` environment variable
//! 3. `<config dir>/trackmatch/config.toml` (OS-dependent)
//! 4. Built-in defaults (no file)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TRACKMATCH_CONFIG";

/// Environment variable overriding `[discogs] token`
pub const DISCOGS_TOKEN_ENV_VAR: &str = "TRACKMATCH_DISCOGS_TOKEN";

/// Environment variable overriding `[lastfm] api_key`
pub const LASTFM_API_KEY_ENV_VAR: &str = "TRACKMATCH_LASTFM_API_KEY";

/// Top-level configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Scoring weights and cutoffs
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Genre taxonomy data locations
    #[serde(default)]
    pub taxonomy: TaxonomyConfig,

    /// Discogs provider settings
    #[serde(default)]
    pub discogs: DiscogsConfig,

    /// Last.fm provider settings
    #[serde(default)]
    pub lastfm: LastfmConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Static weights and cutoffs used when scoring candidates
///
/// None of these values adapt at runtime.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Title similarity at or below this value contributes nothing
    pub title_cutoff: f64,
    /// Artist score at or below this value contributes nothing
    pub artist_cutoff: f64,
    /// Weight of the sorted all-artists comparison
    pub all_artists_weight: f64,
    /// Weight of the primary-artist comparison
    pub main_artist_weight: f64,
    /// Weight of the any-artist-is-primary comparison
    pub any_artist_weight: f64,
    /// Fraction of `artist_cutoff` an individual artist must reach to count
    /// towards the any-artist term
    pub any_artist_cutoff_factor: f64,
    /// Candidates scoring at least `winner * near_tie_ratio` contribute genres
    pub near_tie_ratio: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            title_cutoff: 0.4,
            artist_cutoff: 0.7,
            all_artists_weight: 1.0,
            main_artist_weight: 0.5,
            any_artist_weight: 0.25,
            any_artist_cutoff_factor: 0.9,
            near_tie_ratio: 0.95,
        }
    }
}

impl MatchingConfig {
    /// Reject values that would make scoring meaningless
    pub fn validate(&self) -> Result<()> {
        let weights = [
            ("title_cutoff", self.title_cutoff),
            ("artist_cutoff", self.artist_cutoff),
            ("all_artists_weight", self.all_artists_weight),
            ("main_artist_weight", self.main_artist_weight),
            ("any_artist_weight", self.any_artist_weight),
            ("any_artist_cutoff_factor", self.any_artist_cutoff_factor),
        ];
        for (name, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "matching.{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }
        if !(self.near_tie_ratio > 0.0 && self.near_tie_ratio <= 1.0) {
            return Err(Error::Config(format!(
                "matching.near_tie_ratio must be in (0, 1], got {}",
                self.near_tie_ratio
            )));
        }
        Ok(())
    }
}

/// Locations of the genre tree and alias table
///
/// When a path is absent the bundled data is used instead.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TaxonomyConfig {
    /// Nested genre tree (YAML)
    #[serde(default)]
    pub tree_path: Option<PathBuf>,
    /// Canonical genre → synonyms table (YAML)
    #[serde(default)]
    pub alias_path: Option<PathBuf>,
}

/// Discogs provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscogsConfig {
    /// Personal access token
    pub token: Option<String>,
    /// User-Agent header (required by Discogs)
    pub user_agent: String,
    /// API base URL
    pub base_url: String,
    /// Retries on rate limiting or server errors
    pub max_retries: u32,
    /// Search results requested per round
    pub per_page: u32,
}

impl Default for DiscogsConfig {
    fn default() -> Self {
        Self {
            token: None,
            user_agent: "FuzzyTrackMatch/0.1".to_string(),
            base_url: "https://api.discogs.com".to_string(),
            max_retries: 3,
            per_page: 10,
        }
    }
}

/// Last.fm provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LastfmConfig {
    /// API key
    pub api_key: Option<String>,
    pub user_agent: String,
    /// API root (the `?method=` endpoint)
    pub base_url: String,
    /// Retries on rate limiting or server errors
    pub max_retries: u32,
    /// Search results requested per round
    pub limit: u32,
    /// Tags with a lower Last.fm count are dropped
    pub min_weight: u32,
}

impl Default for LastfmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            user_agent: "FuzzyTrackMatch/0.1".to_string(),
            base_url: "https://ws.audioscrobbler.com/2.0".to_string(),
            max_retries: 3,
            limit: 10,
            min_weight: 10,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;
        Self::parse(&content)
            .map_err(|e| Error::Config(format!("{} ({})", e, path.display())))
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;
        config.matching.validate()?;
        Ok(config)
    }

    /// Resolve the config file and load it, falling back to defaults when no
    /// file is found. Environment overrides are applied afterwards.
    pub fn load_or_default(cli_arg: Option<&Path>) -> Result<Self> {
        let mut config = match resolve_config_path(cli_arg) {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                Self::load(&path)?
            }
            None => {
                debug!("No configuration file found, using built-in defaults");
                Self::default()
            }
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = non_blank_env(DISCOGS_TOKEN_ENV_VAR) {
            debug!("Discogs token taken from {}", DISCOGS_TOKEN_ENV_VAR);
            self.discogs.token = Some(token);
        }
        if let Some(api_key) = non_blank_env(LASTFM_API_KEY_ENV_VAR) {
            debug!("Last.fm API key taken from {}", LASTFM_API_KEY_ENV_VAR);
            self.lastfm.api_key = Some(api_key);
        }
    }
}

fn non_blank_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Resolve which config file to read, if any
///
/// An explicit CLI path or environment path is returned even if it does not
/// exist, so that a typo surfaces as a load error rather than silent defaults.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: OS config directory
    default_config_file().filter(|path| path.exists())
}

/// Get default configuration file path for the platform
pub fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("trackmatch").join("config.toml"))
}
