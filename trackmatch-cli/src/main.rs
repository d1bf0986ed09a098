//! trackmatch - resolve a track or artist against an online music catalog
//!
//! Prints the resolution as pretty JSON on stdout, or `no match`. Logs go to
//! stderr.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use trackmatch_common::config::{TomlConfig, DISCOGS_TOKEN_ENV_VAR, LASTFM_API_KEY_ENV_VAR};
use trackmatch_common::logging;
use trackmatch_core::{GenreTaxonomy, Provider, Query, ResolutionEngine};
use trackmatch_discogs::{DiscogsClient, DiscogsProvider};
use trackmatch_lastfm::{LastfmClient, LastfmProvider};

/// Command-line arguments for trackmatch
#[derive(Parser, Debug)]
#[command(name = "trackmatch")]
#[command(about = "Fuzzy track/artist lookup with canonical genres")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level, overrides the configured one
    #[arg(long)]
    log_level: Option<String>,

    /// Catalog to search
    #[arg(
        short,
        long,
        value_enum,
        env = "TRACKMATCH_PROVIDER",
        default_value_t = ProviderKind::Discogs
    )]
    provider: ProviderKind,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ProviderKind {
    Discogs,
    Lastfm,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a track
    Track {
        #[arg(short, long)]
        artist: String,
        #[arg(short, long)]
        title: String,
        /// Version or mix name, e.g. "Radio Edit"
        #[arg(short, long)]
        subtitle: Option<String>,
    },
    /// Resolve an artist
    Artist {
        #[arg(short, long)]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = TomlConfig::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    logging::init(&config.logging).context("Failed to initialize logging")?;

    info!(
        provider = ?args.provider,
        "Starting trackmatch v{}",
        env!("CARGO_PKG_VERSION")
    );

    let taxonomy = Arc::new(
        GenreTaxonomy::load(&config.taxonomy).context("Failed to load genre taxonomy")?,
    );

    let output = match args.provider {
        ProviderKind::Discogs => {
            let client = DiscogsClient::new(&config.discogs).with_context(|| {
                format!(
                    "Failed to create Discogs client (set [discogs] token or {})",
                    DISCOGS_TOKEN_ENV_VAR
                )
            })?;
            let provider = DiscogsProvider::new(
                client,
                config.matching.title_cutoff,
                config.discogs.per_page,
            );
            run(provider, taxonomy, &config, args.command).await?
        }
        ProviderKind::Lastfm => {
            let client = LastfmClient::new(&config.lastfm).with_context(|| {
                format!(
                    "Failed to create Last.fm client (set [lastfm] api_key or {})",
                    LASTFM_API_KEY_ENV_VAR
                )
            })?;
            let provider =
                LastfmProvider::new(client, config.lastfm.limit, config.lastfm.min_weight);
            run(provider, taxonomy, &config, args.command).await?
        }
    };

    match output {
        Some(json) => println!("{}", json),
        None => println!("no match"),
    }

    Ok(())
}

/// Resolve the requested entity, returning pretty JSON or `None` for no match
async fn run<P: Provider>(
    provider: P,
    taxonomy: Arc<GenreTaxonomy>,
    config: &TomlConfig,
    command: Command,
) -> Result<Option<String>> {
    let engine = ResolutionEngine::new(provider, taxonomy, config.matching.clone());

    let json = match command {
        Command::Track {
            artist,
            title,
            subtitle,
        } => {
            let mut query = Query::new(artist, title);
            if let Some(subtitle) = subtitle {
                query = query.with_subtitle(subtitle);
            }
            match engine.resolve_track(&query).await {
                Some(resolution) => Some(serde_json::to_string_pretty(&resolution)?),
                None => None,
            }
        }
        Command::Artist { name } => match engine.resolve_artist(&name).await {
            Some(resolution) => Some(serde_json::to_string_pretty(&resolution)?),
            None => None,
        },
    };
    Ok(json)
}
