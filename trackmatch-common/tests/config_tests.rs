//! Integration tests for config file resolution and loading
//!
//! Tests that manipulate TRACKMATCH_* environment variables are marked
//! #[serial] so they never run in parallel.

use serial_test::serial;
use std::io::Write;
use std::path::Path;
use trackmatch_common::config::{
    resolve_config_path, TomlConfig, CONFIG_ENV_VAR, DISCOGS_TOKEN_ENV_VAR,
    LASTFM_API_KEY_ENV_VAR,
};
use trackmatch_common::Error;

fn write_config(dir: &Path, content: &str) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(content.as_bytes()).unwrap();
    path
}

#[test]
#[serial]
fn test_cli_path_overrides_env() {
    let dir = tempfile::tempdir().unwrap();
    let cli_path = write_config(dir.path(), "[logging]\nlevel = \"debug\"\n");
    std::env::set_var(CONFIG_ENV_VAR, "/nonexistent/env.toml");

    let resolved = resolve_config_path(Some(&cli_path));
    assert_eq!(resolved.as_deref(), Some(cli_path.as_path()));

    std::env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_env_path_used_without_cli() {
    let dir = tempfile::tempdir().unwrap();
    let env_path = write_config(dir.path(), "[matching]\ntitle_cutoff = 0.55\n");
    std::env::set_var(CONFIG_ENV_VAR, &env_path);

    let config = TomlConfig::load_or_default(None).unwrap();
    assert_eq!(config.matching.title_cutoff, 0.55);

    std::env::remove_var(CONFIG_ENV_VAR);
}

#[test]
#[serial]
fn test_missing_explicit_file_is_an_error() {
    std::env::remove_var(CONFIG_ENV_VAR);
    let path = Path::new("/nonexistent/trackmatch.toml");
    let result = TomlConfig::load_or_default(Some(path));
    match result {
        Err(Error::Config(message)) => assert!(message.contains("/nonexistent/trackmatch.toml")),
        other => panic!("expected a config error, got {:?}", other),
    }
}

#[test]
#[serial]
fn test_discogs_token_env_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[discogs]\ntoken = \"from-file\"\n");
    std::env::set_var(DISCOGS_TOKEN_ENV_VAR, "from-env");

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.discogs.token.as_deref(), Some("from-env"));

    std::env::remove_var(DISCOGS_TOKEN_ENV_VAR);
}

#[test]
#[serial]
fn test_blank_token_env_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[discogs]\ntoken = \"from-file\"\n");
    std::env::set_var(DISCOGS_TOKEN_ENV_VAR, "   ");

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.discogs.token.as_deref(), Some("from-file"));

    std::env::remove_var(DISCOGS_TOKEN_ENV_VAR);
}

#[test]
#[serial]
fn test_lastfm_api_key_env_override() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[lastfm]\nmin_weight = 5\n");
    std::env::set_var(LASTFM_API_KEY_ENV_VAR, "env-key");

    let config = TomlConfig::load_or_default(Some(&path)).unwrap();
    assert_eq!(config.lastfm.api_key.as_deref(), Some("env-key"));
    assert_eq!(config.lastfm.min_weight, 5);

    std::env::remove_var(LASTFM_API_KEY_ENV_VAR);
}

#[test]
fn test_taxonomy_paths_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        "[taxonomy]\ntree_path = \"/data/tree.yaml\"\nalias_path = \"/data/aliases.yaml\"\n",
    );

    let config = TomlConfig::load(&path).unwrap();
    assert_eq!(
        config.taxonomy.tree_path.as_deref(),
        Some(Path::new("/data/tree.yaml"))
    );
    assert_eq!(
        config.taxonomy.alias_path.as_deref(),
        Some(Path::new("/data/aliases.yaml"))
    );
}
