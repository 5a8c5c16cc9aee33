//! Startup configuration: command line, optional TOML file, built-in defaults.
//!
//! The source registry is fixed for the lifetime of the process.  Precedence
//! for the sources directory is CLI flag, then config file, then
//! [`DEFAULT_SOURCES_DIR`].
//!
//! ```toml
//! sources_dir = "/srv/exports"
//! tags = ["sony", "fujifilm"]
//!
//! [[sources]]
//! key = "chotot"
//! label = "Chợ Tốt"
//! location = "https://example.com/chotot.csv"
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::source::{CsvSource, DataSource, SourceKey};

/// Where the crawlers drop their exports, relative to the working directory.
pub const DEFAULT_SOURCES_DIR: &str = "data/sources";

/// Tags offered as one-key filters when the config file names none.
pub const SUGGESTED_TAGS: [&str; 4] = ["sony", "dji", "canon", "nikon"];

/// Browse second-hand marketplace listings exported as CSV.
#[derive(Debug, Default, Parser)]
#[command(version, about)]
pub struct Cli {
    /// TOML file with the source registry and suggested tags
    #[arg(short, long, env = "SAN_DO_CU_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding chotot.csv, facebook_group.csv and facebook_marketplace.csv
    #[arg(long, env = "SAN_DO_CU_SOURCES_DIR")]
    pub sources_dir: Option<PathBuf>,

    /// Directory for viewed state and logs
    #[arg(long, env = "SAN_DO_CU_DATA_DIR")]
    pub data_dir: Option<PathBuf>,
}

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceSpec {
    pub key: SourceKey,
    pub label: String,
    /// File path or `http(s)://` URL.
    pub location: String,
}

impl SourceSpec {
    pub fn new(key: SourceKey, label: &str, location: impl Into<String>) -> Self {
        Self {
            key,
            label: label.to_string(),
            location: location.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    sources_dir: Option<PathBuf>,
    sources: Vec<SourceSpec>,
    tags: Option<Vec<String>>,
}

/// Resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub sources: Vec<SourceSpec>,
    pub tags: Vec<String>,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let (file, base) = match &cli.config {
            Some(path) => {
                let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
                let file = parse_file(&text, path)?;
                (file, path.parent().map(Path::to_path_buf))
            }
            None => (FileConfig::default(), None),
        };

        let sources_dir = cli
            .sources_dir
            .clone()
            .or(file.sources_dir)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SOURCES_DIR));

        let sources = if file.sources.is_empty() {
            default_sources(&sources_dir)
        } else {
            file.sources
                .into_iter()
                .map(|spec| resolve_location(spec, base.as_deref()))
                .collect()
        };
        check_unique(&sources)?;

        let tags = file
            .tags
            .unwrap_or_else(|| SUGGESTED_TAGS.iter().map(|t| t.to_string()).collect());

        let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);

        Ok(Self {
            sources,
            tags,
            data_dir,
        })
    }

    /// Instantiate the registry as loadable sources.
    pub fn build_sources(&self) -> Vec<Arc<dyn DataSource>> {
        self.sources
            .iter()
            .map(|spec| {
                Arc::new(CsvSource::new(spec.key, &spec.label, &spec.location)) as Arc<dyn DataSource>
            })
            .collect()
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

/// The three marketplaces the crawlers cover.
pub fn default_sources(dir: &Path) -> Vec<SourceSpec> {
    let at = |file: &str| dir.join(file).to_string_lossy().into_owned();
    vec![
        SourceSpec::new(SourceKey::Chotot, "Chợ Tốt", at("chotot.csv")),
        SourceSpec::new(SourceKey::FbGroup, "Facebook Group", at("facebook_group.csv")),
        SourceSpec::new(SourceKey::FbMarket, "Facebook Market", at("facebook_marketplace.csv")),
    ]
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("san-do-cu")
}

fn parse_file(text: &str, path: &Path) -> Result<FileConfig, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Relative file locations in a config file are relative to that file.
fn resolve_location(mut spec: SourceSpec, base: Option<&Path>) -> SourceSpec {
    let remote = spec.location.starts_with("http://") || spec.location.starts_with("https://");
    if let Some(base) = base {
        if !remote && Path::new(&spec.location).is_relative() {
            spec.location = base.join(&spec.location).to_string_lossy().into_owned();
        }
    }
    spec
}

fn check_unique(sources: &[SourceSpec]) -> Result<(), ConfigError> {
    let mut seen = BTreeSet::new();
    for spec in sources {
        if !seen.insert(spec.key) {
            return Err(ConfigError::DuplicateSource(spec.key));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, text: &str) -> PathBuf {
        let path = dir.join("san-do-cu.toml");
        fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn defaults_without_config_file() {
        let cli = Cli {
            data_dir: Some(PathBuf::from("/tmp/sdc")),
            ..Cli::default()
        };
        let config = Config::load(&cli).unwrap();

        let keys: Vec<SourceKey> = config.sources.iter().map(|s| s.key).collect();
        assert_eq!(keys, SourceKey::ALL);
        assert_eq!(config.sources[0].label, "Chợ Tốt");
        assert!(config.sources[2].location.ends_with("facebook_marketplace.csv"));
        assert_eq!(config.tags, SUGGESTED_TAGS);
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/sdc/logs"));
    }

    #[test]
    fn cli_sources_dir_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "sources_dir = \"/from/file\"\n");
        let cli = Cli {
            config: Some(path),
            sources_dir: Some(PathBuf::from("/from/cli")),
            ..Cli::default()
        };
        let config = Config::load(&cli).unwrap();
        assert!(config.sources[0].location.starts_with("/from/cli"));
    }

    #[test]
    fn file_sources_and_tags_replace_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
tags = ["fujifilm"]

[[sources]]
key = "fb_market"
label = "Market"
location = "market.csv"

[[sources]]
key = "chotot"
label = "Chợ Tốt"
location = "https://example.com/chotot.csv"
"#,
        );
        let config = Config::load(&Cli {
            config: Some(path),
            ..Cli::default()
        })
        .unwrap();

        assert_eq!(config.tags, ["fujifilm"]);
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[0].key, SourceKey::FbMarket);
        assert_eq!(
            PathBuf::from(&config.sources[0].location),
            dir.path().join("market.csv")
        );
        assert_eq!(config.sources[1].location, "https://example.com/chotot.csv");
        assert_eq!(config.build_sources().len(), 2);
    }

    #[test]
    fn duplicate_source_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"
[[sources]]
key = "chotot"
label = "A"
location = "a.csv"

[[sources]]
key = "chotot"
label = "B"
location = "b.csv"
"#,
        );
        let err = Config::load(&Cli {
            config: Some(path),
            ..Cli::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateSource(SourceKey::Chotot)));
    }

    #[test]
    fn unknown_source_key_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[[sources]]\nkey = \"craigslist\"\nlabel = \"C\"\nlocation = \"c.csv\"\n",
        );
        let err = Config::load(&Cli {
            config: Some(path),
            ..Cli::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_config_file_is_a_read_error() {
        let err = Config::load(&Cli {
            config: Some(PathBuf::from("/nonexistent/san-do-cu.toml")),
            ..Cli::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::parse_from(["san-do-cu", "--sources-dir", "exports", "--data-dir", "state"]);
        assert_eq!(cli.sources_dir, Some(PathBuf::from("exports")));
        assert_eq!(cli.data_dir, Some(PathBuf::from("state")));
    }
}
