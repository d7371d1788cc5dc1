//! Run configuration: built-in defaults, then an optional RON file, then
//! command line flags and environment.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use harvest_core::{FilterCriteria, DEFAULT_YEAR_END, DEFAULT_YEAR_START};
use harvest_engine::HarvestConfig;
use ron::extensions::Extensions;
use serde::Deserialize;
use thiserror::Error;

use crate::cli::Cli;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: ron::error::SpannedError,
    },
    #[error("an API key is required (--api-key or STEAM_API_KEY)")]
    MissingApiKey,
    #[error("concurrency must be at least 1")]
    ZeroConcurrency,
    #[error("listing page size must be at least 1")]
    ZeroPageSize,
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("year range {start}..={end} is empty")]
    EmptyYearRange { start: u16, end: u16 },
}

/// Settings file layout. Every field is optional; `Some` may be omitted.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub output_path: Option<PathBuf>,
    pub min_app_id: Option<u64>,
    pub year_start: Option<u16>,
    pub year_end: Option<u16>,
    pub item_type: Option<String>,
    pub concurrency: Option<usize>,
    pub listing_endpoint: Option<String>,
    pub page_size: Option<u32>,
    pub page_delay_ms: Option<u64>,
    pub detail_endpoint: Option<String>,
    pub country_code: Option<String>,
    pub language: Option<String>,
    pub max_attempts: Option<u32>,
    pub politeness_delay_ms: Option<u64>,
}

impl FileConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        ron::Options::default()
            .with_default_extension(Extensions::IMPLICIT_SOME)
            .from_str(text)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }
}

/// Resolve the final configuration for this run.
pub fn resolve(cli: &Cli) -> Result<HarvestConfig, ConfigError> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = merge(file, cli)?;
    validate(&config)?;
    Ok(config)
}

fn merge(file: FileConfig, cli: &Cli) -> Result<HarvestConfig, ConfigError> {
    let mut config = HarvestConfig::default();
    let defaults = config.criteria.clone();

    let min_app_id = cli
        .min_app_id
        .or(file.min_app_id)
        .unwrap_or(defaults.min_app_id);
    let start = cli
        .year_start
        .or(file.year_start)
        .unwrap_or(DEFAULT_YEAR_START);
    let end = cli.year_end.or(file.year_end).unwrap_or(DEFAULT_YEAR_END);
    if start > end {
        return Err(ConfigError::EmptyYearRange { start, end });
    }
    config.criteria = FilterCriteria::new(min_app_id, start..=end)
        .with_item_type(file.item_type.unwrap_or(defaults.item_type));

    if let Some(path) = cli.output.clone().or(file.output_path) {
        config.output_path = path;
    }
    if let Some(concurrency) = cli.concurrency.or(file.concurrency) {
        config.concurrency = concurrency;
    }

    let listing = &mut config.listing;
    if let Some(key) = cli.api_key.clone().or(file.api_key) {
        listing.api_key = key;
    }
    if let Some(endpoint) = file.listing_endpoint {
        listing.endpoint = endpoint;
    }
    if let Some(page_size) = file.page_size {
        listing.page_size = page_size;
    }
    if let Some(ms) = file.page_delay_ms {
        listing.page_delay = Duration::from_millis(ms);
    }

    let detail = &mut config.detail;
    if let Some(endpoint) = file.detail_endpoint {
        detail.endpoint = endpoint;
    }
    if let Some(cc) = file.country_code {
        detail.country_code = cc;
    }
    if let Some(language) = file.language {
        detail.language = language;
    }

    if let Some(attempts) = file.max_attempts {
        config.retry.max_attempts = attempts;
    }
    if let Some(ms) = file.politeness_delay_ms {
        config.retry.politeness_delay = Duration::from_millis(ms);
    }

    Ok(config)
}

pub fn validate(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.listing.api_key.trim().is_empty() {
        return Err(ConfigError::MissingApiKey);
    }
    if config.concurrency == 0 {
        return Err(ConfigError::ZeroConcurrency);
    }
    if config.listing.page_size == 0 {
        return Err(ConfigError::ZeroPageSize);
    }
    if config.retry.max_attempts == 0 {
        return Err(ConfigError::ZeroAttempts);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use clap::Parser;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["steam-harvest"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = merge(FileConfig::default(), &cli(&["--api-key", "k"])).unwrap();

        assert_eq!(config.criteria, FilterCriteria::default());
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.output_path, PathBuf::from("steam_data_2021_2025.jsonl"));
        assert_eq!(config.listing.api_key, "k");
        validate(&config).unwrap();
    }

    #[test]
    fn file_values_fill_in_and_flags_win() {
        let file = FileConfig::parse(
            r#"(
                api_key: "from-file",
                year_start: 2019,
                year_end: 2020,
                concurrency: 2,
                item_type: "dlc",
                page_delay_ms: 0,
                politeness_delay_ms: 250,
            )"#,
            Path::new("test.ron"),
        )
        .unwrap();

        let config = merge(file, &cli(&["-j", "9", "--year-end", "2022"])).unwrap();

        assert_eq!(config.listing.api_key, "from-file");
        assert_eq!(config.concurrency, 9);
        assert_eq!(
            config.criteria.years,
            (2019..=2022).collect::<BTreeSet<u16>>()
        );
        assert_eq!(config.criteria.item_type, "dlc");
        assert_eq!(config.listing.page_delay, Duration::ZERO);
        assert_eq!(config.retry.politeness_delay, Duration::from_millis(250));
    }

    #[test]
    fn inverted_year_range_is_rejected() {
        let err = merge(
            FileConfig::default(),
            &cli(&["--year-start", "2025", "--year-end", "2021"]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyYearRange {
                start: 2025,
                end: 2021
            }
        ));
    }

    #[test]
    fn validation_rejects_unusable_settings() {
        let mut config = HarvestConfig::default();
        assert!(matches!(validate(&config), Err(ConfigError::MissingApiKey)));

        config.listing.api_key = "k".to_string();
        config.concurrency = 0;
        assert!(matches!(validate(&config), Err(ConfigError::ZeroConcurrency)));

        config.concurrency = 1;
        config.listing.page_size = 0;
        assert!(matches!(validate(&config), Err(ConfigError::ZeroPageSize)));

        config.listing.page_size = 100;
        config.retry.max_attempts = 0;
        assert!(matches!(validate(&config), Err(ConfigError::ZeroAttempts)));
    }

    #[test]
    fn zero_attempts_from_file_is_rejected() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run.ron");
        fs::write(&path, "(max_attempts: 0)").unwrap();

        let err = resolve(&cli(&["--api-key", "k", "--config", path.to_str().unwrap()]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ZeroAttempts));
    }

    #[test]
    fn unknown_file_fields_are_errors() {
        let err = FileConfig::parse("(threads: 4)", Path::new("bad.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_config_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("absent.ron");
        let err = resolve(&cli(&["--api-key", "k", "--config", path.to_str().unwrap()]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn config_file_is_loaded_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("run.ron");
        fs::write(&path, "(min_app_id: 10, output_path: \"custom.jsonl\")").unwrap();

        let config = resolve(&cli(&["--api-key", "k", "--config", path.to_str().unwrap()]))
            .unwrap();
        assert_eq!(config.criteria.min_app_id, 10);
        assert_eq!(config.output_path, PathBuf::from("custom.jsonl"));
    }
}
