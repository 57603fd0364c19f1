//! Runtime configuration.
//!
//! Loaded from built-in defaults, then `harvest.toml` (or `--config`), then
//! `HARVEST_*` environment variables.

use crate::catalog::client::resolve_endpoint;
use crate::catalog::keywords::parse_prefix;
use anyhow::{Context, Result, bail};
use figment::Figment;
use figment::providers::{Env, Format, Toml};
use fundu::DurationParser;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "harvest.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base level for this crate's log output (`RUST_LOG` overrides).
    pub log_level: String,

    pub base_url: String,
    pub search_path: String,
    pub page_path: String,
    pub detail_path: String,
    pub user_agent: String,

    /// Rows per result page.
    pub page_size: u32,
    /// Most rows the catalog will return for one query.
    pub max_results: u32,
    /// 3-digit keyword prefixes known to exceed `max_results`; each is swept as ten 4-digit keywords.
    #[serde(deserialize_with = "deserialize_prefixes")]
    pub truncating_prefixes: Vec<String>,

    pub listings_path: PathBuf,
    pub details_path: PathBuf,

    /// Maximum queries in flight per pass.
    pub concurrency: usize,
    /// Shared across every session.
    pub requests_per_second: u32,
    #[serde(deserialize_with = "deserialize_duration")]
    pub request_timeout: Duration,
    /// Wall-clock limit per pass; unset means unbounded.
    #[serde(deserialize_with = "deserialize_optional_duration")]
    pub run_budget: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            base_url: "https://more.app.vanderbilt.edu/more/".to_owned(),
            search_path: "SearchClassesExecute!search.action".to_owned(),
            page_path: "SearchClassesExecute!switchPage.action".to_owned(),
            detail_path: "GetClassSectionDetail.action".to_owned(),
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_owned(),
            page_size: 50,
            max_results: 300,
            truncating_prefixes: ["100", "101", "110", "200", "201", "300"]
                .map(str::to_owned)
                .to_vec(),
            listings_path: PathBuf::from("data/listings.json"),
            details_path: PathBuf::from("data/details.json"),
            concurrency: 4,
            requests_per_second: 4,
            request_timeout: Duration::from_secs(30),
            run_budget: None,
        }
    }
}

impl Config {
    /// Load and validate configuration. An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path
            && !path.exists()
        {
            bail!("config file {} does not exist", path.display());
        }
        let file = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Toml::file(file))
            .merge(Env::prefixed("HARVEST_"))
            .extract()
            .context("Failed to load config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be positive");
        }
        if self.concurrency == 0 {
            bail!("concurrency must be positive");
        }
        if self.requests_per_second == 0 {
            bail!("requests_per_second must be positive");
        }
        if let Some(bad) = self
            .truncating_prefixes
            .iter()
            .find(|p| parse_prefix(p).is_none())
        {
            bail!("truncating prefix {bad:?} is not a 3-digit number");
        }
        let base_url = url::Url::parse(&self.base_url)
            .with_context(|| format!("base_url {:?} is not a valid URL", self.base_url))?;
        for path in [&self.search_path, &self.page_path, &self.detail_path] {
            resolve_endpoint(&base_url, path)?;
        }
        Ok(())
    }
}

fn parse_duration(raw: &str) -> Result<Duration, String> {
    let parsed = DurationParser::with_all_time_units()
        .parse(raw.trim())
        .map_err(|e| format!("invalid duration {raw:?}: {e}"))?;
    Duration::try_from(parsed).map_err(|e| format!("invalid duration {raw:?}: {e}"))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    fn into_duration(self) -> Result<Duration, String> {
        match self {
            Self::Seconds(secs) => Ok(Duration::from_secs(secs)),
            Self::Text(text) => parse_duration(&text),
        }
    }
}

/// Accepts either bare seconds (`30`) or a unit string (`"30s"`, `"6h"`).
fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    DurationValue::deserialize(deserializer)?
        .into_duration()
        .map_err(serde::de::Error::custom)
}

fn deserialize_optional_duration<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<DurationValue>::deserialize(deserializer)?
        .map(DurationValue::into_duration)
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PrefixValue {
    Number(u16),
    Text(String),
}

impl PrefixValue {
    fn into_prefix(self) -> String {
        match self {
            Self::Number(n) => format!("{n:03}"),
            Self::Text(text) => text.trim().to_owned(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PrefixList {
    List(Vec<PrefixValue>),
    Joined(String),
    /// A lone prefix from the environment arrives as a number.
    One(PrefixValue),
}

/// Accepts a list (`["100", "200"]`, or numbers, zero-padded back to 3 digits),
/// a comma-separated string, or a single prefix, as set from the environment.
fn deserialize_prefixes<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let prefixes = match PrefixList::deserialize(deserializer)? {
        PrefixList::List(values) => values.into_iter().map(PrefixValue::into_prefix).collect(),
        PrefixList::One(value) => vec![value.into_prefix()],
        PrefixList::Joined(joined) => joined
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(str::to_owned)
            .collect(),
    };
    Ok(prefixes)
}
