use anyhow::{Context, Result};
use dotenvy::dotenv;
use harvest::Credentials;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Harvester configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub root_site: Url,
    pub credentials: Credentials,
    pub max_parallel_jobs: usize,
    pub chevron_expansion_delay: Duration,
    pub index_cache_path: PathBuf,
    pub output_path: PathBuf,
    pub headless: bool,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_parallel_jobs: usize = var("MAX_PARALLEL_JOBS")
            .unwrap_or_else(|| "4".to_string())
            .parse()
            .context("MAX_PARALLEL_JOBS must be a valid number")?;
        anyhow::ensure!(max_parallel_jobs >= 1, "MAX_PARALLEL_JOBS must be at least 1");

        Ok(Self {
            root_site: var("ROOT_SITE")
                .context("ROOT_SITE must be set")?
                .parse::<Url>()
                .context("ROOT_SITE must be a valid URL")?,
            credentials: Credentials::new(
                var("USER_EMAIL").context("USER_EMAIL must be set")?,
                var("USER_PASSWORD").context("USER_PASSWORD must be set")?,
            ),
            max_parallel_jobs,
            chevron_expansion_delay: Duration::from_millis(
                var("CHEVRON_EXPANSION_DELAY")
                    .unwrap_or_else(|| "250".to_string())
                    .parse::<u64>()
                    .context("CHEVRON_EXPANSION_DELAY must be a number of milliseconds")?,
            ),
            index_cache_path: var("INDEX_CACHE_PATH")
                .unwrap_or_else(|| "index.json".to_string())
                .into(),
            output_path: var("OUTPUT_PATH")
                .unwrap_or_else(|| "agility-data.json".to_string())
                .into(),
            headless: var("HEADLESS")
                .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(true),
        })
    }
}
