// Entry point for the event harvester

mod browser;
mod config;
mod progress;

use anyhow::{Context, Result};
use clap::Parser;
use harvest::{
    acquire_index, login, write_output, EntryExtractor, HarvestConfig, IndexCache, Navigator,
    Scheduler,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::browser::ChromeBrowser;
use crate::config::Config;
use crate::progress::TracingProgress;

/// Harvest every past event of the configured site into one JSON file.
#[derive(Parser, Debug)]
#[command(name = "harvester", version, about)]
struct Args {
    /// Scrape the event index even if a cache file exists
    #[arg(long)]
    refresh_index: bool,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Index cache file (overrides INDEX_CACHE_PATH)
    #[arg(long, value_name = "PATH")]
    index_cache: Option<PathBuf>,

    /// Output file (overrides OUTPUT_PATH)
    #[arg(long, value_name = "PATH")]
    output: Option<PathBuf>,
}

impl Args {
    /// Let command-line flags win over the environment.
    fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.index_cache {
            config.index_cache_path = path.clone();
        }
        if let Some(path) = &self.output {
            config.output_path = path.clone();
        }
        if self.headful {
            config.headless = false;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse flags first so --help and --version work without a configured site
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,harvest=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let mut config = Config::from_env().context("Failed to load configuration")?;
    args.apply(&mut config);
    tracing::info!(root = %config.root_site, lanes = config.max_parallel_jobs, "Configuration loaded");

    let engine = HarvestConfig::new()
        .with_max_lanes(config.max_parallel_jobs)
        .with_expansion_delay(config.chevron_expansion_delay);
    let navigator = Navigator::new(engine.navigation_retry_interval);
    let progress = TracingProgress;

    // Launch browser and sign in
    let browser = ChromeBrowser::launch(config.headless)?;
    let primary = browser.session()?;
    login(
        &primary,
        &navigator,
        &config.root_site,
        &config.credentials,
        &progress,
    )
    .await
    .context("Failed to log in")?;

    // Event index, from cache when possible
    let cache = IndexCache::new(&config.index_cache_path);
    let scrape = || acquire_index(&primary, &navigator, &config.root_site, &progress);
    let backlog = if args.refresh_index {
        let entries = scrape().await.context("Failed to scrape event index")?;
        cache
            .store(&entries)
            .await
            .context("Failed to write index cache")?;
        entries
    } else {
        cache
            .load_or_acquire(scrape)
            .await
            .context("Failed to acquire event index")?
    };

    // One session per lane; tabs share the signed-in cookies
    let lanes = engine.lane_count(backlog.len());
    let sessions = (0..lanes)
        .map(|_| browser.session())
        .collect::<Result<Vec<_>>>()?;
    tracing::info!(entries = backlog.len(), lanes, "Starting extraction");

    let results = Scheduler::new(EntryExtractor::from_config(&engine))
        .run(&backlog, &sessions, &progress)
        .await
        .context("Extraction failed")?;

    write_output(&config.output_path, &results)
        .await
        .context("Failed to write output")?;
    tracing::info!(
        entries = results.len(),
        output = %config.output_path.display(),
        "Harvest complete"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use clap::CommandFactory;

    #[test]
    fn test_args_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_help_needs_no_configuration() {
        let err = Args::try_parse_from(["harvester", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(err.to_string().contains("--refresh-index"));
    }

    #[test]
    fn test_flags_override_environment() {
        let mut config = Config::from_lookup(|key| match key {
            "ROOT_SITE" => Some("https://agility.example.com/".to_string()),
            "USER_EMAIL" => Some("me@example.com".to_string()),
            "USER_PASSWORD" => Some("hunter2".to_string()),
            _ => None,
        })
        .unwrap();

        let args = Args::try_parse_from([
            "harvester",
            "--headful",
            "--index-cache",
            "cache/index.json",
            "--output",
            "out.json",
        ])
        .unwrap();
        args.apply(&mut config);

        assert!(!config.headless);
        assert_eq!(config.index_cache_path, PathBuf::from("cache/index.json"));
        assert_eq!(config.output_path, PathBuf::from("out.json"));
        assert!(!args.refresh_index);
    }
}
