//! JSON files for the index cache and the harvest output.

use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{HarvestError, HarvestResult};
use crate::types::entry::{FullEntry, IndexEntry};

/// Pretty-printed JSON array of [`IndexEntry`] on disk.
///
/// A present and parseable cache replaces index scraping entirely; anything
/// else is treated as absent and rebuilt.
#[derive(Debug, Clone)]
pub struct IndexCache {
    path: PathBuf,
}

impl IndexCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached index, if there is a usable one.
    pub async fn load(&self) -> Option<Vec<IndexEntry>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                info!(path = %self.path.display(), error = %e, "no index cache");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(entries) => Some(entries),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "ignoring unparseable index cache");
                None
            }
        }
    }

    /// Write `entries` as the new cache.
    pub async fn store(&self, entries: &[IndexEntry]) -> HarvestResult<()> {
        write_json(&self.path, entries).await
    }

    /// Return the cached index, or build it with `acquire` and cache it.
    pub async fn load_or_acquire<F, Fut>(&self, acquire: F) -> HarvestResult<Vec<IndexEntry>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = HarvestResult<Vec<IndexEntry>>>,
    {
        if let Some(entries) = self.load().await {
            info!(entries = entries.len(), path = %self.path.display(), "using cached index");
            return Ok(entries);
        }

        let entries = acquire().await?;
        self.store(&entries).await?;
        info!(entries = entries.len(), path = %self.path.display(), "index cached");
        Ok(entries)
    }
}

/// Write the harvested entries as a pretty-printed JSON array.
pub async fn write_output(path: impl AsRef<Path>, entries: &[FullEntry]) -> HarvestResult<()> {
    write_json(path.as_ref(), entries).await
}

async fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> HarvestResult<()> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json)
        .await
        .map_err(|source| HarvestError::Io {
            path: path.display().to_string(),
            source,
        })
}
