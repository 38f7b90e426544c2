//! Expansion of collapsed rows before extraction.

use std::time::Duration;
use tracing::debug;

use crate::error::{HarvestError, HarvestResult};
use crate::site::selectors::CHEVRON_CANDIDATES;
use crate::traits::page::{ElementHandle, PageClient};

/// Opens a collapsed row so its tabular content exists in the DOM.
///
/// The site prunes collapsed content from the tree, so parsing a row that was
/// not expanded would silently lose data. Failing to expand is fatal.
#[derive(Debug, Clone)]
pub struct ChevronExpander {
    settle_delay: Duration,
    expansion_delay: Duration,
}

impl Default for ChevronExpander {
    fn default() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_millis(250))
    }
}

impl ChevronExpander {
    pub fn new(settle_delay: Duration, expansion_delay: Duration) -> Self {
        Self {
            settle_delay,
            expansion_delay,
        }
    }

    /// Activate the first toggle in `row` that accepts a click.
    pub async fn expand<P: PageClient + ?Sized>(
        &self,
        page: &P,
        row: ElementHandle,
    ) -> HarvestResult<()> {
        tokio::time::sleep(self.settle_delay).await;

        let candidates = page.query_all(Some(row), CHEVRON_CANDIDATES).await?;
        for candidate in &candidates {
            match page.click(*candidate).await {
                Ok(()) => {
                    tokio::time::sleep(self.expansion_delay).await;
                    return Ok(());
                }
                Err(e) => {
                    debug!(row = %row, candidate = %candidate, error = %e, "chevron candidate rejected click");
                }
            }
        }

        Err(HarvestError::Expansion {
            candidates: candidates.len(),
        })
    }
}
