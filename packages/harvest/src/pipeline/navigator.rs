//! Navigation with unbounded retry.

use std::time::Duration;
use tracing::{debug, warn};

use crate::traits::page::PageClient;

/// Wraps [`PageClient::navigate`] so callers only ever see success.
///
/// Every failure is logged and retried after a fixed interval. There is no
/// attempt budget: a page that never loads keeps the lane waiting until the
/// operator stops the job.
#[derive(Debug, Clone)]
pub struct Navigator {
    retry_interval: Duration,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl Navigator {
    pub fn new(retry_interval: Duration) -> Self {
        Self { retry_interval }
    }

    /// Navigate to `url`, retrying until it succeeds.
    ///
    /// Returns the number of attempts made (at least 1).
    pub async fn goto<P: PageClient + ?Sized>(&self, page: &P, url: &str) -> usize {
        let mut attempt = 1;
        loop {
            match page.navigate(url).await {
                Ok(()) => {
                    debug!(url, attempt, "navigated");
                    return attempt;
                }
                Err(e) => {
                    warn!(url, attempt, error = %e, "navigation failed, retrying");
                    tokio::time::sleep(self.retry_interval).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Navigate and then wait for the page to settle.
    pub async fn goto_and_settle<P: PageClient + ?Sized>(
        &self,
        page: &P,
        url: &str,
    ) -> crate::error::HarvestResult<()> {
        self.goto(page, url).await;
        page.wait_for_idle().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSite;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let site = FakeSite::new().fail_navigation("https://example.com/flaky", 3);
        let page = site.session();
        let navigator = Navigator::default();

        let start = Instant::now();
        let attempts = navigator.goto(&page, "https://example.com/flaky").await;

        assert_eq!(attempts, 4);
        assert!(start.elapsed() >= Duration::from_millis(1500));
        assert_eq!(page.current_url().as_deref(), Some("https://example.com/flaky"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_try_does_not_sleep() {
        let site = FakeSite::new();
        let page = site.session();
        let navigator = Navigator::default();

        let start = Instant::now();
        assert_eq!(navigator.goto(&page, "https://example.com/").await, 1);
        assert!(start.elapsed() < Duration::from_millis(500));
    }
}
