//! Per-entry extraction: participants, info and runs phases.

use tracing::{debug, info, warn};

use crate::error::HarvestResult;
use crate::pipeline::chevron::ChevronExpander;
use crate::pipeline::navigator::Navigator;
use crate::pipeline::tabular::read_record;
use crate::site::selectors::{
    COMBINED_RESULTS_MARKER, INFO_GRIDS, INFO_MESSAGES, MESSAGE_HEADING_TAG, PARTICIPANT_ROWS,
    RUN_HEADER, RUN_HEADER_STATUS, RUN_HEADER_TITLE, RUN_HEADER_TYPE, RUN_INDEX_LINKS,
    RUN_INDEX_ROWS, RUN_RESULT_ROWS,
};
use crate::traits::page::{optional_text, required_text, PageClient};
use crate::traits::progress::LaneProgress;
use crate::types::config::HarvestConfig;
use crate::types::entry::{EntryInfo, FullEntry, IndexEntry, Participant, Run};

/// Runs the extraction phases for one entry on one session.
///
/// Phases run in a fixed order and each one only runs when the entry carries
/// its trigger URL. Any error aborts the entry and, upstream, the whole job.
#[derive(Debug, Clone, Default)]
pub struct EntryExtractor {
    navigator: Navigator,
    expander: ChevronExpander,
}

impl EntryExtractor {
    pub fn new(navigator: Navigator, expander: ChevronExpander) -> Self {
        Self {
            navigator,
            expander,
        }
    }

    /// Build an extractor from engine configuration.
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self::new(
            Navigator::new(config.navigation_retry_interval),
            ChevronExpander::new(config.chevron_settle_delay, config.chevron_expansion_delay),
        )
    }

    /// Extract every phase the entry has a URL for.
    pub async fn extract<P: PageClient + ?Sized>(
        &self,
        page: &P,
        entry: &IndexEntry,
        progress: &LaneProgress<'_>,
    ) -> HarvestResult<FullEntry> {
        let mut output = FullEntry::new(entry.clone());
        progress.status(&format!("{} - Indexing...", entry.title));

        if let Some(url) = &entry.participants_url {
            progress.status(&format!("{} - Listing participants...", entry.title));
            output.participants = Some(self.participants(page, url).await?);
        }

        if let Some(url) = &entry.info_url {
            progress.status(&format!("{} - Gathering information...", entry.title));
            output.info = Some(self.info(page, url).await?);
        }

        if let Some(url) = &entry.runs_url {
            progress.status(&format!("{} - Runs (indexing)", entry.title));
            output.runs = Some(self.runs(page, url, &entry.title, progress).await?);
        }

        info!(
            lane = progress.lane(),
            entry = %entry.id,
            participants = ?output.participants.as_ref().map(Vec::len),
            runs = ?output.runs.as_ref().map(Vec::len),
            "entry extracted"
        );
        Ok(output)
    }

    /// One participant record per row of the participants list.
    pub async fn participants<P: PageClient + ?Sized>(
        &self,
        page: &P,
        url: &str,
    ) -> HarvestResult<Vec<Participant>> {
        self.navigator.goto_and_settle(page, url).await?;

        let rows = page.query_all(None, PARTICIPANT_ROWS).await?;
        let mut participants = Vec::with_capacity(rows.len());
        for row in rows {
            self.expander.expand(page, row).await?;
            participants.push(read_record(page, row).await?);
        }

        debug!(url, count = participants.len(), "participants extracted");
        Ok(participants)
    }

    /// Data grids merged into one table, plus the grouped message area.
    pub async fn info<P: PageClient + ?Sized>(&self, page: &P, url: &str) -> HarvestResult<EntryInfo> {
        self.navigator.goto_and_settle(page, url).await?;

        let mut info = EntryInfo::default();
        for grid in page.query_all(None, INFO_GRIDS).await? {
            // Later grids win when a section name repeats.
            info.data_table.extend(read_record(page, grid).await?);
        }

        let mut group = String::new();
        for element in page.query_all(None, INFO_MESSAGES).await? {
            let text = required_text(page, element, INFO_MESSAGES).await?;
            if page.tag_name(element).await? == MESSAGE_HEADING_TAG {
                group = text.strip_suffix(':').unwrap_or(&text).to_string();
                info.messages.insert(group.clone(), Vec::new());
            } else {
                info.messages.entry(group.clone()).or_default().push(text);
            }
        }

        Ok(info)
    }

    /// Every run linked from the run index, visited one after another.
    pub async fn runs<P: PageClient + ?Sized>(
        &self,
        page: &P,
        url: &str,
        title: &str,
        progress: &LaneProgress<'_>,
    ) -> HarvestResult<Vec<Run>> {
        self.navigator.goto_and_settle(page, url).await?;

        let rows = page.query_all(None, RUN_INDEX_ROWS).await?;
        let mut links = Vec::with_capacity(rows.len());
        for row in &rows {
            // Only the first combined-results link of a row is kept.
            for anchor in page.query_all(Some(*row), RUN_INDEX_LINKS).await? {
                if let Some(href) = page.href(anchor).await? {
                    if href.contains(COMBINED_RESULTS_MARKER) {
                        links.push(href);
                        break;
                    }
                }
            }
        }
        progress.status(&format!("{} - Runs (total {})", title, rows.len()));

        let mut runs = Vec::with_capacity(links.len());
        for (position, link) in links.iter().enumerate() {
            let number = position + 1;
            self.navigator.goto_and_settle(page, link).await?;
            progress.status(&format!("{} - Runs ({}/{})", title, number, rows.len()));
            runs.push(self.run(page, title, number, progress).await?);
        }

        Ok(runs)
    }

    async fn run<P: PageClient + ?Sized>(
        &self,
        page: &P,
        title: &str,
        number: usize,
        progress: &LaneProgress<'_>,
    ) -> HarvestResult<Run> {
        let mut run = Run::default();

        let Some(header) = page.query_one(None, RUN_HEADER).await? else {
            warn!(entry = title, run = number, "run has no header element, recording an empty run");
            progress.message(&format!(
                "Warning: {} run #{} has no header element, this will result in an empty run!",
                title, number
            ));
            return Ok(run);
        };

        if let Some(text) = optional_text(page, Some(header), RUN_HEADER_TITLE).await? {
            run.title = text;
        }
        if let Some(text) = optional_text(page, Some(header), RUN_HEADER_STATUS).await? {
            run.status = text;
        }
        if let Some(text) = optional_text(page, Some(header), RUN_HEADER_TYPE).await? {
            run.kind = text;
        }

        for row in page.query_all(None, RUN_RESULT_ROWS).await? {
            self.expander.expand(page, row).await?;
            run.results.push(read_record(page, row).await?);
        }

        Ok(run)
    }
}
