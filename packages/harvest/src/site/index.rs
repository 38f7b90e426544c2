//! Event index acquisition.
//!
//! The past-events listing renders one block per event with a data row
//! (dates, issuer, title, club, location, flag) and a link row (cancel badge,
//! links to the event's pages). Every block becomes one [`IndexEntry`].

use tracing::{error, info};
use url::Url;

use crate::error::{HarvestError, HarvestResult};
use crate::pipeline::navigator::Navigator;
use crate::site::selectors::*;
use crate::site::site_url;
use crate::traits::page::{query_required, required_text, ElementHandle, PageClient};
use crate::traits::progress::ProgressSink;
use crate::types::entry::IndexEntry;

const INDEX_PATH: &str = "zone/events/past_all";

/// Raw reads from one index block, before validation.
#[derive(Debug, Default)]
struct RawEntry {
    short_date: Option<String>,
    issuer: Option<String>,
    title: Option<String>,
    host_club: Option<String>,
    location: Option<String>,
    flag: Option<String>,
    links: Vec<String>,
}

/// Which page of an event a link points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkKind {
    Info,
    Runs,
    Participants,
    Unknown,
}

impl LinkKind {
    pub fn classify(href: &str) -> Self {
        if href.contains(INFO_LINK_MARKER) {
            Self::Info
        } else if href.contains(RUNS_LINK_MARKER) {
            Self::Runs
        } else if href.contains(PARTICIPANTS_LINK_MARKER) {
            Self::Participants
        } else {
            Self::Unknown
        }
    }
}

/// Load the full event index with one session.
pub async fn acquire_index<P: PageClient + ?Sized>(
    page: &P,
    navigator: &Navigator,
    root: &Url,
    progress: &dyn ProgressSink,
) -> HarvestResult<Vec<IndexEntry>> {
    progress.update(0, 0, 1, "Waiting for server dataframe...");
    navigator
        .goto_and_settle(page, &site_url(root, INDEX_PATH)?)
        .await?;

    let blocks = page.query_all(None, INDEX_ROWS).await?;
    let total = blocks.len();
    info!(events = total, "index loaded");

    let mut entries = Vec::with_capacity(total);
    for (n, block) in blocks.into_iter().enumerate() {
        let id = page.attribute(block, "id").await?.unwrap_or_default();
        let entry = read_index_entry(page, &id, block).await?;
        progress.update(0, n + 1, total, &format!("{} ({})", entry.title, entry.id));
        entries.push(entry);
        tokio::task::yield_now().await;
    }

    Ok(entries)
}

/// Build an [`IndexEntry`] from one `#events` child.
pub async fn read_index_entry<P: PageClient + ?Sized>(
    page: &P,
    id: &str,
    block: ElementHandle,
) -> HarvestResult<IndexEntry> {
    let context = format!("index entry {}", id);
    let inner = query_required(page, Some(block), INDEX_INNER, &context).await?;
    let data_row = query_required(page, Some(inner), INDEX_DATA_ROW, &context).await?;
    let link_row = query_required(page, Some(inner), INDEX_LINK_ROW, &context).await?;

    let mut links = Vec::new();
    for link in page.query_all(Some(link_row), INDEX_LINKS).await? {
        if let Some(href) = page.href(link).await? {
            links.push(href);
        }
    }

    let raw = RawEntry {
        short_date: text_at(page, data_row, INDEX_SHORT_DATE).await?,
        issuer: text_at(page, data_row, INDEX_ISSUER).await?,
        title: text_at(page, data_row, INDEX_TITLE).await?,
        host_club: text_at(page, data_row, INDEX_HOST_CLUB).await?,
        location: text_at(page, data_row, INDEX_LOCATION).await?,
        flag: text_at(page, data_row, INDEX_FLAG).await?,
        links,
    };

    let mut entry = match validate(id, &raw) {
        Ok(entry) => entry,
        Err(reason) => {
            error!(id, ?raw, reason, "index entry failed validation");
            return Err(HarvestError::Validation {
                id: id.to_string(),
                reason: reason.to_string(),
            });
        }
    };

    entry.is_cancelled = page
        .query_one(Some(link_row), INDEX_CANCELLED)
        .await?
        .is_some();

    for href in raw.links {
        match LinkKind::classify(&href) {
            LinkKind::Info => entry.info_url = Some(href),
            LinkKind::Runs => entry.runs_url = Some(href),
            LinkKind::Participants => entry.participants_url = Some(href),
            LinkKind::Unknown => entry.unknown_urls.push(href),
        }
    }

    Ok(entry)
}

/// Text of the first match of `selector`, `None` when it does not match or
/// has no text.
async fn text_at<P: PageClient + ?Sized>(
    page: &P,
    scope: ElementHandle,
    selector: &str,
) -> HarvestResult<Option<String>> {
    let Some(element) = page.query_one(Some(scope), selector).await? else {
        return Ok(None);
    };
    match required_text(page, element, selector).await {
        Ok(text) => Ok(Some(text)),
        Err(HarvestError::MissingText { .. }) => Ok(None),
        Err(other) => Err(other),
    }
}

fn validate(id: &str, raw: &RawEntry) -> Result<IndexEntry, &'static str> {
    let required = |value: &Option<String>, name: &'static str| value.clone().ok_or(name);

    Ok(IndexEntry {
        id: id.to_string(),
        short_date: required(&raw.short_date, "missing short date")?,
        issuer: raw.issuer.clone(),
        title: required(&raw.title, "missing title")?,
        host_club: required(&raw.host_club, "missing host club")?,
        location: required(&raw.location, "missing location")?,
        flag: required(&raw.flag, "missing flag")?,
        participants_url: None,
        runs_url: None,
        info_url: None,
        is_cancelled: false,
        unknown_urls: Vec::new(),
    })
}
