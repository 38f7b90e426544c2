//! Event Site Harvest Library
//!
//! Crawls a session-authenticated event site and turns every listed event into
//! one structured record: its participants, its info page and its runs with
//! results.
//!
//! # Design
//!
//! - Pages are reached only through the [`PageClient`] trait, so the whole
//!   pipeline runs against [`testing::FakeSite`] in tests
//! - A fixed number of lanes, each owning one session, drain a shared backlog
//! - Output order always matches backlog order, whatever order lanes finish in
//! - Every non-transient failure is fatal and surfaces as a [`HarvestError`]
//!
//! # Usage
//!
//! ```rust,ignore
//! use harvest::{EntryExtractor, HarvestConfig, IndexCache, NullProgress, Scheduler};
//!
//! let config = HarvestConfig::new().with_max_lanes(4);
//! let backlog = IndexCache::new("index.json")
//!     .load_or_acquire(|| acquire_index(&primary, &navigator, &root, &NullProgress))
//!     .await?;
//!
//! let scheduler = Scheduler::new(EntryExtractor::from_config(&config));
//! let results = scheduler.run(&backlog, &sessions, &NullProgress).await?;
//! write_output("agility-data.json", &results).await?;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Page client and progress sink abstractions
//! - [`types`] - Entry records and engine configuration
//! - [`pipeline`] - Navigation, expansion, parsing, extraction and scheduling
//! - [`site`] - Login, index acquisition and the site's selectors
//! - [`stores`] - Index cache and output files
//! - [`testing`] - In-memory page client for tests

pub mod error;
pub mod pipeline;
pub mod site;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{HarvestError, HarvestResult, PageError, PageResult, TabularError};
pub use pipeline::{
    ChevronExpander, Completion, EntryExtractor, Navigator, Scheduler, FINISHED_STATUS,
};
pub use site::{
    index::acquire_index,
    login::{login, Credentials},
};
pub use stores::{write_output, IndexCache};
pub use traits::{
    page::{ElementHandle, PageClient},
    progress::{LaneProgress, NullProgress, ProgressSink},
};
pub use types::{
    config::HarvestConfig,
    entry::{EntryInfo, FullEntry, IndexEntry, Participant, Run, TabularRecord},
};
