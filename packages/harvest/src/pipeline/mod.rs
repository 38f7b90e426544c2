//! Crawl/extract pipeline.
//!
//! Leaves first: [`navigator`] and [`chevron`] wrap raw page interaction,
//! [`tabular`] parses fragment runs, [`extract`] runs the per-entry phases,
//! and [`scheduler`] fans entries out over lanes, using [`completion`] to know
//! when the backlog has drained.

pub mod chevron;
pub mod completion;
pub mod extract;
pub mod navigator;
pub mod scheduler;
pub mod tabular;

pub use chevron::ChevronExpander;
pub use completion::{Claim, Completion};
pub use extract::EntryExtractor;
pub use navigator::Navigator;
pub use scheduler::{Scheduler, FINISHED_STATUS};
pub use tabular::{parse_fragments, read_record, Fragment, FragmentRole};
