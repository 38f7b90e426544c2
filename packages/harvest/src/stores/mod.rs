//! File-backed persistence.
//!
//! - `IndexCache` - the scraped event index, reused across runs
//! - `write_output` - the final harvest, written once per job

pub mod file;

pub use file::{write_output, IndexCache};
