//! Data types for the harvested dataset.

pub mod config;
pub mod entry;
