//! Capability abstractions the engine is written against.
//!
//! Applications implement these to provide rendering sessions and a
//! progress frontend.

pub mod page;
pub mod progress;
