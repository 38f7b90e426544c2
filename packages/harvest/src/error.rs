//! Typed errors for the harvest engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Every variant of
//! [`HarvestError`] is fatal for the whole job: lanes propagate it with `?`
//! and the binary decides to terminate. Transient navigation failures never
//! show up here because the navigator absorbs them.

use thiserror::Error;

/// Errors raised by a [`PageClient`](crate::traits::page::PageClient).
#[derive(Debug, Error)]
pub enum PageError {
    /// Navigation did not complete
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// A selector query could not be evaluated
    #[error("query `{selector}` failed: {reason}")]
    Query { selector: String, reason: String },

    /// The element handle no longer refers to a live element
    #[error("element handle {0} is stale")]
    StaleHandle(u64),

    /// Clicking an element failed
    #[error("click failed: {0}")]
    Click(String),

    /// Script evaluation or input dispatch failed
    #[error("script error: {0}")]
    Script(String),

    /// The rendering session itself is gone
    #[error("session error: {0}")]
    Session(String),

    /// Waiting for a page condition timed out
    #[error("timed out waiting for {0}")]
    Timeout(String),
}

/// Grammar violations found while parsing tabular fragments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TabularError {
    /// A value appeared before any section-start
    #[error("value {value:?} at fragment {position} appears before any section")]
    ValueOutsideSection { position: usize, value: String },

    /// A value appeared in a section before any field label
    #[error("value {value:?} at fragment {position} in section {section:?} has no field label")]
    ValueWithoutField {
        position: usize,
        section: String,
        value: String,
    },
}

/// Everything the harvest core can fail with.
#[derive(Debug, Error)]
pub enum HarvestError {
    /// A required index field could not be derived from a freshly fetched entry
    #[error("entry {id} failed validation: {reason}")]
    Validation { id: String, reason: String },

    /// A structurally required element is absent
    #[error("required selector `{selector}` did not match anything ({context})")]
    SelectorMiss { selector: String, context: String },

    /// A required node exists but carries no text
    #[error("node matched by `{selector}` has no text content")]
    MissingText { selector: String },

    /// No toggle in a collapsible row could be activated
    #[error("could not expand chevron: {candidates} candidate(s) tried")]
    Expansion { candidates: usize },

    /// Tabular fragments violated the section/field/value grammar
    #[error("tabular parse error: {0}")]
    Tabular(#[from] TabularError),

    /// The page client failed outside of navigation
    #[error("page error: {0}")]
    Page(#[from] PageError),

    /// Reading or writing a cache/output file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A URL could not be built from the site root
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Lanes returned but the completion detector never fired
    #[error("lanes drained without completing the backlog ({claimed}/{total} claimed)")]
    Incomplete { claimed: usize, total: usize },
}

impl HarvestError {
    /// Shorthand for a [`HarvestError::SelectorMiss`].
    pub fn selector_miss(selector: impl Into<String>, context: impl Into<String>) -> Self {
        Self::SelectorMiss {
            selector: selector.into(),
            context: context.into(),
        }
    }
}

/// Result type alias for harvest operations.
pub type HarvestResult<T> = std::result::Result<T, HarvestError>;

/// Result type alias for page client operations.
pub type PageResult<T> = std::result::Result<T, PageError>;

/// Result type alias for tabular parsing.
pub type TabularResult<T> = std::result::Result<T, TabularError>;
