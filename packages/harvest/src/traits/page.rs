//! Page client capability and the text helpers built on it.

use async_trait::async_trait;
use std::fmt;

use crate::error::{HarvestError, HarvestResult, PageResult};

/// Opaque handle to an element inside the current document of a session.
///
/// Handles are only meaningful for the session that produced them and become
/// stale when that session navigates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementHandle(pub u64);

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One remote rendering session.
///
/// Everything the engine does to a page goes through this trait, so the
/// extraction logic can be driven by a synthetic page in tests. Queries take an
/// optional scope; `None` means the whole document.
#[async_trait]
pub trait PageClient: Send + Sync {
    /// Load a URL in this session.
    async fn navigate(&self, url: &str) -> PageResult<()>;

    /// Wait until the page stops loading content.
    async fn wait_for_idle(&self) -> PageResult<()>;

    /// Wait for a navigation triggered by an interaction (e.g. a form submit).
    async fn wait_for_navigation(&self) -> PageResult<()>;

    /// First element matching `selector`.
    async fn query_one(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> PageResult<Option<ElementHandle>>;

    /// All elements matching `selector`, in document order.
    async fn query_all(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> PageResult<Vec<ElementHandle>>;

    /// Text content of an element, if any.
    async fn text(&self, element: ElementHandle) -> PageResult<Option<String>>;

    /// Attribute value of an element, if set.
    async fn attribute(&self, element: ElementHandle, name: &str) -> PageResult<Option<String>>;

    /// Resolved `href` of an element, if it has one.
    async fn href(&self, element: ElementHandle) -> PageResult<Option<String>>;

    /// Upper-case tag name (`"H1"`, `"DIV"`, ...).
    async fn tag_name(&self, element: ElementHandle) -> PageResult<String>;

    /// Activate an element.
    async fn click(&self, element: ElementHandle) -> PageResult<()>;

    /// Focus an element and type text into it.
    async fn type_text(&self, element: ElementHandle, text: &str) -> PageResult<()>;
}

/// Read the trimmed text of a node that must have some.
///
/// `selector` is only used to describe the node in the error.
pub async fn required_text<P: PageClient + ?Sized>(
    page: &P,
    element: ElementHandle,
    selector: &str,
) -> HarvestResult<String> {
    match page.text(element).await? {
        Some(text) => Ok(text.trim().to_string()),
        None => Err(HarvestError::MissingText {
            selector: selector.to_string(),
        }),
    }
}

/// Read the trimmed text of the first match of `selector`, if it matches.
pub async fn optional_text<P: PageClient + ?Sized>(
    page: &P,
    scope: Option<ElementHandle>,
    selector: &str,
) -> HarvestResult<Option<String>> {
    match page.query_one(scope, selector).await? {
        Some(element) => required_text(page, element, selector).await.map(Some),
        None => Ok(None),
    }
}

/// First match of `selector`, or a [`HarvestError::SelectorMiss`].
pub async fn query_required<P: PageClient + ?Sized>(
    page: &P,
    scope: Option<ElementHandle>,
    selector: &str,
    context: &str,
) -> HarvestResult<ElementHandle> {
    page.query_one(scope, selector)
        .await?
        .ok_or_else(|| HarvestError::selector_miss(selector, context))
}
