//! Testing utilities including an in-memory page client.
//!
//! [`FakeSite`] holds a scripted DOM shared by every session; [`FakePage`] is
//! one session over it with its own current URL and call log. Queries are
//! answered from registrations rather than by evaluating CSS, so a test wires
//! exactly the selectors the code under test asks for.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{PageError, PageResult};
use crate::site::selectors::{CHEVRON_CANDIDATES, TABULAR_DESCENDANTS};
use crate::traits::page::{ElementHandle, PageClient};

/// A scripted element.
#[derive(Debug, Clone, Default)]
pub struct FakeNode {
    tag: String,
    text: Option<String>,
    href: Option<String>,
    attributes: HashMap<String, String>,
    fail_click: bool,
}

impl FakeNode {
    /// Create an element with the given tag and nothing else.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_class(self, class: impl Into<String>) -> Self {
        self.with_attribute("class", class)
    }

    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_attribute("id", id)
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Make clicks on this element fail.
    pub fn failing_click(mut self) -> Self {
        self.fail_click = true;
        self
    }

    /// Tabular section-start fragment.
    pub fn section(text: impl Into<String>) -> Self {
        Self::new("div")
            .with_class("font-bold col-span-2")
            .with_text(text)
    }

    /// Tabular field-label fragment.
    pub fn label(text: impl Into<String>) -> Self {
        Self::new("div")
            .with_class("text-gray-500 text-sm")
            .with_text(text)
    }

    /// Tabular value fragment.
    pub fn value(text: impl Into<String>) -> Self {
        Self::new("div")
            .with_class("font-bold text-black")
            .with_text(text)
    }

    /// Message-area heading.
    pub fn heading(text: impl Into<String>) -> Self {
        Self::new("h1").with_text(text)
    }

    /// Plain text element.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new("p").with_text(text)
    }

    /// Anchor with a resolved href.
    pub fn link(href: impl Into<String>) -> Self {
        Self::new("a").with_href(href)
    }
}

#[derive(Default)]
struct SiteState {
    nodes: Vec<FakeNode>,
    document: HashMap<(String, String), Vec<ElementHandle>>,
    scoped: HashMap<(ElementHandle, String), Vec<ElementHandle>>,
    navigation_failures: HashMap<String, usize>,
    load_times: HashMap<String, Duration>,
}

/// Scripted site shared by any number of sessions.
#[derive(Clone, Default)]
pub struct FakeSite {
    state: Arc<RwLock<SiteState>>,
}

impl FakeSite {
    /// Create an empty site.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `times` navigations to `url` fail.
    pub fn fail_navigation(self, url: impl Into<String>, times: usize) -> Self {
        self.state
            .write()
            .unwrap()
            .navigation_failures
            .insert(url.into(), times);
        self
    }

    /// Make navigation to `url` take `duration` of (tokio) time.
    pub fn with_load_time(self, url: impl Into<String>, duration: Duration) -> Self {
        self.state
            .write()
            .unwrap()
            .load_times
            .insert(url.into(), duration);
        self
    }

    /// Add an element and return its handle.
    pub fn add(&self, node: FakeNode) -> ElementHandle {
        let mut state = self.state.write().unwrap();
        state.nodes.push(node);
        ElementHandle(state.nodes.len() as u64 - 1)
    }

    /// Answer document-wide `selector` on `url` with `elements`.
    pub fn document(
        &self,
        url: impl Into<String>,
        selector: impl Into<String>,
        elements: impl IntoIterator<Item = ElementHandle>,
    ) {
        self.state
            .write()
            .unwrap()
            .document
            .insert((url.into(), selector.into()), elements.into_iter().collect());
    }

    /// Answer `selector` scoped to `scope` with `elements`.
    pub fn scoped(
        &self,
        scope: ElementHandle,
        selector: impl Into<String>,
        elements: impl IntoIterator<Item = ElementHandle>,
    ) {
        self.state
            .write()
            .unwrap()
            .scoped
            .insert((scope, selector.into()), elements.into_iter().collect());
    }

    /// Add `fragments` as the tabular descendants of `scope`.
    pub fn tabular(&self, scope: ElementHandle, fragments: impl IntoIterator<Item = FakeNode>) {
        let handles: Vec<_> = fragments.into_iter().map(|node| self.add(node)).collect();
        self.scoped(scope, TABULAR_DESCENDANTS, handles);
    }

    /// Add a collapsible row with one working chevron and tabular content.
    pub fn expandable_row(&self, fragments: impl IntoIterator<Item = FakeNode>) -> ElementHandle {
        let row = self.add(FakeNode::new("div"));
        let toggle = self.add(FakeNode::new("button").with_attribute("phx-click", "toggle"));
        self.scoped(row, CHEVRON_CANDIDATES, [toggle]);
        self.tabular(row, fragments);
        row
    }

    /// Open a new session on this site.
    pub fn session(&self) -> FakePage {
        FakePage {
            site: self.clone(),
            current: RwLock::new(None),
            calls: RwLock::new(Vec::new()),
        }
    }

    fn node(&self, element: ElementHandle) -> PageResult<FakeNode> {
        self.state
            .read()
            .unwrap()
            .nodes
            .get(element.0 as usize)
            .cloned()
            .ok_or(PageError::StaleHandle(element.0))
    }
}

/// Record of a call made to a fake session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    Navigate { url: String },
    NavigateFailed { url: String },
    WaitForIdle,
    WaitForNavigation,
    Click { element: ElementHandle },
    Type { element: ElementHandle, text: String },
}

/// One session on a [`FakeSite`].
pub struct FakePage {
    site: FakeSite,
    current: RwLock<Option<String>>,
    calls: RwLock<Vec<FakeCall>>,
}

impl FakePage {
    /// URL of the last successful navigation.
    pub fn current_url(&self) -> Option<String> {
        self.current.read().unwrap().clone()
    }

    /// Get all calls made to this session.
    pub fn calls(&self) -> Vec<FakeCall> {
        self.calls.read().unwrap().clone()
    }

    /// URLs successfully navigated to, in order.
    pub fn visited(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FakeCall::Navigate { url } => Some(url),
                _ => None,
            })
            .collect()
    }

    /// Elements clicked, in order, including failed clicks.
    pub fn clicked(&self) -> Vec<ElementHandle> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                FakeCall::Click { element } => Some(element),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: FakeCall) {
        self.calls.write().unwrap().push(call);
    }
}

#[async_trait]
impl PageClient for FakePage {
    async fn navigate(&self, url: &str) -> PageResult<()> {
        let load_time = self.site.state.read().unwrap().load_times.get(url).copied();
        if let Some(duration) = load_time {
            tokio::time::sleep(duration).await;
        }

        let failing = {
            let mut state = self.site.state.write().unwrap();
            match state.navigation_failures.get_mut(url) {
                Some(remaining) if *remaining > 0 => {
                    *remaining -= 1;
                    true
                }
                _ => false,
            }
        };

        if failing {
            self.record(FakeCall::NavigateFailed {
                url: url.to_string(),
            });
            return Err(PageError::Navigation {
                url: url.to_string(),
                reason: "Mock connection refused".to_string(),
            });
        }

        self.record(FakeCall::Navigate {
            url: url.to_string(),
        });
        *self.current.write().unwrap() = Some(url.to_string());
        Ok(())
    }

    async fn wait_for_idle(&self) -> PageResult<()> {
        self.record(FakeCall::WaitForIdle);
        Ok(())
    }

    async fn wait_for_navigation(&self) -> PageResult<()> {
        self.record(FakeCall::WaitForNavigation);
        Ok(())
    }

    async fn query_one(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> PageResult<Option<ElementHandle>> {
        Ok(self.query_all(scope, selector).await?.into_iter().next())
    }

    async fn query_all(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> PageResult<Vec<ElementHandle>> {
        let state = self.site.state.read().unwrap();
        let found = match scope {
            Some(element) => {
                if element.0 as usize >= state.nodes.len() {
                    return Err(PageError::StaleHandle(element.0));
                }
                state.scoped.get(&(element, selector.to_string()))
            }
            None => match self.current.read().unwrap().as_ref() {
                Some(url) => state.document.get(&(url.clone(), selector.to_string())),
                None => None,
            },
        };
        Ok(found.cloned().unwrap_or_default())
    }

    async fn text(&self, element: ElementHandle) -> PageResult<Option<String>> {
        Ok(self.site.node(element)?.text)
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> PageResult<Option<String>> {
        Ok(self.site.node(element)?.attributes.get(name).cloned())
    }

    async fn href(&self, element: ElementHandle) -> PageResult<Option<String>> {
        Ok(self.site.node(element)?.href)
    }

    async fn tag_name(&self, element: ElementHandle) -> PageResult<String> {
        Ok(self.site.node(element)?.tag.to_uppercase())
    }

    async fn click(&self, element: ElementHandle) -> PageResult<()> {
        self.record(FakeCall::Click { element });
        if self.site.node(element)?.fail_click {
            return Err(PageError::Click(format!(
                "element {} is not clickable",
                element
            )));
        }
        Ok(())
    }

    async fn type_text(&self, element: ElementHandle, text: &str) -> PageResult<()> {
        self.site.node(element)?;
        self.record(FakeCall::Type {
            element,
            text: text.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_document_queries_follow_current_url() {
        let site = FakeSite::new();
        let a = site.add(FakeNode::paragraph("on a"));
        site.document("https://example.com/a", "p", [a]);
        let page = site.session();

        assert!(page.query_all(None, "p").await.unwrap().is_empty());

        page.navigate("https://example.com/a").await.unwrap();
        assert_eq!(page.query_all(None, "p").await.unwrap(), vec![a]);

        page.navigate("https://example.com/b").await.unwrap();
        assert_eq!(page.query_one(None, "p").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_sessions_do_not_share_location() {
        let site = FakeSite::new();
        let first = site.session();
        let second = site.session();

        first.navigate("https://example.com/a").await.unwrap();

        assert_eq!(first.current_url().as_deref(), Some("https://example.com/a"));
        assert_eq!(second.current_url(), None);
    }

    #[tokio::test]
    async fn test_unknown_handle_is_stale() {
        let page = FakeSite::new().session();
        let err = page.text(ElementHandle(99)).await.unwrap_err();
        assert!(matches!(err, PageError::StaleHandle(99)));
    }
}
