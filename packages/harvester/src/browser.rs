//! `headless_chrome` backed page client.
//!
//! Element handles are indices into a registry array kept on `window` of the
//! current document. Every query appends its matches to the registry, so a
//! handle stays valid until the tab navigates away and the window is replaced.
//!
//! The registry doubles as the document identity: a document the harvester has
//! touched always carries one, a freshly loaded document never does. That is
//! how [`PageClient::wait_for_navigation`] tells the page after a form submit
//! from the page the submit was clicked on.

use anyhow::{Context, Result};
use async_trait::async_trait;
use harvest::{ElementHandle, PageClient, PageError, PageResult};
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const IDLE_TIMEOUT: Duration = Duration::from_secs(30);
const IDLE_POLL: Duration = Duration::from_millis(100);
const IDLE_SETTLE: Duration = Duration::from_millis(200);
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Keeps the connection alive while lanes sit on slow pages.
const BROWSER_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

const PRELUDE: &str = r#"
const registry = (window.__harvest = window.__harvest || []);
const keep = (element) => { registry.push(element); return registry.length - 1; };
const el = (id) => {
  const element = registry[id];
  if (!element || !element.isConnected) throw { staleHandle: id };
  return element;
};
"#;

/// True once the tab shows a document without a registry.
const FRESH_DOCUMENT: &str = "window.__harvest === undefined";

/// Outcome of a wrapped script, as serialized by [`envelope`].
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply {
    Ok(Value),
    Stale(u64),
    Error(String),
}

impl Reply {
    fn into_result(self) -> PageResult<Value> {
        match self {
            Reply::Ok(value) => Ok(value),
            Reply::Stale(id) => Err(PageError::StaleHandle(id)),
            Reply::Error(message) => Err(PageError::Script(message)),
        }
    }
}

/// Wrap a JS expression in a JSON envelope that also carries thrown errors.
fn envelope(prelude: &str, expression: &str) -> String {
    format!(
        "(() => {{{}\ntry {{ return JSON.stringify({{ ok: ({}) ?? null }}); }}\n\
         catch (e) {{ if (e && e.staleHandle !== undefined) return JSON.stringify({{ stale: e.staleHandle }});\n\
         return JSON.stringify({{ error: String((e && e.message) || e) }}); }}\n}})()",
        prelude, expression
    )
}

/// Wrap a JS expression with the registry helpers.
fn script(expression: &str) -> String {
    envelope(PRELUDE, expression)
}

/// Scroll `element` into view and click it, failing when it has no box to
/// click on.
fn click_expression(element: ElementHandle) -> String {
    format!(
        "(() => {{ const target = el({}); \
         target.scrollIntoView({{ block: 'center', inline: 'center' }}); \
         const box = target.getBoundingClientRect(); \
         if (target.getClientRects().length === 0 || box.width === 0 || box.height === 0) \
         throw new Error('element is not visible'); \
         target.click(); return true; }})()",
        element.0
    )
}

fn click_error(error: PageError) -> PageError {
    match error {
        PageError::Script(reason) => PageError::Click(reason),
        other => other,
    }
}

/// JS string literal for `value`.
fn literal(value: &str) -> String {
    Value::from(value).to_string()
}

fn scope_expression(scope: Option<ElementHandle>) -> String {
    match scope {
        Some(element) => format!("el({})", element.0),
        None => "document".to_string(),
    }
}

/// One Chrome instance shared by every session of a job.
pub struct ChromeBrowser {
    browser: Browser,
}

impl ChromeBrowser {
    /// Launch Chrome.
    pub fn launch(headless: bool) -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(headless)
            .idle_browser_timeout(BROWSER_IDLE_TIMEOUT)
            .build()
            .map_err(|e| anyhow::anyhow!("invalid browser options: {}", e))?;

        let browser = Browser::new(options).context("Failed to launch browser")?;
        Ok(Self { browser })
    }

    /// Open a new tab as an independent session.
    pub fn session(&self) -> Result<ChromePage> {
        let tab = self.browser.new_tab().context("Failed to open tab")?;
        Ok(ChromePage { tab })
    }
}

/// One browser tab.
pub struct ChromePage {
    tab: Arc<Tab>,
}

impl ChromePage {
    /// Run a blocking tab operation off the async runtime.
    async fn blocking<T, F>(&self, op: F) -> PageResult<anyhow::Result<T>>
    where
        T: Send + 'static,
        F: FnOnce(&Tab) -> anyhow::Result<T> + Send + 'static,
    {
        let tab = Arc::clone(&self.tab);
        tokio::task::spawn_blocking(move || op(&tab))
            .await
            .map_err(|e| PageError::Session(e.to_string()))
    }

    /// Evaluate `expression` and decode its value.
    async fn eval(&self, expression: &str) -> PageResult<Value> {
        self.eval_source(script(expression)).await
    }

    /// Evaluate a fully wrapped script.
    async fn eval_source(&self, source: String) -> PageResult<Value> {
        let object = self
            .blocking(move |tab| tab.evaluate(&source, false))
            .await?
            .map_err(|e| PageError::Script(e.to_string()))?;

        let raw = object
            .value
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| PageError::Script("script returned no value".to_string()))?
            .to_string();

        serde_json::from_str::<Reply>(&raw)
            .map_err(|e| PageError::Script(e.to_string()))?
            .into_result()
    }

    async fn eval_as<T: serde::de::DeserializeOwned>(&self, expression: &str) -> PageResult<T> {
        let value = self.eval(expression).await?;
        serde_json::from_value(value).map_err(|e| PageError::Script(e.to_string()))
    }
}

#[async_trait]
impl PageClient for ChromePage {
    async fn navigate(&self, url: &str) -> PageResult<()> {
        debug!(url, "navigating");
        let target = url.to_string();
        self.blocking(move |tab| {
            tab.navigate_to(&target)?.wait_until_navigated()?;
            Ok(())
        })
        .await?
        .map_err(|e| PageError::Navigation {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    async fn wait_for_idle(&self) -> PageResult<()> {
        let deadline = tokio::time::Instant::now() + IDLE_TIMEOUT;
        loop {
            // Evaluation fails while a document is being replaced; keep polling.
            if let Ok(Value::Bool(true)) = self.eval("document.readyState === 'complete'").await {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PageError::Timeout("document to finish loading".to_string()));
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
        tokio::time::sleep(IDLE_SETTLE).await;
        Ok(())
    }

    async fn wait_for_navigation(&self) -> PageResult<()> {
        // The document the submit was clicked on has a registry; poll without
        // creating one until the tab shows a different document.
        let deadline = tokio::time::Instant::now() + NAVIGATION_TIMEOUT;
        loop {
            if let Ok(Value::Bool(true)) = self.eval_source(envelope("", FRESH_DOCUMENT)).await {
                break;
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PageError::Timeout("navigation after submit".to_string()));
            }
            tokio::time::sleep(IDLE_POLL).await;
        }
        debug!("navigation after submit detected");
        self.wait_for_idle().await
    }

    async fn query_one(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> PageResult<Option<ElementHandle>> {
        let expression = format!(
            "(() => {{ const found = {}.querySelector({}); return found ? keep(found) : null; }})()",
            scope_expression(scope),
            literal(selector)
        );
        self.eval_as::<Option<u64>>(&expression)
            .await
            .map(|found| found.map(ElementHandle))
            .map_err(|e| query_error(selector, e))
    }

    async fn query_all(
        &self,
        scope: Option<ElementHandle>,
        selector: &str,
    ) -> PageResult<Vec<ElementHandle>> {
        let expression = format!(
            "Array.from({}.querySelectorAll({})).map(keep)",
            scope_expression(scope),
            literal(selector)
        );
        self.eval_as::<Vec<u64>>(&expression)
            .await
            .map(|found| found.into_iter().map(ElementHandle).collect())
            .map_err(|e| query_error(selector, e))
    }

    async fn text(&self, element: ElementHandle) -> PageResult<Option<String>> {
        self.eval_as(&format!("el({}).textContent", element.0)).await
    }

    async fn attribute(&self, element: ElementHandle, name: &str) -> PageResult<Option<String>> {
        self.eval_as(&format!("el({}).getAttribute({})", element.0, literal(name)))
            .await
    }

    async fn href(&self, element: ElementHandle) -> PageResult<Option<String>> {
        self.eval_as(&format!(
            "(() => {{ const href = el({}).href; return typeof href === 'string' ? href : null; }})()",
            element.0
        ))
        .await
    }

    async fn tag_name(&self, element: ElementHandle) -> PageResult<String> {
        self.eval_as(&format!("el({}).tagName", element.0)).await
    }

    async fn click(&self, element: ElementHandle) -> PageResult<()> {
        self.eval(&click_expression(element))
            .await
            .map(|_| ())
            .map_err(click_error)
    }

    async fn type_text(&self, element: ElementHandle, text: &str) -> PageResult<()> {
        self.eval(&format!("(el({}).focus(), true)", element.0))
            .await?;
        let text = text.to_string();
        self.blocking(move |tab| {
            tab.type_str(&text)?;
            Ok(())
        })
        .await?
        .map_err(|e| PageError::Script(e.to_string()))
    }
}

fn query_error(selector: &str, error: PageError) -> PageError {
    match error {
        PageError::Script(reason) => PageError::Query {
            selector: selector.to_string(),
            reason,
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_escapes_quotes() {
        assert_eq!(literal(r#"a[href*="x"]"#), r#""a[href*=\"x\"]""#);
    }

    #[test]
    fn test_scope_expression() {
        assert_eq!(scope_expression(None), "document");
        assert_eq!(scope_expression(Some(ElementHandle(3))), "el(3)");
    }

    #[test]
    fn test_reply_decoding() {
        let ok: Reply = serde_json::from_str(r#"{"ok":[1,2]}"#).unwrap();
        assert!(matches!(ok, Reply::Ok(Value::Array(ref v)) if v.len() == 2));

        let stale: Reply = serde_json::from_str(r#"{"stale":7}"#).unwrap();
        assert!(matches!(stale.into_result(), Err(PageError::StaleHandle(7))));

        let thrown: Reply = serde_json::from_str(r#"{"error":"boom"}"#).unwrap();
        assert!(matches!(thrown.into_result(), Err(PageError::Script(ref m)) if m == "boom"));
    }

    #[test]
    fn test_click_refuses_elements_without_a_box() {
        let source = click_expression(ElementHandle(4));
        assert!(source.contains("el(4)"));
        assert!(source.contains("scrollIntoView"));
        assert!(source.contains("getClientRects().length === 0"));
        assert!(source.contains("throw new Error('element is not visible')"));
        let click = source.find("target.click()").unwrap();
        assert!(source.find("throw").unwrap() < click);
    }

    #[test]
    fn test_thrown_click_becomes_click_error() {
        let err = click_error(PageError::Script("element is not visible".to_string()));
        assert!(matches!(err, PageError::Click(ref m) if m == "element is not visible"));
        assert!(matches!(
            click_error(PageError::StaleHandle(2)),
            PageError::StaleHandle(2)
        ));
    }

    #[test]
    fn test_navigation_check_does_not_create_registry() {
        let source = envelope("", FRESH_DOCUMENT);
        assert!(source.contains("ok: (window.__harvest === undefined)"));
        assert!(!source.contains("window.__harvest ="));
        assert!(script(FRESH_DOCUMENT).contains("window.__harvest = window.__harvest || []"));
    }

    #[test]
    fn test_script_wraps_expression() {
        let source = script("document.title");
        assert!(source.contains("ok: (document.title) ?? null"));
        assert!(source.contains("window.__harvest"));
    }

    #[test]
    #[ignore] // Requires Chrome to be installed
    fn test_launch_and_open_session() {
        let browser = ChromeBrowser::launch(true).unwrap();
        assert!(browser.session().is_ok());
    }
}
