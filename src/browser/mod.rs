pub mod http;

use std::time::Duration;

use thiserror::Error;

pub use http::HttpBrowser;

/// A single DOM lookup that could not be answered. Distinct from "not found",
/// which is `Ok(None)`.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid selector `{0}`")]
    InvalidSelector(String),
    #[error("malformed structured data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("page content unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum BrowseError {
    #[error("invalid url `{0}`")]
    InvalidUrl(String),
    #[error("navigation to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

pub type Lookup<T> = Result<Option<T>, PageError>;

/// Snapshot of one matched element: its rendered text and attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub text: String,
    attrs: Vec<(String, String)>,
}

impl Element {
    pub fn new(text: impl Into<String>, attrs: Vec<(String, String)>) -> Self {
        Self {
            text: text.into(),
            attrs,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Read access to a loaded page.
///
/// Selectors are CSS selector groups; matches come back in document order.
pub trait Page {
    /// URL after navigation and redirects.
    fn url(&self) -> &str;

    fn title(&self) -> Lookup<String>;

    /// Raw page markup.
    fn html(&self) -> Lookup<String>;

    fn query(&self, selector: &str, limit: usize) -> Result<Vec<Element>, PageError>;

    /// Like [`Page::query`] but restricted to the first element matching
    /// `scope`. `Ok(None)` when the scope itself is absent.
    fn query_in(&self, scope: &str, selector: &str, limit: usize) -> Lookup<Vec<Element>>;

    /// Trimmed text of the first match, `None` if absent or blank.
    fn first_text(&self, selector: &str) -> Lookup<String> {
        Ok(self
            .query(selector, 1)?
            .into_iter()
            .next()
            .map(|el| el.text.trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    fn first_attr(&self, selector: &str, name: &str) -> Lookup<String> {
        Ok(self
            .query(selector, 1)?
            .into_iter()
            .next()
            .and_then(|el| el.attr(name).map(str::to_string)))
    }
}

/// Navigation capability. One instance is driven sequentially for a whole run.
#[allow(async_fn_in_trait)]
pub trait Browser {
    type Page: Page;

    /// Navigate and return once the primary content is loaded.
    async fn open(&mut self, url: &str) -> Result<Self::Page, BrowseError>;

    /// Wait for network activity to settle. Callers treat failure as non-fatal.
    async fn settle(&mut self, _page: &Self::Page, _timeout: Duration) -> Result<(), BrowseError> {
        Ok(())
    }
}
