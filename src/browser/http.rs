use std::time::Duration;

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use super::{BrowseError, Browser, Element, Lookup, Page, PageError};
use crate::settings::BrowserMode;

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Elements whose text never shows up in rendered output.
const HIDDEN_TAGS: &[&str] = &["script", "style", "noscript", "template", "head"];
/// Elements that start on their own line when rendered.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "fieldset", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main",
    "nav", "ol", "p", "pre", "section", "table", "tr", "ul",
];

/// Plain HTTP backend: one GET per navigation, the body parsed once into a
/// static DOM snapshot.
pub struct HttpBrowser {
    client: Client,
}

impl HttpBrowser {
    pub fn new(mode: BrowserMode, nav_timeout: Duration) -> Result<Self, BrowseError> {
        if mode == BrowserMode::Visible {
            warn!("HTTP backend has no window to show, running headless");
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(nav_timeout)
            .build()
            .map_err(|source| BrowseError::Http {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }
}

impl Browser for HttpBrowser {
    type Page = HtmlPage;

    async fn open(&mut self, url: &str) -> Result<HtmlPage, BrowseError> {
        let target = Url::parse(url).map_err(|_| BrowseError::InvalidUrl(url.to_string()))?;
        let to_browse_error = |source: reqwest::Error| {
            if source.is_timeout() {
                BrowseError::Timeout { url: url.to_string() }
            } else {
                BrowseError::Http {
                    url: url.to_string(),
                    source,
                }
            }
        };

        let response = self
            .client
            .get(target)
            .send()
            .await
            .map_err(to_browse_error)?;
        let resolved = response.url().to_string();
        let status = response.status();
        debug!(%resolved, status = status.as_u16(), "navigation finished");
        // Error pages still load; callers decide from the resolved URL and content
        if !status.is_success() {
            warn!(%resolved, status = status.as_u16(), "page answered with an error status");
        }

        let body = response.text().await.map_err(to_browse_error)?;
        Ok(HtmlPage::parse(resolved, body))
    }
}

/// A parsed page. Queries run against the snapshot, so nothing here waits.
pub struct HtmlPage {
    url: String,
    markup: String,
    document: Html,
}

impl HtmlPage {
    pub fn parse(url: impl Into<String>, markup: impl Into<String>) -> Self {
        let markup = markup.into();
        let document = Html::parse_document(&markup);
        Self {
            url: url.into(),
            markup,
            document,
        }
    }

    fn select_from<'a>(
        root: impl Iterator<Item = ElementRef<'a>>,
        limit: usize,
    ) -> Vec<Element> {
        root.take(limit).map(snapshot).collect()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, PageError> {
    Selector::parse(selector).map_err(|_| PageError::InvalidSelector(selector.to_string()))
}

impl Page for HtmlPage {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> Lookup<String> {
        let sel = parse_selector("title")?;
        Ok(self
            .document
            .select(&sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty()))
    }

    fn html(&self) -> Lookup<String> {
        if self.markup.trim().is_empty() {
            return Err(PageError::Unavailable(format!("empty document at {}", self.url)));
        }
        Ok(Some(self.markup.clone()))
    }

    fn query(&self, selector: &str, limit: usize) -> Result<Vec<Element>, PageError> {
        let sel = parse_selector(selector)?;
        Ok(Self::select_from(self.document.select(&sel), limit))
    }

    fn query_in(&self, scope: &str, selector: &str, limit: usize) -> Lookup<Vec<Element>> {
        let scope_sel = parse_selector(scope)?;
        let sel = parse_selector(selector)?;
        Ok(self
            .document
            .select(&scope_sel)
            .next()
            .map(|root| Self::select_from(root.select(&sel), limit)))
    }
}

fn snapshot(el: ElementRef<'_>) -> Element {
    let attrs = el
        .value()
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Element::new(inner_text(el), attrs)
}

/// Approximates rendered text: hidden elements dropped, block elements on
/// their own lines, runs of whitespace collapsed. Script and style elements
/// queried directly return their raw contents.
pub fn inner_text(el: ElementRef<'_>) -> String {
    if HIDDEN_TAGS.contains(&el.value().name()) {
        return el.text().collect::<String>().trim().to_string();
    }

    let mut raw = String::new();
    push_text(el, &mut raw);
    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn push_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            let name = child_el.value().name();
            if HIDDEN_TAGS.contains(&name) {
                continue;
            }
            if name == "br" {
                out.push('\n');
                continue;
            }
            let block = BLOCK_TAGS.contains(&name);
            if block {
                out.push('\n');
            }
            push_text(child_el, out);
            if block {
                out.push('\n');
            }
        }
    }
}
