// src/browser/mod.rs

//! Browser automation collaborator boundary.
//!
//! The pipeline needs very little from a browser: navigate, a bounded
//! wait, selector queries over the rendered page, and the two input
//! primitives the login sequence uses. Timeouts and "not found" are
//! distinct, expected outcomes: a timeout is a transient error, an
//! empty query result is just an empty `Vec`.

#[cfg(test)]
pub mod testing;
pub mod webdriver;

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};

pub use webdriver::WebDriverBrowser;

/// A matched element, detached from the live page. Carries its outer
/// HTML so callers can run scoped sub-queries without another round trip.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub text: String,
    pub html: String,
    pub attrs: BTreeMap<String, String>,
}

impl Element {
    /// Build from a parsed element reference.
    pub fn from_element_ref(el: &ElementRef<'_>) -> Self {
        Self {
            text: el.text().collect::<String>(),
            html: el.html(),
            attrs: el
                .value()
                .attrs()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// Select within this element's subtree.
    pub fn select(&self, selector: &str) -> Result<Vec<Element>> {
        let parsed = parse_selector(selector)?;
        let fragment = Html::parse_fragment(&self.html);
        Ok(fragment
            .select(&parsed)
            .map(|el| Element::from_element_ref(&el))
            .collect())
    }
}

/// Parse a CSS selector, mapping parse failures to a typed error.
pub fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| AppError::selector(selector, format!("{e:?}")))
}

/// Select against a full page source.
pub fn select_in_source(source: &str, selector: &str) -> Result<Vec<Element>> {
    let parsed = parse_selector(selector)?;
    let document = Html::parse_document(source);
    Ok(document
        .select(&parsed)
        .map(|el| Element::from_element_ref(&el))
        .collect())
}

/// The capabilities the pipeline requires from a browser driver.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Load a URL and let the page settle.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Wait until `selector` matches at least one element, bounded by
    /// `timeout`. Expiry is a transient `ElementTimeout` error.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()>;

    /// All elements currently matching `selector`; empty means not found.
    async fn query(&self, selector: &str) -> Result<Vec<Element>>;

    /// Clear and type into the first element matching `selector`.
    async fn fill(&self, selector: &str, text: &str) -> Result<()>;

    /// Click the first element matching `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// URL of the current page.
    async fn current_url(&self) -> Result<String>;

    /// Release the underlying driver session. Idempotent.
    async fn close(&self) -> Result<()>;
}
