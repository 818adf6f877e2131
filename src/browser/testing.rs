// src/browser/testing.rs

//! In-memory `Browser` for unit tests. Pages are static HTML keyed by
//! URL; clicks can swap the current page to model post-submit
//! transitions. No timing, no network.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result, TransientKind};

use super::{Browser, Element, select_in_source};

#[derive(Default)]
struct State {
    pages: HashMap<String, String>,
    current_url: String,
    current_html: String,
    click_transitions: HashMap<String, String>,
    filled: Vec<(String, String)>,
    clicks: Vec<String>,
    navigations: Vec<String>,
    navigate_failures: HashMap<String, u32>,
    close_count: usize,
}

#[derive(Default)]
pub struct FakeBrowser {
    state: Mutex<State>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the HTML served when `url` is navigated to.
    pub fn set_page(&self, url: &str, html: &str) {
        let mut state = self.state.lock().unwrap();
        state.pages.insert(url.to_string(), html.to_string());
    }

    /// Clicking `selector` replaces the current page with `html`.
    pub fn on_click(&self, selector: &str, html: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .click_transitions
            .insert(selector.to_string(), html.to_string());
    }

    /// Make the next `times` navigations to `url` fail transiently.
    pub fn fail_navigation(&self, url: &str, times: u32) {
        let mut state = self.state.lock().unwrap();
        state.navigate_failures.insert(url.to_string(), times);
    }

    pub fn filled(&self) -> Vec<(String, String)> {
        self.state.lock().unwrap().filled.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn navigations(&self) -> Vec<String> {
        self.state.lock().unwrap().navigations.clone()
    }

    pub fn close_count(&self) -> usize {
        self.state.lock().unwrap().close_count
    }

    fn has_match(&self, selector: &str) -> Result<bool> {
        let html = self.state.lock().unwrap().current_html.clone();
        Ok(!select_in_source(&html, selector)?.is_empty())
    }
}

#[async_trait]
impl Browser for FakeBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.navigations.push(url.to_string());
        if let Some(remaining) = state.navigate_failures.get_mut(url) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(AppError::transient(
                    TransientKind::Network,
                    format!("navigate {url}"),
                    "injected failure",
                ));
            }
        }
        state.current_url = url.to_string();
        state.current_html = state.pages.get(url).cloned().unwrap_or_default();
        Ok(())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> Result<()> {
        if self.has_match(selector)? {
            Ok(())
        } else {
            Err(AppError::transient(
                TransientKind::ElementTimeout,
                format!("wait_for {selector}"),
                "no match",
            ))
        }
    }

    async fn query(&self, selector: &str) -> Result<Vec<Element>> {
        let html = self.state.lock().unwrap().current_html.clone();
        select_in_source(&html, selector)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        if !self.has_match(selector)? {
            return Err(AppError::transient(
                TransientKind::ElementTimeout,
                format!("fill {selector}"),
                "element not found",
            ));
        }
        let mut state = self.state.lock().unwrap();
        state.filled.push((selector.to_string(), text.to_string()));
        Ok(())
    }

    async fn click(&self, selector: &str) -> Result<()> {
        if !self.has_match(selector)? {
            return Err(AppError::transient(
                TransientKind::ElementTimeout,
                format!("click {selector}"),
                "element not found",
            ));
        }
        let mut state = self.state.lock().unwrap();
        state.clicks.push(selector.to_string());
        if let Some(html) = state.click_transitions.get(selector).cloned() {
            state.current_html = html;
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.state.lock().unwrap().current_url.clone())
    }

    async fn close(&self) -> Result<()> {
        self.state.lock().unwrap().close_count += 1;
        Ok(())
    }
}
