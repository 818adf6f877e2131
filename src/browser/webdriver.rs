// src/browser/webdriver.rs

//! Thin W3C WebDriver client over HTTP.
//!
//! Speaks just enough of the wire protocol for this crawler: session
//! create/delete, navigation, element find/click/type, and page source.
//! Selector queries are evaluated locally against the fetched page source
//! with `scraper`, which sidesteps per-element round trips for listing
//! rows and keeps the query surface identical to the test fakes.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Mutex;

use crate::error::{AppError, Result, TransientKind};
use crate::models::CrawlerConfig;

use super::{Browser, Element, select_in_source};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// WebDriver-backed browser. One driver session per instance.
pub struct WebDriverBrowser {
    client: reqwest::Client,
    base: String,
    session: Mutex<Option<String>>,
    page_load_wait: Duration,
}

#[derive(serde::Deserialize)]
struct WdValue<T> {
    value: T,
}

#[derive(serde::Deserialize)]
struct WdSession {
    #[serde(rename = "sessionId")]
    session_id: String,
}

#[derive(serde::Deserialize)]
struct WdElement {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    id: String,
}

impl WebDriverBrowser {
    /// Create a new headless-browser session against the configured
    /// WebDriver endpoint.
    pub async fn connect(config: &CrawlerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.webdriver_timeout_secs.max(30)))
            .build()?;

        let capabilities = json!({
            "capabilities": {
                "alwaysMatch": {
                    "goog:chromeOptions": {
                        "args": [
                            "--headless=new",
                            "--disable-gpu",
                            "--no-sandbox",
                            "--disable-dev-shm-usage",
                            "--window-size=1920,1080",
                        ]
                    }
                }
            }
        });

        let response: WdValue<WdSession> = client
            .post(format!("{}/session", config.webdriver_url))
            .json(&capabilities)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        log::info!("WebDriver session established: {}", response.value.session_id);

        Ok(Self {
            client,
            base: config.webdriver_url.clone(),
            session: Mutex::new(Some(response.value.session_id)),
            page_load_wait: Duration::from_millis(config.page_load_wait_ms),
        })
    }

    async fn session_id(&self) -> Result<String> {
        self.session
            .lock()
            .await
            .clone()
            .ok_or_else(|| AppError::transient(TransientKind::Network, "webdriver", "session closed"))
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let session = self.session_id().await?;
        let response = self
            .client
            .post(format!("{}/session/{}/{}", self.base, session, path))
            .json(&body)
            .send()
            .await?;
        Self::into_value(response).await
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let session = self.session_id().await?;
        let response = self
            .client
            .get(format!("{}/session/{}/{}", self.base, session, path))
            .send()
            .await?;
        Self::into_value(response).await
    }

    async fn into_value(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response.json().await?;
        if status.is_success() {
            return Ok(body["value"].clone());
        }
        let error = body["value"]["error"].as_str().unwrap_or("unknown");
        let message = body["value"]["message"].as_str().unwrap_or("").to_string();
        match error {
            // Expected outcome, not a crash; callers see an empty result
            "no such element" => Ok(Value::Null),
            "stale element reference" => Err(AppError::transient(
                TransientKind::StaleElement,
                "webdriver",
                message,
            )),
            "timeout" | "script timeout" => Err(AppError::transient(
                TransientKind::ElementTimeout,
                "webdriver",
                message,
            )),
            other => Err(AppError::transient(
                TransientKind::Network,
                "webdriver",
                format!("{other}: {message}"),
            )),
        }
    }

    /// Find one live element, `None` when absent.
    async fn find_element(&self, selector: &str) -> Result<Option<String>> {
        let value = self
            .post(
                "element",
                json!({ "using": "css selector", "value": selector }),
            )
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        let element: WdElement = serde_json::from_value(value)?;
        Ok(Some(element.id))
    }

    async fn element_post(&self, element_id: &str, action: &str, body: Value) -> Result<()> {
        self.post(&format!("element/{element_id}/{action}"), body)
            .await?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String> {
        let value = self.get("source").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

#[async_trait]
impl Browser for WebDriverBrowser {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.post("url", json!({ "url": url })).await?;
        tokio::time::sleep(self.page_load_wait).await;
        Ok(())
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if !self.query(selector).await?.is_empty() {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(AppError::transient(
                    TransientKind::ElementTimeout,
                    format!("wait_for {selector}"),
                    format!("no match within {timeout:?}"),
                ));
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn query(&self, selector: &str) -> Result<Vec<Element>> {
        let source = self.page_source().await?;
        select_in_source(&source, selector)
    }

    async fn fill(&self, selector: &str, text: &str) -> Result<()> {
        let Some(element_id) = self.find_element(selector).await? else {
            return Err(AppError::transient(
                TransientKind::ElementTimeout,
                format!("fill {selector}"),
                "element not found",
            ));
        };
        self.element_post(&element_id, "clear", json!({})).await?;
        self.element_post(&element_id, "value", json!({ "text": text }))
            .await
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let Some(element_id) = self.find_element(selector).await? else {
            return Err(AppError::transient(
                TransientKind::ElementTimeout,
                format!("click {selector}"),
                "element not found",
            ));
        };
        self.element_post(&element_id, "click", json!({})).await
    }

    async fn current_url(&self) -> Result<String> {
        let value = self.get("url").await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.session.lock().await;
        let Some(session) = guard.take() else {
            return Ok(()); // already closed
        };
        self.client
            .delete(format!("{}/session/{}", self.base, session))
            .send()
            .await?;
        log::info!("WebDriver session closed");
        Ok(())
    }
}
