// src/services/walker.rs

//! Paginated listing traversal with early exit on the date cutoff.
//!
//! Listings are reverse-chronological, so the first entry older than the
//! run window ends the whole walk. A fresh walk always starts at page 1;
//! there is no mid-run resume.

use std::sync::Arc;
use std::time::Duration;

use crate::browser::{Browser, Element};
use crate::error::Result;
use crate::models::{Candidate, CrawlerConfig, SourceKind};
use crate::utils::date::{CutoffWindow, parse_listing_date};
use crate::utils::text::normalize_whitespace;
use crate::utils::url::resolve;

use super::retry::{RetryPolicy, with_retry};

/// What one walk produced.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    /// Candidates in listing order (newest first).
    pub candidates: Vec<Candidate>,
    /// A page failed to render after retries; candidates gathered before
    /// the failure are still valid.
    pub partial: bool,
    pub pages_visited: usize,
}

/// Walks one source's paginated listing.
pub struct ListingWalker {
    browser: Arc<dyn Browser>,
    source: SourceKind,
    policy: RetryPolicy,
    max_pages: usize,
    wait_timeout: Duration,
}

impl ListingWalker {
    pub fn new(browser: Arc<dyn Browser>, source: SourceKind, config: &CrawlerConfig) -> Self {
        Self {
            browser,
            source,
            policy: RetryPolicy::from_config(config),
            max_pages: config.max_pages,
            wait_timeout: Duration::from_secs(config.webdriver_timeout_secs),
        }
    }

    /// Collect every candidate published inside `window`, stopping at the
    /// first entry older than it.
    pub async fn walk(&self, window: CutoffWindow) -> Result<WalkOutcome> {
        let listing = &self.source.spec().listing;
        let mut candidates = Vec::new();
        let mut pages_visited = 0;

        for page in 1..=self.max_pages {
            let page_url = listing.page_url(page);

            match self.load_page(&page_url).await {
                Ok(()) => {}
                Err(error) if error.transient_kind().is_some() => {
                    log::warn!(
                        "{}: page {page} failed to render, ending walk early: {error}",
                        self.source
                    );
                    return Ok(WalkOutcome {
                        candidates,
                        partial: true,
                        pages_visited,
                    });
                }
                Err(error) => return Err(error),
            }
            pages_visited += 1;

            let rows = self.browser.query(listing.row_selector).await?;
            if rows.is_empty() {
                log::debug!("{}: page {page} has no rows, walk complete", self.source);
                break;
            }

            for row in &rows {
                match self.parse_row(row, &page_url, window)? {
                    RowOutcome::InWindow(candidate) => candidates.push(candidate),
                    RowOutcome::Newer | RowOutcome::Undated => {}
                    RowOutcome::Past => {
                        log::info!(
                            "{}: reached entries older than {}, stopping at page {page}",
                            self.source,
                            window.start
                        );
                        return Ok(WalkOutcome {
                            candidates,
                            partial: false,
                            pages_visited,
                        });
                    }
                }
            }
        }

        Ok(WalkOutcome {
            candidates,
            partial: false,
            pages_visited,
        })
    }

    /// Navigate and wait for the listing container, not the rows: the
    /// container distinguishes a rendered page with zero rows (end of the
    /// listing) from a page that never came up (a partial walk).
    async fn load_page(&self, url: &str) -> Result<()> {
        let listing = &self.source.spec().listing;
        with_retry(self.policy, &format!("listing page {url}"), || async move {
            self.browser.navigate(url).await?;
            self.browser
                .wait_for(listing.container_selector, self.wait_timeout)
                .await
        })
        .await
    }

    fn parse_row(&self, row: &Element, page_url: &str, window: CutoffWindow) -> Result<RowOutcome> {
        let listing = &self.source.spec().listing;

        let links = row.select(listing.link_selector)?;
        let Some(link) = links.first() else {
            // Ads and section headers match the row selector on some pages
            return Ok(RowOutcome::Undated);
        };
        let Some(href) = link.attr(listing.link_attr) else {
            return Ok(RowOutcome::Undated);
        };
        let title = normalize_whitespace(&link.text);

        let mut raw_date = String::new();
        let mut published = None;
        for date_selector in listing.date_selectors {
            let found = row.select(date_selector)?;
            if let Some(el) = found.first() {
                let text = normalize_whitespace(&el.text);
                if let Some(date) = parse_listing_date(&text) {
                    raw_date = text;
                    published = Some(date);
                    break;
                }
            }
        }
        let Some(published) = published else {
            log::debug!("{}: undated row skipped ({title})", self.source);
            return Ok(RowOutcome::Undated);
        };

        if window.is_past(published) {
            return Ok(RowOutcome::Past);
        }
        if !window.contains(published) {
            return Ok(RowOutcome::Newer);
        }

        Ok(RowOutcome::InWindow(Candidate {
            url: resolve(page_url, href),
            title,
            published,
            raw_date,
        }))
    }
}

enum RowOutcome {
    InWindow(Candidate),
    /// Published after the window; common when the run window is
    /// yesterday and the site already posted today.
    Newer,
    /// Older than the window; ends the walk.
    Past,
    /// No parseable date or no link; skipped.
    Undated,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::FakeBrowser;
    use chrono::NaiveDate;

    const PAGE_1: &str = "https://www.taxsutra.com/dt/rulings";
    const PAGE_2: &str = "https://www.taxsutra.com/dt/rulings?page=1";

    fn row(id: u32, title: &str, date: &str) -> String {
        format!(
            "<div class='views-row'><h3><a href='/dt/rulings/{id}'>{title}</a></h3>\
             <span class='podcastTimeDate'>{date}</span></div>"
        )
    }

    fn listing(rows: &[String]) -> String {
        format!(
            "<div class='view-content row'>{}</div>",
            rows.join("")
        )
    }

    fn walker(browser: Arc<FakeBrowser>) -> ListingWalker {
        let config = CrawlerConfig {
            retry_base_delay_ms: 1,
            ..CrawlerConfig::default()
        };
        ListingWalker::new(browser, SourceKind::Rulings, &config)
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[tokio::test]
    async fn stops_at_first_entry_older_than_window() {
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(
            PAGE_1,
            &listing(&[
                row(1, "First", "Jun 11, 2025"),
                row(2, "Second", "Jun 11, 2025"),
                row(3, "Stale", "Jun 10, 2025"),
            ]),
        );

        let window = CutoffWindow {
            start: day(11),
            end: day(11),
        };
        let outcome = walker(Arc::clone(&browser)).walk(window).await.unwrap();

        assert_eq!(outcome.candidates.len(), 2);
        assert_eq!(outcome.candidates[0].title, "First");
        assert_eq!(
            outcome.candidates[0].url,
            "https://www.taxsutra.com/dt/rulings/1"
        );
        assert_eq!(outcome.pages_visited, 1);
        assert!(!outcome.partial);
        // Cutoff on page 1 means page 2 is never requested
        assert!(!browser.navigations().iter().any(|u| u == PAGE_2));
    }

    #[tokio::test]
    async fn entries_newer_than_window_are_skipped() {
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(
            PAGE_1,
            &listing(&[
                row(1, "Today", "Jun 11, 2025"),
                row(2, "Yesterday", "Jun 10, 2025"),
                row(3, "Older", "Jun 09, 2025"),
            ]),
        );

        let window = CutoffWindow {
            start: day(10),
            end: day(10),
        };
        let outcome = walker(browser).walk(window).await.unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].title, "Yesterday");
    }

    #[tokio::test]
    async fn failed_page_ends_walk_as_partial() {
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(PAGE_1, &listing(&[row(1, "Kept", "Jun 10, 2025")]));
        browser.fail_navigation(PAGE_2, 10);

        let window = CutoffWindow {
            start: day(10),
            end: day(10),
        };
        let outcome = walker(browser).walk(window).await.unwrap();

        assert!(outcome.partial);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.pages_visited, 1);
    }

    #[tokio::test]
    async fn undated_rows_are_skipped_not_fatal() {
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(
            PAGE_1,
            &listing(&[
                "<div class='views-row'>sponsored placement</div>".to_string(),
                row(1, "Real", "Jun 10, 2025"),
                row(2, "Older", "Jun 09, 2025"),
            ]),
        );

        let window = CutoffWindow {
            start: day(10),
            end: day(10),
        };
        let outcome = walker(browser).walk(window).await.unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.candidates[0].title, "Real");
    }

    #[tokio::test]
    async fn page_that_never_renders_is_partial() {
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(PAGE_1, &listing(&[row(1, "Kept", "Jun 10, 2025")]));
        // Page 2 loads but the listing view never appears
        browser.set_page(PAGE_2, "<html><body><p>504 Gateway Time-out</p></body></html>");

        let window = CutoffWindow {
            start: day(10),
            end: day(10),
        };
        let outcome = walker(browser).walk(window).await.unwrap();

        assert!(outcome.partial);
        assert_eq!(outcome.candidates.len(), 1);
        assert_eq!(outcome.pages_visited, 1);
    }

    #[tokio::test]
    async fn empty_page_ends_walk() {
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(PAGE_1, &listing(&[row(1, "Only", "Jun 10, 2025")]));
        browser.set_page(PAGE_2, "<div class='view-content row'></div>");

        let window = CutoffWindow {
            start: day(10),
            end: day(10),
        };
        let outcome = walker(browser).walk(window).await.unwrap();

        assert_eq!(outcome.candidates.len(), 1);
        assert!(!outcome.partial);
        assert_eq!(outcome.pages_visited, 2);
    }
}
