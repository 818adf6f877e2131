// src/services/extractor.rs

//! Per-candidate field extraction with fallback selector chains.
//!
//! Each field tries its selectors in order and takes the first non-empty
//! match. Unresolved non-mandatory fields leave the record PARTIAL; only
//! a missing title or URL makes it FAILED. A paywall or login redirect on
//! the detail page surfaces as an auth error so the run-level handler can
//! re-authenticate and retry the candidate once.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::browser::{Browser, Element};
use crate::error::{AppError, AuthReason, Result};
use crate::models::{Candidate, CrawlerConfig, FieldKind, FieldSpec, Post, Record, SourceKind};
use crate::utils::text::{clean_field, strip_labels};

use super::retry::{RetryPolicy, with_retry};
use super::session::page_suggests_expiry;

/// Extracts one structured record per candidate.
pub struct RecordExtractor {
    browser: Arc<dyn Browser>,
    source: SourceKind,
    policy: RetryPolicy,
    max_field_len: usize,
}

impl RecordExtractor {
    pub fn new(browser: Arc<dyn Browser>, source: SourceKind, config: &CrawlerConfig) -> Self {
        Self {
            browser,
            source,
            policy: RetryPolicy::from_config(config),
            max_field_len: config.max_field_len,
        }
    }

    /// Materialize a record from the candidate's detail page.
    pub async fn extract(&self, candidate: &Candidate) -> Result<Record> {
        let spec = self.source.spec();

        let page = with_retry(self.policy, &candidate.url, || async move {
            self.browser.navigate(&candidate.url).await?;
            let roots = self.browser.query("html").await?;
            Ok(roots.into_iter().next().unwrap_or_default())
        })
        .await?;

        if page_suggests_expiry(self.browser.as_ref(), self.source).await? {
            return Err(AppError::auth(self.source.id(), AuthReason::Unknown));
        }

        let mut fields = BTreeMap::new();
        for field in spec.fields {
            if let Some(value) = self.resolve_field(&page, field)? {
                fields.insert(field.kind, value);
            }
        }

        // The listing already gave us a title and date; use them when the
        // detail page yields nothing better.
        fields
            .entry(FieldKind::Title)
            .or_insert_with(|| candidate.title.clone());
        fields
            .entry(FieldKind::PublishedDate)
            .or_insert_with(|| candidate.raw_date.clone());
        if !fields.contains_key(&FieldKind::Category) {
            if let Some(category) = spec.categorize(&candidate.url) {
                fields.insert(FieldKind::Category, category.to_string());
            }
        }
        fields.retain(|_, v| !v.is_empty());

        let record = Record::new(self.source, candidate.url.clone(), fields);
        if !record.is_committable() {
            return Err(AppError::extraction(&candidate.url, "title"));
        }
        Ok(record)
    }

    /// First non-empty match across the field's selector chain.
    fn resolve_field(&self, page: &Element, field: &FieldSpec) -> Result<Option<String>> {
        for selector in field.selectors {
            let matches = page.select(selector)?;
            let Some(el) = matches.first() else {
                continue;
            };
            let raw = match field.attr {
                Some(attr) => el.attr(attr).unwrap_or_default().to_string(),
                None => el.text.clone(),
            };
            let value = clean_field(&apply_post(&raw, field.post), self.max_field_len);
            if !value.is_empty() {
                return Ok(Some(value));
            }
        }
        log::debug!("{}: no match for {:?}", self.source, field.kind);
        Ok(None)
    }
}

fn apply_post(raw: &str, post: Post) -> String {
    match post {
        Post::None => raw.to_string(),
        Post::StripLabels(labels) => strip_labels(raw, labels),
        Post::PipeSegmentFromEnd(n) => pipe_segment_from_end(raw, n),
    }
}

/// n-th pipe-separated segment counted from the end (1-based), e.g. the
/// sub-category in "11 Jul 2025 | [2025] 175 | GST | Case Laws | 237 Views".
fn pipe_segment_from_end(raw: &str, n: usize) -> String {
    let segments: Vec<&str> = raw.split('|').map(str::trim).collect();
    match segments.len().checked_sub(n) {
        Some(idx) if n > 0 => segments[idx].to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::testing::FakeBrowser;
    use crate::models::ExtractionStatus;
    use chrono::NaiveDate;

    fn candidate(url: &str, title: &str) -> Candidate {
        Candidate {
            url: url.to_string(),
            title: title.to_string(),
            published: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            raw_date: "Jun 10, 2025".to_string(),
        }
    }

    fn extractor(browser: Arc<FakeBrowser>, source: SourceKind) -> RecordExtractor {
        let config = CrawlerConfig {
            retry_base_delay_ms: 1,
            ..CrawlerConfig::default()
        };
        RecordExtractor::new(browser, source, &config)
    }

    #[tokio::test]
    async fn complete_rulings_record() {
        let url = "https://www.taxsutra.com/dt/rulings/42";
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(
            url,
            "<html><body>\
             <h1 class='page-title'>Assessee wins on 10A</h1>\
             <span class='podcastTimeDate'>Jun 10, 2025</span>\
             <div class='field--name-field-date-of-judgement'><div class='field__item'>Jun 05, 2025</div></div>\
             <span class='citationNumber'>[2025] 123 taxsutra 45</span>\
             <div id='conclusion'><div><div class='field__item'><p>HC rules in favour.</p></div></div></div>\
             <div class='rulingsDetailsWrap'><div class='centerContentWrap'>\
             <div class='field--name-body'>Decision Summary: The court held so.</div>\
             <div class='caseLawInfoWrap'>Case Law Information: ITA 99/2024</div>\
             </div></div>\
             </body></html>",
        );

        let record = extractor(browser, SourceKind::Rulings)
            .extract(&candidate(url, "Assessee wins on 10A"))
            .await
            .unwrap();

        assert_eq!(record.status, ExtractionStatus::Complete);
        assert_eq!(record.title(), "Assessee wins on 10A");
        assert_eq!(record.field(FieldKind::Conclusion), "HC rules in favour.");
        assert_eq!(record.field(FieldKind::DecisionSummary), "The court held so.");
        assert_eq!(record.field(FieldKind::Citation), "[2025] 123 taxsutra 45");
    }

    #[tokio::test]
    async fn missing_optional_fields_yield_partial() {
        let url = "https://www.taxsutra.com/dt/rulings/43";
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(
            url,
            "<html><body><h1 class='page-title'>Bare ruling</h1></body></html>",
        );

        let record = extractor(browser, SourceKind::Rulings)
            .extract(&candidate(url, "Bare ruling"))
            .await
            .unwrap();

        assert_eq!(record.status, ExtractionStatus::Partial);
        assert!(record.is_committable());
        assert_eq!(record.field(FieldKind::Conclusion), "");
        // Listing date fills the gap
        assert_eq!(record.published_date(), "Jun 10, 2025");
    }

    #[tokio::test]
    async fn listing_title_backfills_bare_page() {
        let url = "https://www.taxsutra.com/dt/rulings/44";
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(url, "<html><body><div>nothing matches</div></body></html>");

        let record = extractor(browser, SourceKind::Rulings)
            .extract(&candidate(url, "From the listing"))
            .await
            .unwrap();

        assert_eq!(record.title(), "From the listing");
        assert_eq!(record.status, ExtractionStatus::Partial);
    }

    #[tokio::test]
    async fn paywall_page_is_auth_error() {
        let url = "https://www.taxsutra.com/dt/rulings/45";
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(
            url,
            "<html><body>Please login to continue reading.</body></html>",
        );

        let err = extractor(browser, SourceKind::Rulings)
            .extract(&candidate(url, "Paywalled"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Auth { .. }));
    }

    #[tokio::test]
    async fn updates_category_from_url_and_pipe_sub_category() {
        let url = "https://www.taxmann.com/research/gst/article/77";
        let browser = Arc::new(FakeBrowser::new());
        browser.set_page(
            url,
            "<html><body>\
             <h2>Circular clarifies ITC rules</h2>\
             <div class='content-m-info-div1'>11 Jul 2025 | [2025] 175 taxmann.com 1 | GST | Case Laws | 237 Views</div>\
             <div id='dbs_summary'>GST : Where assessee claimed credit, held allowable.</div>\
             </body></html>",
        );

        let record = extractor(browser, SourceKind::Updates)
            .extract(&candidate(url, "Circular clarifies ITC rules"))
            .await
            .unwrap();

        assert_eq!(record.field(FieldKind::Category), "GST");
        assert_eq!(record.field(FieldKind::SubCategory), "Case Laws");
    }

    #[test]
    fn pipe_segment_bounds() {
        assert_eq!(pipe_segment_from_end("a | b | c", 1), "c");
        assert_eq!(pipe_segment_from_end("a | b | c", 3), "a");
        assert_eq!(pipe_segment_from_end("a | b", 5), "");
        assert_eq!(pipe_segment_from_end("plain", 2), "");
    }
}
