// src/models/record.rs

//! Record and candidate data structures.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::SourceKind;
use crate::utils::url::record_identity;

/// A field a record can carry. Which fields a source actually produces is
/// decided by its selector table; the sheet column mapping dispatches on
/// the same tags.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Title,
    PublishedDate,
    RulingDate,
    Category,
    SubCategory,
    Content,
    Conclusion,
    DecisionSummary,
    CaseLawInfo,
    Citation,
}

impl FieldKind {
    /// Human-readable label used in sheet headers and digests.
    pub fn label(self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::PublishedDate => "Published Date",
            Self::RulingDate => "Ruling Date",
            Self::Category => "Category",
            Self::SubCategory => "Sub-Category",
            Self::Content => "Content",
            Self::Conclusion => "Conclusion",
            Self::DecisionSummary => "Decision Summary",
            Self::CaseLawInfo => "Case Law Information",
            Self::Citation => "Citation",
        }
    }
}

/// How much of a record the extractor recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExtractionStatus {
    /// Every field in the source's selector table resolved
    Complete,
    /// Non-mandatory fields missing; still committable
    Partial,
    /// Title or URL missing; never committed
    Failed,
}

/// A reference to a not-yet-extracted listing entry, in listing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub url: String,
    pub title: String,
    pub published: NaiveDate,
    /// Date as the listing displayed it
    pub raw_date: String,
}

/// One ruling/article instance. Created by the extractor, read-only
/// thereafter, persisted once by the commit pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Record {
    /// Stable dedup key (normalized URL, or title+date hash)
    pub identity: String,
    pub source: SourceKind,
    pub url: String,
    /// Extracted field values; absent keys were unresolved
    pub fields: BTreeMap<FieldKind, String>,
    pub status: ExtractionStatus,
}

impl Record {
    /// Build a record from extracted fields, deriving identity and status.
    pub fn new(source: SourceKind, url: String, fields: BTreeMap<FieldKind, String>) -> Self {
        let title = fields.get(&FieldKind::Title).cloned().unwrap_or_default();
        let published = fields
            .get(&FieldKind::PublishedDate)
            .cloned()
            .unwrap_or_default();

        let status = if title.is_empty() || url.is_empty() {
            ExtractionStatus::Failed
        } else if source
            .spec()
            .fields
            .iter()
            .all(|spec| fields.get(&spec.kind).is_some_and(|v| !v.is_empty()))
        {
            ExtractionStatus::Complete
        } else {
            ExtractionStatus::Partial
        };

        Self {
            identity: record_identity(&url, &title, &published),
            source,
            url,
            fields,
            status,
        }
    }

    /// Field value, empty when unresolved.
    pub fn field(&self, kind: FieldKind) -> &str {
        self.fields.get(&kind).map_or("", String::as_str)
    }

    pub fn title(&self) -> &str {
        self.field(FieldKind::Title)
    }

    pub fn published_date(&self) -> &str {
        self.field(FieldKind::PublishedDate)
    }

    /// FAILED records are dropped before commit; PARTIAL ones go through.
    pub fn is_committable(&self) -> bool {
        !matches!(self.status, ExtractionStatus::Failed)
    }

    /// Best available summary text for the digest: conclusion over
    /// decision summary over content.
    pub fn best_summary(&self) -> &str {
        for kind in [
            FieldKind::Conclusion,
            FieldKind::DecisionSummary,
            FieldKind::Content,
        ] {
            let value = self.field(kind);
            if !value.is_empty() {
                return value;
            }
        }
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(FieldKind, &str)]) -> BTreeMap<FieldKind, String> {
        pairs
            .iter()
            .map(|(k, v)| (*k, (*v).to_string()))
            .collect()
    }

    #[test]
    fn missing_title_is_failed() {
        let record = Record::new(
            SourceKind::Rulings,
            "https://example.com/r/1".into(),
            fields(&[(FieldKind::PublishedDate, "Jun 09, 2025")]),
        );
        assert_eq!(record.status, ExtractionStatus::Failed);
        assert!(!record.is_committable());
    }

    #[test]
    fn missing_optional_field_is_partial() {
        let record = Record::new(
            SourceKind::Rulings,
            "https://example.com/r/1".into(),
            fields(&[
                (FieldKind::Title, "Some Ruling"),
                (FieldKind::PublishedDate, "Jun 09, 2025"),
            ]),
        );
        assert_eq!(record.status, ExtractionStatus::Partial);
        assert!(record.is_committable());
    }

    #[test]
    fn identity_uses_normalized_url() {
        let record = Record::new(
            SourceKind::Updates,
            "https://example.com/u/7/?utm_source=x".into(),
            fields(&[(FieldKind::Title, "T")]),
        );
        assert_eq!(record.identity, "https://example.com/u/7");
    }

    #[test]
    fn summary_preference_order() {
        let record = Record::new(
            SourceKind::Rulings,
            "https://example.com/r/2".into(),
            fields(&[
                (FieldKind::Title, "T"),
                (FieldKind::DecisionSummary, "ds"),
                (FieldKind::Conclusion, "conclusion wins"),
            ]),
        );
        assert_eq!(record.best_summary(), "conclusion wins");
    }
}
