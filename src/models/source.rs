// src/models/source.rs

//! Source adapter tables.
//!
//! The two publishers are hard-wired: `Rulings` (Taxsutra-style ruling
//! pages) and `Updates` (Taxmann-style archive updates). Each variant
//! carries a fixed selector table and sheet column mapping; the extractor
//! and commit pipeline dispatch on the tag instead of probing for fields.

use serde::{Deserialize, Serialize};

use super::FieldKind;

/// Which publisher a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Rulings,
    Updates,
}

impl SourceKind {
    pub fn id(self) -> &'static str {
        match self {
            Self::Rulings => "rulings",
            Self::Updates => "updates",
        }
    }

    /// The fixed adapter table for this source.
    pub fn spec(self) -> &'static SourceSpec {
        match self {
            Self::Rulings => &RULINGS_SPEC,
            Self::Updates => &UPDATES_SPEC,
        }
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Login sequence selectors for one source.
#[derive(Debug)]
pub struct LoginSpec {
    pub login_url: &'static str,
    pub username_selector: &'static str,
    pub password_selector: &'static str,
    pub submit_selector: &'static str,
    /// "Another session is active" confirmation, if the site has one
    pub force_login_selector: Option<&'static str>,
    /// Element present only when authenticated
    pub authenticated_marker: &'static str,
    /// Body-text probes that indicate a paywall/login redirect
    pub paywall_markers: &'static [&'static str],
}

/// Paginated listing selectors for one source.
#[derive(Debug)]
pub struct ListingSpec {
    pub listing_url: &'static str,
    /// Present once the listing view has rendered, rows or not; a page
    /// where this never appears did not load
    pub container_selector: &'static str,
    /// One listing entry
    pub row_selector: &'static str,
    /// Link (and title) element within a row
    pub link_selector: &'static str,
    pub link_attr: &'static str,
    /// Tried in order; first non-empty match is the published date
    pub date_selectors: &'static [&'static str],
}

impl ListingSpec {
    /// URL for listing page `page` (1-based; the sites use a 0-based
    /// `?page=` query from the second page on).
    pub fn page_url(&self, page: usize) -> String {
        if page <= 1 {
            self.listing_url.to_string()
        } else {
            format!("{}?page={}", self.listing_url, page - 1)
        }
    }
}

/// Post-extraction cleanup step for a field.
#[derive(Debug, Clone, Copy)]
pub enum Post {
    None,
    /// Remove a leading label like "Decision Summary" or "INCOME TAX :"
    StripLabels(&'static [&'static str]),
    /// Take the n-th segment from the end of a pipe-separated line
    PipeSegmentFromEnd(usize),
}

/// One field's extraction strategy: ordered selectors, first non-empty
/// match wins; unresolved non-mandatory fields leave the record PARTIAL.
#[derive(Debug)]
pub struct FieldSpec {
    pub kind: FieldKind,
    pub mandatory: bool,
    pub selectors: &'static [&'static str],
    /// Read this attribute instead of text content
    pub attr: Option<&'static str>,
    pub post: Post,
}

/// One sheet column: a record field, or a column the pipeline fills in.
#[derive(Debug, Clone, Copy)]
pub enum Column {
    Field(FieldKind),
    Url,
    DateScraped,
}

/// Everything the pipeline needs to know about one source.
#[derive(Debug)]
pub struct SourceSpec {
    pub kind: SourceKind,
    /// Backup file prefix: `downloads/<record_type>-<date>.json`
    pub record_type: &'static str,
    pub login: LoginSpec,
    pub listing: ListingSpec,
    pub fields: &'static [FieldSpec],
    pub columns: &'static [Column],
    pub headers: &'static [&'static str],
    /// Target tab within the spreadsheet
    pub sheet_name: &'static str,
}

impl SourceSpec {
    /// Category assigned from the detail URL when the page itself does
    /// not carry one (the updates site encodes it in the path).
    pub fn categorize(&self, url: &str) -> Option<&'static str> {
        match self.kind {
            SourceKind::Rulings => None,
            SourceKind::Updates => {
                if url.contains("/research/gst") {
                    Some("GST")
                } else if url.contains("/research/direct-tax-laws") {
                    Some("Direct Tax")
                } else if url.contains("/research/fema-banking-insurance") {
                    Some("FEMA & Banking")
                } else {
                    None
                }
            }
        }
    }
}

static RULINGS_SPEC: SourceSpec = SourceSpec {
    kind: SourceKind::Rulings,
    record_type: "rulings",
    login: LoginSpec {
        login_url: "https://www.taxsutra.com/user/login",
        username_selector: "#edit-name",
        password_selector: "#edit-pass",
        submit_selector: "#edit-submit",
        force_login_selector: Some("#edit-reset"),
        authenticated_marker: "a[href*='/user/logout']",
        paywall_markers: &[
            "please login to continue",
            "login to continue",
            "subscribe to continue",
            "login to read full article",
        ],
    },
    listing: ListingSpec {
        listing_url: "https://www.taxsutra.com/dt/rulings",
        container_selector: "div.view-content",
        row_selector: "div.view-content.row div.views-row",
        link_selector: "h3 > a",
        link_attr: "href",
        date_selectors: &[
            ".podcastTimeDate",
            ".field--name-field-published-date .field__item",
            ".views-field-field-published-date .field__item",
        ],
    },
    fields: &[
        FieldSpec {
            kind: FieldKind::Title,
            mandatory: true,
            selectors: &["h3 .field--name-title", "h1.page-title", "title"],
            attr: None,
            post: Post::StripLabels(&[" | IT-rulings"]),
        },
        FieldSpec {
            kind: FieldKind::PublishedDate,
            mandatory: false,
            selectors: &[".podcastTimeDate"],
            attr: None,
            post: Post::None,
        },
        FieldSpec {
            kind: FieldKind::RulingDate,
            mandatory: false,
            selectors: &[".field--name-field-date-of-judgement .field__item"],
            attr: None,
            post: Post::None,
        },
        FieldSpec {
            kind: FieldKind::Citation,
            mandatory: false,
            selectors: &[".citationNumber"],
            attr: None,
            post: Post::None,
        },
        FieldSpec {
            kind: FieldKind::Conclusion,
            mandatory: false,
            selectors: &[
                "#conclusion > div > div.field__item > p",
                "#conclusion .field__item",
            ],
            attr: None,
            post: Post::None,
        },
        FieldSpec {
            kind: FieldKind::DecisionSummary,
            mandatory: false,
            selectors: &[
                ".rulingsDetailsWrap .centerContentWrap .field--name-body",
                ".field--name-body.field--type-text-with-summary",
            ],
            attr: None,
            post: Post::StripLabels(&["Decision Summary"]),
        },
        FieldSpec {
            kind: FieldKind::CaseLawInfo,
            mandatory: false,
            selectors: &[
                ".rulingsDetailsWrap .centerContentWrap .caseLawInfoWrap",
                ".rulingsDetailsWrap .centerContentWrap > div:nth-child(11)",
            ],
            attr: None,
            post: Post::StripLabels(&["Case Law Information", "Case Name"]),
        },
    ],
    columns: &[
        Column::Field(FieldKind::Title),
        Column::Field(FieldKind::PublishedDate),
        Column::Field(FieldKind::RulingDate),
        Column::Field(FieldKind::Conclusion),
        Column::Field(FieldKind::DecisionSummary),
        Column::Field(FieldKind::CaseLawInfo),
        Column::Url,
        Column::DateScraped,
    ],
    headers: &[
        "Title",
        "Published Date",
        "Ruling Date",
        "Conclusion",
        "Decision Summary",
        "Case Law Information",
        "URL",
        "Date Scraped",
    ],
    sheet_name: "Rulings",
};

static UPDATES_SPEC: SourceSpec = SourceSpec {
    kind: SourceKind::Updates,
    record_type: "updates",
    login: LoginSpec {
        login_url: "https://www.taxmann.com/login",
        username_selector: "#email",
        password_selector: "#password",
        submit_selector: "button[type='submit']",
        force_login_selector: None,
        authenticated_marker: "a[href*='logout']",
        paywall_markers: &["subscribe to continue", "login to view"],
    },
    listing: ListingSpec {
        listing_url: "https://www.taxmann.com/research/all/archives",
        container_selector: ".archive-list, .tab-content, .research-box",
        row_selector: ".media, .article-item, .news-item",
        link_selector: "a[href*='/research/'], h3 a, h4 a",
        link_attr: "href",
        date_selectors: &[".news-date-1", ".date", ".published-date"],
    },
    fields: &[
        FieldSpec {
            kind: FieldKind::Title,
            mandatory: true,
            selectors: &["h2", "h1"],
            attr: None,
            post: Post::None,
        },
        FieldSpec {
            kind: FieldKind::SubCategory,
            mandatory: false,
            selectors: &[".content-m-info-div1"],
            attr: None,
            // "11 Jul 2025 | [2025] 175 ... | GST | Case Laws | 237 Views"
            post: Post::PipeSegmentFromEnd(2),
        },
        FieldSpec {
            kind: FieldKind::Content,
            mandatory: false,
            selectors: &["div#dbs_summary", "div#headnotes", "app-pdf-viewer div"],
            attr: None,
            post: Post::StripLabels(&[
                "INCOME TAX",
                "GST",
                "FEMA, BANKING & INSURANCE",
                "FEMA & BANKING",
                "FEMA",
                "BANKING & INSURANCE",
            ]),
        },
        FieldSpec {
            kind: FieldKind::Citation,
            mandatory: false,
            selectors: &[".copy-citation-action"],
            attr: Some("data-clipboard-text"),
            post: Post::None,
        },
    ],
    columns: &[
        Column::Field(FieldKind::Title),
        Column::Field(FieldKind::Category),
        Column::Field(FieldKind::SubCategory),
        Column::Field(FieldKind::Content),
        Column::Field(FieldKind::Citation),
        Column::Field(FieldKind::PublishedDate),
        Column::Url,
        Column::DateScraped,
    ],
    headers: &[
        "Title",
        "Category",
        "Sub-Category",
        "Summary",
        "Citation",
        "Date",
        "URL",
        "Date Scraped",
    ],
    sheet_name: "Updates",
};
