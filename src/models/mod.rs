// src/models/mod.rs

//! Domain models for the crawler application.

mod config;
mod record;
mod run;
mod source;

pub use config::{
    Config, CrawlerConfig, Credentials, MailConfig, OutputConfig, SheetsConfig, SourcesConfig,
};
pub use record::{Candidate, ExtractionStatus, FieldKind, Record};
pub use run::{RunSummary, SourceOutcome};
pub use source::{Column, FieldSpec, ListingSpec, LoginSpec, Post, SourceKind, SourceSpec};
