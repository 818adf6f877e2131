// src/pipeline/digest.rs

//! Daily digest composition from the run's backup files.
//!
//! Strictly downstream of commit: reads already-persisted records,
//! groups them by source and category, and renders a plain-text summary.
//! Delivery failure is logged and swallowed.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::error::Result;
use crate::mail::{DigestMessage, MailSink};
use crate::models::{FieldKind, MailConfig, Record, SourceKind};
use crate::storage::BackupStore;
use crate::utils::text::truncate_with_marker;

/// Longest summary excerpt shown per item.
const SUMMARY_EXCERPT_LEN: usize = 300;

/// Compose the digest for `run_date`, or `None` when no source produced
/// any records.
pub async fn compose_digest(
    sources: &[SourceKind],
    run_date: NaiveDate,
    backup: &BackupStore,
    mail: &MailConfig,
) -> Result<Option<DigestMessage>> {
    let mut sections = Vec::new();
    let mut total = 0usize;

    for source in sources {
        let records = backup.load(*source, run_date).await?;
        if records.is_empty() {
            continue;
        }
        total += records.len();
        sections.push(render_section(*source, &records));
    }

    if total == 0 {
        return Ok(None);
    }

    let mut body = format!("{total} new item(s) for {run_date}\n");
    for section in sections {
        body.push('\n');
        body.push_str(&section);
    }

    Ok(Some(DigestMessage {
        subject: format!("{} - {}", mail.subject_prefix, run_date),
        body,
        recipients: mail.recipients.clone(),
    }))
}

fn render_section(source: SourceKind, records: &[Record]) -> String {
    let mut by_category: BTreeMap<&str, Vec<&Record>> = BTreeMap::new();
    for record in records {
        let category = match record.field(FieldKind::Category) {
            "" => "General",
            c => c,
        };
        by_category.entry(category).or_default().push(record);
    }

    let mut out = format!("== {} ==\n", source.spec().sheet_name);
    for (category, group) in by_category {
        out.push_str(&format!("\n[{category}]\n"));
        for record in group {
            out.push_str(&format!(
                "- {} ({})\n",
                record.title(),
                record.published_date()
            ));
            let summary = record.best_summary();
            if !summary.is_empty() {
                out.push_str(&format!(
                    "  {}\n",
                    truncate_with_marker(summary, SUMMARY_EXCERPT_LEN)
                ));
            }
            out.push_str(&format!("  {}\n", record.url));
        }
    }
    out
}

/// Compose and deliver the digest. Best effort: a quiet day, an
/// unreadable backup, or a delivery failure never fails the run the
/// commit already happened in.
pub async fn run_digest(
    sources: &[SourceKind],
    run_date: NaiveDate,
    backup: &BackupStore,
    mail: &MailConfig,
    sink: &dyn MailSink,
) {
    let message = match compose_digest(sources, run_date, backup, mail).await {
        Ok(Some(message)) => message,
        Ok(None) => {
            log::info!("no records for {run_date}, skipping digest");
            return;
        }
        Err(error) => {
            log::error!("digest composition failed: {error}");
            return;
        }
    };
    if let Err(error) = sink.deliver(&message).await {
        log::error!("digest delivery failed: {error}");
    }
}
