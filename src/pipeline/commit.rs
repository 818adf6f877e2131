// src/pipeline/commit.rs

//! Durable, ordered commit of one source's accepted records.
//!
//! Two phases, always in this order: the dated JSON backup first (the
//! durability anchor), then one batched sheet append. The ledger is
//! updated only after the sheet acknowledges the write; a failed append
//! leaves the backup on disk and the identities unmarked, so the next
//! run re-attempts exactly those records.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};

use crate::error::Result;
use crate::models::{Column, Record, SourceKind};
use crate::sheets::SheetSink;
use crate::storage::{BackupStore, IdentityLedger};

/// What one commit wrote.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub written: usize,
    pub backup_path: PathBuf,
}

/// One sheet row for a record, following the source's column mapping.
pub fn record_row(record: &Record, scraped_at: DateTime<Utc>) -> Vec<String> {
    record
        .source
        .spec()
        .columns
        .iter()
        .map(|column| match column {
            Column::Field(kind) => record.field(*kind).to_string(),
            Column::Url => record.url.clone(),
            Column::DateScraped => scraped_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        })
        .collect()
}

/// Commit `records` in the order given (listing order). `sheet` is `None`
/// when the spreadsheet sink is disabled; the backup then stands as the
/// commit and the ledger is updated after it.
pub async fn commit_records(
    source: SourceKind,
    run_date: NaiveDate,
    records: Vec<Record>,
    backup: &BackupStore,
    ledger: &mut IdentityLedger,
    sheet: Option<&dyn SheetSink>,
) -> Result<CommitOutcome> {
    let records: Vec<Record> = records.into_iter().filter(Record::is_committable).collect();
    // The ledger check here is authoritative: the identity filtered is
    // exactly the identity marked after the write. The walker's earlier
    // check runs on listing-derived identities, which can differ from the
    // extracted record's when the URL does not parse.
    let records = ledger.filter_new(source, records);
    if records.is_empty() {
        return Ok(CommitOutcome {
            written: 0,
            backup_path: backup.path_for(source, run_date),
        });
    }

    let backup_path = backup.append(source, run_date, &records).await?;

    let written = match sheet {
        Some(sheet) => {
            let scraped_at = Utc::now();
            let rows: Vec<Vec<String>> =
                records.iter().map(|r| record_row(r, scraped_at)).collect();

            sheet.ensure_headers(source).await?;
            match sheet.append(source, rows.clone()).await {
                Ok(written) => written,
                Err(first) => {
                    // One more try; after that the run is degraded and the
                    // backup is the recovery path.
                    log::warn!("{source}: sheet append failed, retrying once: {first}");
                    sheet.append(source, rows).await?
                }
            }
        }
        None => {
            log::info!("{source}: sheet sink disabled, backup stands as commit");
            records.len()
        }
    };

    ledger
        .mark_committed(source, records.iter().map(|r| r.identity.clone()))
        .await?;

    Ok(CommitOutcome {
        written,
        backup_path,
    })
}
