// src/storage/backup.rs

//! Dated JSON backup files, one per source per run date.
//!
//! The backup is written before the sheet append and is the durability
//! anchor: if the external write fails, the records are still on disk
//! for manual recovery or the next run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::Result;
use crate::models::{OutputConfig, Record, SourceKind};

use super::{read_json, write_json_atomic};

pub struct BackupStore {
    download_dir: PathBuf,
}

impl BackupStore {
    pub fn new(config: &OutputConfig) -> Self {
        Self {
            download_dir: PathBuf::from(&config.download_dir),
        }
    }

    pub fn with_dir(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            download_dir: download_dir.into(),
        }
    }

    /// `downloads/<record-type>-<YYYY-MM-DD>.json`
    pub fn path_for(&self, source: SourceKind, run_date: NaiveDate) -> PathBuf {
        self.download_dir
            .join(format!("{}-{}.json", source.spec().record_type, run_date))
    }

    /// Append records to the source's backup file for this run date,
    /// keeping anything an earlier invocation already wrote. Records whose
    /// identity is already in the file are dropped, so a commit re-attempt
    /// after a failed sheet write does not double up the recovery artifact.
    pub async fn append(
        &self,
        source: SourceKind,
        run_date: NaiveDate,
        records: &[Record],
    ) -> Result<PathBuf> {
        let path = self.path_for(source, run_date);
        let mut existing = self.load_path(&path).await?;
        let mut known: BTreeSet<String> =
            existing.iter().map(|r| r.identity.clone()).collect();
        let before = existing.len();
        for record in records {
            if known.insert(record.identity.clone()) {
                existing.push(record.clone());
            }
        }
        write_json_atomic(&path, &existing).await?;
        log::info!(
            "{}: backed up {} records ({} total) to {}",
            source,
            existing.len() - before,
            existing.len(),
            path.display()
        );
        Ok(path)
    }

    /// Records backed up for this source and run date; empty when the
    /// file does not exist.
    pub async fn load(&self, source: SourceKind, run_date: NaiveDate) -> Result<Vec<Record>> {
        let path = self.path_for(source, run_date);
        self.load_path(&path).await
    }

    async fn load_path(&self, path: &Path) -> Result<Vec<Record>> {
        Ok(read_json(path).await?.unwrap_or_default())
    }
}
