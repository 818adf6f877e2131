// src/storage/ledger.rs

//! Persisted set of committed record identities, partitioned per source.
//!
//! The ledger is the dedup authority: an identity present here is never
//! re-committed. It is written only after the sheet append is
//! acknowledged, so a crash between extraction and commit leaves the
//! record unmarked and it is simply picked up again next run.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::error::Result;
use crate::models::{OutputConfig, Record, SourceKind};

use super::{read_json, write_json_atomic};

pub struct IdentityLedger {
    path: PathBuf,
    entries: BTreeMap<String, BTreeSet<String>>,
}

impl IdentityLedger {
    /// Load the ledger from disk; a missing file is an empty ledger.
    pub async fn load(config: &OutputConfig) -> Result<Self> {
        Self::load_path(PathBuf::from(&config.ledger_path)).await
    }

    pub async fn load_path(path: PathBuf) -> Result<Self> {
        let entries = read_json(&path).await?.unwrap_or_default();
        Ok(Self { path, entries })
    }

    pub fn contains(&self, source: SourceKind, identity: &str) -> bool {
        self.entries
            .get(source.id())
            .is_some_and(|set| set.contains(identity))
    }

    /// Pure filter: records whose identity is not yet committed, in the
    /// order given.
    pub fn filter_new(&self, source: SourceKind, records: Vec<Record>) -> Vec<Record> {
        records
            .into_iter()
            .filter(|r| !self.contains(source, &r.identity))
            .collect()
    }

    /// Mark identities committed and persist. Called only after the
    /// external write is acknowledged.
    pub async fn mark_committed<I>(&mut self, source: SourceKind, identities: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let set = self.entries.entry(source.id().to_string()).or_default();
        let mut added = 0usize;
        for identity in identities {
            if set.insert(identity) {
                added += 1;
            }
        }
        if added > 0 {
            write_json_atomic(&self.path, &self.entries).await?;
            log::debug!("{source}: ledger grew by {added} identities");
        }
        Ok(())
    }

    pub fn len(&self, source: SourceKind) -> usize {
        self.entries.get(source.id()).map_or(0, BTreeSet::len)
    }
}
