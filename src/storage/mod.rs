// src/storage/mod.rs

//! Run-local persistence: the dated JSON backup files and the identity
//! ledger that enforces at-most-once delivery to the sheet.
//!
//! ## Directory Layout
//!
//! ```text
//! downloads/
//! ├── ledger.json           # Committed identities, per source
//! ├── rulings-2025-06-10.json
//! └── updates-2025-06-10.json
//! ```
//!
//! All writes are atomic (temp file then rename) so a crash mid-write
//! never leaves a truncated JSON file behind.

pub mod backup;
pub mod ledger;

use std::path::Path;

use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};

pub use backup::BackupStore;
pub use ledger::IdentityLedger;

/// Write JSON atomically: temp file in the same directory, then rename.
pub(crate) async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("tmp");
    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(&bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read JSON, `None` when the file does not exist yet.
pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}
