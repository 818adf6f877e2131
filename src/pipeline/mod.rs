// src/pipeline/mod.rs

//! Pipeline entry points.
//!
//! - `run_pipeline`: full crawl across enabled sources
//! - `commit_records`: backup, sheet append, ledger update for one batch
//! - `compose_digest`: categorized summary of a run's backup files

pub mod commit;
pub mod digest;
pub mod run;

pub use commit::{CommitOutcome, commit_records};
pub use digest::{compose_digest, run_digest};
pub use run::{run_pipeline, run_source};
