// src/models/run.rs

//! Per-run statistics and the run-level exit decision.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SourceKind;

/// Counters for one source's pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOutcome {
    pub source: SourceKind,
    /// Candidates yielded by the walker
    pub seen: usize,
    /// Records written to both sinks
    pub committed: usize,
    /// Records marked FAILED by the extractor
    pub failed: usize,
    /// Candidates dropped after retry exhaustion or dedup
    pub skipped: usize,
    /// Source-level failure, if the run for this source ended early
    pub error: Option<String>,
}

impl SourceOutcome {
    pub fn new(source: SourceKind) -> Self {
        Self {
            source,
            seen: 0,
            committed: 0,
            failed: 0,
            skipped: 0,
            error: None,
        }
    }

    pub fn attempted(&self) -> bool {
        self.seen > 0 || self.error.is_some()
    }
}

/// One end-to-end pipeline invocation across the enabled sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub outcomes: Vec<SourceOutcome>,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            outcomes: Vec::new(),
        }
    }

    pub fn total_committed(&self) -> usize {
        self.outcomes.iter().map(|o| o.committed).sum()
    }

    /// Non-zero only when nothing was committed anywhere AND at least one
    /// source actually broke; a quiet day exits clean.
    pub fn exit_code(&self) -> i32 {
        let any_failed = self.outcomes.iter().any(|o| o.error.is_some());
        if self.total_committed() == 0 && any_failed {
            1
        } else {
            0
        }
    }

    /// Log the per-source breakdown.
    pub fn log(&self) {
        for outcome in &self.outcomes {
            log::info!(
                "{}: seen={} committed={} failed={} skipped={}{}",
                outcome.source,
                outcome.seen,
                outcome.committed,
                outcome.failed,
                outcome.skipped,
                outcome
                    .error
                    .as_deref()
                    .map(|e| format!(" error={e}"))
                    .unwrap_or_default()
            );
        }
        let elapsed = Utc::now() - self.started_at;
        log::info!(
            "Run total: {} committed across {} source(s) in {}s",
            self.total_committed(),
            self.outcomes.len(),
            elapsed.num_seconds()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(source: SourceKind) -> SourceOutcome {
        SourceOutcome::new(source)
    }

    #[test]
    fn quiet_day_exits_zero() {
        let mut summary = RunSummary::new(Utc::now());
        let mut o = outcome(SourceKind::Rulings);
        o.seen = 5;
        o.skipped = 5; // everything deduped
        summary.outcomes.push(o);
        assert_eq!(summary.exit_code(), 0);
    }

    #[test]
    fn broken_run_with_no_commits_exits_nonzero() {
        let mut summary = RunSummary::new(Utc::now());
        let mut o = outcome(SourceKind::Rulings);
        o.error = Some("auth failed".into());
        summary.outcomes.push(o);
        assert_eq!(summary.exit_code(), 1);
    }

    #[test]
    fn partial_failure_with_commits_exits_zero() {
        let mut summary = RunSummary::new(Utc::now());
        let mut broken = outcome(SourceKind::Rulings);
        broken.error = Some("auth failed".into());
        let mut fine = outcome(SourceKind::Updates);
        fine.seen = 3;
        fine.committed = 3;
        summary.outcomes.push(broken);
        summary.outcomes.push(fine);
        assert_eq!(summary.exit_code(), 0);
    }
}
