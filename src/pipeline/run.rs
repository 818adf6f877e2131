// src/pipeline/run.rs

//! Run orchestration: one sequential pipeline per enabled source, then
//! the digest.
//!
//! A source failing never takes the other down, and records gathered
//! before a mid-walk failure are still committed. The driver session is
//! released on every exit path.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDate, Utc};

use crate::browser::{Browser, WebDriverBrowser};
use crate::error::{AppError, Result};
use crate::mail::LogMailer;
use crate::models::{Candidate, Config, Credentials, Record, RunSummary, SourceKind, SourceOutcome};
use crate::services::{ListingWalker, LoginCredentials, RecordExtractor, SessionManager};
use crate::sheets::{GoogleSheets, SheetSink};
use crate::storage::{BackupStore, IdentityLedger};
use crate::utils::date::CutoffWindow;
use crate::utils::url::record_identity;

use super::commit::commit_records;
use super::digest::run_digest;

/// Run one source's pipeline end to end. Never returns an error; every
/// failure mode is folded into the outcome so the other source still runs.
#[allow(clippy::too_many_arguments)]
pub async fn run_source(
    browser: Arc<dyn Browser>,
    source: SourceKind,
    credentials: LoginCredentials,
    config: &Config,
    backup: &BackupStore,
    ledger: &mut IdentityLedger,
    sheet: Option<&dyn SheetSink>,
    window: CutoffWindow,
    run_date: NaiveDate,
) -> SourceOutcome {
    let mut outcome = SourceOutcome::new(source);
    let timeout = Duration::from_secs(config.crawler.webdriver_timeout_secs);
    let mut manager = SessionManager::new(browser, source, credentials, timeout);

    let records = match gather_records(&mut manager, source, config, ledger, window, &mut outcome)
        .await
    {
        Ok(records) => records,
        Err(error) => {
            outcome.error = Some(error.to_string());
            Vec::new()
        }
    };

    // Whatever was gathered before a failure still gets committed.
    if !records.is_empty() {
        match commit_records(source, run_date, records, backup, ledger, sheet).await {
            Ok(committed) => outcome.committed = committed.written,
            Err(error) => {
                log::error!("{source}: commit failed, backup is the recovery path: {error}");
                outcome.error = Some(format!("commit failed: {error}"));
            }
        }
    }

    if let Err(error) = manager.close().await {
        log::warn!("{source}: driver shutdown failed: {error}");
    }
    outcome
}

/// Login, walk the listing, extract every new candidate. A source-fatal
/// error aborts the gather; already-extracted records are returned to the
/// caller through `outcome` bookkeeping plus the partial list on success.
async fn gather_records(
    manager: &mut SessionManager,
    source: SourceKind,
    config: &Config,
    ledger: &IdentityLedger,
    window: CutoffWindow,
    outcome: &mut SourceOutcome,
) -> Result<Vec<Record>> {
    manager.ensure_active().await?;

    let walker = ListingWalker::new(manager.browser(), source, &config.crawler);
    let walk = walker.walk(window).await?;
    if walk.partial {
        log::warn!(
            "{source}: partial walk, {} candidates from {} page(s)",
            walk.candidates.len(),
            walk.pages_visited
        );
    }

    let extractor = RecordExtractor::new(manager.browser(), source, &config.crawler);
    let mut records = Vec::new();
    for candidate in &walk.candidates {
        outcome.seen += 1;

        let identity = record_identity(&candidate.url, &candidate.title, &candidate.raw_date);
        if ledger.contains(source, &identity) {
            log::debug!("{source}: already committed, skipping {}", candidate.url);
            outcome.skipped += 1;
            continue;
        }

        match extract_with_reauth(&extractor, manager, candidate).await {
            Ok(record) => records.push(record),
            Err(AppError::Extraction { url, .. }) => {
                log::warn!("{source}: extraction failed for {url}");
                outcome.failed += 1;
            }
            Err(error) if error.transient_kind().is_some() => {
                log::warn!("{source}: skipping {} after retries: {error}", candidate.url);
                outcome.skipped += 1;
            }
            Err(error) => {
                // Auth (post re-auth) or infrastructure failure: stop this
                // source but keep what was already extracted.
                outcome.error = Some(error.to_string());
                log::error!("{source}: aborting after {}: {error}", candidate.url);
                break;
            }
        }
    }

    Ok(records)
}

/// Extract once; on a suspected session expiry, let the manager
/// re-authenticate (a single time per run) and try the candidate again.
async fn extract_with_reauth(
    extractor: &RecordExtractor,
    manager: &mut SessionManager,
    candidate: &Candidate,
) -> Result<Record> {
    match extractor.extract(candidate).await {
        Err(AppError::Auth { .. }) => {
            manager.report_suspected_expiry().await?;
            extractor.extract(candidate).await
        }
        other => other,
    }
}

/// Full run: every enabled source, then the digest.
pub async fn run_pipeline(config: &Config, credentials: &Credentials) -> Result<RunSummary> {
    let mut summary = RunSummary::new(Utc::now());

    let today = Local::now().date_naive();
    let window = CutoffWindow::for_run_date(today);
    let run_date = window.end;
    log::info!(
        "run covers {}..={} (started {})",
        window.start,
        window.end,
        today
    );

    let backup = BackupStore::new(&config.output);
    let mut ledger = IdentityLedger::load(&config.output).await?;

    let sheet: Option<GoogleSheets> = if config.sheets.enabled {
        Some(GoogleSheets::new(&config.sheets, &credentials.sheets_token)?)
    } else {
        None
    };
    if let Some(sheet) = &sheet {
        // Retryable once, then fatal for the whole run
        if let Err(first) = sheet.authenticate().await {
            log::warn!("sheet access check failed, retrying once: {first}");
            sheet.authenticate().await?;
        }
    }
    let sheet_ref = sheet.as_ref().map(|s| s as &dyn SheetSink);

    let mut sources = Vec::new();
    if config.sources.rulings {
        sources.push((
            SourceKind::Rulings,
            LoginCredentials {
                username: credentials.rulings_username.clone(),
                password: credentials.rulings_password.clone(),
            },
        ));
    }
    if config.sources.updates {
        sources.push((
            SourceKind::Updates,
            LoginCredentials {
                username: credentials.updates_email.clone(),
                password: credentials.updates_password.clone(),
            },
        ));
    }

    // Sources run sequentially: they share the ledger file, and one
    // WebDriver endpoint rarely serves two sessions well.
    let mut ran = Vec::new();
    for (source, login) in sources {
        let browser = match WebDriverBrowser::connect(&config.crawler).await {
            Ok(browser) => Arc::new(browser),
            Err(error) => {
                let mut outcome = SourceOutcome::new(source);
                outcome.error = Some(format!("webdriver connect failed: {error}"));
                summary.outcomes.push(outcome);
                continue;
            }
        };
        let outcome = run_source(
            browser,
            source,
            login,
            config,
            &backup,
            &mut ledger,
            sheet_ref,
            window,
            run_date,
        )
        .await;
        summary.outcomes.push(outcome);
        ran.push(source);
    }

    if config.mail.enabled {
        run_digest(&ran, run_date, &backup, &config.mail, &LogMailer).await;
    }

    summary.log();
    Ok(summary)
}
