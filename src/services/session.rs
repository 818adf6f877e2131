// src/services/session.rs

//! Authenticated session lifecycle, one per source.
//!
//! The manager owns login, the single re-authentication allowed after a
//! suspected-expiry report, and driver release. The walker and extractor
//! borrow the browser but never touch login state; they only report
//! failures that suggest expiry, which the manager interprets.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::browser::Browser;
use crate::error::{AppError, AuthReason, Result};
use crate::models::SourceKind;

/// Login state of one source's browsing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    Unauthenticated,
    Authenticating,
    Active,
    Expired,
}

/// An authenticated browsing context for one source.
#[derive(Debug, Clone)]
pub struct Session {
    pub source: SourceKind,
    pub state: LoginState,
    pub established_at: DateTime<Utc>,
}

/// Per-source credentials handed to the manager.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Owns the browsing session for one source.
pub struct SessionManager {
    browser: Arc<dyn Browser>,
    source: SourceKind,
    credentials: LoginCredentials,
    timeout: Duration,
    session: Option<Session>,
    /// One re-authentication per run; a second suspected expiry is fatal
    /// for this source.
    reauth_spent: bool,
}

impl SessionManager {
    pub fn new(
        browser: Arc<dyn Browser>,
        source: SourceKind,
        credentials: LoginCredentials,
        timeout: Duration,
    ) -> Self {
        Self {
            browser,
            source,
            credentials,
            timeout,
            session: None,
            reauth_spent: false,
        }
    }

    /// The browser this session runs in, for walker/extractor borrowing.
    pub fn browser(&self) -> Arc<dyn Browser> {
        Arc::clone(&self.browser)
    }

    /// Return the active session, logging in on first call.
    pub async fn ensure_active(&mut self) -> Result<&Session> {
        let needs_login = !matches!(
            self.session,
            Some(Session {
                state: LoginState::Active,
                ..
            })
        );
        if needs_login {
            self.login().await?;
        }
        self.session
            .as_ref()
            .ok_or_else(|| AppError::auth(self.source.id(), AuthReason::Unknown))
    }

    /// A caller saw a login redirect or paywall mid-run. Re-authenticate
    /// once; a repeat report surfaces as an auth failure for this source.
    pub async fn report_suspected_expiry(&mut self) -> Result<&Session> {
        if self.reauth_spent {
            log::error!("{}: session expired again after re-auth", self.source);
            return Err(AppError::auth(self.source.id(), AuthReason::Unknown));
        }
        self.reauth_spent = true;
        if let Some(session) = &mut self.session {
            session.state = LoginState::Expired;
        }
        log::warn!("{}: suspected session expiry, re-authenticating", self.source);
        self.login().await?;
        self.session
            .as_ref()
            .ok_or_else(|| AppError::auth(self.source.id(), AuthReason::Unknown))
    }

    async fn login(&mut self) -> Result<()> {
        let spec = &self.source.spec().login;
        self.session = Some(Session {
            source: self.source,
            state: LoginState::Authenticating,
            established_at: Utc::now(),
        });

        self.browser.navigate(spec.login_url).await?;

        // Already authenticated from a previous navigation?
        if !self.browser.query(spec.authenticated_marker).await?.is_empty() {
            log::info!("{}: already logged in", self.source);
            self.mark_active();
            return Ok(());
        }

        self.browser
            .fill(spec.username_selector, &self.credentials.username)
            .await?;
        self.browser
            .fill(spec.password_selector, &self.credentials.password)
            .await?;
        self.browser.click(spec.submit_selector).await?;

        // Some sites ask to evict an existing session after submit
        if let Some(force_selector) = spec.force_login_selector {
            if self.browser.click(force_selector).await.is_ok() {
                log::info!("{}: handled force-login confirmation", self.source);
            }
        }

        match self
            .browser
            .wait_for(spec.authenticated_marker, self.timeout)
            .await
        {
            Ok(()) => {
                log::info!("{}: login successful", self.source);
                self.mark_active();
                Ok(())
            }
            Err(_) => {
                // Marker absent: still on the login form means rejected
                // credentials, anything else is a timeout.
                let reason = if !self.browser.query(spec.username_selector).await?.is_empty() {
                    AuthReason::InvalidCredentials
                } else {
                    AuthReason::Timeout
                };
                self.session = None;
                Err(AppError::auth(self.source.id(), reason))
            }
        }
    }

    fn mark_active(&mut self) {
        self.session = Some(Session {
            source: self.source,
            state: LoginState::Active,
            established_at: Utc::now(),
        });
    }

    /// Release the driver. Idempotent; every exit path calls this.
    pub async fn close(&mut self) -> Result<()> {
        self.session = None;
        self.browser.close().await
    }
}

/// Whether the current page looks like a paywall or login redirect for
/// this source. Pure read; the caller decides whether to report expiry.
pub async fn page_suggests_expiry(browser: &dyn Browser, source: SourceKind) -> Result<bool> {
    let spec = &source.spec().login;

    let current = browser.current_url().await?;
    if current.contains("/login") || current.contains("/user/login") {
        return Ok(true);
    }

    let body = browser.query("body").await?;
    let Some(body) = body.first() else {
        return Ok(false);
    };
    let text = body.text.to_lowercase();
    Ok(spec.paywall_markers.iter().any(|m| text.contains(m)))
}
