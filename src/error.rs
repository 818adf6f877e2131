// src/error.rs

//! Unified error handling for the crawler application.

use std::fmt;

use thiserror::Error;

/// Result type alias for crawler operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Why an authentication attempt failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthReason {
    /// Credentials were rejected by the login form
    InvalidCredentials,
    /// The authenticated marker never appeared within the bounded wait
    Timeout,
    /// Anything else (driver died, unexpected page, ...)
    Unknown,
}

impl fmt::Display for AuthReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::Timeout => write!(f, "login marker timeout"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Transient failure classes the retry controller is allowed to absorb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientKind {
    /// Bounded wait for an element expired
    ElementTimeout,
    /// Element handle went stale mid-query (DOM mutation race)
    StaleElement,
    /// Network-level blip (connect reset, 5xx, ...)
    Network,
}

impl fmt::Display for TransientKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementTimeout => write!(f, "element timeout"),
            Self::StaleElement => write!(f, "stale element"),
            Self::Network => write!(f, "network"),
        }
    }
}

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Login failed or the session could not be re-established
    #[error("Auth error for {source_id}: {reason}")]
    Auth { source_id: String, reason: AuthReason },

    /// Retryable rendering/network failure
    #[error("Transient error ({kind}) at {context}: {message}")]
    Transient {
        kind: TransientKind,
        context: String,
        message: String,
    },

    /// A mandatory field could not be extracted
    #[error("Extraction error for {url}: missing {field}")]
    Extraction { url: String, field: &'static str },

    /// External sheet write failed; backup already durable
    #[error("Commit error: {0}")]
    Commit(String),

    /// Configuration error (fatal, aborts before any source runs)
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },
}

impl AppError {
    /// Create an auth error.
    pub fn auth(source_id: impl Into<String>, reason: AuthReason) -> Self {
        Self::Auth {
            source_id: source_id.into(),
            reason,
        }
    }

    /// Create a transient error with context.
    pub fn transient(
        kind: TransientKind,
        context: impl Into<String>,
        message: impl fmt::Display,
    ) -> Self {
        Self::Transient {
            kind,
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create an extraction error for a mandatory field.
    pub fn extraction(url: impl Into<String>, field: &'static str) -> Self {
        Self::Extraction {
            url: url.into(),
            field,
        }
    }

    /// Create a commit error.
    pub fn commit(message: impl Into<String>) -> Self {
        Self::Commit(message.into())
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// The transient kind, if this error is retryable at all.
    pub fn transient_kind(&self) -> Option<TransientKind> {
        match self {
            Self::Transient { kind, .. } => Some(*kind),
            Self::Http(e) if e.is_timeout() => Some(TransientKind::Network),
            Self::Http(e) if e.is_connect() || e.is_request() => Some(TransientKind::Network),
            _ => None,
        }
    }

    /// Whether this error suggests the session expired (auth redirect,
    /// paywall). These are never retried locally.
    pub fn suggests_expiry(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_kind_only_for_whitelisted() {
        let e = AppError::transient(TransientKind::ElementTimeout, "page 1", "wait expired");
        assert_eq!(e.transient_kind(), Some(TransientKind::ElementTimeout));

        let e = AppError::auth("rulings", AuthReason::Timeout);
        assert_eq!(e.transient_kind(), None);
        assert!(e.suggests_expiry());

        let e = AppError::extraction("https://x.test/1", "title");
        assert_eq!(e.transient_kind(), None);
    }

    #[test]
    fn display_carries_context() {
        let e = AppError::transient(TransientKind::StaleElement, "field title", "gone");
        let s = e.to_string();
        assert!(s.contains("stale element"));
        assert!(s.contains("field title"));
    }
}
