// src/mail/mod.rs

//! Outbound digest delivery boundary.
//!
//! Delivery is an external collaborator; the pipeline composes a
//! [`DigestMessage`] and hands it over. Failure here is logged and
//! swallowed upstream: the commit that already happened is never rolled
//! back because mail bounced.

use async_trait::async_trait;

use crate::error::Result;

/// A rendered digest ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigestMessage {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

#[async_trait]
pub trait MailSink: Send + Sync {
    async fn deliver(&self, message: &DigestMessage) -> Result<()>;
}

/// Writes the digest to the log instead of sending it. Used when mail is
/// disabled and as the default sink in development.
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl MailSink for LogMailer {
    async fn deliver(&self, message: &DigestMessage) -> Result<()> {
        log::info!(
            "digest (not sent, mail disabled) to {:?}: {}",
            message.recipients,
            message.subject
        );
        for line in message.body.lines() {
            log::info!("  {line}");
        }
        Ok(())
    }
}
