//! Outbound mail port.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;

/// A composed notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport rejected the message: {0}")]
    Rejected(String),
}

/// Sends notifications.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// A mailer that only logs what it would send.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingMailer;

#[async_trait]
impl Mailer for TracingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        tracing::info!(to = %message.to, subject = %message.subject, "sending mail");
        Ok(())
    }
}

/// In-memory mailer for testing.
#[derive(Clone, Default)]
pub struct InMemoryMailer {
    sent: Arc<RwLock<Vec<MailMessage>>>,
    fail_on_send: Arc<AtomicBool>,
}

impl InMemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent send fail.
    pub fn set_fail_on_send(&self, fail: bool) {
        self.fail_on_send.store(fail, Ordering::SeqCst);
    }

    /// Returns the messages sent so far.
    pub async fn sent(&self) -> Vec<MailMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Mailer for InMemoryMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        if self.fail_on_send.load(Ordering::SeqCst) {
            return Err(MailError::Rejected("mail service unavailable".to_string()));
        }
        self.sent.write().await.push(message);
        Ok(())
    }
}
