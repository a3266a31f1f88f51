//! Outbound mail delivery abstraction.
//!
//! Account handlers build an `OutboundMail` carrying an action link and hand
//! it to whatever `Mailer` the state was constructed with. Transport is
//! pluggable; the default for local runs logs instead of sending.

use async_trait::async_trait;
use std::sync::Mutex;
use tracing::info;

/// Which flow a message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MailKind {
    Activation,
    PasswordReset,
}

/// A single message ready for delivery.
#[derive(Debug, Clone)]
pub struct OutboundMail {
    pub to: String,
    pub recipient_name: String,
    pub subject: String,
    pub link: String,
    pub kind: MailKind,
}

/// Delivery abstraction consumed by the account handlers.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Deliver a message or return an error to let the caller decide.
    async fn send(&self, mail: &OutboundMail) -> anyhow::Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &OutboundMail) -> anyhow::Result<()> {
        info!(
            from = %self.from,
            to = %mail.to,
            subject = %mail.subject,
            link = %mail.link,
            kind = ?mail.kind,
            "mail delivery stub"
        );
        Ok(())
    }
}

/// Captures sent mail for assertions in tests.
#[derive(Default)]
pub struct MemoryMailer {
    sent: Mutex<Vec<OutboundMail>>,
}

impl MemoryMailer {
    pub fn sent(&self) -> Vec<OutboundMail> {
        self.sent.lock().expect("mailer lock").clone()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, mail: &OutboundMail) -> anyhow::Result<()> {
        self.sent.lock().expect("mailer lock").push(mail.clone());
        Ok(())
    }
}
