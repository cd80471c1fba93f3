mod inmemory;
mod smtp;

pub use inmemory::InMemoryMailSender;
pub use smtp::SmtpMailSender;

use campus_scheduler_domain::MailMessage;

/// Delivers a single `MailMessage` to its recipient
#[async_trait::async_trait]
pub trait IMailSender: Send + Sync {
    /// Sets up the connection to the mail server
    async fn open(&self) -> anyhow::Result<()>;
    async fn send(&self, message: &MailMessage) -> anyhow::Result<()>;
    /// Releases the connection to the mail server. Sending afterwards fails.
    async fn close(&self);
}
