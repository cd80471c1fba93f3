use super::IMailSender;
use anyhow::anyhow;
use campus_scheduler_domain::MailMessage;
use std::sync::Mutex;

/// Keeps every sent message in memory. Can be told to fail the next
/// deliveries to simulate an unavailable mail server.
pub struct InMemoryMailSender {
    sent: Mutex<Vec<MailMessage>>,
    failures_left: Mutex<usize>,
    rejected: Mutex<Vec<String>>,
    closed: Mutex<bool>,
}

impl InMemoryMailSender {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(vec![]),
            failures_left: Mutex::new(0),
            rejected: Mutex::new(vec![]),
            closed: Mutex::new(false),
        }
    }

    /// Makes the next `count` calls to `send` fail
    pub fn fail_next(&self, count: usize) {
        *self.failures_left.lock().unwrap() = count;
    }

    /// Makes every delivery to `address` fail
    pub fn reject(&self, address: &str) {
        self.rejected.lock().unwrap().push(address.to_string());
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.lock().unwrap()
    }

    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, address: &str) -> Vec<MailMessage> {
        self.sent()
            .into_iter()
            .filter(|message| message.to == address)
            .collect()
    }
}

impl Default for InMemoryMailSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IMailSender for InMemoryMailSender {
    async fn open(&self) -> anyhow::Result<()> {
        *self.closed.lock().unwrap() = false;
        Ok(())
    }

    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        if self.is_closed() {
            return Err(anyhow!("Mail sender is closed"));
        }
        {
            let mut failures_left = self.failures_left.lock().unwrap();
            if *failures_left > 0 {
                *failures_left -= 1;
                return Err(anyhow!("Mail server unavailable"));
            }
        }
        if self.rejected.lock().unwrap().contains(&message.to) {
            return Err(anyhow!("Recipient rejected: {}", message.to));
        }
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn close(&self) {
        *self.closed.lock().unwrap() = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(to: &str) -> MailMessage {
        MailMessage {
            to: to.into(),
            subject: "Reminder".into(),
            html_body: "<p>Hi</p>".into(),
            attachments: vec![],
        }
    }

    #[tokio::test]
    async fn records_and_fails_on_demand() {
        let sender = InMemoryMailSender::new();
        sender.fail_next(1);
        sender.reject("banned@campus.example");

        assert!(sender.send(&message("a@campus.example")).await.is_err());
        assert!(sender.send(&message("a@campus.example")).await.is_ok());
        assert!(sender
            .send(&message("banned@campus.example"))
            .await
            .is_err());

        assert_eq!(sender.sent().len(), 1);
        assert_eq!(sender.sent_to("a@campus.example").len(), 1);

        sender.close().await;
        assert!(sender.is_closed());
        assert!(sender.send(&message("a@campus.example")).await.is_err());
        assert_eq!(sender.sent().len(), 1);
    }
}
