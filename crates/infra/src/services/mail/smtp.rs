use super::IMailSender;
use crate::config::MailConfig;
use anyhow::anyhow;
use campus_scheduler_domain::{Attachment, MailMessage};
use lettre::{
    message::{
        header::ContentType, Attachment as LettreAttachment, Mailbox, MultiPart, SinglePart,
    },
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Mutex;
use tracing::{debug, info};

type Transport = AsyncSmtpTransport<Tokio1Executor>;

/// Sends mails through an SMTP relay. The pooled transport only exists
/// between `open` and `close`.
pub struct SmtpMailSender {
    config: MailConfig,
    from: Mailbox,
    transport: Mutex<Option<Transport>>,
}

impl SmtpMailSender {
    pub fn new(config: &MailConfig) -> anyhow::Result<Self> {
        let from: Mailbox = config.from.parse()?;

        Ok(Self {
            config: config.clone(),
            from,
            transport: Mutex::new(None),
        })
    }

    fn build_transport(&self) -> anyhow::Result<Transport> {
        let config = &self.config;
        let transport = match (&config.smtp_username, &config.smtp_password) {
            (Some(username), Some(password)) => Transport::starttls_relay(&config.smtp_host)?
                .port(config.smtp_port)
                .credentials(Credentials::new(username.clone(), password.clone()))
                .build(),
            // Local relay without authentication
            _ => Transport::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .build(),
        };
        Ok(transport)
    }

    fn build(&self, message: &MailMessage) -> anyhow::Result<Message> {
        let to: Mailbox = message.to.parse()?;

        let mut related =
            MultiPart::related().singlepart(SinglePart::html(message.html_body.clone()));
        let mut attached = vec![];
        for attachment in &message.attachments {
            match &attachment.content_id {
                Some(content_id) => {
                    related = related.singlepart(
                        LettreAttachment::new_inline(content_id.clone())
                            .body(attachment.bytes.clone(), content_type(attachment)?),
                    );
                }
                None => attached.push(
                    LettreAttachment::new(attachment.filename.clone())
                        .body(attachment.bytes.clone(), content_type(attachment)?),
                ),
            }
        }

        let body = if attached.is_empty() {
            related
        } else {
            attached
                .into_iter()
                .fold(MultiPart::mixed().multipart(related), |mixed, part| {
                    mixed.singlepart(part)
                })
        };

        let mail = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject.clone())
            .multipart(body)?;
        Ok(mail)
    }
}

fn content_type(attachment: &Attachment) -> anyhow::Result<ContentType> {
    Ok(ContentType::parse(&attachment.content_type)?)
}

#[async_trait::async_trait]
impl IMailSender for SmtpMailSender {
    async fn open(&self) -> anyhow::Result<()> {
        let transport = self.build_transport()?;
        *self.transport.lock().unwrap() = Some(transport);
        info!(
            "SMTP transport to {}:{} opened",
            self.config.smtp_host, self.config.smtp_port
        );
        Ok(())
    }

    async fn send(&self, message: &MailMessage) -> anyhow::Result<()> {
        let mail = self.build(message)?;
        // The transport is a handle to a shared pool, so the lock is not
        // held while sending
        let transport = self
            .transport
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("SMTP transport is not open"))?;
        transport.send(mail).await?;
        debug!("Mail sent to: {}", message.to);
        Ok(())
    }

    async fn close(&self) {
        // Pooled connections are closed once the last handle is dropped
        if self.transport.lock().unwrap().take().is_some() {
            info!("SMTP transport closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[test]
    fn builds_mail_with_inline_logo() {
        let sender = SmtpMailSender::new(&Config::with_defaults().mail).expect("To create sender");
        let message = MailMessage {
            to: "Ada <ada@campus.example>".into(),
            subject: "Upcoming exam".into(),
            html_body: r#"<img src="cid:logo"/>"#.into(),
            attachments: vec![Attachment::inline(
                "logo",
                "logo.svg",
                "image/svg+xml",
                b"<svg/>",
            )],
        };

        let formatted = String::from_utf8(sender.build(&message).unwrap().formatted()).unwrap();
        assert!(formatted.contains("Subject: Upcoming exam"));
        assert!(formatted.contains("Content-ID: <logo>"));
        assert!(formatted.contains("multipart/related"));
    }

    #[test]
    fn rejects_invalid_recipient() {
        let sender = SmtpMailSender::new(&Config::with_defaults().mail).unwrap();
        let message = MailMessage {
            to: "not an address".into(),
            subject: "Reminder".into(),
            html_body: String::new(),
            attachments: vec![],
        };
        assert!(sender.build(&message).is_err());
    }

    // The transport pool spawns onto the runtime when built
    #[tokio::test]
    async fn sends_only_while_open() {
        let sender = SmtpMailSender::new(&Config::with_defaults().mail).unwrap();
        let message = MailMessage {
            to: "ada@campus.example".into(),
            subject: "Reminder".into(),
            html_body: "<p>Hi</p>".into(),
            attachments: vec![],
        };
        assert!(sender.send(&message).await.is_err());

        sender.open().await.expect("To open transport");
        assert!(sender.transport.lock().unwrap().is_some());

        sender.close().await;
        assert!(sender.transport.lock().unwrap().is_none());
        let err = sender.send(&message).await.unwrap_err();
        assert!(err.to_string().contains("not open"));
    }
}
