use super::{
    templates::{self, EVENT_REMINDER},
    Notifier, NotifyError, NotifyOutcome, SkipReason,
};
use campus_scheduler_domain::{format_datetime, MailMessage, TemplateFields, User, ID};
use campus_scheduler_infra::SchedulerContext;
use tracing::{debug, error, info};

/// Reminds every participant of a `StudyEvent` that it is about to start.
///
/// Only participants that still exist, are not banned and are still members
/// of the group owning the event are reminded. A failed delivery to one
/// participant does not stop the others, and does not make the job fail.
pub struct EventNotifier {}

impl EventNotifier {
    async fn recipients(
        &self,
        participants: &[ID],
        group_id: &ID,
        ctx: &SchedulerContext,
    ) -> Result<Vec<User>, NotifyError> {
        let users = ctx
            .repos
            .user_repo
            .find_many(participants)
            .await
            .map_err(|e| NotifyError::lookup("participants", e))?;
        if users.len() < participants.len() {
            debug!(
                "{} participants no longer exist",
                participants.len() - users.len()
            );
        }

        let mut recipients = Vec::with_capacity(users.len());
        for user in users {
            if user.banned {
                debug!("Skipping banned user: {}", user.id);
                continue;
            }
            let is_member = ctx
                .repos
                .group_repo
                .is_member(group_id, &user.id)
                .await
                .map_err(|e| NotifyError::lookup("group membership", e))?;
            if !is_member {
                debug!("Skipping user: {} who left group: {}", user.id, group_id);
                continue;
            }
            recipients.push(user);
        }
        Ok(recipients)
    }
}

#[async_trait::async_trait]
impl Notifier for EventNotifier {
    async fn notify(
        &self,
        event_id: &ID,
        ctx: &SchedulerContext,
    ) -> Result<NotifyOutcome, NotifyError> {
        let event = match ctx
            .repos
            .event_repo
            .find(event_id)
            .await
            .map_err(|e| NotifyError::lookup("event", e))?
        {
            Some(event) => event,
            None => {
                info!("Event: {} no longer exists, nothing to remind about", event_id);
                return Ok(NotifyOutcome::Skipped(SkipReason::EntityMissing));
            }
        };
        if event.has_started(ctx.sys.get_timestamp_millis()) {
            info!("Event: {} has already started, skipping reminder", event_id);
            return Ok(NotifyOutcome::Skipped(SkipReason::AlreadyStarted));
        }

        let group = match ctx
            .repos
            .group_repo
            .find(&event.group_id)
            .await
            .map_err(|e| NotifyError::lookup("group", e))?
        {
            Some(group) => group,
            None => {
                info!(
                    "Group: {} of event: {} no longer exists, skipping reminder",
                    event.group_id, event_id
                );
                return Ok(NotifyOutcome::Skipped(SkipReason::GroupMissing));
            }
        };

        let recipients = self
            .recipients(&event.participants, &group.id, ctx)
            .await?;

        let start = format_datetime(event.start_ts, &ctx.config.timezone);
        let mut sent = 0;
        let mut failed = 0;
        for recipient in &recipients {
            let mut fields = TemplateFields::new();
            fields.insert("name", recipient.name.clone());
            fields.insert("title", event.title.clone());
            fields.insert("group", group.name.clone());
            fields.insert("location", event.location.clone());
            fields.insert("description", event.description.clone());
            fields.insert("start", start.clone());
            let rendered = templates::render(&EVENT_REMINDER, &fields);

            let message = MailMessage {
                to: recipient.email.clone(),
                subject: rendered.subject,
                html_body: rendered.html,
                attachments: vec![templates::logo()],
            };
            match ctx.mailer.send(&message).await {
                Ok(_) => sent += 1,
                Err(e) => {
                    failed += 1;
                    error!(
                        "Unable to send reminder for event: {} to user: {}. Err: {:?}",
                        event_id, recipient.id, e
                    );
                }
            }
        }

        info!(
            "Reminded {} of {} recipients about event: {}",
            sent,
            recipients.len(),
            event_id
        );
        Ok(NotifyOutcome::Delivered { sent, failed })
    }
}
