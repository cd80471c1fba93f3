use super::{
    templates::{self, EXAM_REMINDER},
    Notifier, NotifyError, NotifyOutcome, SkipReason,
};
use campus_scheduler_domain::{format_datetime, MailMessage, TemplateFields, ID};
use campus_scheduler_infra::SchedulerContext;
use tracing::info;

/// Reminds the owner of an `Exam`. Unlike event reminders there is a single
/// recipient, so a failed delivery fails the job and it is retried.
pub struct ExamNotifier {}

#[async_trait::async_trait]
impl Notifier for ExamNotifier {
    async fn notify(
        &self,
        exam_id: &ID,
        ctx: &SchedulerContext,
    ) -> Result<NotifyOutcome, NotifyError> {
        let exam = match ctx
            .repos
            .exam_repo
            .find(exam_id)
            .await
            .map_err(|e| NotifyError::lookup("exam", e))?
        {
            Some(exam) => exam,
            None => {
                info!("Exam: {} no longer exists, nothing to remind about", exam_id);
                return Ok(NotifyOutcome::Skipped(SkipReason::EntityMissing));
            }
        };
        if exam.has_started(ctx.sys.get_timestamp_millis()) {
            info!("Exam: {} has already started, skipping reminder", exam_id);
            return Ok(NotifyOutcome::Skipped(SkipReason::AlreadyStarted));
        }

        let owner = ctx
            .repos
            .user_repo
            .find(&exam.user_id)
            .await
            .map_err(|e| NotifyError::lookup("exam owner", e))?;
        let owner = match owner {
            Some(owner) if !owner.banned => owner,
            _ => {
                info!(
                    "Owner: {} of exam: {} is gone or banned, skipping reminder",
                    exam.user_id, exam_id
                );
                return Ok(NotifyOutcome::Skipped(SkipReason::RecipientUnavailable));
            }
        };

        let mut fields = TemplateFields::new();
        fields.insert("name", owner.name.clone());
        fields.insert("course", exam.course.clone());
        fields.insert("location", exam.location.clone());
        fields.insert("start", format_datetime(exam.start_ts, &ctx.config.timezone));
        let rendered = templates::render(&EXAM_REMINDER, &fields);

        let message = MailMessage {
            to: owner.email.clone(),
            subject: rendered.subject,
            html_body: rendered.html,
            attachments: vec![templates::logo()],
        };
        ctx.mailer
            .send(&message)
            .await
            .map_err(|e| NotifyError::Delivery {
                to: owner.email.clone(),
                reason: e.to_string(),
            })?;

        info!("Reminded user: {} about exam: {}", owner.id, exam_id);
        Ok(NotifyOutcome::Delivered { sent: 1, failed: 0 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_scheduler_domain::{Exam, User};
    use campus_scheduler_infra::{InMemoryMailSender, ManualSys};
    use std::sync::Arc;

    async fn setup() -> (SchedulerContext, Arc<InMemoryMailSender>, User) {
        let mailer = Arc::new(InMemoryMailSender::new());
        let ctx = SchedulerContext::create_inmemory(Arc::new(ManualSys::new(0)), mailer.clone());
        let owner = User::new("Ada", "ada@campus.example");
        ctx.repos.user_repo.insert(&owner).await.unwrap();
        (ctx, mailer, owner)
    }

    #[tokio::test]
    async fn reminds_the_owner() {
        let (ctx, mailer, owner) = setup().await;
        let mut exam = Exam::new(owner.id.clone(), "Operating systems", 10_000);
        exam.location = "Aula".into();
        ctx.repos.exam_repo.insert(&exam).await.unwrap();

        let outcome = ExamNotifier {}.notify(&exam.id, &ctx).await.unwrap();
        assert_eq!(outcome, NotifyOutcome::Delivered { sent: 1, failed: 0 });

        let sent = mailer.sent_to("ada@campus.example");
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].subject,
            "Reminder: your Operating systems exam starts Thursday, 1 January 1970 at 00:00 (UTC)"
        );
        assert!(sent[0].html_body.contains("Aula"));
        assert!(sent[0].html_body.contains("(UTC)"));
    }

    #[tokio::test]
    async fn delivery_failure_is_an_error() {
        let (ctx, mailer, owner) = setup().await;
        let exam = Exam::new(owner.id.clone(), "Networks", 10_000);
        ctx.repos.exam_repo.insert(&exam).await.unwrap();
        mailer.fail_next(1);

        let res = ExamNotifier {}.notify(&exam.id, &ctx).await;
        assert!(matches!(res, Err(NotifyError::Delivery { .. })));
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn skips_banned_owner_and_past_exams() {
        let (ctx, mailer, mut owner) = setup().await;
        let past = Exam::new(owner.id.clone(), "History", 0);
        ctx.repos.exam_repo.insert(&past).await.unwrap();
        assert_eq!(
            ExamNotifier {}.notify(&past.id, &ctx).await.unwrap(),
            NotifyOutcome::Skipped(SkipReason::AlreadyStarted)
        );

        owner.banned = true;
        ctx.repos.user_repo.save(&owner).await.unwrap();
        let exam = Exam::new(owner.id.clone(), "Databases", 10_000);
        ctx.repos.exam_repo.insert(&exam).await.unwrap();
        assert_eq!(
            ExamNotifier {}.notify(&exam.id, &ctx).await.unwrap(),
            NotifyOutcome::Skipped(SkipReason::RecipientUnavailable)
        );

        assert_eq!(
            ExamNotifier {}.notify(&ID::default(), &ctx).await.unwrap(),
            NotifyOutcome::Skipped(SkipReason::EntityMissing)
        );
        assert!(mailer.sent().is_empty());
    }
}
