mod helpers;

use campus_scheduler_api::JobOutcome;
use campus_scheduler_domain::{Exam, JobState, ReminderKind, ID};
use campus_scheduler_infra::IExamRepo;
use helpers::setup::{spawn_app, spawn_app_with_context, START_OF_TEST};
use helpers::utils::*;
use std::{sync::Arc, time::Duration};

/// Exam store that cannot be reached
struct UnreachableExamRepo {}

#[async_trait::async_trait]
impl IExamRepo for UnreachableExamRepo {
    async fn insert(&self, _exam: &Exam) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("connection refused"))
    }

    async fn save(&self, _exam: &Exam) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("connection refused"))
    }

    async fn find(&self, _exam_id: &ID) -> anyhow::Result<Option<Exam>> {
        Err(anyhow::anyhow!("connection refused"))
    }

    async fn delete(&self, _exam_id: &ID) -> anyhow::Result<Option<Exam>> {
        Err(anyhow::anyhow!("connection refused"))
    }
}

#[tokio::test]
async fn reminds_owner_a_day_before() {
    let app = spawn_app();
    let ada = create_user(&app.ctx, "Ada").await;
    let exam = create_exam(&app.ctx, &ada, START_OF_TEST + 48 * HOUR).await;

    let job = app
        .scheduler
        .on_exam_created_or_rescheduled(&exam.id, exam.start_ts)
        .await
        .unwrap();
    assert_eq!(job.fire_at, exam.start_ts - 24 * HOUR);

    app.sys.set(job.fire_at);
    assert_eq!(
        app.scheduler.process_due_jobs().await,
        vec![JobOutcome::Done { attempts: 1 }]
    );

    let sent = app.mailer.sent_to(&email_of("Ada"));
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].subject,
        "Reminder: your Linear algebra exam starts Sunday, 3 March 2024 at 00:00 (UTC)"
    );
    // 2024-03-03T00:00:00Z
    assert!(sent[0]
        .html_body
        .contains("Sunday, 3 March 2024 at 00:00 (UTC)"));
}

#[tokio::test]
async fn subject_names_the_start_for_any_lead_time() {
    let app = spawn_app_with_context(|ctx| {
        ctx.config.exam_lead_time = Duration::from_secs(2 * 60 * 60);
    });
    let ada = create_user(&app.ctx, "Ada").await;
    let exam = create_exam(&app.ctx, &ada, START_OF_TEST + 3 * HOUR).await;
    let job = app
        .scheduler
        .on_exam_created_or_rescheduled(&exam.id, exam.start_ts)
        .await
        .unwrap();
    assert_eq!(job.fire_at, exam.start_ts - 2 * HOUR);

    app.sys.set(job.fire_at);
    assert_eq!(
        app.scheduler.process_due_jobs().await,
        vec![JobOutcome::Done { attempts: 1 }]
    );
    let sent = app.mailer.sent_to(&email_of("Ada"));
    assert_eq!(
        sent[0].subject,
        "Reminder: your Linear algebra exam starts Friday, 1 March 2024 at 03:00 (UTC)"
    );
}

#[tokio::test]
async fn deleted_exam_is_never_reminded() {
    let app = spawn_app();
    let ada = create_user(&app.ctx, "Ada").await;
    let exam = create_exam(&app.ctx, &ada, START_OF_TEST + 48 * HOUR).await;
    app.scheduler
        .on_exam_created_or_rescheduled(&exam.id, exam.start_ts)
        .await
        .unwrap();

    app.ctx.repos.exam_repo.delete(&exam.id).await.unwrap();
    assert!(app.scheduler.on_exam_deleted(&exam.id).await.unwrap());

    app.sys.set(exam.start_ts);
    assert!(app.scheduler.process_due_jobs().await.is_empty());
    assert!(app.mailer.sent().is_empty());
    assert!(app
        .ctx
        .repos
        .reminder_job_repo
        .find(ReminderKind::Exam, &exam.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn exam_deleted_without_cancel_completes_the_job() {
    let app = spawn_app();
    let ada = create_user(&app.ctx, "Ada").await;
    let exam = create_exam(&app.ctx, &ada, START_OF_TEST + 48 * HOUR).await;
    app.scheduler
        .on_exam_created_or_rescheduled(&exam.id, exam.start_ts)
        .await
        .unwrap();
    app.ctx.repos.exam_repo.delete(&exam.id).await.unwrap();

    app.sys.set(exam.start_ts - 24 * HOUR);
    // Completed, not failed
    assert_eq!(
        app.scheduler.process_due_jobs().await,
        vec![JobOutcome::Done { attempts: 1 }]
    );
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn mail_failing_twice_is_retried_until_delivered() {
    let app = spawn_app();
    let backoff = app.ctx.config.retry_backoff.as_millis() as i64;
    let ada = create_user(&app.ctx, "Ada").await;
    let exam = create_exam(&app.ctx, &ada, START_OF_TEST + 48 * HOUR).await;
    let job = app
        .scheduler
        .on_exam_created_or_rescheduled(&exam.id, exam.start_ts)
        .await
        .unwrap();
    app.mailer.fail_next(2);

    app.sys.set(job.fire_at);
    assert_eq!(
        app.scheduler.process_due_jobs().await,
        vec![JobOutcome::Retrying { attempts: 1 }]
    );
    // Not retried before the backoff has passed
    assert!(app.scheduler.process_due_jobs().await.is_empty());
    app.sys.advance(backoff);
    assert_eq!(
        app.scheduler.process_due_jobs().await,
        vec![JobOutcome::Retrying { attempts: 2 }]
    );

    let retrying = app
        .ctx
        .repos
        .reminder_job_repo
        .find(ReminderKind::Exam, &exam.id)
        .await
        .unwrap()
        .expect("Job to be pending");
    assert_eq!(retrying.state, JobState::Pending);
    assert_eq!(retrying.attempts, 2);

    // The third attempt delivers the mail and completes the job
    app.sys.advance(backoff);
    assert_eq!(
        app.scheduler.process_due_jobs().await,
        vec![JobOutcome::Done { attempts: 3 }]
    );
    assert_eq!(app.mailer.sent_to(&email_of("Ada")).len(), 1);
    assert!(app
        .ctx
        .repos
        .reminder_job_repo
        .find(ReminderKind::Exam, &exam.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn exam_lookup_failure_is_retried() {
    let app = spawn_app_with_context(|ctx| {
        ctx.repos.exam_repo = Arc::new(UnreachableExamRepo {});
    });
    let backoff = app.ctx.config.retry_backoff.as_millis() as i64;
    let exam_id = ID::default();
    let job = app
        .scheduler
        .on_exam_created_or_rescheduled(&exam_id, START_OF_TEST + 48 * HOUR)
        .await
        .unwrap();

    app.sys.set(job.fire_at);
    // Failed, not completed as if the exam was gone
    assert_eq!(
        app.scheduler.process_due_jobs().await,
        vec![JobOutcome::Retrying { attempts: 1 }]
    );
    let retrying = app
        .ctx
        .repos
        .reminder_job_repo
        .find(ReminderKind::Exam, &exam_id)
        .await
        .unwrap()
        .expect("Job to be kept for retry");
    assert_eq!(retrying.state, JobState::Pending);
    assert_eq!(retrying.fire_at, job.fire_at + backoff);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn abandoned_after_ceiling() {
    let app = spawn_app();
    let backoff = app.ctx.config.retry_backoff.as_millis() as i64;
    let ada = create_user(&app.ctx, "Ada").await;
    let exam = create_exam(&app.ctx, &ada, START_OF_TEST + 48 * HOUR).await;
    let job = app
        .scheduler
        .on_exam_created_or_rescheduled(&exam.id, exam.start_ts)
        .await
        .unwrap();
    app.mailer.fail_next(100);

    app.sys.set(job.fire_at);
    let mut outcomes = vec![];
    for _ in 0..app.ctx.config.max_attempts {
        outcomes.extend(app.scheduler.process_due_jobs().await);
        app.sys.advance(backoff);
    }
    assert_eq!(
        outcomes.last(),
        Some(&JobOutcome::Abandoned {
            attempts: app.ctx.config.max_attempts
        })
    );
    assert_eq!(outcomes.len(), app.ctx.config.max_attempts as usize);

    // Not claimable anymore
    app.sys.advance(24 * HOUR);
    assert!(app.scheduler.process_due_jobs().await.is_empty());
    assert!(app.mailer.sent().is_empty());
}
