use crate::{
    error::SchedulerError,
    job_schedulers::{JobOutcome, JobProcessor},
    notifiers::Notifiers,
    reminder::{cancel_reminder::CancelReminderUseCase, schedule_reminder::ScheduleReminderUseCase},
    shared::usecase::execute,
};
use campus_scheduler_domain::{ReminderJob, ReminderKind, ID};
use campus_scheduler_infra::SchedulerContext;
use std::sync::Arc;
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};
use tracing::{error, info, warn};

struct RunningProcessor {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

enum Lifecycle {
    Idle,
    Running(RunningProcessor),
    Stopped,
}

/// Entry point used by the rest of the system to request reminders about
/// events and exams, and to control the background job processor.
///
/// The job store and the mail transport are opened by `start` and released
/// by `stop`. A stopped scheduler rejects every further request.
pub struct ReminderScheduler {
    ctx: SchedulerContext,
    processor: Arc<JobProcessor>,
    lifecycle: Mutex<Lifecycle>,
}

impl ReminderScheduler {
    pub fn new(ctx: SchedulerContext) -> Self {
        Self::with_notifiers(ctx, Notifiers::default())
    }

    pub fn with_notifiers(ctx: SchedulerContext, notifiers: Notifiers) -> Self {
        let processor = Arc::new(JobProcessor::new(ctx.clone(), notifiers));
        Self {
            ctx,
            processor,
            lifecycle: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Schedules the reminder of a `StudyEvent`, replacing any earlier one
    pub async fn on_event_created_or_rescheduled(
        &self,
        event_id: &ID,
        start_ts: i64,
    ) -> Result<ReminderJob, SchedulerError> {
        self.schedule(ReminderKind::Event, event_id, start_ts).await
    }

    /// Schedules the reminder of an `Exam`, replacing any earlier one
    pub async fn on_exam_created_or_rescheduled(
        &self,
        exam_id: &ID,
        start_ts: i64,
    ) -> Result<ReminderJob, SchedulerError> {
        self.schedule(ReminderKind::Exam, exam_id, start_ts).await
    }

    pub async fn on_event_deleted(&self, event_id: &ID) -> Result<bool, SchedulerError> {
        self.cancel(ReminderKind::Event, event_id).await
    }

    pub async fn on_exam_deleted(&self, exam_id: &ID) -> Result<bool, SchedulerError> {
        self.cancel(ReminderKind::Exam, exam_id).await
    }

    async fn schedule(
        &self,
        kind: ReminderKind,
        entity_id: &ID,
        start_ts: i64,
    ) -> Result<ReminderJob, SchedulerError> {
        self.ensure_not_stopped().await?;
        let usecase = ScheduleReminderUseCase {
            kind,
            entity_id: entity_id.clone(),
            start_ts,
        };
        execute(usecase, &self.ctx).await.map_err(SchedulerError::from)
    }

    async fn cancel(&self, kind: ReminderKind, entity_id: &ID) -> Result<bool, SchedulerError> {
        self.ensure_not_stopped().await?;
        let usecase = CancelReminderUseCase {
            kind,
            entity_id: entity_id.clone(),
        };
        execute(usecase, &self.ctx).await.map_err(SchedulerError::from)
    }

    async fn ensure_not_stopped(&self) -> Result<(), SchedulerError> {
        match *self.lifecycle.lock().await {
            Lifecycle::Stopped => Err(SchedulerError::Stopped),
            _ => Ok(()),
        }
    }

    /// Opens the job store and the mail transport, puts jobs left in flight
    /// by a previous process back in the queue and starts the job processor.
    /// Calling it while running does nothing.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let mut lifecycle = self.lifecycle.lock().await;
        match *lifecycle {
            Lifecycle::Running(_) => {
                warn!("Reminder scheduler is already running");
                return Ok(());
            }
            Lifecycle::Stopped => return Err(SchedulerError::Stopped),
            Lifecycle::Idle => {}
        }

        self.ctx
            .repos
            .open()
            .await
            .map_err(|e| SchedulerError::StoreUnavailable(e.to_string()))?;
        self.ctx
            .mailer
            .open()
            .await
            .map_err(|e| SchedulerError::MailUnavailable(e.to_string()))?;

        let recovered = self
            .ctx
            .repos
            .reminder_job_repo
            .recover_in_flight()
            .await
            .map_err(|e| SchedulerError::StoreUnavailable(e.to_string()))?;
        if recovered > 0 {
            info!("Recovered {} reminder jobs left in flight", recovered);
        }

        let (shutdown, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(self.processor.clone().run(shutdown_rx));
        *lifecycle = Lifecycle::Running(RunningProcessor { shutdown, handle });
        Ok(())
    }

    /// Stops the job processor, waits for running dispatches to finish and
    /// releases the job store and the mail transport
    pub async fn stop(&self) {
        let mut lifecycle = self.lifecycle.lock().await;
        match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
            Lifecycle::Stopped => return,
            Lifecycle::Running(running) => {
                // Only fails if the processor already exited
                let _ = running.shutdown.send(true);
                if let Err(e) = running.handle.await {
                    error!("Reminder job processor exited abnormally. Err: {:?}", e);
                }
            }
            Lifecycle::Idle => {}
        }
        self.ctx.mailer.close().await;
        self.ctx.repos.close().await;
        info!("Reminder scheduler stopped");
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock().await, Lifecycle::Running(_))
    }

    /// Runs a single processor tick and waits for its dispatches
    pub async fn process_due_jobs(&self) -> Vec<JobOutcome> {
        self.processor.process_due_jobs().await
    }
}
