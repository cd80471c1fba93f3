use crate::{error::SchedulerError, shared::usecase::UseCase};
use campus_scheduler_domain::{compute_fire_at, delay_until, ReminderJob, ReminderKind, ID};
use campus_scheduler_infra::SchedulerContext;
use tracing::info;

/// Creates the `ReminderJob` for an entity, or moves the existing one when
/// the entity was rescheduled
#[derive(Debug)]
pub struct ScheduleReminderUseCase {
    pub kind: ReminderKind,
    pub entity_id: ID,
    /// When the event or exam starts, in millis
    pub start_ts: i64,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError(String),
    InvalidLeadTime(String),
}

impl From<UseCaseError> for SchedulerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError(msg) => Self::StoreUnavailable(msg),
            UseCaseError::InvalidLeadTime(msg) => Self::InvalidConfig(msg),
        }
    }
}

#[async_trait::async_trait]
impl UseCase for ScheduleReminderUseCase {
    type Response = ReminderJob;

    type Error = UseCaseError;

    const NAME: &'static str = "ScheduleReminder";

    async fn execute(&mut self, ctx: &SchedulerContext) -> Result<Self::Response, Self::Error> {
        let lead_time = match self.kind {
            ReminderKind::Event => ctx.config.event_lead_time,
            ReminderKind::Exam => ctx.config.exam_lead_time,
        };
        let lead_time = i64::try_from(lead_time.as_millis()).map_err(|_| {
            UseCaseError::InvalidLeadTime(format!("{:?} does not fit in millis", lead_time))
        })?;
        let fire_at = compute_fire_at(self.start_ts, lead_time);

        let job = ctx
            .repos
            .reminder_job_repo
            .schedule(self.kind, &self.entity_id, fire_at)
            .await
            .map_err(|e| UseCaseError::StorageError(e.to_string()))?;

        let now = ctx.sys.get_timestamp_millis();
        info!(
            "Reminder for {} {} scheduled at {}, due in {} ms",
            self.kind,
            self.entity_id,
            fire_at,
            delay_until(fire_at, now)
        );

        Ok(job)
    }
}
