use crate::{error::SchedulerError, shared::usecase::UseCase};
use campus_scheduler_domain::{ReminderKind, ID};
use campus_scheduler_infra::SchedulerContext;
use tracing::info;

/// Removes the pending `ReminderJob` of a deleted entity. A job that is
/// already being processed finishes on its own and finds the entity gone.
#[derive(Debug)]
pub struct CancelReminderUseCase {
    pub kind: ReminderKind,
    pub entity_id: ID,
}

#[derive(Debug)]
pub enum UseCaseError {
    StorageError(String),
}

impl From<UseCaseError> for SchedulerError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::StorageError(msg) => Self::StoreUnavailable(msg),
        }
    }
}

#[async_trait::async_trait]
impl UseCase for CancelReminderUseCase {
    /// Whether a pending job was removed
    type Response = bool;

    type Error = UseCaseError;

    const NAME: &'static str = "CancelReminder";

    async fn execute(&mut self, ctx: &SchedulerContext) -> Result<Self::Response, Self::Error> {
        let removed = ctx
            .repos
            .reminder_job_repo
            .cancel(self.kind, &self.entity_id)
            .await
            .map_err(|e| UseCaseError::StorageError(e.to_string()))?;

        if removed {
            info!("Reminder for {} {} cancelled", self.kind, self.entity_id);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::usecase::execute;
    use campus_scheduler_infra::{InMemoryMailSender, ManualSys};
    use std::sync::Arc;

    #[tokio::test]
    async fn cancels_pending_reminder() {
        let ctx = SchedulerContext::create_inmemory(
            Arc::new(ManualSys::new(0)),
            Arc::new(InMemoryMailSender::new()),
        );
        let exam_id = ID::default();
        ctx.repos
            .reminder_job_repo
            .schedule(ReminderKind::Exam, &exam_id, 1000)
            .await
            .unwrap();

        let usecase = CancelReminderUseCase {
            kind: ReminderKind::Exam,
            entity_id: exam_id.clone(),
        };
        assert!(execute(usecase, &ctx).await.unwrap());

        let usecase = CancelReminderUseCase {
            kind: ReminderKind::Exam,
            entity_id: exam_id,
        };
        assert!(!execute(usecase, &ctx).await.unwrap());
    }
}
