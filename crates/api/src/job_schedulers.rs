use crate::notifiers::{Notifier, Notifiers};
use campus_scheduler_domain::{JobTransition, ReminderJob};
use campus_scheduler_infra::SchedulerContext;
use std::sync::Arc;
use tokio::{
    sync::{watch, OwnedSemaphorePermit, Semaphore},
    task::{JoinError, JoinSet},
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info, warn};

/// What happened to a claimed `ReminderJob` after it was dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Done { attempts: i32 },
    /// The attempt failed and the job will be claimed again after the backoff
    Retrying { attempts: i32 },
    /// The attempt failed and the retry ceiling was reached
    Abandoned { attempts: i32 },
    /// The job was rescheduled while the attempt was running and is pending again
    Rescheduled,
    /// The result of the attempt could not be recorded. The job is stuck in
    /// flight until `recover_in_flight` runs when the next process starts.
    Lost,
}

/// Claims due `ReminderJob`s on a fixed interval and hands each of them to
/// the `Notifier` of its kind.
///
/// A job is only claimed once a dispatch permit is held for it, so at most
/// `max_concurrent_dispatches` jobs are in flight per processor and the rest
/// stay pending, where they can still be cancelled.
pub struct JobProcessor {
    ctx: SchedulerContext,
    notifiers: Notifiers,
    permits: Arc<Semaphore>,
}

impl JobProcessor {
    pub fn new(ctx: SchedulerContext, notifiers: Notifiers) -> Self {
        let permits = Arc::new(Semaphore::new(ctx.config.max_concurrent_dispatches));
        Self {
            ctx,
            notifiers,
            permits,
        }
    }

    /// Runs until `shutdown` changes or its sender is dropped, then waits
    /// for the dispatches that are still running
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.ctx.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut dispatches = JoinSet::new();

        info!(
            "Reminder job processor started with tick interval: {:?}",
            self.ctx.config.tick_interval
        );
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(&mut dispatches).await,
                Some(res) = dispatches.join_next(), if !dispatches.is_empty() => log_join(res),
                _ = shutdown.changed() => break,
            }
        }

        info!(
            "Reminder job processor stopping, waiting for {} dispatches",
            dispatches.len()
        );
        while let Some(res) = dispatches.join_next().await {
            log_join(res);
        }
        info!("Reminder job processor stopped");
    }

    /// Runs a single tick and waits for all of its dispatches
    pub async fn process_due_jobs(&self) -> Vec<JobOutcome> {
        let mut dispatches = JoinSet::new();
        self.tick(&mut dispatches).await;

        let mut outcomes = Vec::with_capacity(dispatches.len());
        while let Some(res) = dispatches.join_next().await {
            match res {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => error!("Reminder dispatch task failed: {:?}", e),
            }
        }
        outcomes
    }

    async fn tick(&self, dispatches: &mut JoinSet<JobOutcome>) {
        let permits = self.acquire_permits();
        if permits.is_empty() {
            debug!("All dispatch permits are in use, skipping claim");
            return;
        }

        let now = self.ctx.sys.get_timestamp_millis();
        let jobs = match self
            .ctx
            .repos
            .reminder_job_repo
            .claim_due(now, permits.len() as i64)
            .await
        {
            Ok(jobs) => jobs,
            Err(e) => {
                error!("Unable to claim due reminder jobs. Err: {:?}", e);
                return;
            }
        };
        if !jobs.is_empty() {
            debug!("Claimed {} due reminder jobs", jobs.len());
        }

        // Permits left over when fewer jobs were due are released on drop
        for (job, permit) in jobs.into_iter().zip(permits) {
            let notifier = self.notifiers.for_kind(job.kind);
            dispatches.spawn(dispatch(job, notifier, self.ctx.clone(), permit));
        }
    }

    /// Takes as many free dispatch permits as a single claim may use
    fn acquire_permits(&self) -> Vec<OwnedSemaphorePermit> {
        let batch_size = usize::try_from(self.ctx.config.claim_batch_size).unwrap_or(usize::MAX);
        let mut permits = vec![];
        while permits.len() < batch_size {
            match self.permits.clone().try_acquire_owned() {
                Ok(permit) => permits.push(permit),
                Err(_) => break,
            }
        }
        permits
    }
}

fn log_join(res: Result<JobOutcome, JoinError>) {
    match res {
        Ok(outcome) => debug!("Reminder dispatch finished: {:?}", outcome),
        Err(e) => error!("Reminder dispatch task failed: {:?}", e),
    }
}

async fn dispatch(
    job: ReminderJob,
    notifier: Arc<dyn Notifier>,
    ctx: SchedulerContext,
    _permit: OwnedSemaphorePermit,
) -> JobOutcome {
    // The notifier runs on its own task so that a panic is caught here
    // instead of taking the dispatch down with the job still in flight
    let notify_ctx = ctx.clone();
    let entity_id = job.entity_id.clone();
    let res = tokio::spawn(async move { notifier.notify(&entity_id, &notify_ctx).await }).await;

    let repo = &ctx.repos.reminder_job_repo;
    let backoff = i64::try_from(ctx.config.retry_backoff.as_millis()).unwrap_or(i64::MAX);
    let retry_at = ctx.sys.get_timestamp_millis().saturating_add(backoff);
    let transition = match res {
        Ok(Ok(outcome)) => {
            debug!(
                "Reminder job: {} for {} {} finished with: {:?}",
                job.id, job.kind, job.entity_id, outcome
            );
            repo.complete(&job).await
        }
        Ok(Err(e)) => {
            warn!(
                "Reminder job: {} for {} {} failed. Err: {}",
                job.id, job.kind, job.entity_id, e
            );
            repo.fail(&job, retry_at, ctx.config.max_attempts).await
        }
        Err(e) => {
            error!(
                "Notifier for reminder job: {} for {} {} panicked. Err: {:?}",
                job.id, job.kind, job.entity_id, e
            );
            repo.fail(&job, retry_at, ctx.config.max_attempts).await
        }
    };

    match transition {
        Ok(JobTransition::Completed(done)) => JobOutcome::Done {
            attempts: done.attempts,
        },
        Ok(JobTransition::Retrying(retrying)) => {
            info!(
                "Reminder job: {} will be retried at: {} (attempt {} of {})",
                retrying.id,
                retrying.fire_at,
                retrying.attempts + 1,
                ctx.config.max_attempts
            );
            JobOutcome::Retrying {
                attempts: retrying.attempts,
            }
        }
        Ok(JobTransition::Abandoned(abandoned)) => {
            error!(
                "Reminder job: {} for {} {} abandoned after {} attempts",
                abandoned.id, abandoned.kind, abandoned.entity_id, abandoned.attempts
            );
            JobOutcome::Abandoned {
                attempts: abandoned.attempts,
            }
        }
        Ok(JobTransition::Rescheduled(pending)) => {
            info!(
                "Reminder job: {} was rescheduled while in flight, next fire at: {}",
                pending.id, pending.fire_at
            );
            JobOutcome::Rescheduled
        }
        Ok(JobTransition::Missing) => {
            warn!("Reminder job: {} disappeared while in flight", job.id);
            JobOutcome::Lost
        }
        Err(e) => {
            error!(
                "Unable to record the result of reminder job: {}. Err: {:?}",
                job.id, e
            );
            JobOutcome::Lost
        }
    }
}
