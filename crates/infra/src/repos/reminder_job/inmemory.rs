use super::IReminderJobRepo;
use crate::repos::shared::inmemory_repo::*;
use campus_scheduler_domain::{JobState, JobTransition, ReminderJob, ReminderKind, ID};
use std::sync::Mutex;

pub struct InMemoryReminderJobRepo {
    jobs: Mutex<Vec<ReminderJob>>,
}

impl InMemoryReminderJobRepo {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(vec![]),
        }
    }
}

impl Default for InMemoryReminderJobRepo {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the outcome of an attempt to the stored job. Returns the
/// transition and whether the job should be removed.
fn report_attempt(
    stored: &mut ReminderJob,
    claimed: &ReminderJob,
    on_current: impl FnOnce(&mut ReminderJob) -> JobTransition,
) -> (JobTransition, bool) {
    if stored.version != claimed.version {
        stored.state = JobState::Pending;
        stored.attempts = 0;
        return (JobTransition::Rescheduled(stored.clone()), false);
    }
    let transition = on_current(stored);
    (transition, stored.state.is_terminal())
}

impl InMemoryReminderJobRepo {
    fn report(
        &self,
        claimed: &ReminderJob,
        on_current: impl FnOnce(&mut ReminderJob) -> JobTransition,
    ) -> JobTransition {
        let mut jobs = self.jobs.lock().unwrap();
        let index = match jobs.iter().position(|job| job.id == claimed.id) {
            Some(index) => index,
            None => return JobTransition::Missing,
        };
        let (transition, remove) = report_attempt(&mut jobs[index], claimed, on_current);
        if remove {
            jobs.remove(index);
        }
        transition
    }
}

#[async_trait::async_trait]
impl IReminderJobRepo for InMemoryReminderJobRepo {
    async fn schedule(
        &self,
        kind: ReminderKind,
        entity_id: &ID,
        fire_at: i64,
    ) -> anyhow::Result<ReminderJob> {
        let mut jobs = self.jobs.lock().unwrap();
        if let Some(job) = jobs
            .iter_mut()
            .find(|job| job.kind == kind && &job.entity_id == entity_id)
        {
            job.fire_at = fire_at;
            job.version += 1;
            if job.state == JobState::Pending {
                job.attempts = 0;
            }
            return Ok(job.clone());
        }

        let job = ReminderJob::new(kind, entity_id.clone(), fire_at);
        jobs.push(job.clone());
        Ok(job)
    }

    async fn cancel(&self, kind: ReminderKind, entity_id: &ID) -> anyhow::Result<bool> {
        let deleted = find_and_delete_by(&self.jobs, |job| {
            job.kind == kind && &job.entity_id == entity_id && job.state == JobState::Pending
        });
        Ok(!deleted.is_empty())
    }

    async fn claim_due(&self, now: i64, limit: i64) -> anyhow::Result<Vec<ReminderJob>> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut due = jobs
            .iter_mut()
            .filter(|job| job.is_due(now))
            .collect::<Vec<_>>();
        due.sort_by_key(|job| job.fire_at);

        let claimed = due
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|job| {
                job.state = JobState::InFlight;
                job.clone()
            })
            .collect();
        Ok(claimed)
    }

    async fn complete(&self, job: &ReminderJob) -> anyhow::Result<JobTransition> {
        Ok(self.report(job, |stored| {
            stored.attempts += 1;
            stored.state = JobState::Done;
            JobTransition::Completed(stored.clone())
        }))
    }

    async fn fail(
        &self,
        job: &ReminderJob,
        retry_at: i64,
        max_attempts: i32,
    ) -> anyhow::Result<JobTransition> {
        Ok(self.report(job, |stored| {
            stored.attempts += 1;
            if stored.attempts >= max_attempts {
                stored.state = JobState::Abandoned;
                JobTransition::Abandoned(stored.clone())
            } else {
                stored.state = JobState::Pending;
                stored.fire_at = retry_at;
                JobTransition::Retrying(stored.clone())
            }
        }))
    }

    async fn recover_in_flight(&self) -> anyhow::Result<u64> {
        let mut jobs = self.jobs.lock().unwrap();
        let mut recovered = 0;
        for job in jobs.iter_mut().filter(|job| job.state == JobState::InFlight) {
            job.state = JobState::Pending;
            recovered += 1;
        }
        Ok(recovered)
    }

    async fn find(
        &self,
        kind: ReminderKind,
        entity_id: &ID,
    ) -> anyhow::Result<Option<ReminderJob>> {
        let found = find_by(&self.jobs, |job| {
            job.kind == kind && &job.entity_id == entity_id
        });
        Ok(found.into_iter().next())
    }
}
