mod inmemory;
mod postgres;

pub use inmemory::InMemoryReminderJobRepo;
pub use postgres::PostgresReminderJobRepo;

use campus_scheduler_domain::{JobTransition, ReminderJob, ReminderKind, ID};

/// Durable queue of delayed `ReminderJob`s.
///
/// Jobs are keyed by `(kind, entity_id)` and there is at most one `Pending`
/// or `InFlight` job per key. `Done` and `Abandoned` jobs are removed.
#[async_trait::async_trait]
pub trait IReminderJobRepo: Send + Sync {
    /// Creates the job for `(kind, entity_id)` or moves the existing one to
    /// `fire_at`. An existing `InFlight` job keeps running, it is re-armed
    /// when the running attempt reports back.
    async fn schedule(
        &self,
        kind: ReminderKind,
        entity_id: &ID,
        fire_at: i64,
    ) -> anyhow::Result<ReminderJob>;
    /// Removes the `Pending` job for `(kind, entity_id)`. `InFlight` jobs are
    /// left alone. Returns true if a job was removed.
    async fn cancel(&self, kind: ReminderKind, entity_id: &ID) -> anyhow::Result<bool>;
    /// Atomically moves at most `limit` due `Pending` jobs to `InFlight` and
    /// returns them, the ones due first first. A job is never returned
    /// to two callers.
    async fn claim_due(&self, now: i64, limit: i64) -> anyhow::Result<Vec<ReminderJob>>;
    /// Reports a successful attempt for a claimed job
    async fn complete(&self, job: &ReminderJob) -> anyhow::Result<JobTransition>;
    /// Reports a failed attempt for a claimed job. The job becomes due again
    /// at `retry_at` unless this was attempt number `max_attempts`.
    async fn fail(
        &self,
        job: &ReminderJob,
        retry_at: i64,
        max_attempts: i32,
    ) -> anyhow::Result<JobTransition>;
    /// Puts jobs left `InFlight` by a process that died back to `Pending`.
    /// Only safe to call while no processor is running.
    async fn recover_in_flight(&self) -> anyhow::Result<u64>;
    async fn find(&self, kind: ReminderKind, entity_id: &ID)
        -> anyhow::Result<Option<ReminderJob>>;
}
