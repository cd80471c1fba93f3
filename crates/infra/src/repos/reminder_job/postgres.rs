use super::IReminderJobRepo;
use anyhow::anyhow;
use campus_scheduler_domain::{JobState, JobTransition, ReminderJob, ReminderKind, ID};
use sqlx::{types::Uuid, FromRow, PgPool, Postgres, Transaction};
use std::convert::TryFrom;

pub struct PostgresReminderJobRepo {
    pool: PgPool,
}

impl PostgresReminderJobRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ReminderJobRaw {
    job_uid: Uuid,
    kind: String,
    entity_uid: Uuid,
    fire_at: i64,
    attempts: i32,
    state: String,
    version: i64,
}

impl TryFrom<ReminderJobRaw> for ReminderJob {
    type Error = anyhow::Error;

    fn try_from(raw: ReminderJobRaw) -> Result<Self, Self::Error> {
        Ok(Self {
            id: raw.job_uid.into(),
            kind: raw.kind.parse::<ReminderKind>().map_err(|e| anyhow!(e))?,
            entity_id: raw.entity_uid.into(),
            fire_at: raw.fire_at,
            attempts: raw.attempts,
            state: raw.state.parse::<JobState>().map_err(|e| anyhow!(e))?,
            version: raw.version,
        })
    }
}

fn into_jobs(rows: Vec<ReminderJobRaw>) -> anyhow::Result<Vec<ReminderJob>> {
    rows.into_iter().map(ReminderJob::try_from).collect()
}

impl PostgresReminderJobRepo {
    /// Locks the row of a claimed job and checks whether it was rescheduled
    /// while in flight. Returns the locked row when the attempt is still
    /// the current one.
    async fn lock_current(
        tx: &mut Transaction<'_, Postgres>,
        claimed: &ReminderJob,
    ) -> anyhow::Result<Result<ReminderJob, JobTransition>> {
        let stored = sqlx::query_as::<_, ReminderJobRaw>(
            r#"
            SELECT * FROM reminder_jobs
            WHERE job_uid = $1
            FOR UPDATE
            "#,
        )
        .bind(claimed.id.inner_ref())
        .fetch_optional(&mut **tx)
        .await?;

        let stored = match stored {
            Some(stored) => ReminderJob::try_from(stored)?,
            None => return Ok(Err(JobTransition::Missing)),
        };
        if stored.version == claimed.version {
            return Ok(Ok(stored));
        }

        let rearmed = sqlx::query_as::<_, ReminderJobRaw>(
            r#"
            UPDATE reminder_jobs
            SET state = 'pending', attempts = 0
            WHERE job_uid = $1
            RETURNING *
            "#,
        )
        .bind(claimed.id.inner_ref())
        .fetch_one(&mut **tx)
        .await?;
        Ok(Err(JobTransition::Rescheduled(ReminderJob::try_from(
            rearmed,
        )?)))
    }

    async fn remove(tx: &mut Transaction<'_, Postgres>, job: &ReminderJob) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM reminder_jobs
            WHERE job_uid = $1
            "#,
        )
        .bind(job.id.inner_ref())
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl IReminderJobRepo for PostgresReminderJobRepo {
    async fn schedule(
        &self,
        kind: ReminderKind,
        entity_id: &ID,
        fire_at: i64,
    ) -> anyhow::Result<ReminderJob> {
        let job = ReminderJob::new(kind, entity_id.clone(), fire_at);
        let raw = sqlx::query_as::<_, ReminderJobRaw>(
            r#"
            INSERT INTO reminder_jobs
                (job_uid, kind, entity_uid, fire_at, attempts, state, version)
            VALUES($1, $2, $3, $4, 0, 'pending', 0)
            ON CONFLICT (kind, entity_uid) DO UPDATE
            SET fire_at = EXCLUDED.fire_at,
                version = reminder_jobs.version + 1,
                attempts = CASE
                    WHEN reminder_jobs.state = 'in_flight' THEN reminder_jobs.attempts
                    ELSE 0
                END
            RETURNING *
            "#,
        )
        .bind(job.id.inner_ref())
        .bind(kind.as_str())
        .bind(entity_id.inner_ref())
        .bind(fire_at)
        .fetch_one(&self.pool)
        .await?;

        ReminderJob::try_from(raw)
    }

    async fn cancel(&self, kind: ReminderKind, entity_id: &ID) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            DELETE FROM reminder_jobs
            WHERE kind = $1 AND entity_uid = $2 AND state = 'pending'
            "#,
        )
        .bind(kind.as_str())
        .bind(entity_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn claim_due(&self, now: i64, limit: i64) -> anyhow::Result<Vec<ReminderJob>> {
        // Rows locked by a concurrent claim are skipped, so two claims never
        // return the same job
        let rows = sqlx::query_as::<_, ReminderJobRaw>(
            r#"
            UPDATE reminder_jobs
            SET state = 'in_flight'
            WHERE job_uid IN (
                SELECT job_uid FROM reminder_jobs
                WHERE state = 'pending' AND fire_at <= $1
                ORDER BY fire_at
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            RETURNING *
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut jobs = into_jobs(rows)?;
        // RETURNING does not keep the order of the sub select
        jobs.sort_by_key(|job| job.fire_at);
        Ok(jobs)
    }

    async fn complete(&self, job: &ReminderJob) -> anyhow::Result<JobTransition> {
        let mut tx = self.pool.begin().await?;
        let mut stored = match Self::lock_current(&mut tx, job).await? {
            Ok(stored) => stored,
            Err(transition) => {
                tx.commit().await?;
                return Ok(transition);
            }
        };

        Self::remove(&mut tx, &stored).await?;
        tx.commit().await?;

        stored.attempts += 1;
        stored.state = JobState::Done;
        Ok(JobTransition::Completed(stored))
    }

    async fn fail(
        &self,
        job: &ReminderJob,
        retry_at: i64,
        max_attempts: i32,
    ) -> anyhow::Result<JobTransition> {
        let mut tx = self.pool.begin().await?;
        let mut stored = match Self::lock_current(&mut tx, job).await? {
            Ok(stored) => stored,
            Err(transition) => {
                tx.commit().await?;
                return Ok(transition);
            }
        };

        stored.attempts += 1;
        let transition = if stored.attempts >= max_attempts {
            Self::remove(&mut tx, &stored).await?;
            stored.state = JobState::Abandoned;
            JobTransition::Abandoned(stored)
        } else {
            let raw = sqlx::query_as::<_, ReminderJobRaw>(
                r#"
                UPDATE reminder_jobs
                SET state = 'pending', attempts = $2, fire_at = $3
                WHERE job_uid = $1
                RETURNING *
                "#,
            )
            .bind(stored.id.inner_ref())
            .bind(stored.attempts)
            .bind(retry_at)
            .fetch_one(&mut *tx)
            .await?;
            JobTransition::Retrying(ReminderJob::try_from(raw)?)
        };
        tx.commit().await?;

        Ok(transition)
    }

    async fn recover_in_flight(&self) -> anyhow::Result<u64> {
        let res = sqlx::query(
            r#"
            UPDATE reminder_jobs
            SET state = 'pending'
            WHERE state = 'in_flight'
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }

    async fn find(
        &self,
        kind: ReminderKind,
        entity_id: &ID,
    ) -> anyhow::Result<Option<ReminderJob>> {
        let raw = sqlx::query_as::<_, ReminderJobRaw>(
            r#"
            SELECT * FROM reminder_jobs
            WHERE kind = $1 AND entity_uid = $2
            "#,
        )
        .bind(kind.as_str())
        .bind(entity_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        raw.map(ReminderJob::try_from).transpose()
    }
}
