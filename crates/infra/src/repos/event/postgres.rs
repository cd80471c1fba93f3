use super::IEventRepo;
use campus_scheduler_domain::{StudyEvent, ID};
use sqlx::{types::Uuid, FromRow, PgPool, Postgres, Transaction};

pub struct PostgresEventRepo {
    pool: PgPool,
}

impl PostgresEventRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct EventRaw {
    event_uid: Uuid,
    group_uid: Uuid,
    title: String,
    description: String,
    location: String,
    start_ts: i64,
    participants: Vec<Uuid>,
}

impl From<EventRaw> for StudyEvent {
    fn from(e: EventRaw) -> Self {
        Self {
            id: e.event_uid.into(),
            group_id: e.group_uid.into(),
            title: e.title,
            description: e.description,
            location: e.location,
            start_ts: e.start_ts,
            participants: e.participants.into_iter().map(|id| id.into()).collect(),
        }
    }
}

async fn replace_participants(
    tx: &mut Transaction<'_, Postgres>,
    e: &StudyEvent,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        DELETE FROM event_participants
        WHERE event_uid = $1
        "#,
    )
    .bind(e.id.inner_ref())
    .execute(&mut **tx)
    .await?;

    let participants = e
        .participants
        .iter()
        .map(|id| *id.inner_ref())
        .collect::<Vec<_>>();
    sqlx::query(
        r#"
        INSERT INTO event_participants(event_uid, user_uid)
        SELECT $1, participant FROM UNNEST($2::uuid[]) AS participant
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(e.id.inner_ref())
    .bind(&participants)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[async_trait::async_trait]
impl IEventRepo for PostgresEventRepo {
    async fn insert(&self, e: &StudyEvent) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO events(event_uid, group_uid, title, description, location, start_ts)
            VALUES($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(e.group_id.inner_ref())
        .bind(&e.title)
        .bind(&e.description)
        .bind(&e.location)
        .bind(e.start_ts)
        .execute(&mut *tx)
        .await?;
        replace_participants(&mut tx, e).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn save(&self, e: &StudyEvent) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            UPDATE events
            SET group_uid = $2,
            title = $3,
            description = $4,
            location = $5,
            start_ts = $6
            WHERE event_uid = $1
            "#,
        )
        .bind(e.id.inner_ref())
        .bind(e.group_id.inner_ref())
        .bind(&e.title)
        .bind(&e.description)
        .bind(&e.location)
        .bind(e.start_ts)
        .execute(&mut *tx)
        .await?;
        replace_participants(&mut tx, e).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn find(&self, event_id: &ID) -> anyhow::Result<Option<StudyEvent>> {
        let event = sqlx::query_as::<_, EventRaw>(
            r#"
            SELECT e.*,
                COALESCE(
                    array_agg(p.user_uid) FILTER (WHERE p.user_uid IS NOT NULL),
                    '{}'
                ) AS participants
            FROM events AS e
            LEFT JOIN event_participants AS p ON p.event_uid = e.event_uid
            WHERE e.event_uid = $1
            GROUP BY e.event_uid
            "#,
        )
        .bind(event_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(event.map(|e| e.into()))
    }

    async fn delete(&self, event_id: &ID) -> anyhow::Result<Option<StudyEvent>> {
        let event = match self.find(event_id).await? {
            Some(event) => event,
            None => return Ok(None),
        };
        // Participants are removed by the foreign key cascade
        sqlx::query(
            r#"
            DELETE FROM events
            WHERE event_uid = $1
            "#,
        )
        .bind(event_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(Some(event))
    }
}
