use super::IExamRepo;
use campus_scheduler_domain::{Exam, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresExamRepo {
    pool: PgPool,
}

impl PostgresExamRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct ExamRaw {
    exam_uid: Uuid,
    user_uid: Uuid,
    course: String,
    location: String,
    start_ts: i64,
}

impl From<ExamRaw> for Exam {
    fn from(e: ExamRaw) -> Self {
        Self {
            id: e.exam_uid.into(),
            user_id: e.user_uid.into(),
            course: e.course,
            location: e.location,
            start_ts: e.start_ts,
        }
    }
}

#[async_trait::async_trait]
impl IExamRepo for PostgresExamRepo {
    async fn insert(&self, exam: &Exam) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO exams(exam_uid, user_uid, course, location, start_ts)
            VALUES($1, $2, $3, $4, $5)
            "#,
        )
        .bind(exam.id.inner_ref())
        .bind(exam.user_id.inner_ref())
        .bind(&exam.course)
        .bind(&exam.location)
        .bind(exam.start_ts)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn save(&self, exam: &Exam) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE exams
            SET user_uid = $2,
            course = $3,
            location = $4,
            start_ts = $5
            WHERE exam_uid = $1
            "#,
        )
        .bind(exam.id.inner_ref())
        .bind(exam.user_id.inner_ref())
        .bind(&exam.course)
        .bind(&exam.location)
        .bind(exam.start_ts)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, exam_id: &ID) -> anyhow::Result<Option<Exam>> {
        let exam = sqlx::query_as::<_, ExamRaw>(
            r#"
            SELECT * FROM exams
            WHERE exam_uid = $1
            "#,
        )
        .bind(exam_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(exam.map(|e| e.into()))
    }

    async fn delete(&self, exam_id: &ID) -> anyhow::Result<Option<Exam>> {
        let exam = sqlx::query_as::<_, ExamRaw>(
            r#"
            DELETE FROM exams
            WHERE exam_uid = $1
            RETURNING *
            "#,
        )
        .bind(exam_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(exam.map(|e| e.into()))
    }
}
