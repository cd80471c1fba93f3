mod event;
mod exam;
mod group;
mod reminder_job;
mod shared;
mod user;

pub use event::{IEventRepo, InMemoryEventRepo, PostgresEventRepo};
pub use exam::{IExamRepo, InMemoryExamRepo, PostgresExamRepo};
pub use group::{IGroupRepo, InMemoryGroupRepo, PostgresGroupRepo};
pub use reminder_job::{IReminderJobRepo, InMemoryReminderJobRepo, PostgresReminderJobRepo};
pub use user::{IUserRepo, InMemoryUserRepo, PostgresUserRepo};

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct Repos {
    pub reminder_job_repo: Arc<dyn IReminderJobRepo>,
    pub event_repo: Arc<dyn IEventRepo>,
    pub exam_repo: Arc<dyn IExamRepo>,
    pub user_repo: Arc<dyn IUserRepo>,
    pub group_repo: Arc<dyn IGroupRepo>,
    pool: Option<PgPool>,
}

impl Repos {
    /// Repos backed by a lazily connected pool. No connection is made until
    /// `open` is called or a query runs.
    pub fn create_postgres(connection_string: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect_lazy(connection_string)?;

        Ok(Self {
            reminder_job_repo: Arc::new(PostgresReminderJobRepo::new(pool.clone())),
            event_repo: Arc::new(PostgresEventRepo::new(pool.clone())),
            exam_repo: Arc::new(PostgresExamRepo::new(pool.clone())),
            user_repo: Arc::new(PostgresUserRepo::new(pool.clone())),
            group_repo: Arc::new(PostgresGroupRepo::new(pool.clone())),
            pool: Some(pool),
        })
    }

    pub fn create_inmemory() -> Self {
        Self {
            reminder_job_repo: Arc::new(InMemoryReminderJobRepo::new()),
            event_repo: Arc::new(InMemoryEventRepo::new()),
            exam_repo: Arc::new(InMemoryExamRepo::new()),
            user_repo: Arc::new(InMemoryUserRepo::new()),
            group_repo: Arc::new(InMemoryGroupRepo::new()),
            pool: None,
        }
    }

    /// Connects to the database and runs the pending migrations. A no-op for
    /// inmemory repos.
    pub async fn open(&self) -> anyhow::Result<()> {
        if let Some(pool) = &self.pool {
            info!("DB CHECKING CONNECTION ...");
            pool.acquire().await?;
            info!("DB CHECKING CONNECTION ... [done]");

            info!("DB EXECUTING MIGRATION ...");
            sqlx::migrate!().run(pool).await?;
            info!("DB EXECUTING MIGRATION ... [done]");
        }
        Ok(())
    }

    /// Closes the connection pool, waiting for checked out connections to
    /// be returned. The pool cannot be opened again. A no-op for inmemory
    /// repos.
    pub async fn close(&self) {
        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("DB connection pool closed");
        }
    }
}
