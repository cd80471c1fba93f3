mod inmemory;
mod postgres;

pub use inmemory::InMemoryEventRepo;
pub use postgres::PostgresEventRepo;

use campus_scheduler_domain::{StudyEvent, ID};

#[async_trait::async_trait]
pub trait IEventRepo: Send + Sync {
    /// Inserts the event together with its participants
    async fn insert(&self, e: &StudyEvent) -> anyhow::Result<()>;
    /// Replaces the stored event and its participant list
    async fn save(&self, e: &StudyEvent) -> anyhow::Result<()>;
    async fn find(&self, event_id: &ID) -> anyhow::Result<Option<StudyEvent>>;
    async fn delete(&self, event_id: &ID) -> anyhow::Result<Option<StudyEvent>>;
}
