use super::IEventRepo;
use crate::repos::shared::inmemory_repo::*;
use campus_scheduler_domain::{StudyEvent, ID};

pub struct InMemoryEventRepo {
    events: std::sync::Mutex<Vec<StudyEvent>>,
}

impl InMemoryEventRepo {
    pub fn new() -> Self {
        Self {
            events: std::sync::Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl IEventRepo for InMemoryEventRepo {
    async fn insert(&self, e: &StudyEvent) -> anyhow::Result<()> {
        insert(e, &self.events);
        Ok(())
    }

    async fn save(&self, e: &StudyEvent) -> anyhow::Result<()> {
        save(e, &self.events);
        Ok(())
    }

    async fn find(&self, event_id: &ID) -> anyhow::Result<Option<StudyEvent>> {
        Ok(find(event_id, &self.events))
    }

    async fn delete(&self, event_id: &ID) -> anyhow::Result<Option<StudyEvent>> {
        Ok(delete(event_id, &self.events))
    }
}
