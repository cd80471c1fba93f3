use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// An event organized within a `Group`, e.g. a study session.
/// Participants are the `User`s who signed up for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyEvent {
    pub id: ID,
    pub group_id: ID,
    pub title: String,
    pub description: String,
    pub location: String,
    pub start_ts: i64,
    pub participants: Vec<ID>,
}

impl StudyEvent {
    pub fn new(group_id: ID, title: &str, start_ts: i64) -> Self {
        Self {
            id: Default::default(),
            group_id,
            title: title.to_string(),
            description: String::new(),
            location: String::new(),
            start_ts,
            participants: Vec::new(),
        }
    }

    pub fn has_started(&self, now: i64) -> bool {
        self.start_ts <= now
    }
}

impl Entity for StudyEvent {
    fn id(&self) -> &ID {
        &self.id
    }
}
