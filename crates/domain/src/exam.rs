use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

/// An exam a `User` registered in their personal planner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub id: ID,
    /// The owner, who is the only one reminded about it
    pub user_id: ID,
    pub course: String,
    pub location: String,
    pub start_ts: i64,
}

impl Exam {
    pub fn new(user_id: ID, course: &str, start_ts: i64) -> Self {
        Self {
            id: Default::default(),
            user_id,
            course: course.to_string(),
            location: String::new(),
            start_ts,
        }
    }

    pub fn has_started(&self, now: i64) -> bool {
        self.start_ts <= now
    }
}

impl Entity for Exam {
    fn id(&self) -> &ID {
        &self.id
    }
}
