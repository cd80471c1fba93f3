use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: ID,
    pub name: String,
}

impl Group {
    pub fn new(name: &str) -> Self {
        Self {
            id: Default::default(),
            name: name.to_string(),
        }
    }
}

impl Entity for Group {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// A `User` being a member of a `Group`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub group_id: ID,
    pub user_id: ID,
}
