use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: ID,
    pub name: String,
    pub email: String,
    /// Banned users never receive notifications
    pub banned: bool,
}

impl User {
    pub fn new(name: &str, email: &str) -> Self {
        Self {
            id: Default::default(),
            name: name.to_string(),
            email: email.to_string(),
            banned: false,
        }
    }
}

impl Entity for User {
    fn id(&self) -> &ID {
        &self.id
    }
}
