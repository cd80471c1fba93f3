use super::IGroupRepo;
use crate::repos::shared::inmemory_repo::*;
use campus_scheduler_domain::{Group, GroupMembership, ID};
use std::sync::Mutex;

pub struct InMemoryGroupRepo {
    groups: Mutex<Vec<Group>>,
    memberships: Mutex<Vec<GroupMembership>>,
}

impl InMemoryGroupRepo {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(vec![]),
            memberships: Mutex::new(vec![]),
        }
    }
}

#[async_trait::async_trait]
impl IGroupRepo for InMemoryGroupRepo {
    async fn insert(&self, group: &Group) -> anyhow::Result<()> {
        insert(group, &self.groups);
        Ok(())
    }

    async fn find(&self, group_id: &ID) -> anyhow::Result<Option<Group>> {
        Ok(find(group_id, &self.groups))
    }

    async fn delete(&self, group_id: &ID) -> anyhow::Result<Option<Group>> {
        find_and_delete_by(&self.memberships, |m| &m.group_id == group_id);
        Ok(delete(group_id, &self.groups))
    }

    async fn add_member(&self, membership: &GroupMembership) -> anyhow::Result<()> {
        let mut memberships = self.memberships.lock().unwrap();
        if !memberships.contains(membership) {
            memberships.push(membership.clone());
        }
        Ok(())
    }

    async fn remove_member(&self, membership: &GroupMembership) -> anyhow::Result<()> {
        find_and_delete_by(&self.memberships, |m| m == membership);
        Ok(())
    }

    async fn is_member(&self, group_id: &ID, user_id: &ID) -> anyhow::Result<bool> {
        let found = find_by(&self.memberships, |m| {
            &m.group_id == group_id && &m.user_id == user_id
        });
        Ok(!found.is_empty())
    }
}
