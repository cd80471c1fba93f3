mod inmemory;
mod postgres;

pub use inmemory::InMemoryGroupRepo;
pub use postgres::PostgresGroupRepo;

use campus_scheduler_domain::{Group, GroupMembership, ID};

#[async_trait::async_trait]
pub trait IGroupRepo: Send + Sync {
    async fn insert(&self, group: &Group) -> anyhow::Result<()>;
    async fn find(&self, group_id: &ID) -> anyhow::Result<Option<Group>>;
    async fn delete(&self, group_id: &ID) -> anyhow::Result<Option<Group>>;
    /// Adding an existing membership is a no-op
    async fn add_member(&self, membership: &GroupMembership) -> anyhow::Result<()>;
    async fn remove_member(&self, membership: &GroupMembership) -> anyhow::Result<()>;
    async fn is_member(&self, group_id: &ID, user_id: &ID) -> anyhow::Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memberships() {
        let repo = InMemoryGroupRepo::new();
        let group = Group::new("Compilers study group");
        repo.insert(&group).await.expect("To insert group");

        let membership = GroupMembership {
            group_id: group.id.clone(),
            user_id: ID::default(),
        };
        repo.add_member(&membership).await.unwrap();
        repo.add_member(&membership).await.unwrap();
        assert!(repo
            .is_member(&group.id, &membership.user_id)
            .await
            .unwrap());
        assert!(!repo.is_member(&group.id, &ID::default()).await.unwrap());

        repo.remove_member(&membership).await.unwrap();
        assert!(!repo
            .is_member(&group.id, &membership.user_id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn deleting_group_removes_memberships() {
        let repo = InMemoryGroupRepo::new();
        let group = Group::new("Chess club");
        repo.insert(&group).await.unwrap();
        let user_id = ID::default();
        repo.add_member(&GroupMembership {
            group_id: group.id.clone(),
            user_id: user_id.clone(),
        })
        .await
        .unwrap();

        assert!(repo.delete(&group.id).await.unwrap().is_some());
        assert!(repo.find(&group.id).await.unwrap().is_none());
        assert!(!repo.is_member(&group.id, &user_id).await.unwrap());
    }
}
