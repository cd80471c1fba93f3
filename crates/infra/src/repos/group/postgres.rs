use super::IGroupRepo;
use campus_scheduler_domain::{Group, GroupMembership, ID};
use sqlx::{types::Uuid, FromRow, PgPool};

pub struct PostgresGroupRepo {
    pool: PgPool,
}

impl PostgresGroupRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct GroupRaw {
    group_uid: Uuid,
    name: String,
}

impl From<GroupRaw> for Group {
    fn from(g: GroupRaw) -> Self {
        Self {
            id: g.group_uid.into(),
            name: g.name,
        }
    }
}

#[async_trait::async_trait]
impl IGroupRepo for PostgresGroupRepo {
    async fn insert(&self, group: &Group) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO groups(group_uid, name)
            VALUES($1, $2)
            "#,
        )
        .bind(group.id.inner_ref())
        .bind(&group.name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find(&self, group_id: &ID) -> anyhow::Result<Option<Group>> {
        let group = sqlx::query_as::<_, GroupRaw>(
            r#"
            SELECT * FROM groups
            WHERE group_uid = $1
            "#,
        )
        .bind(group_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(group.map(|g| g.into()))
    }

    async fn delete(&self, group_id: &ID) -> anyhow::Result<Option<Group>> {
        let group = sqlx::query_as::<_, GroupRaw>(
            r#"
            DELETE FROM groups
            WHERE group_uid = $1
            RETURNING *
            "#,
        )
        .bind(group_id.inner_ref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(group.map(|g| g.into()))
    }

    async fn add_member(&self, membership: &GroupMembership) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO group_members(group_uid, user_uid)
            VALUES($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(membership.group_id.inner_ref())
        .bind(membership.user_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_member(&self, membership: &GroupMembership) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            DELETE FROM group_members
            WHERE group_uid = $1 AND user_uid = $2
            "#,
        )
        .bind(membership.group_id.inner_ref())
        .bind(membership.user_id.inner_ref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_member(&self, group_id: &ID, user_id: &ID) -> anyhow::Result<bool> {
        let (is_member,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM group_members
                WHERE group_uid = $1 AND user_uid = $2
            )
            "#,
        )
        .bind(group_id.inner_ref())
        .bind(user_id.inner_ref())
        .fetch_one(&self.pool)
        .await?;

        Ok(is_member)
    }
}
