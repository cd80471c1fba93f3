use campus_scheduler_domain::{Exam, Group, GroupMembership, StudyEvent, User};
use campus_scheduler_infra::SchedulerContext;

pub const MINUTE: i64 = 1000 * 60;
pub const HOUR: i64 = 60 * MINUTE;

pub fn email_of(name: &str) -> String {
    format!("{}@campus.example", name.to_lowercase())
}

pub async fn create_user(ctx: &SchedulerContext, name: &str) -> User {
    let user = User::new(name, &email_of(name));
    ctx.repos
        .user_repo
        .insert(&user)
        .await
        .expect("To insert user");
    user
}

pub async fn create_group(ctx: &SchedulerContext, members: &[&User]) -> Group {
    let group = Group::new("Study group");
    ctx.repos
        .group_repo
        .insert(&group)
        .await
        .expect("To insert group");
    for member in members {
        ctx.repos
            .group_repo
            .add_member(&GroupMembership {
                group_id: group.id.clone(),
                user_id: member.id.clone(),
            })
            .await
            .expect("To add member");
    }
    group
}

pub async fn create_event(
    ctx: &SchedulerContext,
    group: &Group,
    participants: &[&User],
    start_ts: i64,
) -> StudyEvent {
    let mut event = StudyEvent::new(group.id.clone(), "Exam preparation", start_ts);
    event.location = "Library, room 2".into();
    event.participants = participants.iter().map(|u| u.id.clone()).collect();
    ctx.repos
        .event_repo
        .insert(&event)
        .await
        .expect("To insert event");
    event
}

pub async fn create_exam(ctx: &SchedulerContext, owner: &User, start_ts: i64) -> Exam {
    let exam = Exam::new(owner.id.clone(), "Linear algebra", start_ts);
    ctx.repos
        .exam_repo
        .insert(&exam)
        .await
        .expect("To insert exam");
    exam
}
