pub mod cancel_reminder;
pub mod schedule_reminder;
