mod date;
mod delay;
mod event;
mod exam;
mod group;
mod mail;
mod reminder;
mod shared;
mod template;
mod user;

pub use date::format_datetime;
pub use delay::{compute_fire_at, delay_until};
pub use event::StudyEvent;
pub use exam::Exam;
pub use group::{Group, GroupMembership};
pub use mail::{Attachment, MailMessage};
pub use reminder::{JobState, JobTransition, ReminderJob, ReminderKind};
pub use shared::entity::{Entity, InvalidIDError, ID};
pub use template::{RenderedTemplate, Template, TemplateFields};
pub use user::User;
