mod event;
mod exam;
mod templates;

pub use event::EventNotifier;
pub use exam::ExamNotifier;

use campus_scheduler_domain::{ReminderKind, ID};
use campus_scheduler_infra::SchedulerContext;
use std::sync::Arc;
use thiserror::Error;

/// Why a `Notifier` decided there was nothing to deliver. None of these are
/// errors: the reminder is simply no longer applicable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    EntityMissing,
    AlreadyStarted,
    /// The event belongs to a group that no longer exists
    GroupMissing,
    /// The exam owner no longer exists or is banned
    RecipientUnavailable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Delivery was attempted for every recipient
    Delivered { sent: usize, failed: usize },
    Skipped(SkipReason),
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Unable to look up {entity}: {reason}")]
    Lookup { entity: &'static str, reason: String },
    #[error("Unable to deliver mail to {to}: {reason}")]
    Delivery { to: String, reason: String },
}

impl NotifyError {
    fn lookup(entity: &'static str, e: anyhow::Error) -> Self {
        Self::Lookup {
            entity,
            reason: e.to_string(),
        }
    }
}

/// Resolves the current state of the entity a `ReminderJob` is about and
/// delivers the reminder. Everything is fetched again on every call.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(
        &self,
        entity_id: &ID,
        ctx: &SchedulerContext,
    ) -> Result<NotifyOutcome, NotifyError>;
}

/// The `Notifier` used for each `ReminderKind`
#[derive(Clone)]
pub struct Notifiers {
    pub event: Arc<dyn Notifier>,
    pub exam: Arc<dyn Notifier>,
}

impl Notifiers {
    pub fn for_kind(&self, kind: ReminderKind) -> Arc<dyn Notifier> {
        match kind {
            ReminderKind::Event => self.event.clone(),
            ReminderKind::Exam => self.exam.clone(),
        }
    }
}

impl Default for Notifiers {
    fn default() -> Self {
        Self {
            event: Arc::new(EventNotifier {}),
            exam: Arc::new(ExamNotifier {}),
        }
    }
}
