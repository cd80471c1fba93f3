mod error;
mod job_schedulers;
mod notifiers;
mod reminder;
mod scheduler;
mod shared;

pub use error::SchedulerError;
pub use job_schedulers::{JobOutcome, JobProcessor};
pub use notifiers::{
    EventNotifier, ExamNotifier, Notifier, Notifiers, NotifyError, NotifyOutcome, SkipReason,
};
pub use scheduler::ReminderScheduler;
