use campus_scheduler_api::{Notifiers, ReminderScheduler};
use campus_scheduler_infra::{InMemoryMailSender, ManualSys, SchedulerContext};
use std::sync::Arc;

/// 2024-03-01T00:00:00Z
pub const START_OF_TEST: i64 = 1_709_251_200_000;

pub struct TestApp {
    pub scheduler: ReminderScheduler,
    pub ctx: SchedulerContext,
    pub sys: Arc<ManualSys>,
    pub mailer: Arc<InMemoryMailSender>,
}

/// Scheduler backed by inmemory repos, an inmemory mailer and a clock that
/// only moves when the test says so
pub fn spawn_app() -> TestApp {
    spawn_app_with_notifiers(Notifiers::default())
}

pub fn spawn_app_with_notifiers(notifiers: Notifiers) -> TestApp {
    spawn_app_with(notifiers, |_| {})
}

/// Lets the test swap config values or repos before the scheduler is built
pub fn spawn_app_with_context(configure: impl FnOnce(&mut SchedulerContext)) -> TestApp {
    spawn_app_with(Notifiers::default(), configure)
}

fn spawn_app_with(
    notifiers: Notifiers,
    configure: impl FnOnce(&mut SchedulerContext),
) -> TestApp {
    let sys = Arc::new(ManualSys::new(START_OF_TEST));
    let mailer = Arc::new(InMemoryMailSender::new());
    let mut ctx = SchedulerContext::create_inmemory(sys.clone(), mailer.clone());
    configure(&mut ctx);
    let scheduler = ReminderScheduler::with_notifiers(ctx.clone(), notifiers);

    TestApp {
        scheduler,
        ctx,
        sys,
        mailer,
    }
}
