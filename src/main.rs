mod telemetry;

use campus_scheduler_api::ReminderScheduler;
use campus_scheduler_infra::setup_context;
use telemetry::{get_subscriber, init_subscriber};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("campus_scheduler".into(), "info".into());
    init_subscriber(subscriber)?;

    let context = setup_context()?;

    let scheduler = ReminderScheduler::new(context);
    scheduler.start().await?;
    info!("Reminder scheduler running, press ctrl-c to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    scheduler.stop().await;

    Ok(())
}
