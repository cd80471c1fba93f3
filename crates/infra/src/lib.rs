mod config;
mod repos;
mod services;
mod system;

pub use config::{Config, MailConfig};
pub use repos::{IEventRepo, IExamRepo, IGroupRepo, IReminderJobRepo, IUserRepo, Repos};
pub use services::*;
use std::sync::Arc;
pub use system::{ISys, ManualSys, RealSys};

#[derive(Clone)]
pub struct SchedulerContext {
    pub repos: Repos,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
    pub mailer: Arc<dyn IMailSender>,
}

struct ContextParams {
    pub postgres_connection_string: String,
}

impl SchedulerContext {
    /// Nothing is connected yet. The database and the mail transport are
    /// opened with `Repos::open` and `IMailSender::open`.
    fn create(params: ContextParams) -> anyhow::Result<Self> {
        let config = Config::new();
        let repos = Repos::create_postgres(&params.postgres_connection_string)?;
        let mailer = SmtpMailSender::new(&config.mail)?;
        Ok(Self {
            repos,
            config,
            sys: Arc::new(RealSys {}),
            mailer: Arc::new(mailer),
        })
    }

    /// Context backed by inmemory repos and mailer, used in tests
    pub fn create_inmemory(sys: Arc<dyn ISys>, mailer: Arc<dyn IMailSender>) -> Self {
        Self {
            repos: Repos::create_inmemory(),
            config: Config::with_defaults(),
            sys,
            mailer,
        }
    }
}

/// Will setup the infrastructure context given the environment
pub fn setup_context() -> anyhow::Result<SchedulerContext> {
    SchedulerContext::create(ContextParams {
        postgres_connection_string: get_psql_connection_string()?,
    })
}

fn get_psql_connection_string() -> anyhow::Result<String> {
    const PSQL_CONNECTION_STRING: &str = "DATABASE_URL";

    std::env::var(PSQL_CONNECTION_STRING)
        .map_err(|_| anyhow::anyhow!("{} env var to be present.", PSQL_CONNECTION_STRING))
}
