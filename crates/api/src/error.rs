use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchedulerError {
    /// The job store could not be reached. The request was not recorded and
    /// should be retried.
    #[error("The reminder job store is unavailable. Error message: `{0}`")]
    StoreUnavailable(String),
    /// The mail transport could not be set up when starting
    #[error("The mail transport is unavailable. Error message: `{0}`")]
    MailUnavailable(String),
    /// A configured value cannot be used
    #[error("Invalid scheduler configuration: `{0}`")]
    InvalidConfig(String),
    /// `stop` was called. The connections are released for good.
    #[error("The reminder scheduler has been stopped")]
    Stopped,
}

impl SchedulerError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::StoreUnavailable(_) | Self::MailUnavailable(_) => true,
            Self::InvalidConfig(_) | Self::Stopped => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_are_retryable() {
        let e = SchedulerError::StoreUnavailable("connection refused".into());
        assert!(e.is_retryable());
        assert_eq!(
            e.to_string(),
            "The reminder job store is unavailable. Error message: `connection refused`"
        );
    }

    #[test]
    fn stopped_is_final() {
        assert!(!SchedulerError::Stopped.is_retryable());
        assert!(SchedulerError::MailUnavailable("tls".into()).is_retryable());
    }
}
