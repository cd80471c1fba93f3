use chrono_tz::Tz;
use std::{str::FromStr, time::Duration};
use tracing::warn;

#[derive(Debug, Clone)]
pub struct Config {
    /// How long before a `StudyEvent` starts its participants are reminded
    pub event_lead_time: Duration,
    /// How long before an `Exam` starts its owner is reminded
    pub exam_lead_time: Duration,
    /// Period of the job processor. This bounds how late a reminder can be
    /// delivered when the processor is idle.
    pub tick_interval: Duration,
    /// A job is abandoned when this many attempts have failed
    pub max_attempts: i32,
    /// Delay added to `fire_at` before a failed job can be claimed again
    pub retry_backoff: Duration,
    /// Maximum number of jobs claimed in a single tick
    pub claim_batch_size: i64,
    /// Maximum number of jobs being dispatched at the same time
    pub max_concurrent_dispatches: usize,
    /// Timezone used when rendering timestamps in mails
    pub timezone: Tz,
    pub mail: MailConfig,
}

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    /// Sender of all reminder mails, e.g. "Campus <no-reply@campus.example>"
    pub from: String,
}

impl Config {
    pub fn new() -> Self {
        let event_lead_time = parse_minutes("EVENT_REMINDER_LEAD_MINUTES", 60);
        let exam_lead_time = parse_minutes("EXAM_REMINDER_LEAD_MINUTES", 60 * 24);
        let tick_interval_secs = parse_env("REMINDER_TICK_INTERVAL_SECS", 10u64);
        let retry_backoff_secs = parse_env("REMINDER_RETRY_BACKOFF_SECS", 60u64);

        let max_attempts = match parse_env("REMINDER_MAX_ATTEMPTS", 3i32) {
            attempts if attempts < 1 => {
                warn!(
                    "REMINDER_MAX_ATTEMPTS must be at least 1, got: {}. Falling back to 1.",
                    attempts
                );
                1
            }
            attempts => attempts,
        };

        Self {
            event_lead_time,
            exam_lead_time,
            tick_interval: Duration::from_secs(tick_interval_secs.max(1)),
            max_attempts,
            retry_backoff: Duration::from_secs(retry_backoff_secs),
            claim_batch_size: parse_env("REMINDER_CLAIM_BATCH_SIZE", 100i64).max(1),
            max_concurrent_dispatches: parse_env("REMINDER_MAX_CONCURRENT_DISPATCHES", 8usize)
                .max(1),
            timezone: parse_env("REMINDER_TIMEZONE", Tz::UTC),
            mail: MailConfig::new(),
        }
    }

    /// Config with the default values, independent of the environment.
    /// Used when running against inmemory repos.
    pub fn with_defaults() -> Self {
        Self {
            event_lead_time: Duration::from_secs(60 * 60),
            exam_lead_time: Duration::from_secs(60 * 60 * 24),
            tick_interval: Duration::from_secs(10),
            max_attempts: 3,
            retry_backoff: Duration::from_secs(60),
            claim_batch_size: 100,
            max_concurrent_dispatches: 8,
            timezone: Tz::UTC,
            mail: MailConfig {
                smtp_host: "localhost".into(),
                smtp_port: 587,
                smtp_username: None,
                smtp_password: None,
                from: "Campus <no-reply@campus.example>".into(),
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl MailConfig {
    fn new() -> Self {
        Self {
            smtp_host: std::env::var("SMTP_HOST").unwrap_or_else(|_| "localhost".into()),
            smtp_port: parse_env("SMTP_PORT", 587u16),
            smtp_username: std::env::var("SMTP_USERNAME").ok(),
            smtp_password: std::env::var("SMTP_PASSWORD").ok(),
            from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "Campus <no-reply@campus.example>".into()),
        }
    }
}

/// Lead times are subtracted from millisecond timestamps, so they must fit
/// in an `i64` of millis
const MAX_LEAD_MINUTES: u64 = i64::MAX as u64 / (60 * 1000);

fn parse_minutes(name: &str, default: u64) -> Duration {
    let minutes = match parse_env(name, default) {
        minutes if minutes > MAX_LEAD_MINUTES => {
            warn!(
                "The given {}: {} is too large, falling back to the default: {}.",
                name, minutes, default
            );
            default
        }
        minutes => minutes,
    };
    Duration::from_secs(minutes * 60)
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display,
{
    match std::env::var(name) {
        Ok(value) => match value.parse::<T>() {
            Ok(parsed) => parsed,
            Err(_) => {
                warn!(
                    "The given {}: {} is not valid, falling back to the default: {}.",
                    name, value, default
                );
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_on_invalid_values() {
        std::env::set_var("CAMPUS_TEST_INVALID_NUMBER", "ten");
        assert_eq!(parse_env("CAMPUS_TEST_INVALID_NUMBER", 10u64), 10);
        std::env::set_var("CAMPUS_TEST_VALID_NUMBER", "42");
        assert_eq!(parse_env("CAMPUS_TEST_VALID_NUMBER", 10u64), 42);
        assert_eq!(parse_env("CAMPUS_TEST_MISSING_TZ", Tz::UTC), Tz::UTC);
    }

    #[test]
    fn falls_back_to_default_on_huge_lead_time() {
        std::env::set_var("CAMPUS_TEST_HUGE_LEAD", u64::MAX.to_string());
        assert_eq!(
            parse_minutes("CAMPUS_TEST_HUGE_LEAD", 60),
            Duration::from_secs(3600)
        );
        std::env::set_var("CAMPUS_TEST_LARGE_LEAD", MAX_LEAD_MINUTES.to_string());
        let lead = parse_minutes("CAMPUS_TEST_LARGE_LEAD", 60);
        assert!(i64::try_from(lead.as_millis()).is_ok());
    }

    #[test]
    fn default_lead_times() {
        let config = Config::with_defaults();
        assert_eq!(config.event_lead_time, Duration::from_secs(3600));
        assert_eq!(config.exam_lead_time, Duration::from_secs(86400));
        assert_eq!(config.max_attempts, 3);
    }
}
