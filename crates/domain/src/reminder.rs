use crate::shared::entity::{Entity, ID};
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// What kind of entity a `ReminderJob` reminds about. Together with the
/// entity id it identifies the job: there is never more than one outstanding
/// job for the same `(kind, entity_id)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Event,
    Exam,
}

impl ReminderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Exam => "exam",
        }
    }
}

impl Display for ReminderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "event" => Ok(Self::Event),
            "exam" => Ok(Self::Exam),
            _ => Err(format!("Unknown reminder kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Waiting for `fire_at` to pass
    Pending,
    /// Claimed by the processor, an attempt is running
    InFlight,
    /// Delivered, or determined to be no longer applicable
    Done,
    /// Gave up after reaching the retry ceiling
    Abandoned,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InFlight => "in_flight",
            Self::Done => "done",
            Self::Abandoned => "abandoned",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Abandoned)
    }
}

impl Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_flight" => Ok(Self::InFlight),
            "done" => Ok(Self::Done),
            "abandoned" => Ok(Self::Abandoned),
            _ => Err(format!("Unknown job state: {}", s)),
        }
    }
}

/// A `ReminderJob` is a deferred request to notify about a `StudyEvent`
/// or an `Exam` at `fire_at`.
///
/// The job only holds the id of the entity. Everything needed to build the
/// notification is fetched again when the job fires, because the entity,
/// its participants and their ban status can all change in the meantime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderJob {
    pub id: ID,
    pub kind: ReminderKind,
    /// The `StudyEvent` or `Exam` this job is about
    pub entity_id: ID,
    /// Timestamp in millis at which the job becomes eligible to be claimed
    pub fire_at: i64,
    /// Number of delivery attempts made so far
    pub attempts: i32,
    pub state: JobState,
    /// Incremented every time the job is scheduled again. A running attempt
    /// compares the version it claimed with the stored one to find out if the
    /// job was rescheduled while it was in flight.
    pub version: i64,
}

impl ReminderJob {
    pub fn new(kind: ReminderKind, entity_id: ID, fire_at: i64) -> Self {
        Self {
            id: Default::default(),
            kind,
            entity_id,
            fire_at,
            attempts: 0,
            state: JobState::Pending,
            version: 0,
        }
    }

    pub fn is_due(&self, now: i64) -> bool {
        self.state == JobState::Pending && self.fire_at <= now
    }

    pub fn is_outstanding(&self) -> bool {
        matches!(self.state, JobState::Pending | JobState::InFlight)
    }
}

impl Entity for ReminderJob {
    fn id(&self) -> &ID {
        &self.id
    }
}

/// Result of reporting an attempt back to the job store
#[derive(Debug, Clone, PartialEq)]
pub enum JobTransition {
    /// The job reached `Done` and was removed
    Completed(ReminderJob),
    /// The attempt failed and the job is `Pending` again with a later `fire_at`
    Retrying(ReminderJob),
    /// The attempt failed for the last time, the job was removed
    Abandoned(ReminderJob),
    /// The job was scheduled again while the attempt was running. It is
    /// `Pending` with the new `fire_at` and a fresh attempt counter.
    Rescheduled(ReminderJob),
    /// The job no longer exists in the store
    Missing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_states_and_kinds() {
        for state in [
            JobState::Pending,
            JobState::InFlight,
            JobState::Done,
            JobState::Abandoned,
        ] {
            assert_eq!(state.as_str().parse::<JobState>(), Ok(state));
        }
        assert_eq!("exam".parse::<ReminderKind>(), Ok(ReminderKind::Exam));
        assert!("chat".parse::<ReminderKind>().is_err());
    }

    #[test]
    fn only_pending_jobs_are_due() {
        let mut job = ReminderJob::new(ReminderKind::Event, ID::default(), 100);
        assert!(!job.is_due(99));
        assert!(job.is_due(100));
        job.state = JobState::InFlight;
        assert!(!job.is_due(1000));
        assert!(job.is_outstanding());
    }
}
