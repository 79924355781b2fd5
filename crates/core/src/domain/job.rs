// Job Lifecycle State

use serde::{Deserialize, Serialize};

/// Lifecycle of a single-use job
///
/// `NotStarted -> Running -> Stopping -> Stopped`. `Stopped` is terminal and a
/// job never returns to `NotStarted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    NotStarted,
    Running,
    /// Stop requested (or start token expired), terminal result not yet recorded
    Stopping,
    Stopped,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Stopped)
    }

    /// True once `start` has succeeded, whatever happened afterwards
    pub fn has_started(&self) -> bool {
        !matches!(self, JobState::NotStarted)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobState::NotStarted => write!(f, "NOT_STARTED"),
            JobState::Running => write!(f, "RUNNING"),
            JobState::Stopping => write!(f, "STOPPING"),
            JobState::Stopped => write!(f, "STOPPED"),
        }
    }
}
