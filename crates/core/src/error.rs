// Central Error Type for the Job Lifecycle

use crate::domain::MultiError;
use crate::port::TokenError;
use std::sync::Arc;
use thiserror::Error;

/// Error returned by every job operation
///
/// Cloneable so that a job's terminal result can be handed to any number of
/// concurrent waiters.
#[derive(Error, Debug, Clone)]
pub enum JobError {
    #[error("the job has already been started previously")]
    AlreadyStarted,

    #[error("the job has never started yet")]
    NotYetStarted,

    /// The token governing the job expired
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The token passed to `wait` expired before the job stopped
    #[error("wait timed out: {0}")]
    WaitTimedOut(TokenError),

    #[error("{0}")]
    Multiple(MultiError),

    /// Failure reported by a caller-supplied step or job
    #[error("{0}")]
    Other(Arc<dyn std::error::Error + Send + Sync>),
}

/// Result type alias using JobError
pub type Result<T> = std::result::Result<T, JobError>;

#[derive(Error, Debug)]
#[error("{0}")]
struct Message(String);

impl JobError {
    /// Wrap an arbitrary error. Clones of the returned value share identity.
    pub fn other<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        JobError::Other(Arc::new(err))
    }

    /// Build an `Other` error from a plain message
    pub fn message(msg: impl Into<String>) -> Self {
        Self::other(Message(msg.into()))
    }

    /// Membership test: true if `target` is this error or is contained in it.
    ///
    /// `Other` errors compare by identity, so only clones of the same
    /// original value match. A `WaitTimedOut` also matches the token cause
    /// it wraps.
    pub fn is(&self, target: &JobError) -> bool {
        match self {
            JobError::Multiple(errors) => errors.contains(target),
            JobError::WaitTimedOut(cause) => matches!(
                target,
                JobError::WaitTimedOut(c) | JobError::Token(c) if c == cause
            ),
            _ => self.same_as(target),
        }
    }

    fn same_as(&self, other: &JobError) -> bool {
        match (self, other) {
            (JobError::AlreadyStarted, JobError::AlreadyStarted) => true,
            (JobError::NotYetStarted, JobError::NotYetStarted) => true,
            (JobError::Token(a), JobError::Token(b)) => a == b,
            (JobError::Other(a), JobError::Other(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<MultiError> for JobError {
    fn from(errors: MultiError) -> Self {
        JobError::Multiple(errors)
    }
}
