// Composite Job - a fixed group of jobs driven as one

use crate::domain::{combine, MultiError};
use crate::error::{JobError, Result};
use crate::port::{Job, StartedJob, Token};
use async_trait::async_trait;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Aggregates child jobs behind the same contract
///
/// `start` is all-or-nothing: if any child fails to start, every child that
/// did start is stopped before `start` returns. `stop` and `wait` reach every
/// child and fold all of their results; nothing is short-circuited. Children
/// are driven concurrently, with no ordering between them. Only the first
/// `start` call reaches the children.
pub struct CompositeJob {
    jobs: Vec<Arc<dyn Job>>,
    started: AtomicBool,
}

impl CompositeJob {
    pub fn new(jobs: Vec<Arc<dyn Job>>) -> Self {
        Self {
            jobs,
            started: AtomicBool::new(false),
        }
    }

    pub fn jobs(&self) -> &[Arc<dyn Job>] {
        &self.jobs
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl FromIterator<Arc<dyn Job>> for CompositeJob {
    fn from_iter<I: IntoIterator<Item = Arc<dyn Job>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl Job for CompositeJob {
    async fn start(&self, token: &Token) -> Result<()> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(JobError::AlreadyStarted);
        }

        // Every child is attempted before any rollback decision is made
        let outcomes = join_all(self.jobs.iter().map(|job| job.start(token))).await;

        let mut errors = MultiError::new();
        let mut started = Vec::with_capacity(self.jobs.len());
        for (job, outcome) in self.jobs.iter().zip(outcomes) {
            if !errors.append(outcome) {
                started.push(job);
            }
        }

        if errors.is_empty() {
            debug!(jobs = self.jobs.len(), "Composite started");
            return Ok(());
        }

        warn!(
            failed = errors.len(),
            rolling_back = started.len(),
            "Composite start failed, stopping started jobs"
        );
        let rollbacks = join_all(started.into_iter().map(|job| job.stop(token))).await;
        for outcome in rollbacks {
            errors.append(outcome);
        }
        errors.into_result()
    }
}

#[async_trait]
impl StartedJob for CompositeJob {
    async fn stop(&self, token: &Token) -> Result<()> {
        combine(join_all(self.jobs.iter().map(|job| job.stop(token))).await)
    }

    async fn wait(&self, token: &Token) -> Result<()> {
        combine(join_all(self.jobs.iter().map(|job| job.wait(token))).await)
    }
}
