// Pre-Start Decorator - runs a step before delegating to the wrapped job

use crate::error::{JobError, Result};
use crate::port::{Job, StartedJob, Token};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

/// Step executed before the wrapped job's `start`
pub type PreStartFn = Box<dyn Fn(Token) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Job that runs a pre-start step, then starts the wrapped job
///
/// If the step fails, the wrapped job is never started and the step's error
/// is returned as is. Only the first `start` call runs the step, whatever its
/// outcome. `stop` and `wait` always go straight to the wrapped job.
pub struct WithPreStart<J> {
    job: J,
    pre_start: PreStartFn,
    started: AtomicBool,
}

/// Decorate `job` with a step that must succeed before it starts
pub fn with_pre_start<J, F, Fut>(job: J, pre_start: F) -> WithPreStart<J>
where
    J: Job,
    F: Fn(Token) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    WithPreStart {
        job,
        pre_start: Box::new(move |token| pre_start(token).boxed()),
        started: AtomicBool::new(false),
    }
}

impl<J> WithPreStart<J> {
    pub fn inner(&self) -> &J {
        &self.job
    }

    pub fn into_inner(self) -> J {
        self.job
    }
}

#[async_trait]
impl<J: Job> Job for WithPreStart<J> {
    async fn start(&self, token: &Token) -> Result<()> {
        if self
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(JobError::AlreadyStarted);
        }
        (self.pre_start)(token.clone()).await?;
        self.job.start(token).await
    }
}

#[async_trait]
impl<J: Job> StartedJob for WithPreStart<J> {
    async fn stop(&self, token: &Token) -> Result<()> {
        self.job.stop(token).await
    }

    async fn wait(&self, token: &Token) -> Result<()> {
        self.job.wait(token).await
    }
}
