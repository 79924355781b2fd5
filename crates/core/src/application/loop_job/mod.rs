// Loop Job - repeats an action on a background task until stopped

mod panic_guard;

pub use panic_guard::{execute_guarded, execute_guarded_async, PanicGuardResult};

use crate::domain::JobState;
use crate::error::{JobError, Result};
use crate::port::{Job, StartedJob, Token};
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use tokio::sync::watch;
use tracing::debug;

/// Unit of work invoked once per loop iteration
pub type Action = Arc<dyn Fn(Token) -> BoxFuture<'static, ()> + Send + Sync>;

/// Job that invokes its action back-to-back until stopped or its start
/// token expires
///
/// Invocations never overlap. A panic inside one invocation is contained and
/// the next iteration runs as if the call had returned normally.
#[derive(Clone)]
pub struct LoopJob {
    inner: Arc<LoopInner>,
}

struct LoopInner {
    name: String,
    action: Action,
    started: AtomicBool,
    start_token: OnceLock<Token>,
    stop_requested: AtomicBool,
    stop: watch::Sender<bool>,
    terminal: watch::Sender<Option<Result<()>>>,
}

impl LoopJob {
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: Fn(Token) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::named("loop", action)
    }

    /// Create a loop whose name is attached to its tracing events
    pub fn named<F, Fut>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(Token) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let action: Action = Arc::new(move |token| action(token).boxed());
        let (stop, _) = watch::channel(false);
        let (terminal, _) = watch::channel(None);
        Self {
            inner: Arc::new(LoopInner {
                name: name.into(),
                action,
                started: AtomicBool::new(false),
                start_token: OnceLock::new(),
                stop_requested: AtomicBool::new(false),
                stop,
                terminal,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> JobState {
        if !self.inner.started.load(Ordering::Acquire) {
            return JobState::NotStarted;
        }
        if self.inner.terminal.borrow().is_some() {
            return JobState::Stopped;
        }
        let token_expired = self.inner.start_token.get().is_some_and(Token::is_done);
        if token_expired || self.inner.stop_requested.load(Ordering::Acquire) {
            return JobState::Stopping;
        }
        JobState::Running
    }
}

impl std::fmt::Debug for LoopJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopJob")
            .field("name", &self.inner.name)
            .field("state", &self.state())
            .finish()
    }
}

/// Create a loop job and start it with `token`
pub async fn start_loop<F, Fut>(token: &Token, action: F) -> Result<LoopJob>
where
    F: Fn(Token) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let job = LoopJob::new(action);
    job.start(token).await?;
    Ok(job)
}

#[async_trait]
impl Job for LoopJob {
    async fn start(&self, token: &Token) -> Result<()> {
        if self
            .inner
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(JobError::AlreadyStarted);
        }

        debug!(job = %self.inner.name, "Spawning loop");
        let _ = self.inner.start_token.set(token.clone());
        tokio::spawn(run_loop(Arc::clone(&self.inner), token.clone()));
        Ok(())
    }
}

#[async_trait]
impl StartedJob for LoopJob {
    async fn stop(&self, _token: &Token) -> Result<()> {
        if !self.inner.started.load(Ordering::Acquire) {
            return Err(JobError::NotYetStarted);
        }
        // Only the first request signals; later ones are no-ops
        if self
            .inner
            .stop_requested
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            debug!(job = %self.inner.name, "Stop requested");
            self.inner.stop.send_replace(true);
        }
        Ok(())
    }

    async fn wait(&self, token: &Token) -> Result<()> {
        if !self.inner.started.load(Ordering::Acquire) {
            return Err(JobError::NotYetStarted);
        }

        let mut terminal = self.inner.terminal.subscribe();
        let finished = async move {
            terminal
                .wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|outcome| outcome.clone())
        };

        // A job that already finished wins over an expired wait token
        tokio::select! {
            biased;
            outcome = finished => outcome.unwrap_or(Ok(())),
            cause = token.done() => Err(JobError::WaitTimedOut(cause)),
        }
    }
}

async fn run_loop(inner: Arc<LoopInner>, token: Token) {
    let mut stop = inner.stop.subscribe();

    let outcome = loop {
        // Stop wins over token expiry when both are observed together
        if *stop.borrow_and_update() {
            break Ok(());
        }
        if let Some(cause) = token.cause() {
            break Err(JobError::Token(cause));
        }

        // Panics are contained per invocation and deliberately discarded
        if let PanicGuardResult::Success(invocation) =
            execute_guarded(|| (inner.action)(token.clone()))
        {
            let _ = execute_guarded_async(invocation).await;
        }

        tokio::task::yield_now().await;
    };

    match &outcome {
        Ok(()) => debug!(job = %inner.name, "Loop stopped"),
        Err(e) => debug!(job = %inner.name, reason = %e, "Loop ended by token"),
    }
    inner.terminal.send_replace(Some(outcome));
}
