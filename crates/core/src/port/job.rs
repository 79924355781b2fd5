// Job Port - the lifecycle contract every job implements

use crate::error::Result;
use crate::port::Token;
use async_trait::async_trait;
use std::sync::Arc;

/// A job that may already be running: it can be asked to stop and awaited
#[async_trait]
pub trait StartedJob: Send + Sync {
    /// Request termination. Does not wait for the job to actually stop.
    ///
    /// # Errors
    /// - `JobError::NotYetStarted` if `start` never succeeded
    async fn stop(&self, token: &Token) -> Result<()>;

    /// Block until the job has stopped or `token` expires, whichever is first
    ///
    /// Returns the job's terminal result. May be called any number of times
    /// and from several callers; each observes the same terminal result.
    ///
    /// # Errors
    /// - the job's terminal error (e.g. `JobError::Token` when its start token expired)
    /// - `JobError::WaitTimedOut` if `token` expired first; the job is unaffected
    async fn wait(&self, token: &Token) -> Result<()>;

    /// `wait` with a token that never expires
    async fn wait_until_stopped(&self) -> Result<()> {
        self.wait(&Token::background()).await
    }
}

/// Single-use lifecycle contract: `start` succeeds at most once
///
/// Implementations:
/// - LoopJob: repeats an action on a background task
/// - CompositeJob: starts a group atomically, rolling back on partial failure
/// - WithPreStart: runs a step before delegating to another job
#[async_trait]
pub trait Job: StartedJob {
    /// Begin the job's work. Returns as soon as the work is launched.
    ///
    /// # Errors
    /// - `JobError::AlreadyStarted` on every call after the first
    async fn start(&self, token: &Token) -> Result<()>;
}

#[async_trait]
impl<J: StartedJob + ?Sized> StartedJob for Arc<J> {
    async fn stop(&self, token: &Token) -> Result<()> {
        (**self).stop(token).await
    }

    async fn wait(&self, token: &Token) -> Result<()> {
        (**self).wait(token).await
    }
}

#[async_trait]
impl<J: Job + ?Sized> Job for Arc<J> {
    async fn start(&self, token: &Token) -> Result<()> {
        (**self).start(token).await
    }
}

#[async_trait]
impl<J: StartedJob + ?Sized> StartedJob for Box<J> {
    async fn stop(&self, token: &Token) -> Result<()> {
        (**self).stop(token).await
    }

    async fn wait(&self, token: &Token) -> Result<()> {
        (**self).wait(token).await
    }
}

#[async_trait]
impl<J: Job + ?Sized> Job for Box<J> {
    async fn start(&self, token: &Token) -> Result<()> {
        (**self).start(token).await
    }
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

#[cfg(any(test, feature = "mocks"))]
pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Operation recorded by [`MockJob`]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MockCall {
        Start,
        Stop,
        Wait,
    }

    /// Shared, ordered log of calls across several mocks
    pub type Journal = Arc<Mutex<Vec<String>>>;

    /// Scripted job: returns preset results and records every call
    pub struct MockJob {
        name: String,
        start_result: Result<()>,
        stop_result: Result<()>,
        wait_result: Result<()>,
        calls: Mutex<Vec<(MockCall, Token)>>,
        journal: Option<Journal>,
    }

    impl MockJob {
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                start_result: Ok(()),
                stop_result: Ok(()),
                wait_result: Ok(()),
                calls: Mutex::new(Vec::new()),
                journal: None,
            }
        }

        pub fn with_start_result(mut self, result: Result<()>) -> Self {
            self.start_result = result;
            self
        }

        pub fn with_stop_result(mut self, result: Result<()>) -> Self {
            self.stop_result = result;
            self
        }

        pub fn with_wait_result(mut self, result: Result<()>) -> Self {
            self.wait_result = result;
            self
        }

        /// Also append `"<name> <call>"` entries to a shared journal
        pub fn with_journal(mut self, journal: Journal) -> Self {
            self.journal = Some(journal);
            self
        }

        pub fn calls(&self) -> Vec<MockCall> {
            self.calls.lock().unwrap().iter().map(|(call, _)| *call).collect()
        }

        pub fn call_count(&self, call: MockCall) -> usize {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(recorded, _)| *recorded == call)
                .count()
        }

        /// Tokens passed to every recorded `call`, in order
        pub fn tokens(&self, call: MockCall) -> Vec<Token> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .filter(|(recorded, _)| *recorded == call)
                .map(|(_, token)| token.clone())
                .collect()
        }

        fn record(&self, call: MockCall, token: &Token) {
            self.calls.lock().unwrap().push((call, token.clone()));
            if let Some(journal) = &self.journal {
                let entry = format!("{} {:?}", self.name, call).to_lowercase();
                journal.lock().unwrap().push(entry);
            }
        }
    }

    #[async_trait]
    impl StartedJob for MockJob {
        async fn stop(&self, token: &Token) -> Result<()> {
            self.record(MockCall::Stop, token);
            self.stop_result.clone()
        }

        async fn wait(&self, token: &Token) -> Result<()> {
            self.record(MockCall::Wait, token);
            self.wait_result.clone()
        }
    }

    #[async_trait]
    impl Job for MockJob {
        async fn start(&self, token: &Token) -> Result<()> {
            self.record(MockCall::Start, token);
            self.start_result.clone()
        }
    }
}
