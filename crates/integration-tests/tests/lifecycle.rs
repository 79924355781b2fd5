//! End-to-end lifecycle of real loop jobs grouped under a composite

use async_trait::async_trait;
use jobline_core::{
    with_pre_start, CompositeJob, Job, JobError, JobState, LoopJob, Result, StartedJob, Token,
    TokenError,
};
use jobline_integration_tests::init_tracing;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn counting_loop(name: &str, counter: &Arc<AtomicUsize>) -> Arc<LoopJob> {
    let counter = Arc::clone(counter);
    Arc::new(LoopJob::named(name, move |_token| {
        counter.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2))
    }))
}

/// Loop job that counts how many `start` calls reach it
struct CountedStarts {
    job: Arc<LoopJob>,
    starts: AtomicUsize,
}

impl CountedStarts {
    fn new(job: Arc<LoopJob>) -> Self {
        Self {
            job,
            starts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl StartedJob for CountedStarts {
    async fn stop(&self, token: &Token) -> Result<()> {
        self.job.stop(token).await
    }

    async fn wait(&self, token: &Token) -> Result<()> {
        self.job.wait(token).await
    }
}

#[async_trait]
impl Job for CountedStarts {
    async fn start(&self, token: &Token) -> Result<()> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.job.start(token).await
    }
}

fn wait_token(timeout: Duration) -> Token {
    Token::with_timeout(&Token::background(), timeout).0
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_group_starts_runs_and_stops_cleanly() {
    init_tracing();

    let polls = Arc::new(AtomicUsize::new(0));
    let consumes = Arc::new(AtomicUsize::new(0));
    let warmups = Arc::new(AtomicUsize::new(0));

    let poller = counting_loop("poller", &polls);
    let consumer = counting_loop("consumer", &consumes);
    let warmed_consumer = {
        let warmups = Arc::clone(&warmups);
        with_pre_start(Arc::clone(&consumer), move |_token| {
            warmups.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
    };

    let group = CompositeJob::new(vec![
        Arc::clone(&poller) as Arc<dyn Job>,
        Arc::new(warmed_consumer) as Arc<dyn Job>,
    ]);

    let token = Token::background();
    assert_ok!(group.start(&token).await);
    assert_eq!(warmups.load(Ordering::SeqCst), 1);

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(polls.load(Ordering::SeqCst) > 0);
    assert!(consumes.load(Ordering::SeqCst) > 0);

    assert_ok!(group.stop(&token).await);
    assert_ok!(group.wait(&wait_token(Duration::from_secs(5))).await);

    assert_eq!(poller.state(), JobState::Stopped);
    assert_eq!(consumer.state(), JobState::Stopped);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_group_start_fails_without_side_effects() {
    init_tracing();

    let counter = Arc::new(AtomicUsize::new(0));
    let a = Arc::new(CountedStarts::new(counting_loop("a", &counter)));
    let b = Arc::new(CountedStarts::new(counting_loop("b", &counter)));
    let group = CompositeJob::new(vec![a.clone() as Arc<dyn Job>, b.clone() as Arc<dyn Job>]);
    let token = Token::background();

    assert_ok!(group.start(&token).await);
    let err = assert_err!(group.start(&token).await);

    assert!(matches!(err, JobError::AlreadyStarted));
    assert_eq!(a.starts.load(Ordering::SeqCst), 1, "child started again");
    assert_eq!(b.starts.load(Ordering::SeqCst), 1, "child started again");
    assert_eq!(a.job.state(), JobState::Running);
    assert_eq!(b.job.state(), JobState::Running);

    assert_ok!(group.stop(&token).await);
    assert_ok!(group.wait(&wait_token(Duration::from_secs(5))).await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_start_token_expiry_surfaces_from_every_child() {
    init_tracing();

    let counter = Arc::new(AtomicUsize::new(0));
    let group = CompositeJob::new(vec![
        counting_loop("a", &counter) as Arc<dyn Job>,
        counting_loop("b", &counter) as Arc<dyn Job>,
    ]);
    let (token, _) = Token::with_timeout(&Token::background(), Duration::from_millis(100));

    assert_ok!(group.start(&token).await);
    let err = assert_err!(group.wait(&wait_token(Duration::from_secs(5))).await);

    assert!(matches!(&err, JobError::Multiple(errors) if errors.len() == 2));
    assert!(err.is(&JobError::Token(TokenError::DeadlineExceeded)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wait_timeout_does_not_stop_the_group() {
    init_tracing();

    let stuck = Arc::new(LoopJob::named("stuck", |token: Token| async move {
        // Cooperative action: returns only once its token expires
        token.done().await;
    }));
    let (token, cancel) = Token::with_cancel(&Token::background());
    let group = CompositeJob::new(vec![Arc::clone(&stuck) as Arc<dyn Job>]);

    assert_ok!(group.start(&token).await);
    let err = assert_err!(group.wait(&wait_token(Duration::from_millis(50))).await);

    assert!(matches!(err, JobError::WaitTimedOut(TokenError::DeadlineExceeded)));
    assert_eq!(stuck.state(), JobState::Running);

    // The action honors its token, so cancelling lets the loop finish
    cancel.cancel();
    let err = assert_err!(group.wait(&wait_token(Duration::from_secs(5))).await);
    assert!(err.is(&JobError::Token(TokenError::Cancelled)));
    assert_eq!(stuck.state(), JobState::Stopped);
}

#[tokio::test]
async fn test_wait_until_stopped_after_stop() {
    init_tracing();

    let counter = Arc::new(AtomicUsize::new(0));
    let job = counting_loop("single", &counter);
    let token = Token::background();

    assert_ok!(job.start(&token).await);
    assert_ok!(job.stop(&token).await);
    assert_ok!(job.wait_until_stopped().await);
    assert_eq!(job.state(), JobState::Stopped);
}
