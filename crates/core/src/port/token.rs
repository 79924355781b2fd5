// Cancellation Token
// Hierarchical: a child expires when its own handle fires, its deadline
// passes, or its parent expires.

use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

/// Why a token expired
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    #[error("token cancelled")]
    Cancelled,

    #[error("token deadline exceeded")]
    DeadlineExceeded,
}

/// Read side of a cancellation signal, cheap to clone
#[derive(Debug, Clone)]
pub struct Token {
    inner: Arc<TokenInner>,
}

#[derive(Debug)]
struct TokenInner {
    parent: Option<Token>,
    deadline: Option<Instant>,
    cause: watch::Sender<Option<TokenError>>,
}

/// Fires the token it was created with
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: Token,
}

impl Token {
    /// Root token that never expires
    pub fn background() -> Self {
        Self::new(None, None)
    }

    /// Child token expiring when the handle fires or the parent expires
    pub fn with_cancel(parent: &Token) -> (Token, CancelHandle) {
        let token = Self::new(Some(parent.clone()), parent.deadline());
        let handle = CancelHandle {
            token: token.clone(),
        };
        (token, handle)
    }

    /// Child token that additionally expires at `deadline`
    pub fn with_deadline(parent: &Token, deadline: Instant) -> (Token, CancelHandle) {
        let effective = match parent.deadline() {
            Some(inherited) if inherited < deadline => inherited,
            _ => deadline,
        };
        let token = Self::new(Some(parent.clone()), Some(effective));
        let handle = CancelHandle {
            token: token.clone(),
        };
        (token, handle)
    }

    /// Child token that additionally expires after `timeout`
    pub fn with_timeout(parent: &Token, timeout: Duration) -> (Token, CancelHandle) {
        Self::with_deadline(parent, Instant::now() + timeout)
    }

    fn new(parent: Option<Token>, deadline: Option<Instant>) -> Self {
        let (cause, _) = watch::channel(None);
        Self {
            inner: Arc::new(TokenInner {
                parent,
                deadline,
                cause,
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    /// Why the token expired, without blocking. `None` while still live.
    pub fn cause(&self) -> Option<TokenError> {
        if let Some(cause) = *self.inner.cause.borrow() {
            return Some(cause);
        }
        if let Some(deadline) = self.inner.deadline {
            if Instant::now() >= deadline {
                return Some(TokenError::DeadlineExceeded);
            }
        }
        self.inner.parent.as_ref().and_then(Token::cause)
    }

    pub fn is_done(&self) -> bool {
        self.cause().is_some()
    }

    /// Resolves with the cause once the token expires
    pub fn done(&self) -> BoxFuture<'_, TokenError> {
        async move {
            // Subscribe before checking so a cancel in between is not missed
            let mut rx = self.inner.cause.subscribe();
            loop {
                if let Some(cause) = self.cause() {
                    return cause;
                }
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            futures::future::pending::<()>().await;
                        }
                    }
                    _ = sleep_until(self.inner.deadline) => {}
                    _ = parent_done(self.inner.parent.as_ref()) => {}
                }
            }
        }
        .boxed()
    }

    /// True if both values are handles to the same token
    pub fn same_as(&self, other: &Token) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Token {
    fn default() -> Self {
        Self::background()
    }
}

impl CancelHandle {
    /// Expire the token. Later calls keep the first cause.
    pub fn cancel(&self) {
        self.token.inner.cause.send_if_modified(|cause| {
            if cause.is_some() {
                return false;
            }
            *cause = Some(TokenError::Cancelled);
            true
        });
    }

    pub fn token(&self) -> &Token {
        &self.token
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => futures::future::pending().await,
    }
}

async fn parent_done(parent: Option<&Token>) {
    match parent {
        Some(parent) => {
            parent.done().await;
        }
        None => futures::future::pending().await,
    }
}
