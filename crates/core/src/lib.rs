// Jobline Core - Lifecycle primitives for long-running background jobs
//
// A job is started once, asked to stop, and awaited. Loop jobs repeat an
// action on a background task, composite jobs start a group all-or-nothing,
// and the pre-start decorator sequences a step before another job starts.

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{start_loop, with_pre_start, CompositeJob, LoopJob, WithPreStart};
pub use domain::{JobState, MultiError};
pub use error::{JobError, Result};
pub use port::{CancelHandle, Job, StartedJob, Token, TokenError};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
