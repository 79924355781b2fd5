// Application Layer - Concrete jobs

pub mod composite;
pub mod loop_job;
pub mod pre_start;

// Re-exports
pub use composite::CompositeJob;
pub use loop_job::{start_loop, Action, LoopJob};
pub use pre_start::{with_pre_start, PreStartFn, WithPreStart};
