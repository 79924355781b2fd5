// Domain Layer - Pure lifecycle values

pub mod job;
pub mod multi_error;

// Re-exports
pub use job::JobState;
pub use multi_error::{combine, MultiError};
