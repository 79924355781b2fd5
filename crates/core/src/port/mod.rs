// Port Layer - Seams between jobs and their collaborators

pub mod job;
pub mod token;

// Re-exports
pub use job::{Job, StartedJob};
pub use token::{CancelHandle, Token, TokenError};
