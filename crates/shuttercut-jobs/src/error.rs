//! Error types for job operations.

use thiserror::Error;

use shuttercut_models::{JobId, JobStatus};

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Errors surfaced by the job manager's operations.
#[derive(Debug, Error)]
pub enum JobError {
    #[error("job not found: {0}")]
    NotFound(JobId),

    #[error("job {id} is not ready (status: {status})")]
    NotReady { id: JobId, status: JobStatus },

    #[error("invalid overlay spec: {0}")]
    InvalidSpec(String),
}
