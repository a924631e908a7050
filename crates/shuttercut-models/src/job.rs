//! Render job records and lifecycle states.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a render job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Render job lifecycle state.
///
/// Transitions are strictly `Queued -> Processing -> {Completed, Failed}`;
/// there is no retry and no re-entry from a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Job is queued waiting to be run
    #[default]
    Queued,
    /// Job is actively rendering
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed with an error
    Failed,
}

impl JobStatus {
    /// Get string representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A render job record.
///
/// Created at submission and mutated only by the render run that owns it:
/// status moves to Processing, progress rises monotonically, then exactly
/// one terminal transition sets Completed (with result path) or Failed
/// (with error message).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Current lifecycle state
    #[serde(default)]
    pub status: JobStatus,

    /// Progress percentage (0.0 - 100.0)
    #[serde(default)]
    pub progress: f64,

    /// Error message if the job failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    /// Path of the rendered output, set on completion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result_path: Option<PathBuf>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Create a new queued job with a fresh ID.
    pub fn new() -> Self {
        Self::with_id(JobId::new())
    }

    /// Create a new queued job with a given ID.
    pub fn with_id(id: JobId) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: JobStatus::Queued,
            progress: 0.0,
            error_message: None,
            result_path: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Update the status and bump the updated_at timestamp.
    pub fn set_status(&mut self, status: JobStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Update progress.
    ///
    /// Values are clamped to [0, 100] and decreases are ignored, so
    /// observed progress is always monotonically non-decreasing.
    pub fn set_progress(&mut self, progress: f64) {
        self.progress = self.progress.max(progress.clamp(0.0, 100.0));
        self.updated_at = Utc::now();
    }

    /// Mark the job as completed with its rendered output.
    pub fn complete(&mut self, result_path: PathBuf) {
        self.status = JobStatus::Completed;
        self.progress = 100.0;
        self.result_path = Some(result_path);
        self.updated_at = Utc::now();
    }

    /// Mark the job as failed with an error message.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.status = JobStatus::Failed;
        self.error_message = Some(error.into());
        self.updated_at = Utc::now();
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_creation() {
        let job = Job::new();
        assert_eq!(job.status, JobStatus::Queued);
        assert!((job.progress - 0.0).abs() < f64::EPSILON);
        assert!(!job.is_terminal());
    }

    #[test]
    fn test_job_state_transitions() {
        let mut job = Job::new();

        job.set_status(JobStatus::Processing);
        assert_eq!(job.status, JobStatus::Processing);
        assert!(!job.is_terminal());

        job.set_progress(50.0);
        assert!((job.progress - 50.0).abs() < f64::EPSILON);

        job.complete(PathBuf::from("/results/out.mp4"));
        assert_eq!(job.status, JobStatus::Completed);
        assert!((job.progress - 100.0).abs() < f64::EPSILON);
        assert!(job.is_terminal());
        assert!(job.result_path.is_some());
    }

    #[test]
    fn test_job_failure() {
        let mut job = Job::new();
        job.set_status(JobStatus::Processing);
        job.fail("ffmpeg exited with code 1");

        assert_eq!(job.status, JobStatus::Failed);
        assert!(job.is_terminal());
        assert_eq!(job.error_message.as_deref(), Some("ffmpeg exited with code 1"));
    }

    #[test]
    fn test_progress_is_monotonic_and_clamped() {
        let mut job = Job::new();
        job.set_progress(42.0);
        job.set_progress(17.0);
        assert!((job.progress - 42.0).abs() < f64::EPSILON);

        job.set_progress(250.0);
        assert!((job.progress - 100.0).abs() < f64::EPSILON);
    }
}
