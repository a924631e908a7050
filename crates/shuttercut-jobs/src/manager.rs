//! Job manager: submission, background runs, and queries.

use std::path::PathBuf;

use tracing::{error, info, warn};

use shuttercut_media::RenderExecutor;
use shuttercut_models::{Job, JobId, JobStatus, Overlay};

use crate::error::{JobError, JobResult};
use crate::store::{JobStore, RenderSources};

/// Upper bound on stored error strings; raw tool diagnostics are
/// truncated so the boundary layer never sees unbounded internals.
pub const MAX_ERROR_CHARS: usize = 1000;

/// Owns job records and drives renders as units of background work.
///
/// `create` is synchronous and returns immediately; the caller schedules
/// `run` on a background task. During a run, the manager is the sole
/// writer of that job's status/progress/result fields.
#[derive(Debug, Clone)]
pub struct JobManager {
    store: JobStore,
    executor: RenderExecutor,
    result_dir: PathBuf,
}

impl JobManager {
    /// Create a manager rendering into `result_dir`.
    pub fn new(executor: RenderExecutor, result_dir: impl Into<PathBuf>) -> Self {
        Self {
            store: JobStore::new(),
            executor,
            result_dir: result_dir.into(),
        }
    }

    /// The underlying job store.
    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Submit a render job.
    ///
    /// Validates every overlay spec up front — a malformed spec is
    /// rejected here, before any external tool is invoked — then stores
    /// a Queued record and returns its id immediately.
    pub fn create(
        &self,
        base_video: PathBuf,
        assets: Vec<PathBuf>,
        overlays: Vec<Overlay>,
    ) -> JobResult<JobId> {
        for (i, overlay) in overlays.iter().enumerate() {
            overlay
                .validate()
                .map_err(|e| JobError::InvalidSpec(format!("overlay {i}: {e}")))?;
        }

        let id = self.store.create(RenderSources {
            base_video,
            assets,
            overlays,
        });
        info!(job_id = %id, "job created");
        Ok(id)
    }

    /// Run a queued job to completion.
    ///
    /// Transitions Queued -> Processing, invokes the render executor with
    /// progress forwarded into the store, then writes exactly one
    /// terminal transition. Errors are recorded on the job record rather
    /// than returned; a job that is unknown or not Queued is left
    /// untouched.
    pub async fn run(&self, job_id: &JobId) {
        let Some(sources) = self.store.sources(job_id) else {
            warn!(job_id = %job_id, "run requested for unknown job");
            return;
        };
        if !self.store.mark_processing(job_id) {
            return;
        }

        let output = self.result_dir.join(format!("{job_id}.mp4"));

        let progress_store = self.store.clone();
        let progress_id = job_id.clone();
        let result = self
            .executor
            .render(
                job_id,
                &sources.base_video,
                &sources.assets,
                &sources.overlays,
                &output,
                move |percent| progress_store.update_progress(&progress_id, percent),
            )
            .await;

        match result {
            Ok(path) => {
                info!(job_id = %job_id, path = %path.display(), "job completed");
                self.store.complete(job_id, path);
            }
            Err(e) => {
                error!(job_id = %job_id, error = %e, "job failed");
                self.store.fail(job_id, truncate_chars(&e.to_string(), MAX_ERROR_CHARS));
            }
        }
    }

    /// Read-only job snapshot.
    pub fn get_status(&self, job_id: &JobId) -> JobResult<Job> {
        self.store
            .get(job_id)
            .ok_or_else(|| JobError::NotFound(job_id.clone()))
    }

    /// Path of the rendered output for a completed job.
    pub fn get_result(&self, job_id: &JobId) -> JobResult<PathBuf> {
        let job = self.get_status(job_id)?;
        match (job.status, job.result_path) {
            (JobStatus::Completed, Some(path)) => Ok(path),
            (status, _) => Err(JobError::NotReady {
                id: job_id.clone(),
                status,
            }),
        }
    }
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
