//! In-memory job registry.
//!
//! An explicit store object, injected wherever job records are read or
//! written; there is no global registry. Each record is logically
//! single-writer (the render run that owns it) with any number of
//! readers; readers always get a cloned snapshot taken under the lock,
//! so a concurrent write can never expose a torn record.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use tracing::warn;

use shuttercut_models::{Job, JobId, JobStatus, Overlay};

/// Everything the render executor needs to run a job.
#[derive(Debug, Clone)]
pub struct RenderSources {
    /// Base video file path
    pub base_video: PathBuf,
    /// Overlay asset file paths, addressable by base filename
    pub assets: Vec<PathBuf>,
    /// Ordered overlay specifications
    pub overlays: Vec<Overlay>,
}

#[derive(Debug)]
struct JobEntry {
    job: Job,
    sources: RenderSources,
}

/// Shared in-memory job store.
#[derive(Debug, Clone, Default)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<JobId, JobEntry>>>,
}

impl JobStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new queued job for the given sources and return its id.
    pub fn create(&self, sources: RenderSources) -> JobId {
        let job = Job::new();
        let id = job.id.clone();
        let mut jobs = self.inner.write().expect("job store lock poisoned");
        jobs.insert(id.clone(), JobEntry { job, sources });
        id
    }

    /// Get a consistent snapshot of a job record.
    pub fn get(&self, id: &JobId) -> Option<Job> {
        let jobs = self.inner.read().expect("job store lock poisoned");
        jobs.get(id).map(|entry| entry.job.clone())
    }

    /// Get a clone of a job's render sources.
    pub fn sources(&self, id: &JobId) -> Option<RenderSources> {
        let jobs = self.inner.read().expect("job store lock poisoned");
        jobs.get(id).map(|entry| entry.sources.clone())
    }

    /// Number of jobs in the store.
    pub fn len(&self) -> usize {
        self.inner.read().expect("job store lock poisoned").len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write only the progress field.
    ///
    /// A no-op for unknown ids and for jobs already in a terminal state;
    /// neither case is an error.
    pub fn update_progress(&self, id: &JobId, progress: f64) {
        let mut jobs = self.inner.write().expect("job store lock poisoned");
        if let Some(entry) = jobs.get_mut(id) {
            if !entry.job.is_terminal() {
                entry.job.set_progress(progress);
            }
        }
    }

    /// Transition Queued -> Processing.
    ///
    /// Returns false (and leaves the record untouched) when the job is
    /// unknown or not in the Queued state; there is no re-entry.
    pub fn mark_processing(&self, id: &JobId) -> bool {
        let mut jobs = self.inner.write().expect("job store lock poisoned");
        match jobs.get_mut(id) {
            Some(entry) if entry.job.status == JobStatus::Queued => {
                entry.job.set_status(JobStatus::Processing);
                true
            }
            Some(entry) => {
                warn!(job_id = %id, status = %entry.job.status, "refusing to start job outside Queued state");
                false
            }
            None => {
                warn!(job_id = %id, "refusing to start unknown job");
                false
            }
        }
    }

    /// Terminal transition to Completed with the rendered output path.
    pub fn complete(&self, id: &JobId, result_path: PathBuf) {
        let mut jobs = self.inner.write().expect("job store lock poisoned");
        if let Some(entry) = jobs.get_mut(id) {
            if !entry.job.is_terminal() {
                entry.job.complete(result_path);
            }
        }
    }

    /// Terminal transition to Failed with a human-readable message.
    pub fn fail(&self, id: &JobId, error: impl Into<String>) {
        let mut jobs = self.inner.write().expect("job store lock poisoned");
        if let Some(entry) = jobs.get_mut(id) {
            if !entry.job.is_terminal() {
                entry.job.fail(error);
            }
        }
    }
}
