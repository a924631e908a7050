//! Application state.

use std::sync::Arc;

use shuttercut_jobs::JobManager;
use shuttercut_media::{MediaResult, RenderExecutor};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub manager: Arc<JobManager>,
}

impl AppState {
    /// Create application state, resolving the render tools and making
    /// sure the upload/result directories exist.
    pub fn new(config: ApiConfig) -> MediaResult<Self> {
        let executor = RenderExecutor::from_env()?;
        std::fs::create_dir_all(&config.upload_dir)?;
        std::fs::create_dir_all(&config.result_dir)?;

        let manager = JobManager::new(executor, config.result_dir.clone());
        Ok(Self {
            config,
            manager: Arc::new(manager),
        })
    }

    /// Build state around an existing manager (used by tests).
    pub fn with_manager(config: ApiConfig, manager: JobManager) -> Self {
        Self {
            config,
            manager: Arc::new(manager),
        }
    }
}
