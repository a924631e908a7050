//! Render job store and manager.
//!
//! This crate owns job records and their lifecycle: submission creates a
//! queued record, a background run drives the render executor and is the
//! sole writer of that job's status/progress/result, and the boundary
//! layer reads consistent snapshots through the query operations.

pub mod error;
pub mod manager;
pub mod store;

pub use error::{JobError, JobResult};
pub use manager::{JobManager, MAX_ERROR_CHARS};
pub use store::{JobStore, RenderSources};
