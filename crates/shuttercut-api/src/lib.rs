//! Axum HTTP API for the ShutterCut render backend.
//!
//! Thin boundary layer: accepts uploads, creates render jobs, spawns the
//! background run, and exposes status/result queries. All render logic
//! lives in `shuttercut-media` and `shuttercut-jobs`.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
