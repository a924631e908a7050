//! Shared data models for the ShutterCut backend.
//!
//! This crate provides Serde-serializable types for:
//! - Overlay specifications (text, image, video)
//! - Render jobs and their lifecycle states
//! - Encoding configuration

pub mod encoding;
pub mod job;
pub mod overlay;

// Re-export common types
pub use encoding::EncodingConfig;
pub use job::{Job, JobId, JobStatus};
pub use overlay::{Overlay, OverlayError, OverlayKind};
