//! Error types for media operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur during probing and rendering.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("ffmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("ffprobe not found in PATH")]
    FfprobeNotFound,

    #[error("ffmpeg exited with code {exit_code}: {log_tail}")]
    FfmpegFailed { exit_code: i32, log_tail: String },

    #[error("output file missing or too small ({size} bytes): {path}")]
    OutputInvalid { path: PathBuf, size: u64 },

    #[error("ffprobe failed: {message}")]
    ProbeFailed { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create an ffmpeg failure carrying a bounded diagnostic excerpt.
    ///
    /// `exit_code` is -1 when the process was killed by a signal and no
    /// code is available.
    pub fn ffmpeg_failed(exit_code: Option<i32>, log_tail: impl Into<String>) -> Self {
        Self::FfmpegFailed {
            exit_code: exit_code.unwrap_or(-1),
            log_tail: log_tail.into(),
        }
    }

    /// Create a probe failure.
    pub fn probe_failed(message: impl Into<String>) -> Self {
        Self::ProbeFailed {
            message: message.into(),
        }
    }
}
