//! Source duration probing via ffprobe.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// Probe a media file's duration in seconds.
///
/// Invokes ffprobe so that it prints exactly one numeric value on stdout.
/// Any other outcome (non-zero exit, unparseable output) is a probe
/// failure; callers use duration only for progress estimation and are
/// expected to fall back to a default rather than abort.
pub async fn video_duration(ffprobe: &Path, media: &Path) -> MediaResult<f64> {
    let output = Command::new(ffprobe)
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(media)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(MediaError::probe_failed(format!(
            "exit code {:?}: {}",
            output.status.code(),
            stderr.trim()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let text = stdout.trim();
    text.parse::<f64>()
        .ok()
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| MediaError::probe_failed(format!("unusable duration output {text:?}")))
}
