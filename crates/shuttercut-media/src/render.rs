//! Render executor: drives one ffmpeg run end-to-end.
//!
//! Probes the source duration, compiles the overlay graph, builds the
//! ffmpeg invocation, supervises the process while translating its
//! diagnostic stream into a monotonic completion percentage, and
//! validates the output file.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use shuttercut_models::{EncodingConfig, JobId, Overlay};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::filtergraph::compile;
use crate::probe::video_duration;
use crate::progress::ProgressTracker;

/// Duration assumed when the probe fails; only affects progress
/// estimation, never correctness.
pub const DEFAULT_DURATION_SECS: f64 = 10.0;

/// Outputs below this size are treated as failed renders.
pub const MIN_OUTPUT_BYTES: u64 = 100;

/// How many characters of ffmpeg output are kept for diagnostics.
pub const LOG_TAIL_CHARS: usize = 1000;

/// Executes renders against resolved ffmpeg/ffprobe binaries.
#[derive(Debug, Clone)]
pub struct RenderExecutor {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    encoding: EncodingConfig,
    min_output_bytes: u64,
}

impl RenderExecutor {
    /// Resolve tools from `FFMPEG_PATH`/`FFPROBE_PATH` or the PATH.
    pub fn from_env() -> MediaResult<Self> {
        let ffmpeg = match std::env::var_os("FFMPEG_PATH") {
            Some(path) => PathBuf::from(path),
            None => which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?,
        };
        let ffprobe = match std::env::var_os("FFPROBE_PATH") {
            Some(path) => PathBuf::from(path),
            None => which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?,
        };
        Ok(Self::with_tools(ffmpeg, ffprobe))
    }

    /// Create an executor with explicit tool paths.
    pub fn with_tools(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
            encoding: EncodingConfig::default(),
            min_output_bytes: MIN_OUTPUT_BYTES,
        }
    }

    /// Override the encoding configuration.
    pub fn with_encoding(mut self, encoding: EncodingConfig) -> Self {
        self.encoding = encoding;
        self
    }

    /// Render `base` with `overlays` composited onto it.
    ///
    /// `assets` are the overlay asset files, addressable from overlay
    /// specs by base filename. `on_progress` receives a monotonically
    /// non-decreasing percentage; 100 is delivered exactly once, after
    /// the process has exited and the output has been validated.
    pub async fn render<F>(
        &self,
        job_id: &JobId,
        base: &Path,
        assets: &[PathBuf],
        overlays: &[Overlay],
        output: &Path,
        on_progress: F,
    ) -> MediaResult<PathBuf>
    where
        F: Fn(f64) + Send + Sync,
    {
        let duration = match video_duration(&self.ffprobe, base).await {
            Ok(secs) => secs,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "duration probe failed, assuming {DEFAULT_DURATION_SECS}s");
                DEFAULT_DURATION_SECS
            }
        };
        debug!(job_id = %job_id, duration, "probed source duration");

        let mut inputs = Vec::with_capacity(assets.len() + 1);
        inputs.push(base.to_path_buf());
        inputs.extend(assets.iter().cloned());

        let graph = compile(&inputs, overlays);

        let mut cmd = FfmpegCommand::new(output).inputs(&inputs);
        if graph.is_empty() {
            // No compositing required: direct stream copy fast path.
            cmd = cmd.stream_copy();
        } else {
            cmd = cmd
                .filter_complex(graph.to_filter_complex())
                .map(graph.map_arg())
                .map("0:a?")
                .encode_with(&self.encoding);
        }

        let args = cmd.build_args();
        info!(
            job_id = %job_id,
            stages = graph.stages.len(),
            reencode = !graph.is_empty(),
            "starting render: ffmpeg {}",
            args.join(" ")
        );

        let mut child = Command::new(&self.ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()?;

        let stderr = child.stderr.take().expect("stderr not captured");
        let mut tracker = ProgressTracker::new(duration);
        let mut tail = String::new();

        consume_diagnostics(stderr, &mut tail, |line| {
            if let Some(percent) = tracker.observe_line(line) {
                on_progress(percent);
            }
        })
        .await?;

        let status = child.wait().await?;
        if !status.success() {
            return Err(MediaError::ffmpeg_failed(status.code(), tail));
        }

        let size = tokio::fs::metadata(output).await.map(|m| m.len()).unwrap_or(0);
        if size < self.min_output_bytes {
            return Err(MediaError::OutputInvalid {
                path: output.to_path_buf(),
                size,
            });
        }

        on_progress(100.0);
        info!(job_id = %job_id, size, output = %output.display(), "render complete");
        Ok(output.to_path_buf())
    }
}

/// Stream the child's diagnostic output line by line.
///
/// ffmpeg terminates its periodic stats lines with `\r`, not `\n`, so
/// this splits on both. The bounded tail keeps roughly the last
/// [`LOG_TAIL_CHARS`] characters for failure diagnostics.
async fn consume_diagnostics<R, F>(mut reader: R, tail: &mut String, mut on_line: F) -> MediaResult<()>
where
    R: AsyncReadExt + Unpin,
    F: FnMut(&str),
{
    let mut buf = [0u8; 4096];
    let mut acc: Vec<u8> = Vec::new();

    loop {
        let n = reader.read(&mut buf).await?;
        if n == 0 {
            if !acc.is_empty() {
                let line = String::from_utf8_lossy(&acc).into_owned();
                push_tail(tail, &line);
                on_line(&line);
            }
            return Ok(());
        }
        for &byte in &buf[..n] {
            if byte == b'\n' || byte == b'\r' {
                if !acc.is_empty() {
                    let line = String::from_utf8_lossy(&acc).into_owned();
                    push_tail(tail, &line);
                    on_line(&line);
                    acc.clear();
                }
            } else {
                acc.push(byte);
            }
        }
    }
}

fn push_tail(tail: &mut String, line: &str) {
    tail.push_str(line);
    tail.push('\n');
    if tail.len() > LOG_TAIL_CHARS {
        let cut = tail.len() - LOG_TAIL_CHARS;
        // Find a char boundary at or after the cut point.
        let boundary = (cut..tail.len())
            .find(|i| tail.is_char_boundary(*i))
            .unwrap_or(tail.len());
        tail.drain(..boundary);
    }
}
