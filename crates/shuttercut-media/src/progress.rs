//! Progress parsing for ffmpeg's diagnostic stream.
//!
//! ffmpeg reports progress in two shapes: the stats line written to
//! stderr (`frame=.. time=HH:MM:SS.mmm bitrate=..`) and, when run with
//! `-progress`, `key=value` lines such as `out_time_ms=5000`. Both are
//! normalized here to elapsed seconds; malformed or partial lines are
//! ignored rather than treated as errors.

/// Maximum percentage reported while the process is still running.
pub const MAX_RUNNING_PERCENT: f64 = 99.0;

/// Extract elapsed seconds from one line of ffmpeg output, if present.
pub fn parse_elapsed_seconds(line: &str) -> Option<f64> {
    let line = line.trim();

    // -progress style key=value lines.
    if let Some((key, value)) = line.split_once('=') {
        match key {
            "out_time_ms" => {
                if let Ok(ms) = value.trim().parse::<i64>() {
                    return positive(ms as f64 / 1_000.0);
                }
            }
            "out_time_us" => {
                if let Ok(us) = value.trim().parse::<i64>() {
                    return positive(us as f64 / 1_000_000.0);
                }
            }
            _ => {}
        }
    }

    // Stats line with an embedded `time=HH:MM:SS.mmm` field.
    if let Some(rest) = line.split("time=").nth(1) {
        let token = rest.split_whitespace().next()?;
        return parse_timestamp(token);
    }

    None
}

/// Parse an `HH:MM:SS.mmm` timestamp into seconds.
fn parse_timestamp(token: &str) -> Option<f64> {
    let mut parts = token.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    positive(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn positive(value: f64) -> Option<f64> {
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Converts elapsed seconds into a monotonic completion percentage.
///
/// While the process runs, values are clamped to `[0, 99]` — 100 is
/// reserved for actual process exit — and decreases are swallowed so
/// every observation a caller sees is non-decreasing.
#[derive(Debug)]
pub struct ProgressTracker {
    duration_secs: f64,
    last_percent: f64,
}

impl ProgressTracker {
    /// Create a tracker for a source of the given duration.
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            last_percent: 0.0,
        }
    }

    /// Observe an elapsed-seconds value.
    ///
    /// Returns the percentage to report, or `None` when the observation
    /// does not advance progress (or the duration is unusable).
    pub fn observe(&mut self, elapsed_secs: f64) -> Option<f64> {
        if self.duration_secs <= 0.0 {
            return None;
        }
        let percent = (elapsed_secs / self.duration_secs * 100.0).clamp(0.0, MAX_RUNNING_PERCENT);
        if percent > self.last_percent {
            self.last_percent = percent;
            Some(percent)
        } else {
            None
        }
    }

    /// Observe one raw output line; convenience over [`parse_elapsed_seconds`].
    pub fn observe_line(&mut self, line: &str) -> Option<f64> {
        parse_elapsed_seconds(line).and_then(|elapsed| self.observe(elapsed))
    }

    /// The highest percentage reported so far.
    pub fn last_percent(&self) -> f64 {
        self.last_percent
    }
}
