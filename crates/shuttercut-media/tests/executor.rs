//! Render executor tests against stand-in ffmpeg/ffprobe scripts.
#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use shuttercut_media::{video_duration, MediaError, RenderExecutor};
use shuttercut_models::JobId;
use tempfile::TempDir;

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}

struct Fixture {
    tmp: TempDir,
    executor: RenderExecutor,
    base: PathBuf,
    output: PathBuf,
}

fn fixture(ffmpeg_body: &str, ffprobe_body: &str) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let ffmpeg = write_script(tmp.path(), "ffmpeg", ffmpeg_body);
    let ffprobe = write_script(tmp.path(), "ffprobe", ffprobe_body);

    let base = tmp.path().join("clip.mp4");
    std::fs::write(&base, b"stub").unwrap();
    let output = tmp.path().join("out.mp4");

    Fixture {
        executor: RenderExecutor::with_tools(ffmpeg, ffprobe),
        tmp,
        base,
        output,
    }
}

#[tokio::test]
async fn progress_observations_are_ordered_and_end_at_100() {
    // 20s source, stats at 5s and 10s -> 25% then 50%, then the terminal
    // 100 after exit.
    let fx = fixture(
        "#!/bin/sh\n\
         for last; do :; done\n\
         printf 'frame=1 time=00:00:05.000 speed=1x\\n' >&2\n\
         printf 'frame=2 time=00:00:10.000 speed=1x\\n' >&2\n\
         head -c 4096 /dev/zero > \"$last\"\n",
        "#!/bin/sh\necho 20.0\n",
    );

    let observed: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&observed);

    let job_id = JobId::new();
    let result = fx
        .executor
        .render(&job_id, &fx.base, &[], &[], &fx.output, move |pct| {
            sink.lock().unwrap().push(pct);
        })
        .await
        .unwrap();
    assert_eq!(result, fx.output);

    let observed = observed.lock().unwrap();
    assert_eq!(observed.as_slice(), &[25.0, 50.0, 100.0]);
}

#[tokio::test]
async fn nonzero_exit_yields_ffmpeg_failed_with_log_tail() {
    let fx = fixture(
        "#!/bin/sh\nprintf 'Error: something exploded\\n' >&2\nexit 1\n",
        "#!/bin/sh\necho 10.0\n",
    );

    let job_id = JobId::new();
    let err = fx
        .executor
        .render(&job_id, &fx.base, &[], &[], &fx.output, |_| {})
        .await
        .unwrap_err();

    match err {
        MediaError::FfmpegFailed { exit_code, log_tail } => {
            assert_eq!(exit_code, 1);
            assert!(log_tail.contains("something exploded"), "got: {log_tail}");
        }
        other => panic!("expected FfmpegFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn undersized_output_yields_output_invalid() {
    let fx = fixture(
        "#!/bin/sh\nfor last; do :; done\n: > \"$last\"\n",
        "#!/bin/sh\necho 10.0\n",
    );

    let job_id = JobId::new();
    let err = fx
        .executor
        .render(&job_id, &fx.base, &[], &[], &fx.output, |_| {})
        .await
        .unwrap_err();

    match err {
        MediaError::OutputInvalid { size, .. } => assert_eq!(size, 0),
        other => panic!("expected OutputInvalid, got {other:?}"),
    }
}

#[tokio::test]
async fn probe_reads_single_numeric_duration() {
    let fx = fixture("#!/bin/sh\n", "#!/bin/sh\necho 12.5\n");
    let ffprobe = fx.tmp.path().join("ffprobe");

    let duration = video_duration(&ffprobe, &fx.base).await.unwrap();
    assert!((duration - 12.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn probe_rejects_garbage_and_failure() {
    let fx = fixture("#!/bin/sh\n", "#!/bin/sh\necho not-a-number\n");
    let ffprobe = fx.tmp.path().join("ffprobe");
    assert!(video_duration(&ffprobe, &fx.base).await.is_err());

    let failing = write_script(fx.tmp.path(), "ffprobe-fail", "#!/bin/sh\nexit 1\n");
    assert!(video_duration(&failing, &fx.base).await.is_err());
}
