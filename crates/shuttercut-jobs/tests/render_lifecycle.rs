//! End-to-end job lifecycle tests against stand-in ffmpeg/ffprobe
//! scripts, exercising the manager's state machine without real media.
#![cfg(unix)]

use std::path::{Path, PathBuf};

use shuttercut_jobs::{JobError, JobManager};
use shuttercut_media::RenderExecutor;
use shuttercut_models::{JobId, JobStatus, Overlay};
use tempfile::TempDir;

const FFPROBE_OK: &str = "#!/bin/sh\necho 10.000000\n";
const FFPROBE_GARBAGE: &str = "#!/bin/sh\necho not-a-number\n";

/// Prints one progress line, then writes a plausibly sized output file
/// (the output path is ffmpeg's final argument).
const FFMPEG_OK: &str = "#!/bin/sh\n\
for last; do :; done\n\
printf 'frame=   10 fps=0.0 q=-1.0 size=     256kB time=00:00:05.000 bitrate=N/A speed=2x\\n' >&2\n\
head -c 4096 /dev/zero > \"$last\"\n";

const FFMPEG_FAIL: &str = "#!/bin/sh\n\
printf 'Error: something exploded\\n' >&2\n\
exit 1\n";

const FFMPEG_EMPTY_OUTPUT: &str = "#!/bin/sh\n\
for last; do :; done\n\
: > \"$last\"\n";

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
    _tmp: TempDir,
    manager: JobManager,
    base_video: PathBuf,
}

fn fixture(ffmpeg_body: &str, ffprobe_body: &str) -> Fixture {
    let tmp = TempDir::new().unwrap();
    let ffmpeg = write_script(tmp.path(), "ffmpeg", ffmpeg_body);
    let ffprobe = write_script(tmp.path(), "ffprobe", ffprobe_body);

    let base_video = tmp.path().join("clip.mp4");
    std::fs::write(&base_video, b"not actually a video").unwrap();

    let results = tmp.path().join("results");
    std::fs::create_dir(&results).unwrap();

    let manager = JobManager::new(RenderExecutor::with_tools(ffmpeg, ffprobe), results);
    Fixture {
        _tmp: tmp,
        manager,
        base_video,
    }
}

#[tokio::test]
async fn successful_render_completes_job() {
    let fx = fixture(FFMPEG_OK, FFPROBE_OK);
    let id = fx
        .manager
        .create(fx.base_video.clone(), Vec::new(), Vec::new())
        .unwrap();

    fx.manager.run(&id).await;

    let job = fx.manager.get_status(&id).unwrap();
    assert_eq!(job.status, JobStatus::Completed);
    assert!((job.progress - 100.0).abs() < f64::EPSILON);
    assert!(job.error_message.is_none());

    let result = fx.manager.get_result(&id).unwrap();
    assert!(result.exists());
    assert!(std::fs::metadata(&result).unwrap().len() >= 100);
}

#[tokio::test]
async fn render_with_overlays_completes_job() {
    let fx = fixture(FFMPEG_OK, FFPROBE_OK);
    let overlays = vec![Overlay::text("hello").at(10, 10).between(0.0, 3.0)];
    let id = fx
        .manager
        .create(fx.base_video.clone(), Vec::new(), overlays)
        .unwrap();

    fx.manager.run(&id).await;

    assert_eq!(
        fx.manager.get_status(&id).unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn nonzero_exit_marks_job_failed() {
    let fx = fixture(FFMPEG_FAIL, FFPROBE_OK);
    let id = fx
        .manager
        .create(fx.base_video.clone(), Vec::new(), Vec::new())
        .unwrap();

    fx.manager.run(&id).await;

    let job = fx.manager.get_status(&id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let message = job.error_message.unwrap();
    assert!(message.contains("exited with code 1"), "got: {message}");

    match fx.manager.get_result(&id) {
        Err(JobError::NotReady { status, .. }) => assert_eq!(status, JobStatus::Failed),
        other => panic!("expected NotReady, got {other:?}"),
    }
}

#[tokio::test]
async fn undersized_output_fails_distinguishably() {
    let fx = fixture(FFMPEG_EMPTY_OUTPUT, FFPROBE_OK);
    let id = fx
        .manager
        .create(fx.base_video.clone(), Vec::new(), Vec::new())
        .unwrap();

    fx.manager.run(&id).await;

    let job = fx.manager.get_status(&id).unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    let message = job.error_message.unwrap();
    assert!(
        message.contains("output file missing or too small"),
        "got: {message}"
    );
}

#[tokio::test]
async fn probe_failure_falls_back_and_render_still_completes() {
    let fx = fixture(FFMPEG_OK, FFPROBE_GARBAGE);
    let id = fx
        .manager
        .create(fx.base_video.clone(), Vec::new(), Vec::new())
        .unwrap();

    fx.manager.run(&id).await;

    assert_eq!(
        fx.manager.get_status(&id).unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn unknown_job_is_not_found_from_both_queries() {
    let fx = fixture(FFMPEG_OK, FFPROBE_OK);
    let bogus = JobId::from_string("no-such-job");

    assert!(matches!(
        fx.manager.get_status(&bogus),
        Err(JobError::NotFound(_))
    ));
    assert!(matches!(
        fx.manager.get_result(&bogus),
        Err(JobError::NotFound(_))
    ));
}

#[tokio::test]
async fn queued_job_result_is_not_ready() {
    let fx = fixture(FFMPEG_OK, FFPROBE_OK);
    let id = fx
        .manager
        .create(fx.base_video.clone(), Vec::new(), Vec::new())
        .unwrap();

    match fx.manager.get_result(&id) {
        Err(JobError::NotReady { status, .. }) => assert_eq!(status, JobStatus::Queued),
        other => panic!("expected NotReady, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_overlay_is_rejected_before_any_job_exists() {
    let fx = fixture(FFMPEG_OK, FFPROBE_OK);
    let overlays = vec![Overlay::text("late").between(5.0, 1.0)];

    let result = fx
        .manager
        .create(fx.base_video.clone(), Vec::new(), overlays);
    assert!(matches!(result, Err(JobError::InvalidSpec(_))));
    assert!(fx.manager.store().is_empty());
}

#[tokio::test]
async fn completed_job_cannot_be_rerun() {
    let fx = fixture(FFMPEG_OK, FFPROBE_OK);
    let id = fx
        .manager
        .create(fx.base_video.clone(), Vec::new(), Vec::new())
        .unwrap();

    fx.manager.run(&id).await;
    let first = fx.manager.get_status(&id).unwrap();
    assert_eq!(first.status, JobStatus::Completed);

    // A second run must refuse re-entry and leave the record untouched.
    fx.manager.run(&id).await;
    let second = fx.manager.get_status(&id).unwrap();
    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!(second.result_path, first.result_path);
}
