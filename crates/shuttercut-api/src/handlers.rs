//! HTTP handlers: upload, status polling, result download.

use std::path::{Path as FsPath, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::multipart::Field;
use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tracing::{info, warn};
use uuid::Uuid;

use shuttercut_models::{JobId, Overlay};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub job_id: String,
    pub status: String,
}

/// Response for a status poll.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub job_id: String,
    pub status: String,
    pub progress: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET / — service info.
pub async fn root() -> Json<serde_json::Value> {
    Json(json!({
        "status": "online",
        "service": "ShutterCut Video Editing Backend",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /upload",
            "status": "GET /status/{job_id}",
            "result": "GET /result/{job_id}",
        },
    }))
}

/// GET /health — liveness check.
pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// POST /upload — accept a base video, overlay assets, and the overlay
/// metadata; create the job and schedule its render.
///
/// Uploads land in a per-submission directory under their original base
/// filenames so that overlay `content` values resolve against the asset
/// list exactly as submitted.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let upload_dir = state
        .config
        .upload_dir
        .join(Uuid::new_v4().to_string());
    tokio::fs::create_dir_all(&upload_dir)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create upload dir: {e}")))?;

    let mut video_path: Option<PathBuf> = None;
    let mut asset_paths: Vec<PathBuf> = Vec::new();
    let mut metadata: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Malformed multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "video" => {
                let name = sanitize_filename(field.file_name())?;
                let path = upload_dir.join(name);
                write_field(&path, field).await?;
                video_path = Some(path);
            }
            "assets" => {
                let name = sanitize_filename(field.file_name())?;
                let path = upload_dir.join(name);
                write_field(&path, field).await?;
                asset_paths.push(path);
            }
            "metadata" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Unreadable metadata: {e}")))?;
                metadata = Some(text);
            }
            other => {
                warn!(field = other, "ignoring unexpected multipart field");
            }
        }
    }

    let video_path = video_path.ok_or_else(|| ApiError::bad_request("Missing video file"))?;
    let metadata = metadata.ok_or_else(|| ApiError::bad_request("Missing overlay metadata"))?;

    let overlays: Vec<Overlay> = serde_json::from_str(&metadata)
        .map_err(|e| ApiError::bad_request(format!("Invalid metadata JSON: {e}")))?;

    let job_id = state.manager.create(video_path, asset_paths, overlays)?;

    // Render off the request path; submission returns immediately.
    let manager = Arc::clone(&state.manager);
    let run_id = job_id.clone();
    tokio::spawn(async move {
        manager.run(&run_id).await;
    });

    info!(job_id = %job_id, "upload accepted, render scheduled");
    Ok(Json(UploadResponse {
        job_id: job_id.to_string(),
        status: "queued".to_string(),
    }))
}

/// GET /status/:job_id — job snapshot for polling.
pub async fn status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let id = JobId::from_string(job_id);
    let job = state.manager.get_status(&id)?;

    Ok(Json(StatusResponse {
        job_id: id.to_string(),
        status: job.status.to_string(),
        progress: job.progress,
        error: job.error_message,
    }))
}

/// GET /result/:job_id — stream the rendered video.
pub async fn result(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> ApiResult<Response> {
    let id = JobId::from_string(job_id);
    let path = state.manager.get_result(&id)?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| ApiError::internal(format!("Result file unavailable: {e}")))?;
    let stream = ReaderStream::new(file);

    let headers = [
        (header::CONTENT_TYPE, "video/mp4"),
        (
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"edited_video.mp4\"",
        ),
    ];
    Ok((headers, Body::from_stream(stream)).into_response())
}

/// Reduce a client-supplied filename to its base component.
fn sanitize_filename(name: Option<&str>) -> ApiResult<String> {
    let base = FsPath::new(name.unwrap_or_default())
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    if base.is_empty() {
        return Err(ApiError::bad_request("Missing filename"));
    }
    Ok(base.to_string())
}

/// Stream one multipart field to disk.
async fn write_field(path: &FsPath, mut field: Field<'_>) -> ApiResult<()> {
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {e}")))?;
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| ApiError::bad_request(format!("Upload interrupted: {e}")))?
    {
        file.write_all(&chunk)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to store upload: {e}")))?;
    }
    file.flush()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to store upload: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename_strips_directories() {
        assert_eq!(
            sanitize_filename(Some("../../etc/passwd")).unwrap(),
            "passwd"
        );
        assert_eq!(sanitize_filename(Some("logo.png")).unwrap(), "logo.png");
    }

    #[test]
    fn test_sanitize_filename_rejects_empty() {
        assert!(sanitize_filename(None).is_err());
        assert!(sanitize_filename(Some("")).is_err());
        assert!(sanitize_filename(Some("..")).is_err());
    }
}
