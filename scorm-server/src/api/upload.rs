//! Package upload endpoint
//!
//! POST /upload accepts a multipart form whose `file` field holds a zip
//! package. The body is streamed to a uniquely named file in the uploads
//! folder, extracted, mapped, validated and stored by the
//! [`PackageImporter`](crate::services::PackageImporter), and only then moved
//! to `uploads/<file name>`. A package whose folder already exists is
//! rejected before anything is written.

use axum::{
    extract::{
        multipart::{Field, MultipartRejection},
        Multipart, State,
    },
    routing::post,
    Json, Router,
};
use scorm_common::uuid_utils;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::{
    error::{ApiError, ApiResult},
    models::DigitalCourse,
    AppState,
};

/// Multipart field carrying the package
pub const FILE_FIELD: &str = "file";

/// POST /upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub status: String,
    pub course_id: i64,
    pub course: DigitalCourse,
}

/// POST /upload
pub async fn upload_package(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<UploadResponse>> {
    let mut multipart = multipart?;
    let importer = state.importer();

    let mut saved: Option<(PathBuf, PathBuf, PathBuf)> = None;
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = archive_file_name(field.file_name())?;
        let archive_path = state.storage.uploads_dir.join(&file_name);
        let dest = importer.destination_for(&archive_path);
        if dest.exists() {
            return Err(ApiError::Conflict(format!(
                "Package folder already exists: {}",
                dest.display()
            )));
        }

        let partial_path = state
            .storage
            .uploads_dir
            .join(format!(".{}.partial", uuid_utils::generate()));
        if let Err(e) = write_field(&mut field, &partial_path).await {
            remove_partial(&partial_path).await;
            return Err(e);
        }

        tracing::info!(file = %file_name, "Package upload received");
        saved = Some((archive_path, dest, partial_path));
        break;
    }

    let (archive_path, dest, partial_path) = saved.ok_or_else(|| {
        ApiError::BadRequest(format!("Missing multipart field '{}'", FILE_FIELD))
    })?;

    let imported = match importer.import_archive_to(&partial_path, &dest).await {
        Ok(imported) => imported,
        Err(e) => {
            remove_partial(&partial_path).await;
            return Err(e.into());
        }
    };
    tokio::fs::rename(&partial_path, &archive_path).await?;

    Ok(Json(UploadResponse {
        status: "uploaded and processed".to_string(),
        course_id: imported.course_id,
        course: imported.course,
    }))
}

/// Stream one multipart field to `path`
async fn write_field(field: &mut Field<'_>, path: &Path) -> ApiResult<()> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0usize;
    while let Some(chunk) = field.chunk().await? {
        written += chunk.len();
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    tracing::debug!(path = %path.display(), bytes = written, "Upload body written");
    Ok(())
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {}: {}", path.display(), e);
        }
    }
}

/// Final path component of the client-supplied name, which must end in `.zip`
fn archive_file_name(raw: Option<&str>) -> ApiResult<String> {
    let name = raw
        .and_then(|raw| Path::new(raw).file_name())
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Upload has no file name".to_string()))?;

    let is_zip = Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"));
    if !is_zip {
        return Err(ApiError::BadRequest(format!(
            "Only .zip packages are accepted: {}",
            name
        )));
    }

    Ok(name.to_string())
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_package))
}
