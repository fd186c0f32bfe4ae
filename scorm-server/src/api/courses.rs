//! Course listing, replay, validation and deletion endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use scorm_common::db::CourseRecord;
use serde::Serialize;
use serde_json::Value;

use crate::{
    db::courses,
    error::{ApiError, ApiResult},
    models::DigitalCourse,
    validators::{validate_document, Violation},
    AppState,
};

/// GET /courses response
#[derive(Debug, Serialize)]
pub struct CourseListResponse {
    pub courses: Vec<CourseRecord>,
}

/// GET /courses/:id/validated response
#[derive(Debug, Serialize)]
pub struct ValidatedCourseResponse {
    pub identifier: String,
    pub data: DigitalCourse,
    pub validation: String,
    pub generated_at: String,
}

/// POST /courses/:id/validate response
#[derive(Debug, Serialize)]
pub struct RevalidateResponse {
    pub status: String,
    pub data: DigitalCourse,
}

/// POST /courses/validate response
#[derive(Debug, Serialize)]
pub struct DocumentValidationResponse {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

/// DELETE /courses/:id response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub status: String,
}

/// GET /courses
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<CourseListResponse>> {
    let courses = courses::list_courses(&state.db).await?;
    Ok(Json(CourseListResponse { courses }))
}

/// GET /courses/:id/validated and GET /courses/:id/view
///
/// Rebuilds the course from its stored manifest. 404 for an unknown id,
/// 400 with violations when the rebuilt course no longer validates.
pub async fn get_validated_course(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ValidatedCourseResponse>> {
    let Path(course_id) = id?;
    let replayed = state.importer().replay(course_id).await?;

    Ok(Json(ValidatedCourseResponse {
        identifier: replayed.identifier,
        data: replayed.course,
        validation: "success".to_string(),
        generated_at: "real-time".to_string(),
    }))
}

/// POST /courses/:id/validate
pub async fn revalidate_course(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<RevalidateResponse>> {
    let Path(course_id) = id?;
    let replayed = state.importer().replay(course_id).await?;
    tracing::debug!(course_id, identifier = %replayed.identifier, "Course revalidated");

    Ok(Json(RevalidateResponse {
        status: "validated".to_string(),
        data: replayed.course,
    }))
}

/// POST /courses/validate
///
/// Checks a client-supplied course document. Violations are the result of
/// this endpoint, not an error.
pub async fn validate_course_document(
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<DocumentValidationResponse>> {
    let Json(document) = body?;

    let violations = match validate_document(&document) {
        Ok(()) => Vec::new(),
        Err(errors) => errors.0,
    };

    Ok(Json(DocumentValidationResponse {
        valid: violations.is_empty(),
        violations,
    }))
}

/// DELETE /courses/:id
///
/// Removes tracking events, the course record, then the extracted package.
pub async fn delete_course(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<DeleteResponse>> {
    let Path(course_id) = id?;

    let path = courses::delete_course(&state.db, course_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Course {} not found", course_id)))?;

    match tokio::fs::remove_dir_all(&path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(course_id, path = %path, "Package folder already gone");
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!(course_id, path = %path, "Course deleted");

    Ok(Json(DeleteResponse {
        status: "deleted".to_string(),
    }))
}

/// Build course routes
pub fn course_routes() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list_courses))
        .route("/courses/validate", post(validate_course_document))
        .route("/courses/:id", delete(delete_course))
        .route("/courses/:id/validated", get(get_validated_course))
        .route("/courses/:id/view", get(get_validated_course))
        .route("/courses/:id/validate", post(revalidate_course))
}
