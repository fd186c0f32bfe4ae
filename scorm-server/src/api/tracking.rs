//! Learner tracking endpoints

use axum::{
    extract::{rejection::JsonRejection, rejection::PathRejection, Path, State},
    routing::{get, post},
    Json, Router,
};
use scorm_common::db::ProgressRecord;
use serde::{Deserialize, Serialize};

use crate::{
    db::{courses, progress},
    error::{ApiError, ApiResult},
    AppState,
};

/// POST /track request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub user_id: i64,
    /// Manifest identifier of the course
    pub scorm_id: String,
    pub sco_id: String,
    pub status: String,
    #[serde(default)]
    pub score: i64,
}

/// POST /track response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub status: String,
    pub sco_id: String,
}

/// POST /track
pub async fn track(
    State(state): State<AppState>,
    body: Result<Json<TrackRequest>, JsonRejection>,
) -> ApiResult<Json<TrackResponse>> {
    let Json(request) = body?;

    let course_id = courses::find_course_id(&state.db, &request.scorm_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Course '{}' not found", request.scorm_id)))?;

    let id = progress::insert_progress(
        &state.db,
        &progress::NewProgress {
            user_id: request.user_id,
            course_id,
            sco_id: &request.sco_id,
            status: &request.status,
            score: request.score,
        },
    )
    .await?;

    tracing::debug!(
        id,
        user_id = request.user_id,
        course_id,
        sco_id = %request.sco_id,
        status = %request.status,
        "Tracking event saved"
    );

    Ok(Json(TrackResponse {
        status: "saved".to_string(),
        sco_id: request.sco_id,
    }))
}

/// GET /progress/:user_id
pub async fn get_progress(
    State(state): State<AppState>,
    user_id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<ProgressRecord>>> {
    let Path(user_id) = user_id?;
    let records = progress::list_for_user(&state.db, user_id).await?;
    Ok(Json(records))
}

/// Build tracking routes
pub fn tracking_routes() -> Router<AppState> {
    Router::new()
        .route("/track", post(track))
        .route("/progress/:user_id", get(get_progress))
}
