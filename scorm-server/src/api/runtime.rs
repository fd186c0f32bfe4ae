//! Runtime tracking endpoint
//!
//! POST /scormrt takes `{session, method, element?, value?}` and answers
//! `{result}`. Rejections use the flat `{"error": ...}` body SCO adapters
//! expect rather than the structured API error.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;

use crate::{
    runtime::{RuntimeCall, RuntimeRequest},
    AppState,
};

/// POST /scormrt response
#[derive(Debug, Serialize)]
pub struct RuntimeResponse {
    pub result: String,
}

fn rejection(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

/// POST /scormrt
pub async fn runtime_call(
    State(state): State<AppState>,
    body: Result<Json<RuntimeRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return rejection("invalid request");
    };

    let call = match RuntimeCall::try_from(request) {
        Ok(call) => call,
        Err(e) => {
            tracing::debug!("Runtime call rejected: {}", e);
            return rejection("unknown method");
        }
    };

    let result = state.runtime.dispatch(&call);
    tracing::debug!(method = call.method(), result = %result, "Runtime call");

    Json(RuntimeResponse { result }).into_response()
}

/// Build runtime routes
pub fn runtime_routes() -> Router<AppState> {
    Router::new().route("/scormrt", post(runtime_call))
}
