use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::submission::Submission;
use crate::tree::TreeStore;

/// Rate-limit key for the caller: first X-Forwarded-For hop, else "unknown"
pub(crate) fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
        .to_string()
}

/// POST /public/submissions - 202 once the guard lets the submission through
pub async fn submit<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    headers: HeaderMap,
    payload: Result<Json<Submission>, JsonRejection>,
) -> ApiResult<Value> {
    let Json(submission) = payload?;
    let key = client_key(&headers);
    state.guard.check(&key, &submission).await?;

    tracing::info!("Accepted {:?} submission from {}", submission.kind, key);
    Ok(ApiResponse::accepted(json!({ "accepted": true, "kind": submission.kind })))
}
