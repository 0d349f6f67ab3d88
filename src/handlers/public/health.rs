use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::database::DatabaseManager;
use crate::state::AppState;
use crate::tree::TreeStore;

/// GET /health
pub async fn health<S: TreeStore>(State(state): State<Arc<AppState<S>>>) -> Response {
    let now = chrono::Utc::now();

    let Some(pool) = &state.pool else {
        return Json(json!({
            "success": true,
            "data": {
                "status": "ok",
                "timestamp": now,
                "backend": state.backend,
            }
        }))
        .into_response();
    };

    match DatabaseManager::health_check(pool).await {
        Ok(_) => Json(json!({
            "success": true,
            "data": {
                "status": "ok",
                "timestamp": now,
                "backend": state.backend,
                "database": "ok"
            }
        }))
        .into_response(),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": true,
                    "message": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                        "backend": state.backend
                    }
                })),
            )
                .into_response()
        }
    }
}
