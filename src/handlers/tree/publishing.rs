use axum::extract::{Path, State};
use std::sync::Arc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::tree::{TreeNode, TreeStore};

use super::target;

/// POST /api/:kind/:id/duplicate - the copy is an inactive draft placed
/// right after the source
pub async fn duplicate<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<TreeNode> {
    let (kind, id) = target(&kind, &id)?;
    let copy = state.mutator.duplicate_as_draft(kind, id).await?;
    Ok(ApiResponse::created(copy))
}

/// POST /api/:kind/:id/publish
pub async fn publish<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<TreeNode> {
    let (kind, id) = target(&kind, &id)?;
    Ok(ApiResponse::success(state.mutator.publish(kind, id).await?))
}

/// POST /api/:kind/:id/unpublish
pub async fn unpublish<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<TreeNode> {
    let (kind, id) = target(&kind, &id)?;
    Ok(ApiResponse::success(state.mutator.unpublish(kind, id).await?))
}
