use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use std::sync::Arc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::tree::{NewNode, TreeNode, TreeStore};

use super::{entity_kind, target};

/// POST /api/:kind - create a node, appended to its scope unless a free
/// position is given
pub async fn create<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path(kind): Path<String>,
    payload: Result<Json<NewNode>, JsonRejection>,
) -> ApiResult<TreeNode> {
    let kind = entity_kind(&kind)?;
    let Json(new) = payload?;
    let node = state.mutator.create(kind, new).await?;
    Ok(ApiResponse::created(node))
}

/// GET /api/:kind/:id
pub async fn show<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<TreeNode> {
    let (kind, id) = target(&kind, &id)?;
    Ok(ApiResponse::success(state.queries.node(kind, id).await?))
}

/// DELETE /api/:kind/:id - only leaves without attached content
pub async fn destroy<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<()> {
    let (kind, id) = target(&kind, &id)?;
    state.mutator.delete(kind, id).await?;
    Ok(ApiResponse::no_content())
}
