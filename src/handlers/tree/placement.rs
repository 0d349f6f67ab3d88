use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::tree::{NodeId, TreeNode, TreeStore};

use super::target;

#[derive(Debug, Deserialize)]
pub struct ReparentBody {
    /// `null` moves the node to the root level
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub position: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PositionBody {
    pub position: i32,
}

/// PUT /api/:kind/:id/parent
pub async fn reparent<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<ReparentBody>, JsonRejection>,
) -> ApiResult<TreeNode> {
    let (kind, id) = target(&kind, &id)?;
    let Json(body) = payload?;
    let node = state.mutator.reparent(kind, id, body.parent_id, body.position).await?;
    Ok(ApiResponse::success(node))
}

/// PUT /api/:kind/:id/position - rejects occupied positions
pub async fn assign_position<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<PositionBody>, JsonRejection>,
) -> ApiResult<TreeNode> {
    let (kind, id) = target(&kind, &id)?;
    let Json(body) = payload?;
    let node = state.mutator.assign_position(kind, id, body.position).await?;
    Ok(ApiResponse::success(node))
}

/// POST /api/:kind/:id/reorder - shifts siblings to make room
pub async fn reorder<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
    payload: Result<Json<PositionBody>, JsonRejection>,
) -> ApiResult<TreeNode> {
    let (kind, id) = target(&kind, &id)?;
    let Json(body) = payload?;
    let node = state.mutator.reorder(kind, id, body.position).await?;
    Ok(ApiResponse::success(node))
}
