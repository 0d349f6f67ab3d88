use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::tree::{Crumb, TreeNode, TreeStore};

use super::target;

#[derive(Debug, Default, Deserialize)]
pub struct ChildrenQuery {
    /// Only children with `is_active` set
    #[serde(default)]
    pub active: bool,
}

/// GET /api/:kind/:id/children
pub async fn children<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
    Query(query): Query<ChildrenQuery>,
) -> ApiResult<Vec<TreeNode>> {
    let (kind, id) = target(&kind, &id)?;
    let mut children = state.queries.children(kind, id).await?;
    if query.active {
        children.retain(|c| c.is_active);
    }
    Ok(ApiResponse::success(children))
}

/// GET /api/:kind/:id/siblings
pub async fn siblings<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Vec<TreeNode>> {
    let (kind, id) = target(&kind, &id)?;
    Ok(ApiResponse::success(state.queries.siblings(kind, id).await?))
}

/// GET /api/:kind/:id/ancestors - root first
pub async fn ancestors<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Vec<TreeNode>> {
    let (kind, id) = target(&kind, &id)?;
    Ok(ApiResponse::success(state.queries.ancestors(kind, id).await?))
}

/// GET /api/:kind/:id/descendants
pub async fn descendants<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Vec<TreeNode>> {
    let (kind, id) = target(&kind, &id)?;
    Ok(ApiResponse::success(state.queries.descendants(kind, id).await?))
}

/// GET /api/:kind/:id/breadcrumb
pub async fn breadcrumb<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<Vec<Crumb>> {
    let (kind, id) = target(&kind, &id)?;
    Ok(ApiResponse::success(state.queries.breadcrumb(kind, id).await?))
}

#[derive(Debug, Serialize)]
pub struct NodePath {
    pub depth: usize,
    pub full_name: String,
    pub full_slug: String,
}

/// GET /api/:kind/:id/path
pub async fn path<S: TreeStore>(
    State(state): State<Arc<AppState<S>>>,
    Path((kind, id)): Path<(String, String)>,
) -> ApiResult<NodePath> {
    let (kind, id) = target(&kind, &id)?;
    let depth = state.queries.depth(kind, id).await?;
    let full_name = state.queries.full_name(kind, id).await?;
    let full_slug = state.queries.full_slug(kind, id).await?;
    Ok(ApiResponse::success(NodePath {
        depth,
        full_name,
        full_slug,
    }))
}
