// Handlers for /api/:kind. Every handler is generic over the TreeStore so the
// same routes serve the memory and postgres backends.

mod hierarchy;
mod nodes;
mod placement;
mod publishing;

pub use hierarchy::{ancestors, breadcrumb, children, descendants, path, siblings};
pub use nodes::{create, destroy, show};
pub use placement::{assign_position, reorder, reparent};
pub use publishing::{duplicate, publish, unpublish};

use uuid::Uuid;

use crate::error::ApiError;
use crate::types::EntityKind;

/// Resolve the `:kind` segment
pub(crate) fn entity_kind(segment: &str) -> Result<EntityKind, ApiError> {
    EntityKind::from_path(segment).ok_or_else(|| ApiError::not_found(format!("Unknown collection '{}'", segment)))
}

/// Resolve `:kind` and `:id`
pub(crate) fn target(segment: &str, id: &str) -> Result<(EntityKind, Uuid), ApiError> {
    let kind = entity_kind(segment)?;
    let id = Uuid::parse_str(id).map_err(|_| ApiError::bad_request(format!("Invalid UUID '{}'", id)))?;
    Ok((kind, id))
}
