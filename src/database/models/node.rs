use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::components::{Componentable, ComponentableType};
use crate::database::manager::DatabaseError;
use crate::tree::{PublishState, ScopeKey, TreeNode};
use crate::types::EntityKind;

/// Column list shared by every tree table
pub const NODE_COLUMNS: &str = "id, parent_id, position, scope_owner, scope_partition, title, slug, \
     status, published_at, is_active, attributes, componentable_type, componentable_id, \
     created_at, updated_at";

/// Row of `categories`, `pages` or `page_components`
#[derive(Debug, Clone, FromRow)]
pub struct NodeRow {
    pub id: Uuid,
    pub parent_id: Option<Uuid>,
    pub position: i32,
    pub scope_owner: Uuid,
    pub scope_partition: Option<String>,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub published_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub attributes: Value,
    pub componentable_type: Option<String>,
    pub componentable_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NodeRow {
    pub fn into_node(self, kind: EntityKind) -> Result<TreeNode, DatabaseError> {
        let status = PublishState::parse(&self.status).ok_or_else(|| {
            DatabaseError::QueryError(format!("unknown status '{}' on {} {}", self.status, kind, self.id))
        })?;

        let componentable = match (self.componentable_type, self.componentable_id) {
            (Some(type_name), Some(id)) => {
                let component_kind = ComponentableType::parse(&type_name).ok_or_else(|| {
                    DatabaseError::QueryError(format!("unknown componentable type '{}'", type_name))
                })?;
                Some(Componentable::new(component_kind, id))
            }
            _ => None,
        };

        let attributes = match self.attributes {
            Value::Object(map) => map,
            _ => Default::default(),
        };

        Ok(TreeNode {
            id: self.id,
            kind,
            parent_id: self.parent_id,
            position: self.position,
            scope: ScopeKey {
                owner: self.scope_owner,
                partition: self.scope_partition,
            },
            title: self.title,
            slug: self.slug,
            status,
            published_at: self.published_at,
            is_active: self.is_active,
            attributes,
            componentable,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row() -> NodeRow {
        let now = Utc::now();
        NodeRow {
            id: Uuid::new_v4(),
            parent_id: None,
            position: 1,
            scope_owner: Uuid::new_v4(),
            scope_partition: Some("de".into()),
            title: "Solar".into(),
            slug: "solar".into(),
            status: "published".into(),
            published_at: Some(now),
            is_active: true,
            attributes: json!({ "color": "green" }),
            componentable_type: None,
            componentable_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn converts_row_to_node() {
        let node = row().into_node(EntityKind::Category).unwrap();
        assert_eq!(node.status, PublishState::Published);
        assert_eq!(node.scope.partition.as_deref(), Some("de"));
        assert_eq!(node.attributes["color"], "green");
        assert!(node.componentable.is_none());
    }

    #[test]
    fn converts_componentable_pair() {
        let mut r = row();
        let hero = Uuid::new_v4();
        r.componentable_type = Some("hero".into());
        r.componentable_id = Some(hero);
        let node = r.into_node(EntityKind::PageComponent).unwrap();
        assert_eq!(node.componentable, Some(Componentable::new(ComponentableType::Hero, hero)));
    }

    #[test]
    fn rejects_unknown_status() {
        let mut r = row();
        r.status = "archived".into();
        assert!(r.into_node(EntityKind::Page).is_err());
    }
}
