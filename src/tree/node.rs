use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::components::Componentable;
use crate::types::EntityKind;

pub type NodeId = Uuid;

/// Tenant/container boundary plus an optional partition (language).
///
/// `owner` is the organization for categories and pages, and the page for
/// page components. A parent must share its child's `owner`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScopeKey {
    pub owner: Uuid,
    #[serde(default)]
    pub partition: Option<String>,
}

impl ScopeKey {
    pub fn new(owner: Uuid) -> Self {
        Self { owner, partition: None }
    }

    pub fn with_partition(mut self, partition: impl Into<String>) -> Self {
        self.partition = Some(partition.into());
        self
    }

    pub fn same_family(&self, other: &ScopeKey) -> bool {
        self.owner == other.owner
    }
}

/// The set of nodes sharing one position sequence
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SiblingScope {
    pub kind: EntityKind,
    pub parent_id: Option<NodeId>,
    pub key: ScopeKey,
}

impl SiblingScope {
    /// Lock name covering every sibling scope of one owner. Locking at this
    /// granularity also serializes the ancestor walks of concurrent reparents.
    pub fn family_lock_name(&self) -> String {
        format!("{}:{}", self.kind.table_name(), self.key.owner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublishState {
    Draft,
    Published,
}

impl PublishState {
    pub fn as_str(self) -> &'static str {
        match self {
            PublishState::Draft => "draft",
            PublishState::Published => "published",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(PublishState::Draft),
            "published" => Some(PublishState::Published),
            _ => None,
        }
    }
}

/// One category, page or page component participating in a hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: NodeId,
    pub kind: EntityKind,
    pub parent_id: Option<NodeId>,
    pub position: i32,
    pub scope: ScopeKey,
    pub title: String,
    pub slug: String,
    pub status: PublishState,
    pub published_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub attributes: Map<String, Value>,
    #[serde(flatten)]
    pub componentable: Option<Componentable>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TreeNode {
    pub fn sibling_scope(&self) -> SiblingScope {
        SiblingScope {
            kind: self.kind,
            parent_id: self.parent_id,
            key: self.scope.clone(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn crumb(&self) -> Crumb {
        Crumb {
            id: self.id,
            title: self.title.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// Breadcrumb entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    pub id: NodeId,
    pub title: String,
    pub slug: String,
}

/// Which node field `full_path` joins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathField {
    Title,
    Slug,
}

/// Input for creating a node; position is assigned when omitted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNode {
    #[serde(default)]
    pub parent_id: Option<NodeId>,
    #[serde(default)]
    pub position: Option<i32>,
    pub scope: ScopeKey,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default, flatten)]
    pub componentable: Option<Componentable>,
}

impl NewNode {
    pub fn new(scope: ScopeKey, title: impl Into<String>) -> Self {
        Self {
            parent_id: None,
            position: None,
            scope,
            title: title.into(),
            slug: String::new(),
            is_active: false,
            attributes: Map::new(),
            componentable: None,
        }
    }

    pub fn under(mut self, parent_id: NodeId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn at(mut self, position: i32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn componentable(mut self, componentable: Componentable) -> Self {
        self.componentable = Some(componentable);
        self
    }

    /// Materialize as a draft with a fresh id. Position is left at 0 for the
    /// mutator to assign.
    pub(crate) fn into_node(self, kind: EntityKind) -> TreeNode {
        let now = Utc::now();
        TreeNode {
            id: Uuid::new_v4(),
            kind,
            parent_id: self.parent_id,
            position: 0,
            scope: self.scope,
            title: self.title,
            slug: self.slug,
            status: PublishState::Draft,
            published_at: None,
            is_active: self.is_active,
            attributes: self.attributes,
            componentable: self.componentable,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Default reset applied to duplicates
pub fn reset_duplicate(node: &mut TreeNode) {
    node.status = PublishState::Draft;
    node.is_active = false;
    node.published_at = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::ComponentableType;
    use serde_json::json;

    #[test]
    fn new_node_deserializes_with_defaults() {
        let owner = Uuid::new_v4();
        let body = json!({
            "scope": { "owner": owner },
            "title": "About us"
        });
        let new: NewNode = serde_json::from_value(body).unwrap();
        assert_eq!(new.scope, ScopeKey::new(owner));
        assert!(new.parent_id.is_none());
        assert!(new.position.is_none());
        assert!(new.componentable.is_none());
    }

    #[test]
    fn componentable_fields_are_flattened() {
        let hero = Uuid::new_v4();
        let body = json!({
            "scope": { "owner": Uuid::new_v4(), "partition": "de" },
            "title": "Hero",
            "componentable_type": "hero",
            "componentable_id": hero
        });
        let new: NewNode = serde_json::from_value(body).unwrap();
        assert_eq!(new.componentable.map(|c| c.kind), Some(ComponentableType::Hero));
        assert_eq!(new.scope.partition.as_deref(), Some("de"));

        let node = new.into_node(EntityKind::PageComponent);
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["componentable_id"], hero.to_string());
        assert_eq!(value["status"], "draft");
    }

    #[test]
    fn family_lock_ignores_parent_and_partition() {
        let owner = Uuid::new_v4();
        let a = SiblingScope {
            kind: EntityKind::Category,
            parent_id: None,
            key: ScopeKey::new(owner).with_partition("en"),
        };
        let b = SiblingScope {
            kind: EntityKind::Category,
            parent_id: Some(Uuid::new_v4()),
            key: ScopeKey::new(owner),
        };
        assert_ne!(a, b);
        assert_eq!(a.family_lock_name(), b.family_lock_name());
    }

    #[test]
    fn reset_clears_publication() {
        let mut node = NewNode::new(ScopeKey::new(Uuid::new_v4()), "Page")
            .active(true)
            .into_node(EntityKind::Page);
        node.status = PublishState::Published;
        node.published_at = Some(Utc::now());

        reset_duplicate(&mut node);
        assert_eq!(node.status, PublishState::Draft);
        assert!(!node.is_active);
        assert!(node.published_at.is_none());
    }
}
