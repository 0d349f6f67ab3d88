// Tree mutations. Each public operation opens one transaction, locks the
// sibling scopes it touches, validates, writes and commits. Any error drops
// the transaction, which rolls it back.

use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::components::ComponentRegistry;
use crate::tree::error::{TreeError, TreeResult};
use crate::tree::node::{reset_duplicate, NewNode, NodeId, PublishState, TreeNode};
use crate::tree::queries::find_in;
use crate::tree::sequencer::PositionSequencer;
use crate::tree::store::{TreeStore, TreeTx};
use crate::tree::validate::check_parent;
use crate::types::{EntityKind, Operation};

/// Load a node under its scope lock. The second read sees any move that
/// committed while the lock was being acquired.
async fn load_locked<T: TreeTx>(tx: &mut T, kind: EntityKind, id: NodeId) -> TreeResult<TreeNode> {
    let node = find_in(tx, kind, id).await?;
    tx.lock_scope(&node.sibling_scope()).await?;
    find_in(tx, kind, id).await
}

pub struct TreeMutator<S: TreeStore> {
    store: Arc<S>,
    registry: Arc<ComponentRegistry>,
    log_mutations: bool,
}

impl<S: TreeStore> TreeMutator<S> {
    pub fn new(store: Arc<S>, registry: Arc<ComponentRegistry>) -> Self {
        Self {
            store,
            registry,
            log_mutations: false,
        }
    }

    pub fn with_mutation_logging(mut self, enabled: bool) -> Self {
        self.log_mutations = enabled;
        self
    }

    fn log(&self, operation: Operation, node: &TreeNode) {
        if self.log_mutations {
            tracing::info!(
                "Tree mutation: operation={:?}, kind={}, id={}, parent={:?}, position={}",
                operation,
                node.kind,
                node.id,
                node.parent_id,
                node.position
            );
        }
    }

    /// Create a node. Without an explicit position it is appended to its
    /// scope; an explicit position must be free.
    pub async fn create(&self, kind: EntityKind, new: NewNode) -> TreeResult<TreeNode> {
        let explicit = new.position;
        let mut node = new.into_node(kind);

        let mut tx = self.store.begin().await?;
        let scope = node.sibling_scope();
        tx.lock_scope(&scope).await?;
        if let Some(parent_id) = node.parent_id {
            check_parent(&mut tx, &node, parent_id).await?;
        }

        let siblings = tx.siblings(&scope).await?;
        node.position = match explicit {
            Some(position) => {
                PositionSequencer::ensure_free(&siblings, position, &node)?;
                position
            }
            None => PositionSequencer::next_position(&siblings)?,
        };

        tx.insert(&node).await?;
        tx.commit().await?;

        self.log(Operation::Create, &node);
        Ok(node)
    }

    /// Overwrite the position field. Occupied positions are rejected, nothing
    /// is shifted; use `reorder` for that.
    pub async fn assign_position(&self, kind: EntityKind, id: NodeId, position: i32) -> TreeResult<TreeNode> {
        let mut tx = self.store.begin().await?;
        let mut node = load_locked(&mut tx, kind, id).await?;
        let siblings = tx.siblings(&node.sibling_scope()).await?;
        PositionSequencer::ensure_free(&siblings, position, &node)?;
        if node.position == position {
            return Ok(node);
        }

        node.position = position;
        node.updated_at = Utc::now();
        tx.update(&node).await?;
        tx.commit().await?;

        self.log(Operation::AssignPosition, &node);
        Ok(node)
    }

    /// Shifting move within the node's current scope
    pub async fn reorder(&self, kind: EntityKind, id: NodeId, target: i32) -> TreeResult<TreeNode> {
        let mut tx = self.store.begin().await?;
        let mut node = load_locked(&mut tx, kind, id).await?;
        let position = PositionSequencer::move_to_position_in(&mut tx, &node, target).await?;
        if position == node.position {
            return Ok(node);
        }
        tx.commit().await?;

        node.position = position;
        self.log(Operation::Reorder, &node);
        Ok(node)
    }

    /// Move a node under `new_parent` (`None` makes it a root). The node is
    /// appended to its new scope unless `position` names a free slot there.
    pub async fn reparent(
        &self,
        kind: EntityKind,
        id: NodeId,
        new_parent: Option<NodeId>,
        position: Option<i32>,
    ) -> TreeResult<TreeNode> {
        let mut tx = self.store.begin().await?;
        let mut node = load_locked(&mut tx, kind, id).await?;
        if new_parent == node.parent_id && position.is_none() {
            return Ok(node);
        }

        let old_scope = node.sibling_scope();
        if let Some(parent_id) = new_parent {
            check_parent(&mut tx, &node, parent_id).await?;
        }

        let old_position = node.position;
        node.parent_id = new_parent;
        let new_scope = node.sibling_scope();
        if new_scope != old_scope {
            tx.lock_scope(&new_scope).await?;
        }

        let siblings: Vec<TreeNode> = tx
            .siblings(&new_scope)
            .await?
            .into_iter()
            .filter(|s| s.id != node.id)
            .collect();
        node.position = match position {
            Some(position) => {
                PositionSequencer::ensure_free(&siblings, position, &node)?;
                position
            }
            None => PositionSequencer::next_position(&siblings)?,
        };
        node.updated_at = Utc::now();
        tx.update(&node).await?;

        if old_scope != new_scope {
            PositionSequencer::close_gap_in(&mut tx, &old_scope, old_position).await?;
        }
        tx.commit().await?;

        self.log(Operation::Reparent, &node);
        Ok(node)
    }

    /// Delete a leaf with no attached content
    pub async fn delete(&self, kind: EntityKind, id: NodeId) -> TreeResult<()> {
        let mut tx = self.store.begin().await?;
        let node = load_locked(&mut tx, kind, id).await?;
        let scope = node.sibling_scope();

        let children = tx.children(kind, id).await?;
        if !children.is_empty() {
            return Err(TreeError::HasChildren {
                kind,
                id,
                count: children.len(),
            });
        }
        let attached = tx.attached_content(kind, id).await?;
        if attached > 0 {
            return Err(TreeError::HasAssociatedContent {
                kind,
                id,
                count: attached,
            });
        }

        tx.remove(kind, id).await?;
        PositionSequencer::close_gap_in(&mut tx, &scope, node.position).await?;
        tx.commit().await?;

        self.log(Operation::Delete, &node);
        Ok(())
    }

    /// Copy a node into the slot right after it. `reset` adjusts the copy's
    /// entity fields; identity and tree placement are fixed afterwards.
    pub async fn duplicate<F>(&self, kind: EntityKind, id: NodeId, reset: F) -> TreeResult<TreeNode>
    where
        F: FnOnce(&mut TreeNode) + Send,
    {
        let mut tx = self.store.begin().await?;
        let source = load_locked(&mut tx, kind, id).await?;
        let scope = source.sibling_scope();

        let siblings = tx.siblings(&scope).await?;
        let slot = PositionSequencer::after(source.position)?;
        let moves = PositionSequencer::plan_open_after(&siblings, source.position)?;
        if !moves.is_empty() {
            tx.set_positions(kind, &moves).await?;
        }

        let mut copy = source.clone();
        reset(&mut copy);
        let now = Utc::now();
        copy.id = Uuid::new_v4();
        copy.kind = source.kind;
        copy.parent_id = source.parent_id;
        copy.scope = source.scope.clone();
        copy.position = slot;
        copy.created_at = now;
        copy.updated_at = now;

        tx.insert(&copy).await?;
        tx.commit().await?;

        self.log(Operation::Duplicate, &copy);
        Ok(copy)
    }

    /// Duplicate as a draft, inactive and unpublished
    pub async fn duplicate_as_draft(&self, kind: EntityKind, id: NodeId) -> TreeResult<TreeNode> {
        self.duplicate(kind, id, reset_duplicate).await
    }

    /// Draft -> Published. Publishing a published node is a no-op.
    pub async fn publish(&self, kind: EntityKind, id: NodeId) -> TreeResult<TreeNode> {
        let mut tx = self.store.begin().await?;
        let mut node = load_locked(&mut tx, kind, id).await?;
        if node.status == PublishState::Published {
            return Ok(node);
        }
        self.check_publishable(&node).await?;

        let now = Utc::now();
        node.status = PublishState::Published;
        node.published_at = Some(now);
        node.updated_at = now;
        tx.update(&node).await?;
        tx.commit().await?;

        self.log(Operation::Publish, &node);
        Ok(node)
    }

    /// Published -> Draft, for kinds that allow it
    pub async fn unpublish(&self, kind: EntityKind, id: NodeId) -> TreeResult<TreeNode> {
        if !kind.allows_unpublish() {
            return Err(TreeError::InvalidTransition {
                kind,
                id,
                action: "unpublish",
                reason: format!("a published {kind} cannot return to draft"),
            });
        }

        let mut tx = self.store.begin().await?;
        let mut node = load_locked(&mut tx, kind, id).await?;
        if node.status == PublishState::Draft {
            return Ok(node);
        }

        node.status = PublishState::Draft;
        node.published_at = None;
        node.updated_at = Utc::now();
        tx.update(&node).await?;
        tx.commit().await?;

        self.log(Operation::Unpublish, &node);
        Ok(node)
    }

    async fn check_publishable(&self, node: &TreeNode) -> TreeResult<()> {
        let invalid = |field: &'static str, message: &str| TreeError::Validation {
            kind: node.kind,
            id: node.id,
            field,
            message: message.to_string(),
        };

        match node.kind {
            EntityKind::Category => {
                if node.title.trim().is_empty() {
                    return Err(invalid("title", "a name is required"));
                }
            }
            EntityKind::Page => {
                if node.title.trim().is_empty() {
                    return Err(invalid("title", "a title is required"));
                }
                if node.slug.trim().is_empty() {
                    return Err(invalid("slug", "a slug is required"));
                }
            }
            EntityKind::PageComponent => {
                let componentable = node
                    .componentable
                    .ok_or_else(|| invalid("componentable_id", "no content is attached"))?;
                if !self.registry.resolve(&componentable).await? {
                    return Err(invalid(
                        "componentable_id",
                        &format!("{} {} does not exist", componentable.kind, componentable.id),
                    ));
                }
            }
        }
        Ok(())
    }
}
