// Read-only views over a hierarchy. Depth and ancestry are walked on every
// call, never cached.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use crate::tree::error::{TreeError, TreeResult};
use crate::tree::node::{Crumb, NodeId, PathField, TreeNode};
use crate::tree::store::{TreeStore, TreeTx};
use crate::types::EntityKind;

pub async fn find_in<T: TreeTx>(tx: &mut T, kind: EntityKind, id: NodeId) -> TreeResult<TreeNode> {
    tx.find(kind, id)
        .await?
        .ok_or(TreeError::NotFound { kind, id })
}

/// Ancestors of `node`, root-most first
pub async fn ancestors_in<T: TreeTx>(tx: &mut T, node: &TreeNode) -> TreeResult<Vec<TreeNode>> {
    let bound = tx.count(node.kind).await?;
    let mut chain = Vec::new();
    let mut next = node.parent_id;

    while let Some(id) = next {
        if id == node.id || chain.len() as u64 >= bound {
            return Err(TreeError::CircularReference {
                kind: node.kind,
                id: node.id,
                parent_id: node.parent_id.unwrap_or(id),
            });
        }
        match tx.find(node.kind, id).await? {
            Some(parent) => {
                next = parent.parent_id;
                chain.push(parent);
            }
            None => break,
        }
    }

    chain.reverse();
    Ok(chain)
}

/// Every transitive child of `node`, breadth first, without duplicates
pub async fn descendants_in<T: TreeTx>(tx: &mut T, node: &TreeNode) -> TreeResult<Vec<TreeNode>> {
    let mut seen: HashSet<NodeId> = HashSet::from([node.id]);
    let mut queue = VecDeque::from([node.id]);
    let mut found = Vec::new();

    while let Some(id) = queue.pop_front() {
        for child in tx.children(node.kind, id).await? {
            if seen.insert(child.id) {
                queue.push_back(child.id);
                found.push(child);
            }
        }
    }

    Ok(found)
}

pub struct TreeQueries<S: TreeStore> {
    store: Arc<S>,
}

impl<S: TreeStore> TreeQueries<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn node(&self, kind: EntityKind, id: NodeId) -> TreeResult<TreeNode> {
        let mut tx = self.store.begin().await?;
        find_in(&mut tx, kind, id).await
    }

    /// 0 for a root
    pub async fn depth(&self, kind: EntityKind, id: NodeId) -> TreeResult<usize> {
        Ok(self.ancestors(kind, id).await?.len())
    }

    pub async fn ancestors(&self, kind: EntityKind, id: NodeId) -> TreeResult<Vec<TreeNode>> {
        let mut tx = self.store.begin().await?;
        let node = find_in(&mut tx, kind, id).await?;
        ancestors_in(&mut tx, &node).await
    }

    pub async fn descendants(&self, kind: EntityKind, id: NodeId) -> TreeResult<Vec<TreeNode>> {
        let mut tx = self.store.begin().await?;
        let node = find_in(&mut tx, kind, id).await?;
        descendants_in(&mut tx, &node).await
    }

    /// Root-most ancestor down to the node itself
    pub async fn breadcrumb(&self, kind: EntityKind, id: NodeId) -> TreeResult<Vec<Crumb>> {
        let mut tx = self.store.begin().await?;
        let node = find_in(&mut tx, kind, id).await?;
        let mut crumbs: Vec<Crumb> = ancestors_in(&mut tx, &node)
            .await?
            .iter()
            .map(TreeNode::crumb)
            .collect();
        crumbs.push(node.crumb());
        Ok(crumbs)
    }

    pub async fn is_ancestor_of(&self, kind: EntityKind, a: NodeId, b: NodeId) -> TreeResult<bool> {
        let ancestors = self.ancestors(kind, b).await?;
        Ok(ancestors.iter().any(|n| n.id == a))
    }

    pub async fn is_descendant_of(&self, kind: EntityKind, a: NodeId, b: NodeId) -> TreeResult<bool> {
        self.is_ancestor_of(kind, b, a).await
    }

    pub async fn full_path(
        &self,
        kind: EntityKind,
        id: NodeId,
        separator: &str,
        field: PathField,
    ) -> TreeResult<String> {
        let parts: Vec<String> = self
            .breadcrumb(kind, id)
            .await?
            .into_iter()
            .map(|c| match field {
                PathField::Title => c.title,
                PathField::Slug => c.slug,
            })
            .collect();
        Ok(parts.join(separator))
    }

    /// Titles joined with " > "
    pub async fn full_name(&self, kind: EntityKind, id: NodeId) -> TreeResult<String> {
        self.full_path(kind, id, " > ", PathField::Title).await
    }

    /// Slugs joined with "/"
    pub async fn full_slug(&self, kind: EntityKind, id: NodeId) -> TreeResult<String> {
        self.full_path(kind, id, "/", PathField::Slug).await
    }

    pub async fn children(&self, kind: EntityKind, id: NodeId) -> TreeResult<Vec<TreeNode>> {
        let mut tx = self.store.begin().await?;
        find_in(&mut tx, kind, id).await?;
        Ok(tx.children(kind, id).await?)
    }

    /// Members of the node's sibling scope, the node included
    pub async fn siblings(&self, kind: EntityKind, id: NodeId) -> TreeResult<Vec<TreeNode>> {
        let mut tx = self.store.begin().await?;
        let node = find_in(&mut tx, kind, id).await?;
        Ok(tx.siblings(&node.sibling_scope()).await?)
    }

    pub async fn has_children(&self, kind: EntityKind, id: NodeId) -> TreeResult<bool> {
        Ok(!self.children(kind, id).await?.is_empty())
    }

    pub async fn has_active_children<F>(&self, kind: EntityKind, id: NodeId, is_active: F) -> TreeResult<bool>
    where
        F: Fn(&TreeNode) -> bool + Send,
    {
        Ok(self.children(kind, id).await?.iter().any(|c| is_active(c)))
    }
}
