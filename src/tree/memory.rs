// In-process TreeStore: nodes live in a flat id -> node map per kind.
//
// A transaction owns the store mutex for its whole lifetime and works on a
// copy of the state; `commit` checks position uniqueness and swaps the copy
// in. Dropping the transaction discards the copy.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::database::DatabaseError;
use crate::tree::node::{NodeId, SiblingScope, TreeNode};
use crate::tree::store::{PositionMove, TreeStore, TreeTx};
use crate::types::EntityKind;

#[derive(Debug, Default, Clone)]
struct MemoryState {
    nodes: HashMap<EntityKind, BTreeMap<NodeId, TreeNode>>,
    content: HashMap<(EntityKind, NodeId), u64>,
}

impl MemoryState {
    fn table(&self, kind: EntityKind) -> impl Iterator<Item = &TreeNode> {
        self.nodes.get(&kind).into_iter().flat_map(|t| t.values())
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut BTreeMap<NodeId, TreeNode> {
        self.nodes.entry(kind).or_default()
    }

    /// Deferred uniqueness check on (kind, parent, scope, position)
    fn check_positions(&self) -> Result<(), DatabaseError> {
        for (kind, table) in &self.nodes {
            let mut seen = HashSet::new();
            for node in table.values() {
                let key = (node.parent_id, node.scope.clone(), node.position);
                if !seen.insert(key) {
                    return Err(DatabaseError::ConstraintViolation(format!(
                        "duplicate position {} in {} scope of {:?}",
                        node.position,
                        kind.table_name(),
                        node.parent_id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryTreeStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record content (articles, images, components) hanging off a node
    pub async fn attach_content(&self, kind: EntityKind, id: NodeId, count: u64) {
        let mut state = self.state.lock().await;
        if count == 0 {
            state.content.remove(&(kind, id));
        } else {
            state.content.insert((kind, id), count);
        }
    }

    /// Store a node as-is, bypassing every tree rule
    pub async fn seed(&self, node: TreeNode) {
        let mut state = self.state.lock().await;
        state.table_mut(node.kind).insert(node.id, node);
    }

    /// All nodes of a kind ordered by parent, then position
    pub async fn snapshot(&self, kind: EntityKind) -> Vec<TreeNode> {
        let state = self.state.lock().await;
        let mut nodes: Vec<TreeNode> = state.table(kind).cloned().collect();
        nodes.sort_by(|a, b| (a.parent_id, a.position).cmp(&(b.parent_id, b.position)));
        nodes
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    type Tx = MemoryTx;

    async fn begin(&self) -> Result<Self::Tx, DatabaseError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(MemoryTx { guard, working })
    }
}

pub struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

fn ordered(mut nodes: Vec<TreeNode>) -> Vec<TreeNode> {
    nodes.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));
    nodes
}

#[async_trait]
impl TreeTx for MemoryTx {
    async fn lock_scope(&mut self, scope: &SiblingScope) -> Result<(), DatabaseError> {
        // The whole store is already held by this transaction
        tracing::debug!("Memory store lock: {}", scope.family_lock_name());
        Ok(())
    }

    async fn find(&mut self, kind: EntityKind, id: NodeId) -> Result<Option<TreeNode>, DatabaseError> {
        Ok(self.working.nodes.get(&kind).and_then(|t| t.get(&id)).cloned())
    }

    async fn siblings(&mut self, scope: &SiblingScope) -> Result<Vec<TreeNode>, DatabaseError> {
        let members = self
            .working
            .table(scope.kind)
            .filter(|n| n.parent_id == scope.parent_id && n.scope == scope.key)
            .cloned()
            .collect();
        Ok(ordered(members))
    }

    async fn children(&mut self, kind: EntityKind, id: NodeId) -> Result<Vec<TreeNode>, DatabaseError> {
        let mut members: Vec<TreeNode> = self
            .working
            .table(kind)
            .filter(|n| n.parent_id == Some(id))
            .cloned()
            .collect();
        members.sort_by(|a, b| {
            (&a.scope.partition, a.position, a.id).cmp(&(&b.scope.partition, b.position, b.id))
        });
        Ok(members)
    }

    async fn count(&mut self, kind: EntityKind) -> Result<u64, DatabaseError> {
        Ok(self.working.table(kind).count() as u64)
    }

    async fn insert(&mut self, node: &TreeNode) -> Result<(), DatabaseError> {
        let table = self.working.table_mut(node.kind);
        if table.contains_key(&node.id) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "duplicate id {} in {}",
                node.id,
                node.kind.table_name()
            )));
        }
        table.insert(node.id, node.clone());
        Ok(())
    }

    async fn update(&mut self, node: &TreeNode) -> Result<(), DatabaseError> {
        match self.working.table_mut(node.kind).get_mut(&node.id) {
            Some(stored) => {
                *stored = node.clone();
                Ok(())
            }
            None => Err(DatabaseError::QueryError(format!(
                "no row {} in {}",
                node.id,
                node.kind.table_name()
            ))),
        }
    }

    async fn set_positions(&mut self, kind: EntityKind, moves: &[PositionMove]) -> Result<(), DatabaseError> {
        let table = self.working.table_mut(kind);
        for m in moves {
            let node = table.get_mut(&m.id).ok_or_else(|| {
                DatabaseError::QueryError(format!("no row {} in {}", m.id, kind.table_name()))
            })?;
            node.position = m.position;
        }
        Ok(())
    }

    async fn remove(&mut self, kind: EntityKind, id: NodeId) -> Result<(), DatabaseError> {
        self.working.table_mut(kind).remove(&id);
        self.working.content.remove(&(kind, id));
        Ok(())
    }

    async fn attached_content(&mut self, kind: EntityKind, id: NodeId) -> Result<u64, DatabaseError> {
        let seeded = self.working.content.get(&(kind, id)).copied().unwrap_or(0);
        let components = match kind {
            EntityKind::Page => self
                .working
                .table(EntityKind::PageComponent)
                .filter(|c| c.scope.owner == id)
                .count() as u64,
            _ => 0,
        };
        Ok(seeded + components)
    }

    async fn commit(mut self) -> Result<(), DatabaseError> {
        self.working.check_positions()?;
        *self.guard = self.working;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::node::{NewNode, ScopeKey};
    use uuid::Uuid;

    fn node(owner: Uuid, position: i32) -> TreeNode {
        let mut node = NewNode::new(ScopeKey::new(owner), "n").into_node(EntityKind::Category);
        node.position = position;
        node
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemoryTreeStore::new();
        let n = node(Uuid::new_v4(), 1);
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert(&n).await.unwrap();
        }
        assert!(store.snapshot(EntityKind::Category).await.is_empty());

        let mut tx = store.begin().await.unwrap();
        tx.insert(&n).await.unwrap();
        tx.commit().await.unwrap();
        assert_eq!(store.snapshot(EntityKind::Category).await.len(), 1);
    }

    #[tokio::test]
    async fn commit_rejects_duplicate_positions() {
        let store = MemoryTreeStore::new();
        let owner = Uuid::new_v4();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&node(owner, 1)).await.unwrap();
        tx.insert(&node(owner, 1)).await.unwrap();
        let err = tx.commit().await.unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
        assert!(store.snapshot(EntityKind::Category).await.is_empty());
    }

    #[tokio::test]
    async fn same_position_in_different_scopes_is_fine() {
        let store = MemoryTreeStore::new();
        let mut tx = store.begin().await.unwrap();
        tx.insert(&node(Uuid::new_v4(), 1)).await.unwrap();
        tx.insert(&node(Uuid::new_v4(), 1)).await.unwrap();
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn siblings_are_ordered_by_position() {
        let store = MemoryTreeStore::new();
        let owner = Uuid::new_v4();
        for p in [3, 1, 2] {
            store.seed(node(owner, p)).await;
        }
        let scope = node(owner, 0).sibling_scope();
        let mut tx = store.begin().await.unwrap();
        let positions: Vec<i32> = tx.siblings(&scope).await.unwrap().iter().map(|n| n.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }
}
