use async_trait::async_trait;

use crate::database::DatabaseError;
use crate::tree::node::{NodeId, SiblingScope, TreeNode};
use crate::types::EntityKind;

/// New position for one node, applied as part of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionMove {
    pub id: NodeId,
    pub position: i32,
}

/// Storage backing the tree engine. Every engine operation runs inside one
/// transaction obtained from `begin`.
#[async_trait]
pub trait TreeStore: Send + Sync + 'static {
    type Tx: TreeTx;

    async fn begin(&self) -> Result<Self::Tx, DatabaseError>;
}

/// One storage transaction. Dropping it without `commit` discards its writes.
#[async_trait]
pub trait TreeTx: Send {
    /// Pessimistically lock the scope for the rest of the transaction
    async fn lock_scope(&mut self, scope: &SiblingScope) -> Result<(), DatabaseError>;

    async fn find(&mut self, kind: EntityKind, id: NodeId) -> Result<Option<TreeNode>, DatabaseError>;

    /// Members of the scope ordered by position
    async fn siblings(&mut self, scope: &SiblingScope) -> Result<Vec<TreeNode>, DatabaseError>;

    /// Direct children grouped by partition, then ordered by position
    async fn children(&mut self, kind: EntityKind, id: NodeId) -> Result<Vec<TreeNode>, DatabaseError>;

    /// Total number of nodes of a kind; bounds ancestor walks
    async fn count(&mut self, kind: EntityKind) -> Result<u64, DatabaseError>;

    async fn insert(&mut self, node: &TreeNode) -> Result<(), DatabaseError>;

    async fn update(&mut self, node: &TreeNode) -> Result<(), DatabaseError>;

    async fn set_positions(&mut self, kind: EntityKind, moves: &[PositionMove]) -> Result<(), DatabaseError>;

    async fn remove(&mut self, kind: EntityKind, id: NodeId) -> Result<(), DatabaseError>;

    /// Entity-specific content that blocks deletion (articles and images on a
    /// category, components on a page)
    async fn attached_content(&mut self, kind: EntityKind, id: NodeId) -> Result<u64, DatabaseError>;

    async fn commit(self) -> Result<(), DatabaseError>;
}
