use async_trait::async_trait;
use sha2::{Digest, Sha256};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use crate::database::manager::DatabaseError;
use crate::database::models::node::{NodeRow, NODE_COLUMNS};
use crate::tree::{NodeId, PositionMove, SiblingScope, TreeNode, TreeStore, TreeTx};
use crate::types::EntityKind;

/// TreeStore over the `categories`, `pages` and `page_components` tables.
///
/// Scopes are locked with transaction-scoped advisory locks; the deferred
/// unique constraint on positions (see sql/schema.sql) catches anything that
/// slips past them.
#[derive(Clone)]
pub struct PgTreeStore {
    pool: PgPool,
    lock_timeout_ms: u64,
}

impl PgTreeStore {
    pub fn new(pool: PgPool, lock_timeout_ms: u64) -> Self {
        Self { pool, lock_timeout_ms }
    }
}

/// 64-bit advisory lock id for a lock name
pub fn advisory_lock_id(name: &str) -> i64 {
    let digest = Sha256::digest(name.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    i64::from_be_bytes(bytes)
}

fn map_commit_error(err: sqlx::Error) -> DatabaseError {
    match err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            DatabaseError::ConstraintViolation(db.message().to_string())
        }
        other => DatabaseError::Sqlx(other),
    }
}

#[async_trait]
impl TreeStore for PgTreeStore {
    type Tx = PgTreeTx;

    async fn begin(&self) -> Result<Self::Tx, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        // SET does not take bind parameters
        sqlx::query(&format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await?;
        Ok(PgTreeTx { tx })
    }
}

pub struct PgTreeTx {
    tx: Transaction<'static, Postgres>,
}

fn into_nodes(rows: Vec<NodeRow>, kind: EntityKind) -> Result<Vec<TreeNode>, DatabaseError> {
    rows.into_iter().map(|row| row.into_node(kind)).collect()
}

#[async_trait]
impl TreeTx for PgTreeTx {
    async fn lock_scope(&mut self, scope: &SiblingScope) -> Result<(), DatabaseError> {
        let name = scope.family_lock_name();
        debug!("Acquiring advisory lock for {}", name);
        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(advisory_lock_id(&name))
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn find(&mut self, kind: EntityKind, id: NodeId) -> Result<Option<TreeNode>, DatabaseError> {
        let sql = format!("SELECT {} FROM \"{}\" WHERE id = $1", NODE_COLUMNS, kind.table_name());
        let row = sqlx::query_as::<_, NodeRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(|r| r.into_node(kind)).transpose()
    }

    async fn siblings(&mut self, scope: &SiblingScope) -> Result<Vec<TreeNode>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" \
             WHERE parent_id IS NOT DISTINCT FROM $1::uuid \
               AND scope_owner = $2 \
               AND scope_partition IS NOT DISTINCT FROM $3::text \
             ORDER BY position, id",
            NODE_COLUMNS,
            scope.kind.table_name()
        );
        let rows = sqlx::query_as::<_, NodeRow>(&sql)
            .bind(scope.parent_id)
            .bind(scope.key.owner)
            .bind(&scope.key.partition)
            .fetch_all(&mut *self.tx)
            .await?;
        into_nodes(rows, scope.kind)
    }

    async fn children(&mut self, kind: EntityKind, id: NodeId) -> Result<Vec<TreeNode>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM \"{}\" WHERE parent_id = $1 ORDER BY scope_partition NULLS FIRST, position, id",
            NODE_COLUMNS,
            kind.table_name()
        );
        let rows = sqlx::query_as::<_, NodeRow>(&sql)
            .bind(id)
            .fetch_all(&mut *self.tx)
            .await?;
        into_nodes(rows, kind)
    }

    async fn count(&mut self, kind: EntityKind) -> Result<u64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM \"{}\"", kind.table_name());
        let count: i64 = sqlx::query_scalar::<_, i64>(&sql).fetch_one(&mut *self.tx).await?;
        Ok(count.max(0) as u64)
    }

    async fn insert(&mut self, node: &TreeNode) -> Result<(), DatabaseError> {
        let sql = format!(
            "INSERT INTO \"{}\" ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            node.kind.table_name(),
            NODE_COLUMNS
        );
        sqlx::query(&sql)
            .bind(node.id)
            .bind(node.parent_id)
            .bind(node.position)
            .bind(node.scope.owner)
            .bind(&node.scope.partition)
            .bind(&node.title)
            .bind(&node.slug)
            .bind(node.status.as_str())
            .bind(node.published_at)
            .bind(node.is_active)
            .bind(sqlx::types::Json(&node.attributes))
            .bind(node.componentable.map(|c| c.kind.as_str()))
            .bind(node.componentable.map(|c| c.id))
            .bind(node.created_at)
            .bind(node.updated_at)
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn update(&mut self, node: &TreeNode) -> Result<(), DatabaseError> {
        let sql = format!(
            "UPDATE \"{}\" SET parent_id = $2, position = $3, scope_owner = $4, scope_partition = $5, \
             title = $6, slug = $7, status = $8, published_at = $9, is_active = $10, attributes = $11, \
             componentable_type = $12, componentable_id = $13, updated_at = $14 \
             WHERE id = $1",
            node.kind.table_name()
        );
        let result = sqlx::query(&sql)
            .bind(node.id)
            .bind(node.parent_id)
            .bind(node.position)
            .bind(node.scope.owner)
            .bind(&node.scope.partition)
            .bind(&node.title)
            .bind(&node.slug)
            .bind(node.status.as_str())
            .bind(node.published_at)
            .bind(node.is_active)
            .bind(sqlx::types::Json(&node.attributes))
            .bind(node.componentable.map(|c| c.kind.as_str()))
            .bind(node.componentable.map(|c| c.id))
            .bind(node.updated_at)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::QueryError(format!(
                "no row {} in {}",
                node.id,
                node.kind.table_name()
            )));
        }
        Ok(())
    }

    async fn set_positions(&mut self, kind: EntityKind, moves: &[PositionMove]) -> Result<(), DatabaseError> {
        // Intermediate duplicates are fine: the unique constraint is deferred
        let sql = format!(
            "UPDATE \"{}\" SET position = $2, updated_at = now() WHERE id = $1",
            kind.table_name()
        );
        for m in moves {
            sqlx::query(&sql)
                .bind(m.id)
                .bind(m.position)
                .execute(&mut *self.tx)
                .await?;
        }
        Ok(())
    }

    async fn remove(&mut self, kind: EntityKind, id: NodeId) -> Result<(), DatabaseError> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = $1", kind.table_name());
        sqlx::query(&sql).bind(id).execute(&mut *self.tx).await?;
        Ok(())
    }

    async fn attached_content(&mut self, kind: EntityKind, id: NodeId) -> Result<u64, DatabaseError> {
        let sql = match kind {
            EntityKind::Category => {
                "SELECT (SELECT COUNT(*) FROM articles WHERE category_id = $1) \
                      + (SELECT COUNT(*) FROM images WHERE category_id = $1)"
            }
            EntityKind::Page => "SELECT COUNT(*) FROM page_components WHERE scope_owner = $1",
            // A component references its content, it does not own any
            EntityKind::PageComponent => return Ok(0),
        };
        let count: i64 = sqlx::query_scalar::<_, i64>(sql)
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit().await.map_err(map_commit_error)
    }
}
