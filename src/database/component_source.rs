use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::components::{ComponentRegistry, ComponentSource, ComponentableType};
use crate::database::manager::DatabaseError;

/// Resolves componentables against their content table
pub struct PgComponentSource {
    pool: PgPool,
    kind: ComponentableType,
}

impl PgComponentSource {
    pub fn new(pool: PgPool, kind: ComponentableType) -> Self {
        Self { pool, kind }
    }
}

#[async_trait]
impl ComponentSource for PgComponentSource {
    async fn exists(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let sql = format!(
            "SELECT EXISTS (SELECT 1 FROM \"{}\" WHERE id = $1)",
            self.kind.table_name()
        );
        let found = sqlx::query_scalar::<_, bool>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }
}

/// Registry with every componentable type backed by its Postgres table
pub fn postgres_registry(pool: &PgPool) -> ComponentRegistry {
    ComponentableType::ALL
        .into_iter()
        .fold(ComponentRegistry::new(), |registry, kind| {
            registry.register(kind, Arc::new(PgComponentSource::new(pool.clone(), kind)))
        })
}
