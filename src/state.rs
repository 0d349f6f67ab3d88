use axum::{
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::components::{ComponentRegistry, ComponentableType, MemoryComponentSource};
use crate::config::{AppConfig, StoreBackend, SubmissionConfig};
use crate::database::{postgres_registry, DatabaseError, DatabaseManager, PgTreeStore};
use crate::handlers::{public, tree};
use crate::submission::SubmissionGuard;
use crate::tree::{MemoryTreeStore, TreeMutator, TreeQueries, TreeStore};

/// Everything a handler needs, shared behind an `Arc`
pub struct AppState<S: TreeStore> {
    pub mutator: TreeMutator<S>,
    pub queries: TreeQueries<S>,
    pub guard: SubmissionGuard,
    /// Present on the postgres backend, pinged by `/health`
    pub pool: Option<PgPool>,
    pub backend: StoreBackend,
}

impl<S: TreeStore> AppState<S> {
    pub fn new(
        store: Arc<S>,
        registry: ComponentRegistry,
        submission: &SubmissionConfig,
        log_mutations: bool,
        backend: StoreBackend,
    ) -> Self {
        Self {
            mutator: TreeMutator::new(store.clone(), Arc::new(registry)).with_mutation_logging(log_mutations),
            queries: TreeQueries::new(store),
            guard: SubmissionGuard::new(submission),
            pool: None,
            backend,
        }
    }

    pub fn with_pool(mut self, pool: PgPool) -> Self {
        self.pool = Some(pool);
        self
    }
}

/// Handles returned alongside an in-memory app so callers can seed content
pub struct MemoryHandles {
    pub store: MemoryTreeStore,
    pub components: HashMap<ComponentableType, Arc<MemoryComponentSource>>,
}

/// In-process state backed by `MemoryTreeStore`
pub fn memory_state(config: &AppConfig) -> (Arc<AppState<MemoryTreeStore>>, MemoryHandles) {
    let store = MemoryTreeStore::new();
    let (registry, components) = ComponentRegistry::in_memory();
    let state = AppState::new(
        Arc::new(store.clone()),
        registry,
        &config.submission,
        config.tree.log_mutations,
        StoreBackend::Memory,
    );
    (Arc::new(state), MemoryHandles { store, components })
}

/// State backed by PostgreSQL; connects the pool first
pub async fn postgres_state(config: &AppConfig) -> Result<Arc<AppState<PgTreeStore>>, DatabaseError> {
    let pool = DatabaseManager::connect(&config.database).await?;
    let store = PgTreeStore::new(pool.clone(), config.database.lock_timeout_ms);
    let state = AppState::new(
        Arc::new(store),
        postgres_registry(&pool),
        &config.submission,
        config.tree.log_mutations,
        StoreBackend::Postgres,
    )
    .with_pool(pool);
    Ok(Arc::new(state))
}

pub fn router<S: TreeStore>(state: Arc<AppState<S>>, request_logging: bool) -> Router {
    let app = Router::new()
        .route("/health", get(public::health::<S>))
        .route("/public/submissions", post(public::submit::<S>))
        .merge(tree_routes::<S>())
        .with_state(state)
        .layer(CorsLayer::permissive());

    if request_logging {
        app.layer(TraceLayer::new_for_http())
    } else {
        app
    }
}

fn tree_routes<S: TreeStore>() -> Router<Arc<AppState<S>>> {
    Router::new()
        .route("/api/:kind", post(tree::create::<S>))
        .route("/api/:kind/:id", get(tree::show::<S>).delete(tree::destroy::<S>))
        .route("/api/:kind/:id/children", get(tree::children::<S>))
        .route("/api/:kind/:id/siblings", get(tree::siblings::<S>))
        .route("/api/:kind/:id/ancestors", get(tree::ancestors::<S>))
        .route("/api/:kind/:id/descendants", get(tree::descendants::<S>))
        .route("/api/:kind/:id/breadcrumb", get(tree::breadcrumb::<S>))
        .route("/api/:kind/:id/path", get(tree::path::<S>))
        .route("/api/:kind/:id/parent", put(tree::reparent::<S>))
        .route("/api/:kind/:id/position", put(tree::assign_position::<S>))
        .route("/api/:kind/:id/reorder", post(tree::reorder::<S>))
        .route("/api/:kind/:id/duplicate", post(tree::duplicate::<S>))
        .route("/api/:kind/:id/publish", post(tree::publish::<S>))
        .route("/api/:kind/:id/unpublish", post(tree::unpublish::<S>))
}
