pub mod component_source;
pub mod manager;
pub mod models;
pub mod tree_store;

pub use component_source::{postgres_registry, PgComponentSource};
pub use manager::{DatabaseError, DatabaseManager};
pub use tree_store::{PgTreeStore, PgTreeTx};
