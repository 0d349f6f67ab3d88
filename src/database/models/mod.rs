pub mod node;

pub use node::{NodeRow, NODE_COLUMNS};
