// Hierarchical ordered tree engine shared by categories, pages and page
// components: parent validation, sibling positions, ancestry queries and the
// transactional mutator that ties them together.

pub mod error;
pub mod memory;
pub mod mutator;
pub mod node;
pub mod queries;
pub mod sequencer;
pub mod store;
pub mod validate;

pub use error::{TreeError, TreeResult};
pub use memory::MemoryTreeStore;
pub use mutator::TreeMutator;
pub use node::{reset_duplicate, Crumb, NewNode, NodeId, PathField, PublishState, ScopeKey, SiblingScope, TreeNode};
pub use queries::TreeQueries;
pub use sequencer::PositionSequencer;
pub use store::{PositionMove, TreeStore, TreeTx};
