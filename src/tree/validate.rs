use crate::tree::error::{TreeError, TreeResult};
use crate::tree::node::{NodeId, TreeNode};
use crate::tree::store::TreeTx;

/// Check that `candidate` may become the parent of `node` and return it.
///
/// `node` need not be stored yet; a fresh node has no descendants so only the
/// self-parent and scope rules can fail for it.
pub async fn check_parent<T: TreeTx>(tx: &mut T, node: &TreeNode, candidate: NodeId) -> TreeResult<TreeNode> {
    let kind = node.kind;

    if candidate == node.id {
        return Err(TreeError::SelfParent { kind, id: node.id });
    }

    let parent = tx
        .find(kind, candidate)
        .await?
        .ok_or(TreeError::NotFound { kind, id: candidate })?;

    if !parent.scope.same_family(&node.scope) {
        return Err(TreeError::CrossScope {
            kind,
            id: node.id,
            parent_id: candidate,
        });
    }

    // Walk up from the candidate. The bound only trips on data that is
    // already cyclic.
    let bound = tx.count(kind).await?;
    let mut steps: u64 = 0;
    let mut current = Some(parent.clone());
    while let Some(ancestor) = current {
        if ancestor.id == node.id || steps > bound {
            return Err(TreeError::CircularReference {
                kind,
                id: node.id,
                parent_id: candidate,
            });
        }
        current = match ancestor.parent_id {
            Some(next) => tx.find(kind, next).await?,
            None => None,
        };
        steps += 1;
    }

    Ok(parent)
}
