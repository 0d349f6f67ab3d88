// Sibling position bookkeeping.
//
// The planning functions are pure: they take the current members of a scope
// (ordered or not) and return the position writes needed. The `*_in` helpers
// read the scope inside a transaction and apply the plan.

use crate::tree::error::{TreeError, TreeResult};
use crate::tree::node::{NodeId, SiblingScope, TreeNode};
use crate::tree::store::{PositionMove, TreeTx};

pub struct PositionSequencer;

impl PositionSequencer {
    /// `1 + max(position)`, or 1 for an empty scope
    pub fn next_position(siblings: &[TreeNode]) -> TreeResult<i32> {
        let last = siblings.iter().map(|s| s.position).max().unwrap_or(0);
        Self::after(last)
    }

    /// The slot right after `position`
    pub fn after(position: i32) -> TreeResult<i32> {
        position.checked_add(1).ok_or(TreeError::PositionOverflow(position))
    }

    /// Sibling other than `except` holding `position`
    pub fn occupant(siblings: &[TreeNode], position: i32, except: NodeId) -> Option<&TreeNode> {
        siblings
            .iter()
            .find(|s| s.position == position && s.id != except)
    }

    /// Reject positions below 1 and positions held by another sibling
    pub fn ensure_free(siblings: &[TreeNode], position: i32, node: &TreeNode) -> TreeResult<()> {
        if position < 1 {
            return Err(TreeError::InvalidPosition(position));
        }
        match Self::occupant(siblings, position, node.id) {
            Some(other) => Err(TreeError::PositionConflict {
                kind: node.kind,
                position,
                occupied_by: other.id,
            }),
            None => Ok(()),
        }
    }

    /// Shifting move of `node` to `target`. Targets past the last occupied
    /// position are clamped to it. Returns an empty plan for a no-op; the
    /// node's own move is part of the plan.
    pub fn plan_move(siblings: &[TreeNode], node: &TreeNode, target: i32) -> TreeResult<Vec<PositionMove>> {
        if target < 1 {
            return Err(TreeError::InvalidPosition(target));
        }

        let current = node.position;
        let last = siblings
            .iter()
            .map(|s| s.position)
            .chain(std::iter::once(current))
            .max()
            .unwrap_or(current);
        let target = target.min(last);

        if target == current {
            return Ok(Vec::new());
        }

        let mut moves: Vec<PositionMove> = if target < current {
            siblings
                .iter()
                .filter(|s| s.id != node.id && s.position >= target && s.position < current)
                .map(|s| PositionMove { id: s.id, position: s.position + 1 })
                .collect()
        } else {
            siblings
                .iter()
                .filter(|s| s.id != node.id && s.position > current && s.position <= target)
                .map(|s| PositionMove { id: s.id, position: s.position - 1 })
                .collect()
        };
        moves.push(PositionMove { id: node.id, position: target });
        Ok(moves)
    }

    /// Pull up every sibling after a vacated slot
    pub fn plan_close_gap(siblings: &[TreeNode], vacated: i32) -> Vec<PositionMove> {
        siblings
            .iter()
            .filter(|s| s.position > vacated)
            .map(|s| PositionMove { id: s.id, position: s.position - 1 })
            .collect()
    }

    /// Push down every sibling after `after` so `after + 1` is free
    pub fn plan_open_after(siblings: &[TreeNode], after: i32) -> TreeResult<Vec<PositionMove>> {
        Self::after(after)?;
        siblings
            .iter()
            .filter(|s| s.position > after)
            .map(|s| {
                Ok(PositionMove {
                    id: s.id,
                    position: Self::after(s.position)?,
                })
            })
            .collect()
    }

    /// Apply a shifting move; returns the node's final position
    pub async fn move_to_position_in<T: TreeTx>(tx: &mut T, node: &TreeNode, target: i32) -> TreeResult<i32> {
        let scope = node.sibling_scope();
        let siblings = tx.siblings(&scope).await?;
        let moves = Self::plan_move(&siblings, node, target)?;

        let final_position = moves
            .iter()
            .find(|m| m.id == node.id)
            .map(|m| m.position)
            .unwrap_or(node.position);

        if !moves.is_empty() {
            tx.set_positions(node.kind, &moves).await?;
        }
        Ok(final_position)
    }

    /// Close the slot `vacated` left behind in `scope`
    pub async fn close_gap_in<T: TreeTx>(tx: &mut T, scope: &SiblingScope, vacated: i32) -> TreeResult<()> {
        let siblings = tx.siblings(scope).await?;
        let moves = Self::plan_close_gap(&siblings, vacated);
        if !moves.is_empty() {
            tx.set_positions(scope.kind, &moves).await?;
        }
        Ok(())
    }
}
