mod common;

use anyhow::Result;
use coop_content_api::tree::{NewNode, TreeError};
use coop_content_api::types::EntityKind;

const KIND: EntityKind = EntityKind::Category;

#[tokio::test]
async fn roots_are_appended_in_creation_order() -> Result<()> {
    let engine = common::engine();
    let scope = common::org();

    let a = engine.root(KIND, &scope, "A").await?;
    let b = engine.root(KIND, &scope, "B").await?;
    let c = engine.root(KIND, &scope, "C").await?;

    assert_eq!((a.position, b.position, c.position), (1, 2, 3));
    assert_eq!(engine.order(KIND, a.id).await?, vec!["A", "B", "C"]);
    Ok(())
}

#[tokio::test]
async fn scopes_number_independently() -> Result<()> {
    let engine = common::engine();
    let scope = common::org();
    let other_org = common::org();
    let german = scope.clone().with_partition("de");

    let a = engine.root(KIND, &scope, "A").await?;
    let x = engine.root(KIND, &other_org, "X").await?;
    let d = engine.root(KIND, &german, "D").await?;
    let child = engine.child(KIND, a.id, &scope, "A1").await?;

    assert_eq!(a.position, 1);
    assert_eq!(x.position, 1);
    assert_eq!(d.position, 1);
    assert_eq!(child.position, 1);
    Ok(())
}

#[tokio::test]
async fn reorder_moves_last_to_front() -> Result<()> {
    let engine = common::engine();
    let scope = common::org();
    let a = engine.root(KIND, &scope, "A").await?;
    engine.root(KIND, &scope, "B").await?;
    let c = engine.root(KIND, &scope, "C").await?;

    let moved = engine.mutator.reorder(KIND, c.id, 1).await?;

    assert_eq!(moved.position, 1);
    assert_eq!(engine.order(KIND, a.id).await?, vec!["C", "A", "B"]);
    assert_eq!(engine.positions(KIND, a.id).await?, vec![1, 2, 3]);
    Ok(())
}

#[tokio::test]
async fn reorder_moves_front_to_back_and_clamps() -> Result<()> {
    let engine = common::engine();
    let scope = common::org();
    let a = engine.root(KIND, &scope, "A").await?;
    engine.root(KIND, &scope, "B").await?;
    engine.root(KIND, &scope, "C").await?;

    let moved = engine.mutator.reorder(KIND, a.id, 99).await?;

    assert_eq!(moved.position, 3);
    assert_eq!(engine.order(KIND, a.id).await?, vec!["B", "C", "A"]);
    Ok(())
}

#[tokio::test]
async fn reorder_to_current_position_changes_nothing() -> Result<()> {
    let engine = common::engine();
    let scope = common::org();
    let a = engine.root(KIND, &scope, "A").await?;
    let b = engine.root(KIND, &scope, "B").await?;
    let before = engine.store.snapshot(KIND).await;

    let same = engine.mutator.reorder(KIND, b.id, 2).await?;

    assert_eq!(same.position, 2);
    assert_eq!(engine.store.snapshot(KIND).await, before);
    assert_eq!(engine.order(KIND, a.id).await?, vec!["A", "B"]);
    Ok(())
}

#[tokio::test]
async fn reorder_rejects_positions_below_one() -> Result<()> {
    let engine = common::engine();
    let a = engine.root(KIND, &common::org(), "A").await?;

    let err = engine.mutator.reorder(KIND, a.id, 0).await.unwrap_err();
    assert!(matches!(err, TreeError::InvalidPosition(0)));
    Ok(())
}

#[tokio::test]
async fn assign_position_rejects_occupied_slot() -> Result<()> {
    let engine = common::engine();
    let scope = common::org();
    let a = engine.root(KIND, &scope, "A").await?;
    let b = engine.root(KIND, &scope, "B").await?;

    let err = engine.mutator.assign_position(KIND, b.id, 1).await.unwrap_err();
    match err {
        TreeError::PositionConflict { position, occupied_by, .. } => {
            assert_eq!(position, 1);
            assert_eq!(occupied_by, a.id);
        }
        other => panic!("expected PositionConflict, got {other:?}"),
    }

    // A free slot is taken as-is, leaving a gap
    let moved = engine.mutator.assign_position(KIND, b.id, 5).await?;
    assert_eq!(moved.position, 5);
    assert_eq!(engine.positions(KIND, a.id).await?, vec![1, 5]);

    // Appends continue after the highest position
    let c = engine.root(KIND, &scope, "C").await?;
    assert_eq!(c.position, 6);
    Ok(())
}

#[tokio::test]
async fn create_at_explicit_position() -> Result<()> {
    let engine = common::engine();
    let scope = common::org();
    let a = engine.root(KIND, &scope, "A").await?;

    let err = engine
        .mutator
        .create(KIND, NewNode::new(scope.clone(), "B").at(1))
        .await
        .unwrap_err();
    assert!(matches!(err, TreeError::PositionConflict { .. }));

    let b = engine.mutator.create(KIND, NewNode::new(scope.clone(), "B").at(4)).await?;
    assert_eq!(b.position, 4);
    assert_eq!(engine.positions(KIND, a.id).await?, vec![1, 4]);
    Ok(())
}

#[tokio::test]
async fn positions_stay_unique_through_a_mix_of_operations() -> Result<()> {
    let engine = common::engine();
    let scope = common::org();
    let mut ids = Vec::new();
    for title in ["A", "B", "C", "D", "E"] {
        ids.push(engine.root(KIND, &scope, title).await?.id);
    }

    engine.mutator.reorder(KIND, ids[4], 2).await?;
    engine.mutator.reorder(KIND, ids[0], 4).await?;
    engine.mutator.delete(KIND, ids[2]).await?;
    engine.mutator.duplicate_as_draft(KIND, ids[1]).await?;
    engine.mutator.reparent(KIND, ids[3], Some(ids[1]), None).await?;

    let positions = engine.positions(KIND, ids[1]).await?;
    assert_eq!(positions, vec![1, 2, 3, 4]);
    Ok(())
}

#[tokio::test]
async fn concurrent_appends_get_distinct_positions() -> Result<()> {
    let engine = std::sync::Arc::new(common::engine());
    let scope = common::org();

    let mut tasks = Vec::new();
    for i in 0..10 {
        let engine = engine.clone();
        let scope = scope.clone();
        tasks.push(tokio::spawn(async move {
            engine.mutator.create(KIND, NewNode::new(scope, format!("N{i}"))).await
        }));
    }

    let mut positions = Vec::new();
    for task in tasks {
        positions.push(task.await??.position);
    }
    positions.sort_unstable();
    assert_eq!(positions, (1..=10).collect::<Vec<_>>());
    Ok(())
}

#[tokio::test]
async fn appending_after_the_largest_position_is_refused() -> Result<()> {
    let engine = common::engine();
    let scope = common::org();
    let last = engine
        .mutator
        .create(KIND, NewNode::new(scope.clone(), "Last").at(i32::MAX))
        .await?;
    assert_eq!(last.position, i32::MAX);

    let err = engine
        .mutator
        .create(KIND, NewNode::new(scope.clone(), "Next"))
        .await
        .unwrap_err();
    assert!(matches!(err, TreeError::PositionOverflow(i32::MAX)));

    let err = engine.mutator.duplicate_as_draft(KIND, last.id).await.unwrap_err();
    assert!(matches!(err, TreeError::PositionOverflow(i32::MAX)));

    // Nothing was written by the refused operations
    assert_eq!(engine.order(KIND, last.id).await?, vec!["Last"]);
    assert_eq!(engine.positions(KIND, last.id).await?, vec![i32::MAX]);
    Ok(())
}
