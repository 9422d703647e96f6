use super::models::{children, create_strain, get_strain, lineage, set_parent};
use crate::common::errors::{Constraint, MachineError};
use crate::common::test_helpers::setup_test_db;
use uuid::Uuid;

#[tokio::test]
async fn test_lineage_runs_to_root() {
    let db = setup_test_db().await;
    let root = create_strain(&db, "MG1655", Some(16_397_289), None)
        .await
        .unwrap();
    let middle = create_strain(&db, "MG1655 dlacZ", None, Some(root.id))
        .await
        .unwrap();
    let leaf = create_strain(&db, "MG1655 dlacZ dara", None, Some(middle.id))
        .await
        .unwrap();

    let names: Vec<String> = lineage(&db, leaf.id)
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.name)
        .collect();
    assert_eq!(names, vec!["MG1655 dlacZ dara", "MG1655 dlacZ", "MG1655"]);

    let direct = children(&db, root.id).await.unwrap();
    assert_eq!(direct.len(), 1);
    assert_eq!(direct[0].id, middle.id);
}

#[tokio::test]
async fn test_set_parent_rejects_cycles() {
    let db = setup_test_db().await;
    let root = create_strain(&db, "root", None, None).await.unwrap();
    let child = create_strain(&db, "child", None, Some(root.id))
        .await
        .unwrap();
    let grandchild = create_strain(&db, "grandchild", None, Some(child.id))
        .await
        .unwrap();

    let loops = [
        (root.id, grandchild.id),
        (root.id, root.id),
        (child.id, grandchild.id),
    ];
    for (strain, parent) in loops {
        let err = set_parent(&db, strain, Some(parent)).await.unwrap_err();
        assert!(matches!(
            err,
            MachineError::ConstraintViolation {
                constraint: Constraint::StrainCycle
            }
        ));
    }

    // The rejected writes left the tree as it was
    assert_eq!(get_strain(&db, root.id).await.unwrap().parent_id, None);
    assert_eq!(lineage(&db, grandchild.id).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_set_parent_moves_and_detaches() {
    let db = setup_test_db().await;
    let first = create_strain(&db, "first", None, None).await.unwrap();
    let second = create_strain(&db, "second", None, None).await.unwrap();
    let child = create_strain(&db, "child", None, Some(first.id))
        .await
        .unwrap();

    let moved = set_parent(&db, child.id, Some(second.id)).await.unwrap();
    assert_eq!(moved.parent_id, Some(second.id));
    assert!(children(&db, first.id).await.unwrap().is_empty());

    let detached = set_parent(&db, child.id, None).await.unwrap();
    assert_eq!(detached.parent_id, None);
}

#[tokio::test]
async fn test_unknown_parent() {
    let db = setup_test_db().await;
    let err = create_strain(&db, "orphan", None, Some(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert!(matches!(err, MachineError::NotFound { .. }));
}
