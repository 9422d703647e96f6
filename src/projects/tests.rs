use super::models as projects;
use crate::common::errors::{Constraint, MachineError};
use crate::common::test_helpers::{
    assign_design_values, create_test_design, create_test_plate, create_test_project,
    setup_test_db,
};
use crate::designs::models::DesignType;
use crate::phenotypes::models as phenotypes;
use crate::plates::{models as plates, services as plate_services};

#[tokio::test]
async fn test_create_and_list_projects() {
    let db = setup_test_db().await;
    let created = projects::create_project(&db, " Growth curves ", None)
        .await
        .unwrap();
    assert_eq!(created.name, "Growth curves");

    let fetched = projects::get_project(&db, created.id).await.unwrap();
    assert_eq!(fetched, created);
    let by_name = projects::find_project_by_name(&db, "Growth curves")
        .await
        .unwrap();
    assert_eq!(by_name.id, created.id);
    assert_eq!(projects::list_projects(&db).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_project_name_is_unique() {
    let db = setup_test_db().await;
    projects::create_project(&db, "Evolution", None).await.unwrap();
    let err = projects::create_project(&db, "Evolution", Some("again".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MachineError::ConstraintViolation {
            constraint: Constraint::ProjectName
        }
    ));
}

#[tokio::test]
async fn test_delete_project_cascades_through_plates() {
    let db = setup_test_db().await;
    let project = create_test_project(&db).await;
    let keep = create_test_project(&db).await;
    let (first, wells) = create_test_plate(&db, project.id, "P1", 2).await;
    let (second, _) = create_test_plate(&db, project.id, "P2", 2).await;
    let (kept_plate, _) = create_test_plate(&db, keep.id, "P1", 2).await;

    let media = create_test_design(&db, "media", DesignType::Str).await;
    assign_design_values(&db, &media, &wells, &[Some("LB"), Some("M9")]).await;
    phenotypes::create_phenotype(&db, "fast growers", &[wells[0].id], &[media.id])
        .await
        .unwrap();

    projects::delete_project(&db, project.id).await.unwrap();

    assert!(matches!(
        projects::get_project(&db, project.id).await,
        Err(MachineError::NotFound { .. })
    ));
    for plate in [&first, &second] {
        assert!(plates::get_plate(&db, plate.id).await.is_err());
    }
    assert!(plate_services::get_well(&db, wells[0].id).await.is_err());
    assert!(
        phenotypes::list_phenotypes(&db, Some(project.id))
            .await
            .unwrap()
            .is_empty()
    );

    // Other projects and shared designs are untouched
    plates::get_plate(&db, kept_plate.id).await.unwrap();
    crate::designs::models::get_design(&db, media.id).await.unwrap();
}
