use super::{models as plates, services};
use crate::chemicals::{
    models as chemicals, quantities::models as chemical_quantities,
    quantities::models::QuantityType, services::add_quantity,
};
use crate::common::errors::{Constraint, MachineError};
use crate::common::test_helpers::{
    assign_design_values, create_test_design, create_test_plate, create_test_project,
    setup_test_db,
};
use crate::designs::{models as designs, models::DesignType, values::models as design_values};
use sea_orm::{EntityTrait, PaginatorTrait};
use uuid::Uuid;

#[tokio::test]
async fn test_plate_name_unique_within_project() {
    let db = setup_test_db().await;
    let first = create_test_project(&db).await;
    let second = create_test_project(&db).await;

    plates::create_plate(&db, first.id, "P1", None).await.unwrap();
    let err = plates::create_plate(&db, first.id, "P1", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        MachineError::ConstraintViolation {
            constraint: Constraint::PlateNameInProject
        }
    ));

    // The same name is fine in another project
    plates::create_plate(&db, second.id, "P1", Some("runs/p1.csv".to_string()))
        .await
        .unwrap();
    assert_eq!(plates::list_plates(&db, first.id).await.unwrap().len(), 1);
    assert_eq!(plates::list_plates(&db, second.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_plate_rejects_unknown_project_and_blank_name() {
    let db = setup_test_db().await;
    let err = plates::create_plate(&db, Uuid::new_v4(), "P1", None)
        .await
        .unwrap_err();
    assert!(matches!(err, MachineError::NotFound { .. }));

    let project = create_test_project(&db).await;
    let err = plates::create_plate(&db, project.id, "  ", None)
        .await
        .unwrap_err();
    assert!(matches!(err, MachineError::InvalidInput { .. }));
}

#[tokio::test]
async fn test_find_plate_and_wells_in_order() {
    let db = setup_test_db().await;
    let project = create_test_project(&db).await;
    let (plate, wells) = create_test_plate(&db, project.id, "P1", 5).await;

    let found = plates::find_plate(&db, project.id, "P1").await.unwrap();
    assert_eq!(found.id, plate.id);
    assert_eq!(found.to_string(), "Plate: P1");
    assert!(matches!(
        plates::find_plate(&db, project.id, "P2").await,
        Err(MachineError::NotFound { .. })
    ));

    let listed = services::plate_wells(&db, plate.id).await.unwrap();
    let ids: Vec<Uuid> = listed.iter().map(|w| w.id).collect();
    let expected: Vec<Uuid> = wells.iter().map(|w| w.id).collect();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn test_well_series_sorted_by_time() {
    let db = setup_test_db().await;
    let project = create_test_project(&db).await;
    let plate = plates::create_plate(&db, project.id, "P1", None)
        .await
        .unwrap();
    let well = services::create_well(&db, plate.id, 1).await.unwrap();
    services::add_measurements(&db, well.id, &[(2.0, 0.4), (0.0, 0.1), (1.0, 0.2)])
        .await
        .unwrap();

    let series = services::well_series(&db, &[well.id]).await.unwrap();
    assert_eq!(series[&well.id], vec![(0.0, 0.1), (1.0, 0.2), (2.0, 0.4)]);
    assert!(
        services::well_series(&db, &[])
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_delete_plate_cascades_but_keeps_reference_data() {
    let db = setup_test_db().await;
    let project = create_test_project(&db).await;
    let (plate, wells) = create_test_plate(&db, project.id, "P1", 3).await;
    let (other, _) = create_test_plate(&db, project.id, "P2", 2).await;

    let media = create_test_design(&db, "media", DesignType::Str).await;
    assign_design_values(&db, &media, &wells, &[Some("LB"), Some("LB"), Some("M9")]).await;
    let glucose = chemicals::create_chemical(&db, "glucose", None)
        .await
        .unwrap();
    add_quantity(&db, wells[0].id, glucose.id, QuantityType::Concentration, 1.0)
        .await
        .unwrap();

    services::delete_plate(&db, plate.id).await.unwrap();

    assert!(matches!(
        plates::get_plate(&db, plate.id).await,
        Err(MachineError::NotFound { .. })
    ));
    for well in &wells {
        assert!(matches!(
            services::get_well(&db, well.id).await,
            Err(MachineError::NotFound { .. })
        ));
    }
    assert_eq!(design_values::Entity::find().count(&db).await.unwrap(), 0);
    assert_eq!(
        chemical_quantities::Entity::find().count(&db).await.unwrap(),
        0
    );
    assert!(services::well_series(&db, &[wells[0].id]).await.unwrap().is_empty());

    // Shared definitions and the sibling plate survive
    designs::get_design(&db, media.id).await.unwrap();
    chemicals::get_chemical(&db, glucose.id).await.unwrap();
    assert_eq!(services::plate_wells(&db, other.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_delete_unknown_plate() {
    let db = setup_test_db().await;
    let err = services::delete_plate(&db, Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, MachineError::NotFound { .. }));
}
