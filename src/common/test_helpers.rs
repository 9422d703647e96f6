//! Shared fixtures for the test suite.
//!
//! Every test gets its own in-memory SQLite database with migrations applied,
//! so tests never see each other's rows.
use crate::config::{Config, connect};
use crate::designs::{models as designs, models::DesignType, services::set_design_value};
use crate::plates::{models as plates, services as plate_services, wells::models as wells};
use crate::projects::models as projects;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

pub async fn setup_test_db() -> DatabaseConnection {
    connect(&Config::for_tests(), true)
        .await
        .expect("Failed to set up test database")
}

/// Create a test project with a unique name
pub async fn create_test_project(db: &DatabaseConnection) -> projects::Model {
    projects::create_project(
        db,
        &format!("Test Project {}", Uuid::new_v4()),
        Some("Test project created by helper".to_string()),
    )
    .await
    .expect("Failed to create test project")
}

/// Create a plate with `wells` wells numbered from 1, each with a short
/// three-point time series
pub async fn create_test_plate(
    db: &DatabaseConnection,
    project_id: Uuid,
    name: &str,
    wells: i32,
) -> (plates::Model, Vec<wells::Model>) {
    let plate = plates::create_plate(db, project_id, name, None)
        .await
        .expect("Failed to create test plate");

    let mut created = Vec::new();
    for number in 1..=wells {
        let well = plate_services::create_well(db, plate.id, number)
            .await
            .expect("Failed to create test well");
        let base = f64::from(number) / 100.0;
        let readings = [(0.0, base), (1.0, base * 2.0), (2.0, base * 4.0)];
        plate_services::add_measurements(db, well.id, &readings)
            .await
            .expect("Failed to add test measurements");
        created.push(well);
    }

    (plate, created)
}

/// Return the design called `name`, creating it with `design_type` if needed
pub async fn create_test_design(
    db: &DatabaseConnection,
    name: &str,
    design_type: DesignType,
) -> designs::Model {
    if let Some(existing) = designs::find_design_by_name(db, name)
        .await
        .expect("Failed to look up design")
    {
        return existing;
    }
    designs::create_design(db, name, design_type)
        .await
        .expect("Failed to create test design")
}

/// Give each well in `wells` the matching entry of `values` for `design`.
/// `None` leaves the well without a value.
pub async fn assign_design_values(
    db: &DatabaseConnection,
    design: &designs::Model,
    wells: &[wells::Model],
    values: &[Option<&str>],
) {
    for (well, value) in wells.iter().zip(values) {
        if let Some(value) = value {
            set_design_value(db, well.id, design.id, value)
                .await
                .expect("Failed to set test design value");
        }
    }
}
