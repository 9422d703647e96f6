use super::{measurements::models as measurements, models as plates, wells::models as wells};
use crate::chemicals::quantities::models as chemical_quantities;
use crate::common::errors::MachineResult;
use crate::designs::values::models as design_values;
use crate::phenotypes::wells::models as phenotype_wells;
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, QueryOrder, TransactionTrait, entity::prelude::*,
};
use std::collections::HashMap;

const INSERT_CHUNK: usize = 1000;

pub async fn create_well<C: ConnectionTrait>(
    db: &C,
    plate_id: Uuid,
    plate_number: i32,
) -> MachineResult<wells::Model> {
    let now = Utc::now();
    let well = wells::ActiveModel {
        id: Set(Uuid::new_v4()),
        plate_id: Set(plate_id),
        plate_number: Set(plate_number),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(db)
    .await?;
    Ok(well)
}

pub async fn get_well<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<wells::Model> {
    wells::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("well", id))
}

/// Store a well's time series as `(time, value)` pairs.
pub async fn add_measurements<C: ConnectionTrait>(
    db: &C,
    well_id: Uuid,
    readings: &[(f64, f64)],
) -> MachineResult<usize> {
    let now = Utc::now();
    for chunk in readings.chunks(INSERT_CHUNK) {
        let rows = chunk.iter().map(|(time, value)| measurements::ActiveModel {
            id: Set(Uuid::new_v4()),
            well_id: Set(well_id),
            time: Set(*time),
            value: Set(*value),
            created_at: Set(now),
            last_updated: Set(now),
        });
        measurements::Entity::insert_many(rows)
            .exec_without_returning(db)
            .await?;
    }
    Ok(readings.len())
}

/// Wells of a plate in creation order, ties broken by position.
pub async fn plate_wells<C: ConnectionTrait>(
    db: &C,
    plate_id: Uuid,
) -> MachineResult<Vec<wells::Model>> {
    Ok(wells::Entity::find()
        .filter(wells::Column::PlateId.eq(plate_id))
        .order_by_asc(wells::Column::CreatedAt)
        .order_by_asc(wells::Column::PlateNumber)
        .all(db)
        .await?)
}

/// Time series for each of `well_ids`, readings sorted by time.
pub async fn well_series<C: ConnectionTrait>(
    db: &C,
    well_ids: &[Uuid],
) -> MachineResult<HashMap<Uuid, Vec<(f64, f64)>>> {
    let mut series: HashMap<Uuid, Vec<(f64, f64)>> = HashMap::new();
    if well_ids.is_empty() {
        return Ok(series);
    }

    for chunk in well_ids.chunks(INSERT_CHUNK) {
        let readings = measurements::Entity::find()
            .filter(measurements::Column::WellId.is_in(chunk.to_vec()))
            .order_by_asc(measurements::Column::Time)
            .all(db)
            .await?;
        for reading in readings {
            series
                .entry(reading.well_id)
                .or_default()
                .push((reading.time, reading.value));
        }
    }
    Ok(series)
}

/// Remove every well of a plate and everything the wells own. The plate row
/// itself and the shared design/chemical definitions are left alone.
pub(crate) async fn delete_plate_contents<C: ConnectionTrait>(
    db: &C,
    plate_id: Uuid,
) -> MachineResult<usize> {
    let well_ids: Vec<Uuid> = wells::Entity::find()
        .filter(wells::Column::PlateId.eq(plate_id))
        .all(db)
        .await?
        .into_iter()
        .map(|w| w.id)
        .collect();

    for chunk in well_ids.chunks(INSERT_CHUNK) {
        let ids = chunk.to_vec();
        design_values::Entity::delete_many()
            .filter(design_values::Column::WellId.is_in(ids.clone()))
            .exec(db)
            .await?;
        chemical_quantities::Entity::delete_many()
            .filter(chemical_quantities::Column::WellId.is_in(ids.clone()))
            .exec(db)
            .await?;
        measurements::Entity::delete_many()
            .filter(measurements::Column::WellId.is_in(ids.clone()))
            .exec(db)
            .await?;
        phenotype_wells::Entity::delete_many()
            .filter(phenotype_wells::Column::WellId.is_in(ids))
            .exec(db)
            .await?;
    }

    wells::Entity::delete_many()
        .filter(wells::Column::PlateId.eq(plate_id))
        .exec(db)
        .await?;

    Ok(well_ids.len())
}

/// Delete a plate, cascading to its wells and their values, quantities and readings.
pub async fn delete_plate<C>(db: &C, plate_id: Uuid) -> MachineResult<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let plate = plates::get_plate(&txn, plate_id).await?;
    let removed = delete_plate_contents(&txn, plate_id).await?;
    plates::Entity::delete_by_id(plate_id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(plate = %plate.name, "deleted plate and {removed} wells");
    Ok(())
}
