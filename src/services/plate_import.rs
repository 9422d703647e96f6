use super::tables::{DesignTable, MeasurementTable};
use crate::common::errors::{Constraint, DbErrorExt, MachineResult};
use crate::designs::{models as designs, values::models as design_values};
use crate::plates::{models as plates, services as plate_services};
use chrono::Utc;
use sea_orm::{ActiveValue::Set, ConnectionTrait, EntityTrait, TransactionTrait};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;
use uuid::Uuid;

const INSERT_CHUNK: usize = 1000;

/// Everything needed to create one plate from exported tables
#[derive(Debug, Clone)]
pub struct PlateImport {
    pub project_id: Uuid,
    pub name: String,
    /// Where the measurement table came from, kept on the plate for reference
    pub data_table: Option<String>,
    pub data: MeasurementTable,
    pub design: Option<DesignTable>,
    /// Design columns to leave out
    pub ignore: Vec<String>,
}

/// Counts of what an import wrote
#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub plate: plates::Model,
    pub wells_created: usize,
    pub measurements_created: usize,
    pub design_values_created: usize,
    pub designs_created: Vec<String>,
    pub columns_ignored: Vec<String>,
    pub processing_time_ms: u128,
}

/// Create a plate with its wells, readings and design values. Either all of
/// it is written or none of it.
pub async fn import_plate<C>(db: &C, import: PlateImport) -> MachineResult<ImportResult>
where
    C: ConnectionTrait + TransactionTrait,
{
    let start_time = Instant::now();
    let PlateImport {
        project_id,
        name,
        data_table,
        data,
        design,
        ignore,
    } = import;

    if data.wells.is_empty() {
        return Err(crate::invalid_input!("data", "measurement table has no wells"));
    }

    let mut columns_ignored = Vec::new();
    let design = match design {
        Some(mut table) => {
            columns_ignored = table.drop_columns(&ignore);
            let known = data.well_numbers();
            if let Some((number, _)) = table.rows.iter().find(|(n, _)| !known.contains(n)) {
                return Err(crate::invalid_input!(
                    "design",
                    format!("well {number} is not in the measurement table")
                ));
            }
            Some(table)
        }
        None => None,
    };

    let txn = db.begin().await?;

    let plate = plates::create_plate(&txn, project_id, &name, data_table).await?;

    let mut well_ids: HashMap<i32, Uuid> = HashMap::with_capacity(data.wells.len());
    let mut measurements_created = 0;
    for (number, readings) in &data.wells {
        let well = plate_services::create_well(&txn, plate.id, *number).await?;
        measurements_created += plate_services::add_measurements(&txn, well.id, readings).await?;
        well_ids.insert(*number, well.id);
    }

    let mut designs_created = Vec::new();
    let mut design_values_created = 0;
    if let Some(table) = &design {
        for (idx, design_name) in table.designs.iter().enumerate() {
            let target = match designs::find_design_by_name(&txn, design_name).await? {
                Some(existing) => existing,
                None => {
                    let created =
                        designs::create_design(&txn, design_name, table.infer_type(idx)).await?;
                    tracing::info!("import created design {created}");
                    designs_created.push(created.name.clone());
                    created
                }
            };

            let now = Utc::now();
            let rows: Vec<design_values::ActiveModel> = table
                .rows
                .iter()
                .filter_map(|(number, cells)| {
                    let value = cells.get(idx)?.as_ref()?;
                    let well_id = well_ids.get(number)?;
                    Some(design_values::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        design_id: Set(target.id),
                        well_id: Set(*well_id),
                        value: Set(value.clone()),
                        created_at: Set(now),
                        last_updated: Set(now),
                    })
                })
                .collect();

            design_values_created += rows.len();
            for chunk in rows.chunks(INSERT_CHUNK) {
                design_values::Entity::insert_many(chunk.to_vec())
                    .exec_without_returning(&txn)
                    .await
                    .map_err(|e| e.or_constraint(Constraint::WellDesign))?;
            }
        }
    }

    txn.commit().await?;

    let result = ImportResult {
        plate,
        wells_created: well_ids.len(),
        measurements_created,
        design_values_created,
        designs_created,
        columns_ignored,
        processing_time_ms: start_time.elapsed().as_millis(),
    };
    tracing::info!(
        plate = %result.plate.name,
        "imported {} wells, {} readings and {} design values in {} ms",
        result.wells_created,
        result.measurements_created,
        result.design_values_created,
        result.processing_time_ms
    );
    Ok(result)
}
