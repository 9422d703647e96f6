use super::quantities::models::QuantityType;
use super::{models as chemicals, quantities::models as quantities};
use crate::common::errors::{Constraint, DbErrorExt, MachineResult};
use chrono::Utc;
use sea_orm::{ActiveValue::Set, ConnectionTrait, TransactionTrait, entity::prelude::*};

/// Record how much of `chemical_id` is in `well_id`. A well holds at most one
/// quantity per chemical.
pub async fn add_quantity<C>(
    db: &C,
    well_id: Uuid,
    chemical_id: Uuid,
    quantity_type: QuantityType,
    value: f64,
) -> MachineResult<quantities::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    if !value.is_finite() {
        return Err(crate::invalid_input!("value", "quantity must be a finite number"));
    }

    let txn = db.begin().await?;

    crate::plates::services::get_well(&txn, well_id).await?;
    chemicals::get_chemical(&txn, chemical_id).await?;

    let existing = quantities::Entity::find()
        .filter(quantities::Column::WellId.eq(well_id))
        .filter(quantities::Column::ChemicalId.eq(chemical_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(crate::constraint_violation!(Constraint::WellChemical));
    }

    let now = Utc::now();
    let quantity = quantities::ActiveModel {
        id: Set(Uuid::new_v4()),
        chemical_id: Set(chemical_id),
        well_id: Set(well_id),
        quantity_type: Set(quantity_type),
        value: Set(value),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(|e| e.or_constraint(Constraint::WellChemical))?;

    txn.commit().await?;
    Ok(quantity)
}

/// Quantities held by a well, with their chemicals.
pub async fn well_quantities<C: ConnectionTrait>(
    db: &C,
    well_id: Uuid,
) -> MachineResult<Vec<(quantities::Model, chemicals::Model)>> {
    let rows = quantities::Entity::find()
        .filter(quantities::Column::WellId.eq(well_id))
        .find_also_related(chemicals::Entity)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(quantity, chemical)| chemical.map(|c| (quantity, c)))
        .collect())
}
