use super::{models as designs, values::models as design_values};
use crate::common::errors::{Constraint, DbErrorExt, MachineResult};
use crate::plates::{models as plates, wells::models as wells};
use chrono::Utc;
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, JoinType, QueryOrder, QuerySelect, TransactionTrait,
    entity::prelude::*,
};

/// Record `value` for `design` in `well`. A second value for the same pair is
/// rejected rather than overwritten.
pub async fn set_design_value<C>(
    db: &C,
    well_id: Uuid,
    design_id: Uuid,
    value: &str,
) -> MachineResult<design_values::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    crate::plates::services::get_well(&txn, well_id).await?;
    designs::get_design(&txn, design_id).await?;

    let existing = design_values::Entity::find()
        .filter(design_values::Column::WellId.eq(well_id))
        .filter(design_values::Column::DesignId.eq(design_id))
        .one(&txn)
        .await?;
    if existing.is_some() {
        return Err(crate::constraint_violation!(Constraint::WellDesign));
    }

    let now = Utc::now();
    let inserted = design_values::ActiveModel {
        id: Set(Uuid::new_v4()),
        design_id: Set(design_id),
        well_id: Set(well_id),
        value: Set(value.to_string()),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(&txn)
    .await
    .map_err(|e| e.or_constraint(Constraint::WellDesign))?;

    txn.commit().await?;
    Ok(inserted)
}

/// Values recorded for a design, optionally only on plates called `plate_name`.
pub async fn design_values<C: ConnectionTrait>(
    db: &C,
    design_id: Uuid,
    plate_name: Option<&str>,
) -> MachineResult<Vec<design_values::Model>> {
    let mut query = design_values::Entity::find()
        .filter(design_values::Column::DesignId.eq(design_id))
        .order_by_asc(design_values::Column::Value);

    if let Some(plate) = plate_name {
        query = query
            .join(JoinType::InnerJoin, design_values::Relation::Wells.def())
            .join(JoinType::InnerJoin, wells::Relation::Plates.def())
            .filter(plates::Column::Name.eq(plate));
    }

    Ok(query.all(db).await?)
}

/// Wells that carry a value for a design, optionally only on plates called `plate_name`.
pub async fn wells_with_design<C: ConnectionTrait>(
    db: &C,
    design_id: Uuid,
    plate_name: Option<&str>,
) -> MachineResult<Vec<wells::Model>> {
    let mut query = wells::Entity::find()
        .join(JoinType::InnerJoin, wells::Relation::DesignValues.def())
        .filter(design_values::Column::DesignId.eq(design_id))
        .order_by_asc(wells::Column::CreatedAt)
        .order_by_asc(wells::Column::PlateNumber);

    if let Some(plate) = plate_name {
        query = query
            .join(JoinType::InnerJoin, wells::Relation::Plates.def())
            .filter(plates::Column::Name.eq(plate));
    }

    Ok(query.all(db).await?)
}
