use super::{designs::models as phenotype_designs, wells::models as phenotype_wells};
use crate::common::errors::MachineResult;
use crate::designs::models as designs;
use crate::machine::{Dataset, Machine};
use crate::plates::{models as plates, wells::models as wells};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, JoinType, QueryOrder, QuerySelect, TransactionTrait,
    entity::prelude::*,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named selection of wells together with the designs that describe them
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "phenotypes")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::projects::models::Entity",
        from = "Column::ProjectId",
        to = "crate::projects::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Projects,
    #[sea_orm(has_many = "crate::phenotypes::wells::models::Entity")]
    PhenotypeWells,
    #[sea_orm(has_many = "crate::phenotypes::designs::models::Entity")]
    PhenotypeDesigns,
}

impl Related<crate::projects::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<crate::phenotypes::wells::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PhenotypeWells.def()
    }
}

impl Related<crate::phenotypes::designs::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PhenotypeDesigns.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Save a phenotype over `well_ids` described by `design_ids`. The phenotype
/// belongs to the project of the first well's plate.
pub async fn create_phenotype<C>(
    db: &C,
    name: &str,
    well_ids: &[Uuid],
    design_ids: &[Uuid],
) -> MachineResult<Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(crate::invalid_input!("name", "phenotype name must not be empty"));
    }
    let Some(first_well) = well_ids.first() else {
        return Err(crate::invalid_input!("wells", "a phenotype needs at least one well"));
    };

    let unique_wells: BTreeSet<Uuid> = well_ids.iter().copied().collect();
    let unique_designs: BTreeSet<Uuid> = design_ids.iter().copied().collect();

    let txn = db.begin().await?;

    let found_wells = wells::Entity::find()
        .filter(wells::Column::Id.is_in(unique_wells.iter().copied()))
        .all(&txn)
        .await?;
    if let Some(missing) = unique_wells
        .iter()
        .find(|id| !found_wells.iter().any(|w| w.id == **id))
    {
        return Err(crate::not_found!("well", missing));
    }

    if !unique_designs.is_empty() {
        let found_designs = designs::Entity::find()
            .filter(designs::Column::Id.is_in(unique_designs.iter().copied()))
            .all(&txn)
            .await?;
        if let Some(missing) = unique_designs
            .iter()
            .find(|id| !found_designs.iter().any(|d| d.id == **id))
        {
            return Err(crate::not_found!("design", missing));
        }
    }

    let well = crate::plates::services::get_well(&txn, *first_well).await?;
    let plate = plates::get_plate(&txn, well.plate_id).await?;

    let now = Utc::now();
    let phenotype = ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(plate.project_id),
        name: Set(name.to_string()),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(&txn)
    .await?;

    phenotype_wells::Entity::insert_many(unique_wells.iter().map(|well_id| {
        phenotype_wells::ActiveModel {
            phenotype_id: Set(phenotype.id),
            well_id: Set(*well_id),
        }
    }))
    .exec_without_returning(&txn)
    .await?;

    if !unique_designs.is_empty() {
        phenotype_designs::Entity::insert_many(unique_designs.iter().map(|design_id| {
            phenotype_designs::ActiveModel {
                phenotype_id: Set(phenotype.id),
                design_id: Set(*design_id),
            }
        }))
        .exec_without_returning(&txn)
        .await?;
    }

    txn.commit().await?;
    tracing::info!(
        phenotype = %phenotype.name,
        "created phenotype over {} wells and {} designs",
        unique_wells.len(),
        unique_designs.len()
    );
    Ok(phenotype)
}

pub async fn get_phenotype<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("phenotype", id))
}

pub async fn list_phenotypes<C: ConnectionTrait>(
    db: &C,
    project_id: Option<Uuid>,
) -> MachineResult<Vec<Model>> {
    let mut query = Entity::find().order_by_asc(Column::Name);
    if let Some(project) = project_id {
        query = query.filter(Column::ProjectId.eq(project));
    }
    Ok(query.all(db).await?)
}

pub async fn phenotype_wells<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> MachineResult<Vec<wells::Model>> {
    Ok(wells::Entity::find()
        .join(JoinType::InnerJoin, phenotype_wells::Relation::Wells.def().rev())
        .filter(phenotype_wells::Column::PhenotypeId.eq(id))
        .order_by_asc(wells::Column::CreatedAt)
        .order_by_asc(wells::Column::PlateNumber)
        .all(db)
        .await?)
}

pub async fn phenotype_designs<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> MachineResult<Vec<designs::Model>> {
    Ok(designs::Entity::find()
        .join(JoinType::InnerJoin, phenotype_designs::Relation::Designs.def().rev())
        .filter(phenotype_designs::Column::PhenotypeId.eq(id))
        .order_by_asc(designs::Column::Name)
        .all(db)
        .await?)
}

/// The phenotype's wells as a dataset with one column per phenotype design.
pub async fn phenotype_dataset<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<Dataset> {
    let phenotype = get_phenotype(db, id).await?;
    let wells = phenotype_wells(db, phenotype.id).await?;
    let include: Vec<String> = phenotype_designs(db, phenotype.id)
        .await?
        .into_iter()
        .map(|d| d.name)
        .collect();

    Machine::new(db).get(&wells, &include).await
}

pub(crate) async fn delete_for_project<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
) -> MachineResult<()> {
    let ids: Vec<Uuid> = Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .all(db)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();
    if ids.is_empty() {
        return Ok(());
    }

    phenotype_wells::Entity::delete_many()
        .filter(phenotype_wells::Column::PhenotypeId.is_in(ids.clone()))
        .exec(db)
        .await?;
    phenotype_designs::Entity::delete_many()
        .filter(phenotype_designs::Column::PhenotypeId.is_in(ids.clone()))
        .exec(db)
        .await?;
    Entity::delete_many()
        .filter(Column::Id.is_in(ids))
        .exec(db)
        .await?;
    Ok(())
}
