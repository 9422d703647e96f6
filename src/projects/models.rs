use crate::common::errors::{Constraint, DbErrorExt, MachineResult};
use crate::plates;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, QueryOrder, TransactionTrait, entity::prelude::*,
};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "projects")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::plates::models::Entity")]
    Plates,
    #[sea_orm(has_many = "crate::phenotypes::models::Entity")]
    Phenotypes,
}

impl Related<crate::plates::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plates.def()
    }
}

impl Related<crate::phenotypes::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phenotypes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

pub async fn create_project<C: ConnectionTrait>(
    db: &C,
    name: &str,
    description: Option<String>,
) -> MachineResult<Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(crate::invalid_input!("name", "project name must not be empty"));
    }

    let now = Utc::now();
    let project = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        description: Set(description),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(db)
    .await
    .map_err(|e| e.or_constraint(Constraint::ProjectName))?;

    tracing::info!(project = %project.name, "created project {}", project.id);
    Ok(project)
}

pub async fn get_project<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("project", id))
}

pub async fn find_project_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> MachineResult<Model> {
    Entity::find()
        .filter(Column::Name.eq(name.trim()))
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("project", name))
}

pub async fn list_projects<C: ConnectionTrait>(db: &C) -> MachineResult<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Name).all(db).await?)
}

/// Delete a project together with every plate it owns.
pub async fn delete_project<C>(db: &C, id: Uuid) -> MachineResult<()>
where
    C: ConnectionTrait + TransactionTrait,
{
    let txn = db.begin().await?;

    let project = get_project(&txn, id).await?;
    let plate_ids: Vec<Uuid> = plates::models::Entity::find()
        .filter(plates::models::Column::ProjectId.eq(id))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| p.id)
        .collect();

    for plate_id in &plate_ids {
        plates::services::delete_plate_contents(&txn, *plate_id).await?;
    }
    crate::phenotypes::models::delete_for_project(&txn, id).await?;
    plates::models::Entity::delete_many()
        .filter(plates::models::Column::ProjectId.eq(id))
        .exec(&txn)
        .await?;
    Entity::delete_by_id(id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!(
        project = %project.name,
        "deleted project and {} plates",
        plate_ids.len()
    );
    Ok(())
}
