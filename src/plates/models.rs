use crate::common::errors::{Constraint, DbErrorExt, MachineResult};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue::Set, ConnectionTrait, QueryOrder, entity::prelude::*};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plates")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
    /// Where the raw measurement table was read from
    pub data_table: Option<String>,
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
    #[sea_orm(has_many = "crate::plates::wells::models::Entity")]
    Wells,
}

impl Related<crate::projects::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Projects.def()
    }
}

impl Related<crate::plates::wells::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wells.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl std::fmt::Display for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Plate: {}", self.name)
    }
}

/// Create an empty plate. Fails when the project already has a plate by that name.
pub async fn create_plate<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    name: &str,
    data_table: Option<String>,
) -> MachineResult<Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(crate::invalid_input!("name", "plate name must not be empty"));
    }

    // Resolve the project first so a bad id reads as NotFound, not a key violation
    crate::projects::models::get_project(db, project_id).await?;

    let existing = Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::Name.eq(name))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(crate::constraint_violation!(Constraint::PlateNameInProject));
    }

    let now = Utc::now();
    let plate = ActiveModel {
        id: Set(Uuid::new_v4()),
        project_id: Set(project_id),
        name: Set(name.to_string()),
        data_table: Set(data_table),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(db)
    .await
    .map_err(|e| e.or_constraint(Constraint::PlateNameInProject))?;

    tracing::debug!(plate = %plate.name, project = %project_id, "created plate {}", plate.id);
    Ok(plate)
}

pub async fn get_plate<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("plate", id))
}

pub async fn find_plate<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
    name: &str,
) -> MachineResult<Model> {
    Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .filter(Column::Name.eq(name.trim()))
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("plate", name))
}

pub async fn list_plates<C: ConnectionTrait>(
    db: &C,
    project_id: Uuid,
) -> MachineResult<Vec<Model>> {
    Ok(Entity::find()
        .filter(Column::ProjectId.eq(project_id))
        .order_by_asc(Column::Name)
        .all(db)
        .await?)
}
