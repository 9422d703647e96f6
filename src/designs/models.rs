use crate::common::errors::{Constraint, DbErrorExt, MachineResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, IntoActiveModel, PaginatorTrait, QueryOrder,
    entity::prelude::*,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared type of a design; stored values are text and coerced on read
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum DesignType {
    #[sea_orm(string_value = "str")]
    Str,
    #[sea_orm(string_value = "int")]
    Int,
    #[sea_orm(string_value = "float")]
    Float,
    #[sea_orm(string_value = "bool")]
    Bool,
}

impl DesignType {
    pub fn as_str(self) -> &'static str {
        match self {
            DesignType::Str => "str",
            DesignType::Int => "int",
            DesignType::Float => "float",
            DesignType::Bool => "bool",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DesignType::Int | DesignType::Float)
    }
}

impl fmt::Display for DesignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DesignType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "str" | "string" => Ok(DesignType::Str),
            "int" | "integer" => Ok(DesignType::Int),
            "float" => Ok(DesignType::Float),
            "bool" | "boolean" => Ok(DesignType::Bool),
            other => Err(format!(
                "unknown design type '{other}', expected one of str, int, float, bool"
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "designs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub design_type: DesignType,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub protocol: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::designs::values::models::Entity")]
    DesignValues,
}

impl Related<crate::designs::values::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DesignValues.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.design_type)
    }
}

/// Editable design attributes; `None` leaves a field untouched
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DesignUpdate {
    pub design_type: Option<DesignType>,
    pub description: Option<String>,
    pub protocol: Option<String>,
}

pub async fn create_design<C: ConnectionTrait>(
    db: &C,
    name: &str,
    design_type: DesignType,
) -> MachineResult<Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(crate::invalid_input!("name", "design name must not be empty"));
    }

    let now = Utc::now();
    let design = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        design_type: Set(design_type),
        description: Set(None),
        protocol: Set(None),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(db)
    .await
    .map_err(|e| e.or_constraint(Constraint::DesignName))?;

    tracing::debug!("created design {design}");
    Ok(design)
}

pub async fn get_design<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("design", id))
}

pub async fn find_design_by_name<C: ConnectionTrait>(
    db: &C,
    name: &str,
) -> MachineResult<Option<Model>> {
    Ok(Entity::find()
        .filter(Column::Name.eq(name.trim()))
        .one(db)
        .await?)
}

pub async fn list_designs<C: ConnectionTrait>(db: &C) -> MachineResult<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Name).all(db).await?)
}

/// Change a design's type or documentation. Stored values are not rewritten,
/// so a type change can make existing values fail coercion on read.
pub async fn update_design<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    update: DesignUpdate,
) -> MachineResult<Model> {
    let mut design = get_design(db, id).await?.into_active_model();
    if let Some(design_type) = update.design_type {
        design.design_type = Set(design_type);
    }
    if let Some(description) = update.description {
        design.description = Set(Some(description));
    }
    if let Some(protocol) = update.protocol {
        design.protocol = Set(Some(protocol));
    }
    design.last_updated = Set(Utc::now());

    Ok(design.update(db).await?)
}

/// Designs are shared reference data and cannot go while a well still uses them.
pub async fn delete_design<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<()> {
    let design = get_design(db, id).await?;
    let in_use = crate::designs::values::models::Entity::find()
        .filter(crate::designs::values::models::Column::DesignId.eq(id))
        .count(db)
        .await?;
    if in_use > 0 {
        return Err(crate::constraint_violation!(Constraint::DesignInUse));
    }

    Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| e.or_constraint(Constraint::DesignInUse))?;
    tracing::info!("deleted design {design}");
    Ok(())
}
