use crate::common::errors::{Constraint, DbErrorExt, MachineResult};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, Condition, ConnectionTrait, PaginatorTrait, QueryOrder, entity::prelude::*,
};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chemicals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    #[sea_orm(unique, nullable)]
    pub abbreviation: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "crate::chemicals::quantities::models::Entity")]
    ChemicalQuantities,
}

impl Related<crate::chemicals::quantities::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChemicalQuantities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Short label: the abbreviation when there is one, else the name
    pub fn label(&self) -> &str {
        match self.abbreviation.as_deref() {
            Some(abbr) if !abbr.is_empty() => abbr,
            _ => &self.name,
        }
    }

    pub fn is_called(&self, text: &str) -> bool {
        let text = text.trim();
        self.name == text || self.abbreviation.as_deref() == Some(text)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.abbreviation {
            Some(abbr) => write!(f, "{} ({abbr})", self.name),
            None => f.write_str(&self.name),
        }
    }
}

pub async fn create_chemical<C: ConnectionTrait>(
    db: &C,
    name: &str,
    abbreviation: Option<&str>,
) -> MachineResult<Model> {
    let name = name.trim();
    if name.is_empty() {
        return Err(crate::invalid_input!("name", "chemical name must not be empty"));
    }
    let abbreviation = abbreviation
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(ToString::to_string);

    // Names and abbreviations share one namespace so lookups stay unambiguous
    if find_chemical(db, name).await?.is_some() {
        return Err(crate::constraint_violation!(Constraint::ChemicalName));
    }
    if let Some(abbr) = &abbreviation {
        if abbr == name || find_chemical(db, abbr).await?.is_some() {
            return Err(crate::constraint_violation!(Constraint::ChemicalAbbreviation));
        }
    }

    let now = Utc::now();
    let chemical = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        abbreviation: Set(abbreviation),
        created_at: Set(now),
        last_updated: Set(now),
    }
    .insert(db)
    .await
    .map_err(|e| {
        let constraint = if e.to_string().contains("abbreviation") {
            Constraint::ChemicalAbbreviation
        } else {
            Constraint::ChemicalName
        };
        e.or_constraint(constraint)
    })?;

    tracing::debug!("created chemical {chemical}");
    Ok(chemical)
}

pub async fn get_chemical<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<Model> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| crate::not_found!("chemical", id))
}

/// Look a chemical up by its name or its abbreviation. `create_chemical`
/// keeps both in one namespace, so at most one row matches.
pub async fn find_chemical<C: ConnectionTrait>(
    db: &C,
    name_or_abbreviation: &str,
) -> MachineResult<Option<Model>> {
    let key = name_or_abbreviation.trim();
    Ok(Entity::find()
        .filter(
            Condition::any()
                .add(Column::Name.eq(key))
                .add(Column::Abbreviation.eq(key)),
        )
        .one(db)
        .await?)
}

pub async fn list_chemicals<C: ConnectionTrait>(db: &C) -> MachineResult<Vec<Model>> {
    Ok(Entity::find().order_by_asc(Column::Name).all(db).await?)
}

pub async fn delete_chemical<C: ConnectionTrait>(db: &C, id: Uuid) -> MachineResult<()> {
    let chemical = get_chemical(db, id).await?;
    let in_use = crate::chemicals::quantities::models::Entity::find()
        .filter(crate::chemicals::quantities::models::Column::ChemicalId.eq(id))
        .count(db)
        .await?;
    if in_use > 0 {
        return Err(crate::constraint_violation!(Constraint::ChemicalInUse));
    }

    Entity::delete_by_id(id)
        .exec(db)
        .await
        .map_err(|e| e.or_constraint(Constraint::ChemicalInUse))?;
    tracing::info!("deleted chemical {chemical}");
    Ok(())
}
