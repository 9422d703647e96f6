use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "wells")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub plate_id: Uuid,
    /// Position of the well on its plate
    pub plate_number: i32,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::plates::models::Entity",
        from = "Column::PlateId",
        to = "crate::plates::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Plates,
    #[sea_orm(has_many = "crate::designs::values::models::Entity")]
    DesignValues,
    #[sea_orm(has_many = "crate::chemicals::quantities::models::Entity")]
    ChemicalQuantities,
    #[sea_orm(has_many = "crate::plates::measurements::models::Entity")]
    Measurements,
}

impl Related<crate::plates::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plates.def()
    }
}

impl Related<crate::designs::values::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DesignValues.def()
    }
}

impl Related<crate::chemicals::quantities::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChemicalQuantities.def()
    }
}

impl Related<crate::plates::measurements::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Measurements.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
