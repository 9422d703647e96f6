use crate::common::errors::{MachineError, MachineResult};
use crate::common::models::FieldValue;
use crate::designs::models::{DesignType, Model as Design};
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The value of one design for one well, stored as text
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "design_values")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub design_id: Uuid,
    pub well_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub value: String,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::designs::models::Entity",
        from = "Column::DesignId",
        to = "crate::designs::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Designs,
    #[sea_orm(
        belongs_to = "crate::plates::wells::models::Entity",
        from = "Column::WellId",
        to = "crate::plates::wells::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Wells,
}

impl Related<crate::designs::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Designs.def()
    }
}

impl Related<crate::plates::wells::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wells.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Coerce the stored text to the design's declared type.
    ///
    /// `bool` follows text truthiness: the empty string is `false` and any
    /// other text is `true`, including `"False"` and `"0"`.
    pub fn get_value(&self, design: &Design) -> MachineResult<FieldValue> {
        coerce(&self.value, design.design_type).ok_or_else(|| MachineError::TypeCoercion {
            well: self.well_id,
            design: design.name.clone(),
            text: self.value.clone(),
            expected: design.design_type.to_string(),
        })
    }
}

pub(crate) fn coerce(text: &str, design_type: DesignType) -> Option<FieldValue> {
    match design_type {
        DesignType::Str => Some(FieldValue::Str(text.to_string())),
        DesignType::Int => text.trim().parse().ok().map(FieldValue::Int),
        DesignType::Float => text.trim().parse().ok().map(FieldValue::Float),
        DesignType::Bool => Some(FieldValue::Bool(!text.is_empty())),
    }
}
