use crate::chemicals::models::Model as Chemical;
use crate::common::errors::MachineResult;
use crate::common::models::approx_eq;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum QuantityType {
    #[sea_orm(string_value = "concentration")]
    Concentration,
    #[sea_orm(string_value = "mass by volume")]
    MassByVolume,
    #[sea_orm(string_value = "percent mass")]
    PercentMass,
    #[sea_orm(string_value = "percent volume")]
    PercentVolume,
}

impl QuantityType {
    pub fn units(self) -> &'static str {
        match self {
            QuantityType::Concentration => "mM",
            QuantityType::MassByVolume => "g/L",
            QuantityType::PercentMass => "%w/w",
            QuantityType::PercentVolume => "%v/v",
        }
    }
}

impl fmt::Display for QuantityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            QuantityType::Concentration => "concentration",
            QuantityType::MassByVolume => "mass by volume",
            QuantityType::PercentMass => "percent mass",
            QuantityType::PercentVolume => "percent volume",
        };
        f.write_str(text)
    }
}

impl FromStr for QuantityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', '-'], " ").as_str() {
            "concentration" => Ok(QuantityType::Concentration),
            "mass by volume" => Ok(QuantityType::MassByVolume),
            "percent mass" => Ok(QuantityType::PercentMass),
            "percent volume" => Ok(QuantityType::PercentVolume),
            other => Err(format!("unknown quantity type '{other}'")),
        }
    }
}

/// Amount of one chemical in one well
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chemical_quantities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub chemical_id: Uuid,
    pub well_id: Uuid,
    pub quantity_type: QuantityType,
    pub value: f64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::chemicals::models::Entity",
        from = "Column::ChemicalId",
        to = "crate::chemicals::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Chemicals,
    #[sea_orm(
        belongs_to = "crate::plates::wells::models::Entity",
        from = "Column::WellId",
        to = "crate::plates::wells::models::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Wells,
}

impl Related<crate::chemicals::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Chemicals.def()
    }
}

impl Related<crate::plates::wells::models::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wells.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Check a description of the form `<value> <units> <chemical>` against
    /// this quantity. The chemical may be given by name or abbreviation and
    /// runs to the end of the text; the units token is not compared.
    pub fn matches_description(&self, chemical: &Chemical, text: &str) -> MachineResult<bool> {
        // The chemical is everything after the units, so names may contain spaces
        let malformed = || {
            crate::invalid_input!(
                "description",
                format!("expected '<value> <units> <chemical>', got '{text}'")
            )
        };
        let (value, rest) = text
            .trim()
            .split_once(char::is_whitespace)
            .ok_or_else(malformed)?;
        let (_units, name) = rest
            .trim_start()
            .split_once(char::is_whitespace)
            .ok_or_else(malformed)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(malformed());
        }
        let value: f64 = value.parse().map_err(|_| {
            crate::invalid_input!("description", format!("'{value}' is not a number"))
        })?;

        Ok(approx_eq(value, self.value) && chemical.is_called(name))
    }

    pub fn describe(&self, chemical: &Chemical) -> String {
        format!(
            "{:.2} {} {}",
            self.value,
            self.quantity_type.units(),
            chemical.label()
        )
    }
}
