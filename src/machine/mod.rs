//! Query and aggregation over the entity store.
//!
//! [`Machine::filter`] turns a [`Query`] into a set of wells and
//! [`Machine::get`] pivots the design values and chemical quantities of those
//! wells into a [`Dataset`]. [`Machine::search`] does both.

mod dataset;
mod query;
#[cfg(test)]
mod tests;

pub use dataset::{Dataset, DatasetRow};
pub use query::{INCLUDE, PLATES, Query, RESERVED_FIELDS};

use crate::chemicals::{models as chemicals, quantities::models as chemical_quantities};
use crate::common::errors::{MachineError, MachineResult};
use crate::common::models::{FieldValue, approx_eq};
use crate::designs::{
    models::{self as designs, DesignType},
    values::models as design_values,
};
use crate::plates::{models as plates, wells::models as wells};
use sea_orm::{ConnectionTrait, QueryOrder, entity::prelude::*};
use std::collections::{BTreeSet, HashMap};

const ID_CHUNK: usize = 1000;

/// What a field name in a query or include list refers to
#[derive(Debug, Clone)]
enum FieldSource {
    Design(designs::Model),
    Chemical(chemicals::Model),
}

/// Read-side handle over a store connection
pub struct Machine<'a, C: ConnectionTrait> {
    db: &'a C,
}

impl<'a, C: ConnectionTrait> Machine<'a, C> {
    pub fn new(db: &'a C) -> Self {
        Self { db }
    }

    /// Designs take precedence over chemicals sharing a name.
    async fn resolve_field(&self, field: &str) -> MachineResult<FieldSource> {
        if let Some(design) = designs::find_design_by_name(self.db, field).await? {
            return Ok(FieldSource::Design(design));
        }
        if let Some(chemical) = chemicals::find_chemical(self.db, field).await? {
            return Ok(FieldSource::Chemical(chemical));
        }
        Err(MachineError::UnknownField {
            field: field.to_string(),
        })
    }

    /// Wells matching every criterion of `query`, in creation order.
    pub async fn filter(&self, query: &Query) -> MachineResult<Vec<wells::Model>> {
        let mut resolved = Vec::new();
        for (field, accepted) in query.criteria() {
            resolved.push((self.resolve_field(field).await?, accepted));
        }

        let mut selected: Option<BTreeSet<Uuid>> = None;

        if let Some(plate_names) = query.plates() {
            let plate_ids: Vec<Uuid> = plates::Entity::find()
                .filter(plates::Column::Name.is_in(plate_names.iter().cloned()))
                .all(self.db)
                .await?
                .into_iter()
                .map(|p| p.id)
                .collect();
            let ids = wells::Entity::find()
                .filter(wells::Column::PlateId.is_in(plate_ids))
                .all(self.db)
                .await?
                .into_iter()
                .map(|w| w.id)
                .collect();
            selected = Some(ids);
        }

        for (source, accepted) in resolved {
            let matching = self.matching_wells(&source, accepted).await?;
            selected = Some(match selected {
                Some(current) => current.intersection(&matching).copied().collect(),
                None => matching,
            });
            if selected.as_ref().is_some_and(BTreeSet::is_empty) {
                break;
            }
        }

        let wells = match selected {
            Some(ids) => self.load_wells(ids.into_iter().collect()).await?,
            None => wells::Entity::find()
                .order_by_asc(wells::Column::CreatedAt)
                .order_by_asc(wells::Column::PlateNumber)
                .all(self.db)
                .await?,
        };

        tracing::debug!(query = %query, "filter selected {} wells", wells.len());
        Ok(wells)
    }

    async fn matching_wells(
        &self,
        source: &FieldSource,
        accepted: &[String],
    ) -> MachineResult<BTreeSet<Uuid>> {
        let ids: BTreeSet<Uuid> = match source {
            FieldSource::Design(design) => design_values::Entity::find()
                .filter(design_values::Column::DesignId.eq(design.id))
                .all(self.db)
                .await?
                .into_iter()
                .filter(|v| {
                    accepted
                        .iter()
                        .any(|a| design_value_matches(design.design_type, &v.value, a))
                })
                .map(|v| v.well_id)
                .collect(),
            FieldSource::Chemical(chemical) => chemical_quantities::Entity::find()
                .filter(chemical_quantities::Column::ChemicalId.eq(chemical.id))
                .all(self.db)
                .await?
                .into_iter()
                .filter(|q| accepted.iter().any(|a| quantity_matches(q.value, a)))
                .map(|q| q.well_id)
                .collect(),
        };
        Ok(ids)
    }

    async fn load_wells(&self, ids: Vec<Uuid>) -> MachineResult<Vec<wells::Model>> {
        let mut found = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(ID_CHUNK) {
            found.extend(
                wells::Entity::find()
                    .filter(wells::Column::Id.is_in(chunk.to_vec()))
                    .all(self.db)
                    .await?,
            );
        }
        found.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then(a.plate_number.cmp(&b.plate_number))
        });
        Ok(found)
    }

    /// Build a dataset over `wells` with one column per entry of `include`.
    ///
    /// Wells without a value for a column get `None`; use
    /// [`Dataset::assert_complete`] before grouping by that column.
    pub async fn get(
        &self,
        wells: &[wells::Model],
        include: &[String],
    ) -> MachineResult<Dataset> {
        let mut sources = Vec::with_capacity(include.len());
        for field in include {
            sources.push(self.resolve_field(field).await?);
        }
        if wells.is_empty() {
            return Err(MachineError::EmptyResult {
                query: format!("include={}", include.join(",")),
            });
        }

        let well_ids: Vec<Uuid> = wells.iter().map(|w| w.id).collect();

        let plate_ids: BTreeSet<Uuid> = wells.iter().map(|w| w.plate_id).collect();
        let plate_names: HashMap<Uuid, String> = plates::Entity::find()
            .filter(plates::Column::Id.is_in(plate_ids))
            .all(self.db)
            .await?
            .into_iter()
            .map(|p| (p.id, p.name))
            .collect();

        let mut columns: Vec<HashMap<Uuid, FieldValue>> = Vec::with_capacity(sources.len());
        for source in &sources {
            columns.push(self.column_values(source, &well_ids).await?);
        }

        let mut series = crate::plates::services::well_series(self.db, &well_ids).await?;

        let rows = wells
            .iter()
            .map(|well| DatasetRow {
                well_id: well.id,
                plate_id: well.plate_id,
                plate: plate_names.get(&well.plate_id).cloned().unwrap_or_default(),
                plate_number: well.plate_number,
                values: columns.iter().map(|c| c.get(&well.id).cloned()).collect(),
                series: series.remove(&well.id).unwrap_or_default(),
            })
            .collect();

        Ok(Dataset {
            columns: include.to_vec(),
            rows,
        })
    }

    async fn column_values(
        &self,
        source: &FieldSource,
        well_ids: &[Uuid],
    ) -> MachineResult<HashMap<Uuid, FieldValue>> {
        let mut values = HashMap::new();
        for chunk in well_ids.chunks(ID_CHUNK) {
            match source {
                FieldSource::Design(design) => {
                    let stored = design_values::Entity::find()
                        .filter(design_values::Column::DesignId.eq(design.id))
                        .filter(design_values::Column::WellId.is_in(chunk.to_vec()))
                        .all(self.db)
                        .await?;
                    for value in stored {
                        values.insert(value.well_id, value.get_value(design)?);
                    }
                }
                FieldSource::Chemical(chemical) => {
                    let stored = chemical_quantities::Entity::find()
                        .filter(chemical_quantities::Column::ChemicalId.eq(chemical.id))
                        .filter(chemical_quantities::Column::WellId.is_in(chunk.to_vec()))
                        .all(self.db)
                        .await?;
                    for quantity in stored {
                        values.insert(quantity.well_id, FieldValue::Float(quantity.value));
                    }
                }
            }
        }
        Ok(values)
    }

    /// Filter, then aggregate. Columns are the query's data fields followed by
    /// its `include` fields. A query that selects nothing is `EmptyResult`.
    pub async fn search(&self, query: &Query) -> MachineResult<Dataset> {
        let mut columns: Vec<String> = query
            .grouping_fields()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        for field in query.include() {
            if !columns.contains(field) {
                columns.push(field.clone());
            }
        }
        for field in &columns {
            self.resolve_field(field).await?;
        }

        let wells = self.filter(query).await?;
        if wells.is_empty() {
            tracing::info!(query = %query, "search matched no wells");
            return Err(MachineError::EmptyResult {
                query: query.to_string(),
            });
        }

        let dataset = self.get(&wells, &columns).await?;
        tracing::info!(
            query = %query,
            "search built dataset with {} rows and {} columns",
            dataset.len(),
            dataset.columns.len()
        );
        Ok(dataset)
    }
}

/// Compare a stored design value with an accepted query value. Text is
/// compared trimmed; numeric designs also compare as numbers so that `37`
/// finds `37.0`.
pub(crate) fn design_value_matches(design_type: DesignType, stored: &str, accepted: &str) -> bool {
    let stored = stored.trim();
    let accepted = accepted.trim();
    if stored == accepted {
        return true;
    }
    if design_type.is_numeric() {
        if let (Ok(a), Ok(b)) = (stored.parse::<f64>(), accepted.parse::<f64>()) {
            return approx_eq(a, b);
        }
    }
    false
}

pub(crate) fn quantity_matches(stored: f64, accepted: &str) -> bool {
    accepted
        .trim()
        .parse::<f64>()
        .is_ok_and(|a| approx_eq(a, stored))
}
