use crate::common::errors::{MachineError, MachineResult};
use crate::common::models::FieldValue;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::io;
use uuid::Uuid;

/// One well of a dataset: where it sits, its metadata cells and its readings
#[derive(Debug, Clone, Serialize)]
pub struct DatasetRow {
    pub well_id: Uuid,
    pub plate_id: Uuid,
    pub plate: String,
    pub plate_number: i32,
    /// Aligned with [`Dataset::columns`]; `None` where the well has no value
    pub values: Vec<Option<FieldValue>>,
    /// `(time, value)` readings sorted by time
    pub series: Vec<(f64, f64)>,
}

/// Rectangular per-well table handed to presentation
#[derive(Debug, Clone, Default, Serialize)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub rows: Vec<DatasetRow>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn well_ids(&self) -> Vec<Uuid> {
        self.rows.iter().map(|r| r.well_id).collect()
    }

    fn column_index(&self, name: &str) -> MachineResult<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| MachineError::UnknownField {
                field: name.to_string(),
            })
    }

    pub fn column(&self, name: &str) -> MachineResult<Vec<Option<&FieldValue>>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r.values[idx].as_ref()).collect())
    }

    /// Number of rows with no value in `name`
    pub fn missing(&self, name: &str) -> MachineResult<usize> {
        Ok(self.column(name)?.iter().filter(|v| v.is_none()).count())
    }

    /// Fail with `MissingValues` unless every row has a value in `name`.
    pub fn assert_complete(&self, name: &str) -> MachineResult<()> {
        match self.missing(name)? {
            0 => Ok(()),
            missing => Err(MachineError::MissingValues {
                field: name.to_string(),
                missing,
            }),
        }
    }

    /// Distinct values of a complete column, in first-seen order.
    pub fn unique_values(&self, name: &str) -> MachineResult<Vec<FieldValue>> {
        self.assert_complete(name)?;
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for value in self.column(name)?.into_iter().flatten() {
            if seen.insert(value.group_key()) {
                unique.push(value.clone());
            }
        }
        Ok(unique)
    }

    /// For each row, the index of its value among [`Dataset::unique_values`].
    /// Presentation colours rows by these indices.
    pub fn color_groups(&self, name: &str) -> MachineResult<Vec<usize>> {
        self.assert_complete(name)?;
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut groups = Vec::with_capacity(self.rows.len());
        for value in self.column(name)?.into_iter().flatten() {
            let next = index.len();
            groups.push(*index.entry(value.group_key()).or_insert(next));
        }
        Ok(groups)
    }

    /// Write the metadata table, one line per well.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> MachineResult<()> {
        let mut csv = csv::Writer::from_writer(writer);

        let mut header = vec![
            "well_id".to_string(),
            "plate".to_string(),
            "plate_number".to_string(),
        ];
        header.extend(self.columns.iter().cloned());
        csv.write_record(&header)?;

        for row in &self.rows {
            let mut record = vec![
                row.well_id.to_string(),
                row.plate.clone(),
                row.plate_number.to_string(),
            ];
            record.extend(
                row.values
                    .iter()
                    .map(|v| v.as_ref().map(ToString::to_string).unwrap_or_default()),
            );
            csv.write_record(&record)?;
        }

        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }

    /// Write the readings in long form: `well_id,time,value`.
    pub fn write_series_csv<W: io::Write>(&self, writer: W) -> MachineResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["well_id", "time", "value"])?;
        for row in &self.rows {
            let well = row.well_id.to_string();
            for (time, value) in &row.series {
                csv.write_record([well.clone(), time.to_string(), value.to_string()])?;
            }
        }
        csv.flush().map_err(csv::Error::from)?;
        Ok(())
    }
}
