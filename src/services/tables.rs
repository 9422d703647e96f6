use crate::common::errors::MachineResult;
use crate::designs::models::DesignType;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

/// Name of the first column in both tables
pub const WELL_COLUMN: &str = "well";

fn reader<R: io::Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new().trim(Trim::All).from_reader(source)
}

fn open(path: &Path) -> MachineResult<File> {
    File::open(path).map_err(|e| {
        crate::invalid_input!("path", format!("cannot open {}: {e}", path.display()))
    })
}

fn check_well_column(headers: &StringRecord, table: &str) -> MachineResult<()> {
    match headers.get(0) {
        Some(first) if first.eq_ignore_ascii_case(WELL_COLUMN) => Ok(()),
        _ => Err(crate::invalid_input!(
            table,
            format!("first column must be '{WELL_COLUMN}'")
        )),
    }
}

fn parse_well(record: &StringRecord, table: &str, line: usize) -> MachineResult<i32> {
    let text = record.get(0).unwrap_or_default();
    match text.parse::<i32>() {
        Ok(number) if number > 0 => Ok(number),
        _ => Err(crate::invalid_input!(
            table,
            format!("line {line}: '{text}' is not a well number")
        )),
    }
}

/// Readings exported by a plate reader: one row per well, one column per
/// time point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementTable {
    pub times: Vec<f64>,
    /// Well number and its `(time, value)` readings; blank cells are skipped
    pub wells: Vec<(i32, Vec<(f64, f64)>)>,
}

impl MeasurementTable {
    pub fn from_reader<R: io::Read>(source: R) -> MachineResult<Self> {
        let mut csv = reader(source);
        let headers = csv.headers()?.clone();
        check_well_column(&headers, "data")?;

        let times = headers
            .iter()
            .skip(1)
            .map(|h| {
                h.parse::<f64>().map_err(|_| {
                    crate::invalid_input!("data", format!("time header '{h}' is not a number"))
                })
            })
            .collect::<MachineResult<Vec<f64>>>()?;

        let mut wells = Vec::new();
        let mut seen = HashSet::new();
        for (idx, record) in csv.records().enumerate() {
            let record = record?;
            let line = idx + 2;
            let number = parse_well(&record, "data", line)?;
            if !seen.insert(number) {
                return Err(crate::invalid_input!(
                    "data",
                    format!("line {line}: well {number} appears twice")
                ));
            }

            let mut readings = Vec::with_capacity(times.len());
            for (time, cell) in times.iter().zip(record.iter().skip(1)) {
                if cell.is_empty() {
                    continue;
                }
                let value = cell.parse::<f64>().map_err(|_| {
                    crate::invalid_input!(
                        "data",
                        format!("line {line}: reading '{cell}' is not a number")
                    )
                })?;
                readings.push((*time, value));
            }
            wells.push((number, readings));
        }

        Ok(Self { times, wells })
    }

    pub fn from_path(path: &Path) -> MachineResult<Self> {
        Self::from_reader(open(path)?)
    }

    pub fn well_numbers(&self) -> HashSet<i32> {
        self.wells.iter().map(|(number, _)| *number).collect()
    }

    pub fn readings(&self) -> usize {
        self.wells.iter().map(|(_, r)| r.len()).sum()
    }
}

/// Experimental conditions per well: one column per design
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesignTable {
    pub designs: Vec<String>,
    /// Well number and one cell per design; `None` for blank cells
    pub rows: Vec<(i32, Vec<Option<String>>)>,
}

impl DesignTable {
    pub fn from_reader<R: io::Read>(source: R) -> MachineResult<Self> {
        let mut csv = reader(source);
        let headers = csv.headers()?.clone();
        check_well_column(&headers, "design")?;

        let designs: Vec<String> = headers.iter().skip(1).map(ToString::to_string).collect();
        let mut names = HashSet::new();
        for name in &designs {
            if name.is_empty() {
                return Err(crate::invalid_input!("design", "design column without a name"));
            }
            if !names.insert(name.as_str()) {
                return Err(crate::invalid_input!(
                    "design",
                    format!("design '{name}' appears twice")
                ));
            }
        }

        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        for (idx, record) in csv.records().enumerate() {
            let record = record?;
            let line = idx + 2;
            let number = parse_well(&record, "design", line)?;
            if !seen.insert(number) {
                return Err(crate::invalid_input!(
                    "design",
                    format!("line {line}: well {number} appears twice")
                ));
            }
            let cells = record
                .iter()
                .skip(1)
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect();
            rows.push((number, cells));
        }

        Ok(Self { designs, rows })
    }

    pub fn from_path(path: &Path) -> MachineResult<Self> {
        Self::from_reader(open(path)?)
    }

    /// Drop the columns named in `ignore`. Returns the names actually dropped.
    pub fn drop_columns(&mut self, ignore: &[String]) -> Vec<String> {
        let keep: Vec<bool> = self
            .designs
            .iter()
            .map(|d| !ignore.iter().any(|i| i.trim() == d))
            .collect();
        let dropped = self
            .designs
            .iter()
            .zip(&keep)
            .filter(|(_, k)| !**k)
            .map(|(d, _)| d.clone())
            .collect();

        self.designs = retain_by(std::mem::take(&mut self.designs), &keep);
        for (_, cells) in &mut self.rows {
            *cells = retain_by(std::mem::take(cells), &keep);
        }
        dropped
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(move |(_, cells)| cells.get(idx).and_then(Option::as_deref))
    }

    /// Type for a design first seen in this table: `int` when every filled
    /// cell is an integer, `float` when every cell is a number, else `str`.
    pub fn infer_type(&self, idx: usize) -> DesignType {
        let cells: Vec<&str> = self.column(idx).collect();
        if cells.is_empty() {
            return DesignType::Str;
        }
        if cells.iter().all(|c| c.parse::<i64>().is_ok()) {
            DesignType::Int
        } else if cells.iter().all(|c| c.parse::<f64>().is_ok()) {
            DesignType::Float
        } else {
            DesignType::Str
        }
    }
}

fn retain_by<T>(items: Vec<T>, keep: &[bool]) -> Vec<T> {
    items
        .into_iter()
        .zip(keep)
        .filter_map(|(item, k)| k.then_some(item))
        .collect()
}
