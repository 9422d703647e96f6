//! Building plates from exported tables.
//!
//! [`tables`] reads the raw measurement table and the optional design table
//! into memory; [`plate_import`] writes them to the store in one transaction.

pub mod plate_import;
pub mod tables;

pub use plate_import::{ImportResult, PlateImport, import_plate};
pub use tables::{DesignTable, MeasurementTable};
