//! Plate, well and experimental-design store.
//!
//! Projects own plates, plates own wells, and wells carry design values and
//! chemical quantities. The [`machine`] module turns a set of search criteria
//! into a flat per-well [`machine::Dataset`].

pub mod chemicals;
pub mod common;
pub mod config;
pub mod designs;
pub mod machine;
pub mod phenotypes;
pub mod plates;
pub mod projects;
pub mod services;
pub mod strains;

pub use common::errors::{Constraint, MachineError, MachineResult};
pub use machine::{Dataset, Machine, Query};
