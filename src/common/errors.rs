use sea_orm::{DbErr, SqlErr};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Uniqueness and reference rules enforced at write time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    ProjectName,
    PlateNameInProject,
    WellDesign,
    WellChemical,
    DesignName,
    ChemicalName,
    ChemicalAbbreviation,
    DesignInUse,
    ChemicalInUse,
    StrainCycle,
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Constraint::ProjectName => "project name must be unique",
            Constraint::PlateNameInProject => "plate name must be unique within its project",
            Constraint::WellDesign => "a well holds at most one value per design",
            Constraint::WellChemical => "a well holds at most one quantity per chemical",
            Constraint::DesignName => "design name must be unique",
            Constraint::ChemicalName => "chemical name must be unique",
            Constraint::ChemicalAbbreviation => "chemical abbreviation must be unique",
            Constraint::DesignInUse => "design is still referenced by design values",
            Constraint::ChemicalInUse => "chemical is still referenced by chemical quantities",
            Constraint::StrainCycle => "strain lineage must not contain a cycle",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Error)]
pub enum MachineError {
    /// A write would break a uniqueness or reference rule
    #[error("Constraint violated: {constraint}")]
    ConstraintViolation { constraint: Constraint },
    /// A filter or include names neither a design, a chemical nor a directive
    #[error("Unknown field '{field}'")]
    UnknownField { field: String },
    #[error("{resource} with id '{id}' not found")]
    NotFound { resource: String, id: String },
    /// A well-formed query that selected no wells
    #[error("No wells matched {query}")]
    EmptyResult { query: String },
    #[error("Cannot read '{text}' as {expected} for design '{design}' in well {well}")]
    TypeCoercion {
        well: Uuid,
        design: String,
        text: String,
        expected: String,
    },
    #[error("Column '{field}' has {missing} missing values")]
    MissingValues { field: String, missing: usize },
    #[error("Validation failed for field '{field}': {message}")]
    InvalidInput { field: String, message: String },
    #[error("Table error: {0}")]
    Table(#[from] csv::Error),
    #[error("Database error: {0}")]
    Database(DbErr),
}

impl From<DbErr> for MachineError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(msg) => MachineError::NotFound {
                resource: "record".to_string(),
                id: msg,
            },
            other => MachineError::Database(other),
        }
    }
}

/// Result type alias for store and machine operations
pub type MachineResult<T> = Result<T, MachineError>;

/// Extension trait attaching the rule a write was guarding to driver errors
pub trait DbErrorExt {
    fn is_unique_violation(&self) -> bool;
    fn is_foreign_key_violation(&self) -> bool;
    fn or_constraint(self, constraint: Constraint) -> MachineError;
}

impl DbErrorExt for DbErr {
    fn is_unique_violation(&self) -> bool {
        if matches!(self.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            return true;
        }
        let msg = self.to_string();
        msg.contains("UNIQUE constraint") || msg.contains("duplicate key")
    }

    fn is_foreign_key_violation(&self) -> bool {
        if matches!(self.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_))) {
            return true;
        }
        let msg = self.to_string();
        msg.contains("FOREIGN KEY constraint") || msg.contains("violates foreign key")
    }

    fn or_constraint(self, constraint: Constraint) -> MachineError {
        if self.is_unique_violation() || self.is_foreign_key_violation() {
            tracing::debug!("driver rejected write: {self}");
            MachineError::ConstraintViolation { constraint }
        } else {
            self.into()
        }
    }
}

#[macro_export]
macro_rules! not_found {
    ($resource:expr, $id:expr) => {
        $crate::common::errors::MachineError::NotFound {
            resource: $resource.to_string(),
            id: $id.to_string(),
        }
    };
}

#[macro_export]
macro_rules! invalid_input {
    ($field:expr, $message:expr) => {
        $crate::common::errors::MachineError::InvalidInput {
            field: $field.to_string(),
            message: $message.to_string(),
        }
    };
}

#[macro_export]
macro_rules! constraint_violation {
    ($constraint:expr) => {
        $crate::common::errors::MachineError::ConstraintViolation {
            constraint: $constraint,
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_macro() {
        let err = not_found!("plate", "abc-123");
        match err {
            MachineError::NotFound { resource, id } => {
                assert_eq!(resource, "plate");
                assert_eq!(id, "abc-123");
            }
            _ => panic!("Expected not found error"),
        }
    }

    #[test]
    fn test_record_not_found_maps_to_not_found() {
        let err: MachineError = DbErr::RecordNotFound("Plate not found".to_string()).into();
        assert!(matches!(err, MachineError::NotFound { .. }));
    }

    #[test]
    fn test_custom_error_is_not_a_constraint() {
        let err = DbErr::Custom("something else".to_string()).or_constraint(Constraint::WellDesign);
        assert!(matches!(err, MachineError::Database(_)));
    }

    #[test]
    fn test_unique_message_maps_to_constraint() {
        let err = DbErr::Custom("UNIQUE constraint failed: designs.name".to_string())
            .or_constraint(Constraint::DesignName);
        match err {
            MachineError::ConstraintViolation { constraint } => {
                assert_eq!(constraint, Constraint::DesignName);
            }
            other => panic!("Expected constraint violation, got {other:?}"),
        }
    }

    #[test]
    fn test_constraint_display() {
        let err = constraint_violation!(Constraint::PlateNameInProject);
        assert_eq!(
            err.to_string(),
            "Constraint violated: plate name must be unique within its project"
        );
    }
}
