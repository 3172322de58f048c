pub mod repository;
pub mod sqlite;

pub use repository::*;
pub use sqlite::*;

use thiserror::Error;

/// The persistence sub-steps of `save_case`, in execution order. There is no
/// cross-step rollback; a failure names the step and leaves earlier writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStep {
    CaseHeader,
    IcdCodes,
    Treatments,
    Evidence,
    Medicines,
}

impl SaveStep {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CaseHeader => "case",
            Self::IcdCodes => "ICD codes",
            Self::Treatments => "treatments",
            Self::Evidence => "evidence",
            Self::Medicines => "medicines",
        }
    }
}

impl std::fmt::Display for SaveStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("Migration failed at version {version}: {reason}")]
    MigrationFailed { version: i64, reason: String },

    #[error("Constraint violated: {0}")]
    ConstraintViolation(String),

    #[error("Failed to save {step}: {reason}")]
    StepFailed { step: SaveStep, reason: String },
}
