//! Error types for the boundary-value solver.

use pc_core::CoreError;
use thiserror::Error;

/// Errors that stop a solve before it can report a status.
///
/// Failing to converge is not an error; it is reported through
/// [`BvpStatus`](crate::BvpStatus).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem setup error: {what}")]
    ProblemSetup { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Invalid mesh: {what}")]
    InvalidMesh { what: String },
}

pub type SolverResult<T> = Result<T, SolverError>;

impl From<CoreError> for SolverError {
    fn from(e: CoreError) -> Self {
        SolverError::Numeric {
            what: e.to_string(),
        }
    }
}
