//! Error types for the compressor cycle model.

use pc_fluids::FluidError;
use pc_solver::SolverError;
use thiserror::Error;

/// Errors that can occur while setting up or solving a cycle.
#[derive(Error, Debug)]
pub enum CycleError {
    /// The fluid oracle rejected the cylinder state at one crank angle.
    ///
    /// Aborts the whole residual evaluation; a caller may retry with another
    /// initial guess or mesh.
    #[error("Invalid fluid state at theta = {theta:.5} rad: {message}")]
    InvalidState { theta: f64, message: String },

    #[error("Fluid error: {0}")]
    Fluid(#[from] FluidError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),

    #[error("Configuration error: {what}")]
    Config { what: String },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type CycleResult<T> = Result<T, CycleError>;

impl CycleError {
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, CycleError::InvalidState { .. })
    }
}
