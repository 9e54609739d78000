//! Fluid property errors.

use pc_core::CoreError;
use thiserror::Error;

/// Result type for fluid operations.
pub type FluidResult<T> = Result<T, FluidError>;

/// Errors that can occur during fluid property calculations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// Non-physical values (negative density, pressure, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Value out of valid range.
    #[error("Value out of range for {what}")]
    OutOfRange { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Operation not supported (e.g., mixtures, saturation of an ideal gas).
    #[error("Not supported: {what}")]
    NotSupported { what: &'static str },

    /// Backend (CoolProp) error.
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// Convergence failure (e.g., solving for T given u,v).
    #[error("Convergence failed for {what}")]
    ConvergenceFailed { what: &'static str },

    /// The query lies outside the domain where the backend can form a state.
    #[error("Invalid state: {message}")]
    InvalidState { message: String },
}

impl FluidError {
    /// True when the backend rejected the query point itself.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, FluidError::InvalidState { .. })
    }
}

impl From<CoreError> for FluidError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NonFinite { what, .. } => FluidError::NonPhysical { what },
            CoreError::InvalidArg { what } => FluidError::InvalidArg { what },
            CoreError::Invariant { what } => FluidError::Backend {
                message: what.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = FluidError::NonPhysical { what: "pressure" };
        assert!(err.to_string().contains("pressure"));

        let err = FluidError::InvalidState {
            message: "u below 0 K".into(),
        };
        assert!(err.to_string().contains("Invalid state"));
        assert!(err.is_invalid_state());
    }

    #[test]
    fn core_error_conversion() {
        let err: FluidError = CoreError::NonFinite {
            what: "density",
            value: f64::NAN,
        }
        .into();
        assert!(matches!(err, FluidError::NonPhysical { what: "density" }));
    }
}
