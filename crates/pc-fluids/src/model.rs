//! Fluid property model trait and validation helpers.

use crate::composition::Composition;
use crate::error::FluidResult;
use crate::state::{StateInput, ThermoState};
use pc_core::units::{Pressure, Temperature};

/// Equation-of-state oracle.
///
/// Every query returns the full state tuple (T, p, v, u, h, s). Implementations
/// must be thread-safe (Send + Sync); the cycle model itself calls them from a
/// single thread.
pub trait FluidModel: Send + Sync {
    /// Get the model name (for debugging/logging).
    fn name(&self) -> &str;

    /// Check if this model supports the given composition.
    fn supports_composition(&self, comp: &Composition) -> bool;

    /// Resolve a state from an input pair.
    ///
    /// A `UV` pair outside the region where the backend can form a state yields
    /// [`FluidError::InvalidState`](crate::FluidError::InvalidState).
    fn state(&self, input: StateInput, comp: &Composition) -> FluidResult<ThermoState>;

    /// Molar mass [kg/mol].
    fn molar_mass(&self, comp: &Composition) -> FluidResult<f64> {
        Ok(comp.molar_mass())
    }

    /// Saturation (bubble-point) pressure at temperature `t`.
    fn saturation_pressure(&self, t: Temperature, comp: &Composition) -> FluidResult<Pressure> {
        let state = self.state(StateInput::TQ { t, x: 0.0 }, comp)?;
        Ok(state.pressure())
    }
}

/// Validation helpers for fluid properties.
pub(crate) mod validation {
    use crate::error::{FluidError, FluidResult};
    use pc_core::units::{Pressure, Temperature};

    /// Ensure pressure is positive and finite.
    pub fn validate_pressure(p: Pressure) -> FluidResult<()> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure temperature is positive and finite.
    pub fn validate_temperature(t: Temperature) -> FluidResult<()> {
        if !t.value.is_finite() || t.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure specific volume is positive and finite.
    pub fn validate_specific_volume(v: f64) -> FluidResult<()> {
        if !v.is_finite() || v <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "specific volume must be positive and finite",
            });
        }
        Ok(())
    }

    /// Ensure internal energy is finite (can be negative).
    pub fn validate_energy(u: f64) -> FluidResult<()> {
        if !u.is_finite() {
            return Err(FluidError::NonPhysical {
                what: "internal energy must be finite",
            });
        }
        Ok(())
    }

    /// Ensure vapour quality lies in [0, 1].
    pub fn validate_quality(x: f64) -> FluidResult<()> {
        if !(0.0..=1.0).contains(&x) {
            return Err(FluidError::OutOfRange {
                what: "vapour quality must lie in [0, 1]",
            });
        }
        Ok(())
    }
}
