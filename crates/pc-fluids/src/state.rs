//! Thermodynamic state definitions.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use pc_core::units::{Pressure, Temperature};

/// Specific internal energy [J/kg].
pub type SpecEnergy = f64;

/// Specific enthalpy [J/kg].
pub type SpecEnthalpy = f64;

/// Specific entropy [J/(kg·K)].
pub type SpecEntropy = f64;

/// Specific volume [m³/kg].
pub type SpecVolume = f64;

/// Input pair for a state query.
#[derive(Debug, Clone, PartialEq)]
pub enum StateInput {
    /// Pressure and temperature.
    PT { p: Pressure, t: Temperature },
    /// Specific internal energy and specific volume.
    UV { u: SpecEnergy, v: SpecVolume },
    /// Temperature and vapour quality (0 = saturated liquid, 1 = saturated vapour).
    TQ { t: Temperature, x: f64 },
}

/// Full state tuple returned by every query: T, p, v, u, h, s.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermoState {
    p: Pressure,
    t: Temperature,
    v: SpecVolume,
    u: SpecEnergy,
    h: SpecEnthalpy,
    s: SpecEntropy,
    comp: Composition,
}

impl ThermoState {
    /// Assemble a state from backend output.
    ///
    /// Pressure, temperature and specific volume must be positive and finite;
    /// the caloric properties must be finite.
    pub fn from_parts(
        p: Pressure,
        t: Temperature,
        v: SpecVolume,
        u: SpecEnergy,
        h: SpecEnthalpy,
        s: SpecEntropy,
        comp: Composition,
    ) -> FluidResult<Self> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        if !t.value.is_finite() || t.value <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "temperature must be positive and finite",
            });
        }
        if !v.is_finite() || v <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "specific volume must be positive and finite",
            });
        }
        if !(u.is_finite() && h.is_finite() && s.is_finite()) {
            return Err(FluidError::NonPhysical {
                what: "caloric properties must be finite",
            });
        }

        Ok(Self {
            p,
            t,
            v,
            u,
            h,
            s,
            comp,
        })
    }

    pub fn pressure(&self) -> Pressure {
        self.p
    }

    pub fn temperature(&self) -> Temperature {
        self.t
    }

    /// Specific volume [m³/kg].
    pub fn specific_volume(&self) -> SpecVolume {
        self.v
    }

    /// Specific internal energy [J/kg].
    pub fn internal_energy(&self) -> SpecEnergy {
        self.u
    }

    /// Specific enthalpy [J/kg].
    pub fn enthalpy(&self) -> SpecEnthalpy {
        self.h
    }

    /// Specific entropy [J/(kg·K)].
    pub fn entropy(&self) -> SpecEntropy {
        self.s
    }

    pub fn composition(&self) -> &Composition {
        &self.comp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;
    use pc_core::units::{k, pa};

    fn parts(p: f64, t: f64, v: f64) -> FluidResult<ThermoState> {
        ThermoState::from_parts(
            pa(p),
            k(t),
            v,
            250_000.0,
            300_000.0,
            1_200.0,
            Composition::pure(Species::N2),
        )
    }

    #[test]
    fn create_valid_state() {
        let state = parts(101_325.0, 300.0, 0.87).unwrap();
        assert_eq!(state.pressure().value, 101_325.0);
        assert_eq!(state.temperature().value, 300.0);
        assert_eq!(state.specific_volume(), 0.87);
        assert_eq!(state.enthalpy(), 300_000.0);
    }

    #[test]
    fn reject_non_physical() {
        assert!(parts(-100.0, 300.0, 0.87).is_err());
        assert!(parts(101_325.0, 0.0, 0.87).is_err());
        assert!(parts(101_325.0, 300.0, 0.0).is_err());
        assert!(parts(f64::NAN, 300.0, 0.87).is_err());
    }
}
