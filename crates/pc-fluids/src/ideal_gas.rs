//! Calorically perfect ideal-gas backend.
//!
//! Closed-form `p = ρ·R·T` with constant `cp`, so every query is exact and cheap.
//! Caloric reference: `u = cv·T` and `h = cp·T` (zero at 0 K); entropy is
//! referenced to 298.15 K and 101 325 Pa.
//!
//! There is no two-phase region, so saturation queries are not supported. A
//! `(u, v)` pair whose energy maps to a non-positive temperature is reported as
//! an invalid state, the same way a real-fluid backend rejects out-of-domain
//! queries.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::model::{FluidModel, validation};
use crate::state::{StateInput, ThermoState};
use pc_core::numeric::ensure_positive;
use pc_core::units::constants::R_UNIVERSAL;
use pc_core::units::{k, pa};
use uom::si::{pressure::pascal, thermodynamic_temperature::kelvin};

const T_REF: f64 = 298.15;
const P_REF: f64 = 101_325.0;

/// Ideal gas with a frozen isobaric heat capacity.
#[derive(Debug, Clone)]
pub struct IdealGasModel {
    /// Specific heat capacity at constant pressure [J/(kg·K)]
    cp: f64,
}

impl IdealGasModel {
    /// Create a model with the given isobaric heat capacity [J/(kg·K)].
    pub fn new(cp_j_per_kg_k: f64) -> FluidResult<Self> {
        let cp = ensure_positive(cp_j_per_kg_k, "cp must be positive and finite")?;
        Ok(Self { cp })
    }

    /// Isobaric heat capacity [J/(kg·K)].
    pub fn cp(&self) -> f64 {
        self.cp
    }

    /// Specific gas constant [J/(kg·K)] for a composition.
    pub fn gas_constant(&self, comp: &Composition) -> f64 {
        R_UNIVERSAL / comp.molar_mass()
    }

    /// Isochoric heat capacity [J/(kg·K)] for a composition.
    fn cv(&self, comp: &Composition) -> FluidResult<f64> {
        let cv = self.cp - self.gas_constant(comp);
        if cv <= 0.0 {
            return Err(FluidError::NonPhysical {
                what: "cp must exceed the specific gas constant",
            });
        }
        Ok(cv)
    }

    fn assemble(&self, t_k: f64, v: f64, comp: &Composition) -> FluidResult<ThermoState> {
        let r = self.gas_constant(comp);
        let cv = self.cv(comp)?;
        let p_pa = r * t_k / v;
        let u = cv * t_k;
        let h = self.cp * t_k;
        let s = self.cp * (t_k / T_REF).ln() - r * (p_pa / P_REF).ln();
        ThermoState::from_parts(pa(p_pa), k(t_k), v, u, h, s, comp.clone())
    }
}

impl FluidModel for IdealGasModel {
    fn name(&self) -> &str {
        "IdealGas"
    }

    fn supports_composition(&self, _comp: &Composition) -> bool {
        true
    }

    fn state(&self, input: StateInput, comp: &Composition) -> FluidResult<ThermoState> {
        match input {
            StateInput::PT { p, t } => {
                validation::validate_pressure(p)?;
                validation::validate_temperature(t)?;
                let t_k = t.get::<kelvin>();
                let v = self.gas_constant(comp) * t_k / p.get::<pascal>();
                self.assemble(t_k, v, comp)
            }
            StateInput::UV { u, v } => {
                validation::validate_energy(u)?;
                validation::validate_specific_volume(v)?;
                let t_k = u / self.cv(comp)?;
                if !t_k.is_finite() || t_k <= 0.0 {
                    return Err(FluidError::InvalidState {
                        message: format!("u={u} J/kg, v={v} m³/kg maps to T={t_k} K"),
                    });
                }
                self.assemble(t_k, v, comp)
            }
            StateInput::TQ { .. } => Err(FluidError::NotSupported {
                what: "saturation states of an ideal gas",
            }),
        }
    }
}
