//! CoolProp-based fluid property model.

use crate::composition::Composition;
use crate::error::{FluidError, FluidResult};
use crate::model::{FluidModel, validation};
use crate::state::{StateInput, ThermoState};
use pc_core::units::{k, pa};
use rfluids::prelude::*;
use std::collections::HashMap;
use uom::si::{pressure::pascal, thermodynamic_temperature::kelvin};

/// Temperature search bounds for `(u, v)` inversion [K].
const T_MIN: f64 = 100.0;
const T_MAX: f64 = 2000.0;
/// Step of the upward scan for a lower bracket the backend can evaluate [K].
const T_SCAN_STEP: f64 = 25.0;
const MAX_ITER: usize = 80;
/// Absolute tolerance on specific internal energy [J/kg].
const U_TOL: f64 = 1e-3;
/// Relative mismatch accepted once the bracket has collapsed.
const U_REL_TOL: f64 = 1e-6;

/// The rfluids substance behind a composition.
enum Substance {
    Pure(Pure),
    Mix(CustomMix),
}

impl Substance {
    fn of(comp: &Composition) -> FluidResult<Self> {
        if let Some(species) = comp.is_pure() {
            return Ok(Substance::Pure(species.rfluids_pure()));
        }
        let components: HashMap<Pure, f64> = comp
            .iter()
            .map(|(species, x)| (species.rfluids_pure(), x))
            .collect();
        CustomMix::mole_based(components)
            .map(Substance::Mix)
            .map_err(|_| FluidError::Backend {
                message: format!("rfluids rejected the mixture {comp}"),
            })
    }

    fn fluid(&self) -> FluidResult<Fluid<Undefined>> {
        match self {
            Substance::Pure(pure) => Ok(Fluid::from(*pure)),
            Substance::Mix(mix) => Fluid::try_from(mix.clone()).map_err(|_| FluidError::Backend {
                message: "rfluids could not build the mixture".to_string(),
            }),
        }
    }
}

/// CoolProp backend for fluid properties.
///
/// Pure fluids and mole-based mixtures of the supported species. Mixtures go
/// through CoolProp's Helmholtz mixture model.
pub struct CoolPropModel {}

impl CoolPropModel {
    /// Create a new CoolProp model.
    pub fn new() -> Self {
        Self {}
    }

    /// Create a Fluid instance at given P,T state.
    fn fluid_at_pt(&self, substance: &Substance, p_pa: f64, t_k: f64) -> FluidResult<Fluid> {
        substance
            .fluid()?
            .in_state(FluidInput::pressure(p_pa), FluidInput::temperature(t_k))
            .map_err(|e| FluidError::Backend {
                message: format!("rfluids error at P={} Pa, T={} K: {}", p_pa, t_k, e),
            })
    }

    fn fluid_at_rho_t(&self, substance: &Substance, rho: f64, t_k: f64) -> FluidResult<Fluid> {
        substance
            .fluid()?
            .in_state(FluidInput::density(rho), FluidInput::temperature(t_k))
            .map_err(|e| FluidError::Backend {
                message: format!("rfluids error at rho={} kg/m³, T={} K: {}", rho, t_k, e),
            })
    }

    /// Internal energy [J/kg] at `(ρ, T)`, with the resolved fluid.
    fn energy_at(&self, substance: &Substance, rho: f64, t_k: f64) -> FluidResult<(Fluid, f64)> {
        let mut fluid = self.fluid_at_rho_t(substance, rho, t_k)?;
        let (h, p, rho) = Self::hpr(&mut fluid)?;
        Ok((fluid, h - p / rho))
    }

    fn hpr(fluid: &mut Fluid) -> FluidResult<(f64, f64, f64)> {
        let h = fluid.enthalpy().map_err(|e| FluidError::Backend {
            message: format!("rfluids error getting enthalpy: {}", e),
        })?;
        let p = fluid.pressure().map_err(|e| FluidError::Backend {
            message: format!("rfluids error getting pressure: {}", e),
        })?;
        let rho = fluid.density().map_err(|e| FluidError::Backend {
            message: format!("rfluids error getting density: {}", e),
        })?;
        Ok((h, p, rho))
    }

    /// Read the full state tuple out of a resolved fluid instance.
    fn assemble(fluid: &mut Fluid, comp: &Composition) -> FluidResult<ThermoState> {
        let (h, p_pa, rho) = Self::hpr(fluid)?;
        let t_k = fluid.temperature().map_err(|e| FluidError::Backend {
            message: format!("rfluids error getting temperature: {}", e),
        })?;
        let s = fluid.entropy().map_err(|e| FluidError::Backend {
            message: format!("rfluids error getting entropy: {}", e),
        })?;
        let v = 1.0 / rho;
        ThermoState::from_parts(pa(p_pa), k(t_k), v, h - p_pa * v, h, s, comp.clone())
    }

    /// Solve for temperature at fixed density such that u(ρ, T) = u_target.
    ///
    /// Bisection on T; u is monotone in T along an isochore, also across the
    /// two-phase dome. Points the backend cannot flash (mixtures inside the
    /// dome) are taken to lie on the cold side. Any failure to bracket or to
    /// match the target is an invalid state.
    fn solve_t_from_rho_u(
        &self,
        substance: &Substance,
        rho: f64,
        u_target: f64,
    ) -> FluidResult<Fluid> {
        let invalid = |reason: String| FluidError::InvalidState {
            message: format!("u={u_target} J/kg at rho={rho} kg/m³: {reason}"),
        };

        let mut t_low = T_MIN;
        let u_low = loop {
            match self.energy_at(substance, rho, t_low) {
                Ok((_, u)) => break u,
                Err(_) if t_low + T_SCAN_STEP < T_MAX => t_low += T_SCAN_STEP,
                Err(e) => return Err(invalid(e.to_string())),
            }
        };
        let mut t_high = T_MAX;
        let (_, u_high) = self
            .energy_at(substance, rho, t_high)
            .map_err(|e| invalid(e.to_string()))?;

        if u_target < u_low || u_target > u_high {
            return Err(invalid(format!(
                "outside [{u_low}, {u_high}] J/kg for T in [{t_low}, {T_MAX}] K"
            )));
        }

        for _ in 0..MAX_ITER {
            let t_mid = 0.5 * (t_low + t_high);
            match self.energy_at(substance, rho, t_mid) {
                Ok((fluid, u_mid)) => {
                    if (u_mid - u_target).abs() < U_TOL {
                        return Ok(fluid);
                    }
                    if u_mid < u_target {
                        t_low = t_mid;
                    } else {
                        t_high = t_mid;
                    }
                }
                Err(_) => t_low = t_mid,
            }
        }

        let (fluid, u) = self
            .energy_at(substance, rho, 0.5 * (t_low + t_high))
            .map_err(|e| invalid(e.to_string()))?;
        if (u - u_target).abs() > U_REL_TOL * u_target.abs().max(1.0) {
            return Err(invalid(format!("bisection stalled at u={u} J/kg")));
        }
        Ok(fluid)
    }
}

impl Default for CoolPropModel {
    fn default() -> Self {
        Self::new()
    }
}

impl FluidModel for CoolPropModel {
    fn name(&self) -> &str {
        "CoolProp"
    }

    fn supports_composition(&self, comp: &Composition) -> bool {
        Substance::of(comp).is_ok()
    }

    fn state(&self, input: StateInput, comp: &Composition) -> FluidResult<ThermoState> {
        let substance = Substance::of(comp)?;

        match input {
            StateInput::PT { p, t } => {
                validation::validate_pressure(p)?;
                validation::validate_temperature(t)?;
                let mut fluid =
                    self.fluid_at_pt(&substance, p.get::<pascal>(), t.get::<kelvin>())?;
                Self::assemble(&mut fluid, comp)
            }
            StateInput::UV { u, v } => {
                validation::validate_energy(u)?;
                validation::validate_specific_volume(v)?;
                let mut fluid = self.solve_t_from_rho_u(&substance, 1.0 / v, u)?;
                Self::assemble(&mut fluid, comp)
            }
            StateInput::TQ { t, x } => {
                validation::validate_temperature(t)?;
                validation::validate_quality(x)?;
                let t_k = t.get::<kelvin>();
                let mut fluid = substance
                    .fluid()?
                    .in_state(FluidInput::temperature(t_k), FluidInput::quality(x))
                    .map_err(|e| FluidError::Backend {
                        message: format!("rfluids error at T={} K, x={}: {}", t_k, x, e),
                    })?;
                Self::assemble(&mut fluid, comp)
            }
        }
    }

    fn molar_mass(&self, comp: &Composition) -> FluidResult<f64> {
        let mut fluid = Substance::of(comp)?.fluid()?;
        fluid.molar_mass().map_err(|e| FluidError::Backend {
            message: format!("rfluids error getting molar mass: {}", e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Species;

    #[test]
    fn binary_mixture_is_supported() {
        let model = CoolPropModel::new();
        let comp = Composition::from_fluid_string("Propane * nButane", &[0.5, 0.5]).unwrap();
        assert!(model.supports_composition(&comp));
        assert!(matches!(Substance::of(&comp).unwrap(), Substance::Mix(_)));
    }

    #[test]
    fn pure_supported() {
        let model = CoolPropModel::new();
        let comp = Composition::pure(Species::Propane);
        assert!(model.supports_composition(&comp));
        assert!(matches!(Substance::of(&comp).unwrap(), Substance::Pure(_)));
    }

    #[test]
    fn fluid_string_with_empty_partner_stays_pure() {
        let comp = Composition::from_fluid_string("Propane * nButane", &[1.0, 0.0]).unwrap();
        assert!(matches!(Substance::of(&comp).unwrap(), Substance::Pure(_)));
    }
}
