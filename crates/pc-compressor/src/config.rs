//! Cycle configuration (YAML).

use crate::error::{CycleError, CycleResult};
use crate::thermal_mass::ThermalMassConfig;
use pc_fluids::{Composition, Species};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CycleConfig {
    pub geometry: GeometryConfig,
    pub operating: OperatingConfig,
    pub boundary: BoundaryConfig,
    pub thermal_mass: ThermalMassConfig,
    pub solver: SolverSettings,
    pub backend: BackendConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    pub bore_m: f64,
    pub stroke_m: f64,
    /// Connecting rod length over crank radius
    pub rod_ratio: f64,
    /// Clearance gap as a fraction of the stroke
    pub clearance_fraction: f64,
    /// Only scales the outer surface of the wall node
    pub cylinders: u32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            bore_m: 0.034,
            stroke_m: 0.034,
            rod_ratio: 2.0,
            clearance_fraction: 0.04,
            cylinders: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatingConfig {
    /// Revolutions per second
    pub speed_hz: f64,
    /// Friction mean pressure [kPa]
    pub friction_kpa: f64,
    pub ambient_temperature_k: f64,
}

impl Default for OperatingConfig {
    fn default() -> Self {
        Self {
            speed_hz: 25.0,
            friction_kpa: 48.916,
            ambient_temperature_k: pc_core::units::constants::T_AMBIENT_K,
        }
    }
}

/// Boundary pressure given directly or as a saturation (bubble-point) temperature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PressureSpec {
    Absolute { pa: f64 },
    Saturation { temperature_k: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FluidComponent {
    pub species: String,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub inlet_temperature_k: f64,
    pub inlet_pressure: PressureSpec,
    pub outlet_pressure: PressureSpec,
    pub fluid: Vec<FluidComponent>,
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            inlet_temperature_k: 282.65,
            inlet_pressure: PressureSpec::Saturation {
                temperature_k: 263.0,
            },
            outlet_pressure: PressureSpec::Saturation {
                temperature_k: 355.0,
            },
            fluid: vec![
                FluidComponent {
                    species: "Propane".to_string(),
                    fraction: 1.0,
                },
                FluidComponent {
                    species: "nButane".to_string(),
                    fraction: 0.0,
                },
            ],
        }
    }
}

impl BoundaryConfig {
    /// Composition from the component list; zero fractions are dropped.
    pub fn composition(&self) -> CycleResult<Composition> {
        let fractions = self
            .fluid
            .iter()
            .map(|c| {
                c.species
                    .parse::<Species>()
                    .map(|s| (s, c.fraction))
                    .map_err(|_| CycleError::Config {
                        what: format!("unknown species '{}'", c.species),
                    })
            })
            .collect::<CycleResult<Vec<_>>>()?;
        Ok(Composition::new_mole_fractions(fractions)?)
    }
}

/// Starting trajectory for the periodic solve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitialGuess {
    /// Cylinder full of suction gas, wall halfway between ambient and inlet.
    FromBoundary,
    /// Same values at every node.
    Constant {
        mass_kg: f64,
        energy_kj_per_kg: f64,
        wall_temperature_k: f64,
    },
}

impl InitialGuess {
    /// Literal guess calibrated for the 34 mm propane compressor.
    /// Must be recalibrated for other configurations.
    pub fn calibrated_propane() -> Self {
        InitialGuess::Constant {
            mass_kg: 0.00019,
            energy_kj_per_kg: 570.74,
            wall_temperature_k: 321.91,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Mesh points over one revolution
    pub resolution: usize,
    pub tolerance: f64,
    pub max_nodes: usize,
    pub max_newton_iterations: usize,
    /// Revolutions marched before the Newton solve
    pub warmup_revolutions: usize,
    /// RK4 steps per mesh interval while marching
    pub march_substeps: usize,
    /// Divides the valve mass flows entering the balances
    pub flow_divisor: f64,
    /// Mass guesses above this multiple of the full-cylinder suction mass are reset
    pub mass_ceiling_factor: f64,
    /// Relative discharge-area change that ends the outer area iteration
    pub valve_area_tolerance: f64,
    /// Re-solves allowed for the discharge area to settle
    pub max_valve_updates: usize,
    pub initial_guess: InitialGuess,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            resolution: 360,
            tolerance: 0.01,
            max_nodes: 1000,
            max_newton_iterations: 50,
            warmup_revolutions: 3,
            march_substeps: 4,
            flow_divisor: 1.0,
            mass_ceiling_factor: 1.5,
            valve_area_tolerance: 1e-3,
            max_valve_updates: 25,
            initial_guess: InitialGuess::FromBoundary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackendConfig {
    #[default]
    #[serde(rename = "coolprop")]
    CoolProp,
    IdealGas {
        cp_j_per_kg_k: f64,
    },
}

impl CycleConfig {
    pub fn from_yaml_str(content: &str) -> CycleResult<Self> {
        let config: CycleConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> CycleResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml_string(&self) -> CycleResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> CycleResult<()> {
        let g = &self.geometry;
        positive("geometry.bore_m", g.bore_m)?;
        positive("geometry.stroke_m", g.stroke_m)?;
        positive("geometry.clearance_fraction", g.clearance_fraction)?;
        if !(g.rod_ratio > 1.0) {
            return Err(invalid("geometry.rod_ratio", g.rod_ratio, "must exceed 1"));
        }
        if g.cylinders == 0 {
            return Err(invalid("geometry.cylinders", 0.0, "must be at least 1"));
        }

        let o = &self.operating;
        positive("operating.speed_hz", o.speed_hz)?;
        positive("operating.ambient_temperature_k", o.ambient_temperature_k)?;
        if !(o.friction_kpa >= 0.0) {
            return Err(invalid(
                "operating.friction_kpa",
                o.friction_kpa,
                "must be non-negative",
            ));
        }

        let b = &self.boundary;
        positive("boundary.inlet_temperature_k", b.inlet_temperature_k)?;
        for (field, spec) in [
            ("boundary.inlet_pressure", b.inlet_pressure),
            ("boundary.outlet_pressure", b.outlet_pressure),
        ] {
            match spec {
                PressureSpec::Absolute { pa } => positive(field, pa)?,
                PressureSpec::Saturation { temperature_k } => positive(field, temperature_k)?,
            }
        }
        if let (PressureSpec::Absolute { pa: p_in }, PressureSpec::Absolute { pa: p_out }) =
            (b.inlet_pressure, b.outlet_pressure)
            && !(p_out > p_in)
        {
            return Err(invalid(
                "boundary.outlet_pressure",
                p_out,
                "must exceed the inlet pressure",
            ));
        }
        if b.fluid.is_empty() {
            return Err(CycleError::Config {
                what: "boundary.fluid must list at least one species".to_string(),
            });
        }
        b.composition()?;

        let t = &self.thermal_mass;
        positive("thermal_mass.mass_kg", t.mass_kg)?;
        positive(
            "thermal_mass.specific_heat_kj_per_kg_k",
            t.specific_heat_kj_per_kg_k,
        )?;
        if !(t.ambient_htc_w_per_m2_k >= 0.0) {
            return Err(invalid(
                "thermal_mass.ambient_htc_w_per_m2_k",
                t.ambient_htc_w_per_m2_k,
                "must be non-negative",
            ));
        }

        let s = &self.solver;
        if s.resolution < 3 {
            return Err(invalid(
                "solver.resolution",
                s.resolution as f64,
                "must be at least 3",
            ));
        }
        if s.max_nodes < s.resolution {
            return Err(invalid(
                "solver.max_nodes",
                s.max_nodes as f64,
                "must be at least the resolution",
            ));
        }
        positive("solver.tolerance", s.tolerance)?;
        positive("solver.flow_divisor", s.flow_divisor)?;
        if !(s.mass_ceiling_factor > 1.0) {
            return Err(invalid(
                "solver.mass_ceiling_factor",
                s.mass_ceiling_factor,
                "must exceed 1",
            ));
        }
        positive("solver.valve_area_tolerance", s.valve_area_tolerance)?;
        if s.max_valve_updates == 0 {
            return Err(invalid(
                "solver.max_valve_updates",
                0.0,
                "must be at least 1",
            ));
        }
        if let InitialGuess::Constant {
            mass_kg,
            wall_temperature_k,
            energy_kj_per_kg,
        } = s.initial_guess
        {
            positive("solver.initial_guess.mass_kg", mass_kg)?;
            positive("solver.initial_guess.wall_temperature_k", wall_temperature_k)?;
            if !energy_kj_per_kg.is_finite() {
                return Err(invalid(
                    "solver.initial_guess.energy_kj_per_kg",
                    energy_kj_per_kg,
                    "must be finite",
                ));
            }
        }

        if let BackendConfig::IdealGas { cp_j_per_kg_k } = self.backend {
            positive("backend.cp_j_per_kg_k", cp_j_per_kg_k)?;
        }

        Ok(())
    }
}

fn invalid(field: &str, value: f64, reason: &str) -> CycleError {
    CycleError::Config {
        what: format!("{field} = {value}: {reason}"),
    }
}

fn positive(field: &str, value: f64) -> CycleResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(field, value, "must be positive and finite"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        CycleConfig::default().validate().unwrap();
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = r#"
boundary:
  inlet_pressure: { type: absolute, pa: 300000.0 }
  outlet_pressure: { type: absolute, pa: 900000.0 }
backend:
  type: ideal_gas
  cp_j_per_kg_k: 1670.0
solver:
  resolution: 181
"#;
        let config = CycleConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.geometry, GeometryConfig::default());
        assert_eq!(config.solver.resolution, 181);
        assert_eq!(config.solver.tolerance, 0.01);
        assert_eq!(
            config.backend,
            BackendConfig::IdealGas {
                cp_j_per_kg_k: 1670.0
            }
        );
        assert_eq!(
            config.boundary.inlet_pressure,
            PressureSpec::Absolute { pa: 300000.0 }
        );
    }

    #[test]
    fn yaml_round_trip() {
        let config = CycleConfig::default();
        let text = config.to_yaml_string().unwrap();
        assert!(text.contains("coolprop"));
        let back = CycleConfig::from_yaml_str(&text).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn rejects_outlet_below_inlet() {
        let mut config = CycleConfig::default();
        config.boundary.inlet_pressure = PressureSpec::Absolute { pa: 9.0e5 };
        config.boundary.outlet_pressure = PressureSpec::Absolute { pa: 3.0e5 };
        assert!(matches!(config.validate(), Err(CycleError::Config { .. })));
    }

    #[test]
    fn rejects_unknown_species() {
        let mut config = CycleConfig::default();
        config.boundary.fluid[0].species = "Unobtainium".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Unobtainium"));
    }

    #[test]
    fn rejects_a_disabled_valve_area_iteration() {
        let mut config = CycleConfig::default();
        config.solver.max_valve_updates = 0;
        assert!(matches!(config.validate(), Err(CycleError::Config { .. })));

        let mut config = CycleConfig::default();
        config.solver.valve_area_tolerance = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("valve_area_tolerance"));
    }

    #[test]
    fn zero_fraction_component_is_dropped() {
        let comp = BoundaryConfig::default().composition().unwrap();
        assert_eq!(comp.is_pure(), Some(Species::Propane));
    }
}
