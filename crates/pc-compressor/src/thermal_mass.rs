//! Lumped wall node.
//!
//! One node stores heat exchanged with the gas and with the surroundings. Its
//! mass and specific heat are tuning constants that make the periodic solve
//! settle quickly without oscillation; they do not describe the real cylinder
//! wall. At the periodic solution only the balance between gas and ambient
//! heat flows matters, not the heat capacity.

use crate::valve::{REFERENCE_BORE, REFERENCE_STROKE};
use serde::{Deserialize, Serialize};

/// Outer surface of the reference two-cylinder compressor [m²].
const REFERENCE_OUTER_AREA: f64 = 0.04;
const REFERENCE_CYLINDERS: f64 = 2.0;

/// Wall node parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermalMassConfig {
    pub mass_kg: f64,
    pub specific_heat_kj_per_kg_k: f64,
    pub ambient_htc_w_per_m2_k: f64,
}

impl Default for ThermalMassConfig {
    fn default() -> Self {
        Self {
            mass_kg: 0.01,
            specific_heat_kj_per_kg_k: 0.502,
            ambient_htc_w_per_m2_k: 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalMass {
    /// Heat capacity [kJ/K]
    capacity: f64,
    /// Conductance to ambient [kW/K]
    ambient_conductance: f64,
    ambient_temperature: f64,
}

/// Outer surface scaled from the reference compressor [m²].
pub fn outer_area(bore: f64, stroke: f64, cylinders: u32) -> f64 {
    REFERENCE_OUTER_AREA * f64::from(cylinders) / REFERENCE_CYLINDERS * bore / REFERENCE_BORE
        * stroke
        / REFERENCE_STROKE
}

impl ThermalMass {
    pub fn new(config: &ThermalMassConfig, outer_area: f64, ambient_temperature: f64) -> Self {
        Self {
            capacity: config.mass_kg * config.specific_heat_kj_per_kg_k,
            ambient_conductance: config.ambient_htc_w_per_m2_k * outer_area * 1e-3,
            ambient_temperature,
        }
    }

    pub fn ambient_temperature(&self) -> f64 {
        self.ambient_temperature
    }

    /// Heat flow from ambient into the wall [kW].
    pub fn ambient_heat_rate(&self, t_wall: f64) -> f64 {
        self.ambient_conductance * (self.ambient_temperature - t_wall)
    }

    /// Wall temperature rate [K/s] given the heat flow from wall into gas [kW].
    pub fn temperature_rate(&self, wall_to_gas_kw: f64, t_wall: f64) -> f64 {
        (-wall_to_gas_kw + self.ambient_heat_rate(t_wall)) / self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_outer_area() {
        assert!((outer_area(0.034, 0.034, 2) - 0.04).abs() < 1e-15);
        assert!((outer_area(0.068, 0.034, 1) - 0.04).abs() < 1e-15);
    }

    #[test]
    fn wall_relaxes_towards_ambient() {
        let wall = ThermalMass::new(&ThermalMassConfig::default(), 0.04, 298.15);
        assert!(wall.temperature_rate(0.0, 320.0) < 0.0);
        assert!(wall.temperature_rate(0.0, 280.0) > 0.0);
        assert_eq!(wall.temperature_rate(0.0, 298.15), 0.0);
    }

    #[test]
    fn heating_the_gas_cools_the_wall() {
        let wall = ThermalMass::new(&ThermalMassConfig::default(), 0.04, 298.15);
        assert!(wall.temperature_rate(0.01, 298.15) < 0.0);
        assert!(wall.temperature_rate(-0.01, 298.15) > 0.0);
    }
}
