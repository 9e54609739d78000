//! Reconstruction of derived quantities along a solved trajectory.
//!
//! The solver only returns `(m, u, T_wall)` at the mesh nodes. Everything
//! else (pressure, flows, heat and work rates) is recomputed here from the
//! same balance equations, with the discharge area the final solve held.

use crate::derivative::CycleStateDerivative;
use crate::error::CycleResult;
use crate::valve::Regime;
use pc_solver::BvpSolution;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use uom::si::{pressure::pascal, thermodynamic_temperature::kelvin};

/// Cylinder state and rates at one mesh node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub theta_rad: f64,
    pub mass_kg: f64,
    pub energy_kj_per_kg: f64,
    pub wall_temperature_k: f64,
    pub position_m: f64,
    pub volume_m3: f64,
    pub surface_m2: f64,
    pub p_pa: f64,
    pub t_k: f64,
    pub h_kj_per_kg: f64,
    pub regime: Regime,
    pub alpha_w_per_m2_k: f64,
    pub mdot_in_kg_s: f64,
    pub mdot_out_kg_s: f64,
    pub heat_kw: f64,
    pub friction_kw: f64,
    pub work_kw: f64,
}

/// Cycle aggregates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSummary {
    pub converged: bool,
    pub message: String,
    pub iterations: usize,
    pub max_residual: f64,
    pub nodes: usize,
    /// `|y(2π) - y(0)|` for mass, energy and wall temperature
    pub periodicity_gap: [f64; 3],
    /// Mass drawn in over one revolution, as seen by the balances [kg]
    pub inducted_mass_kg: f64,
    /// Mass pushed out over one revolution, as seen by the balances [kg]
    pub delivered_mass_kg: f64,
    /// `(inducted - delivered) / inducted`; absent when nothing is inducted
    pub mass_balance_error: Option<f64>,
    /// Work done on the gas per revolution, `-∮p dV` [kJ]
    pub indicated_work_kj: f64,
    pub indicated_power_kw: f64,
    pub peak_pressure_pa: f64,
    pub peak_pressure_theta_rad: f64,
    pub min_pressure_pa: f64,
    pub outlet_valve_area_m2: f64,
    pub outlet_area_commits: usize,
    pub outlet_area_converged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub summary: CycleSummary,
    pub nodes: Vec<NodeRecord>,
}

impl CycleReport {
    /// Rebuild per-node records and aggregates for `solution`.
    ///
    /// `derivative` must still hold the discharge area `solution` was solved
    /// with. Works for unconverged solutions too; the summary carries the
    /// status.
    pub fn reconstruct(
        derivative: &CycleStateDerivative<'_>,
        solution: &BvpSolution,
        outlet_area_converged: bool,
    ) -> CycleResult<Self> {
        let params = derivative.parameters();
        let area = derivative.correction().area();
        let y = &solution.y;

        let mut nodes = Vec::with_capacity(solution.x.len());
        for (i, &theta) in solution.x.iter().enumerate() {
            let e = derivative.evaluate_with_area(theta, [y[(0, i)], y[(1, i)], y[(2, i)]], area)?;
            nodes.push(NodeRecord {
                theta_rad: theta,
                mass_kg: e.mass,
                energy_kj_per_kg: y[(1, i)],
                wall_temperature_k: e.wall_temperature,
                position_m: e.kinematics.position,
                volume_m3: e.kinematics.volume,
                surface_m2: e.kinematics.surface,
                p_pa: e.state.pressure().get::<pascal>(),
                t_k: e.state.temperature().get::<kelvin>(),
                h_kj_per_kg: e.state.enthalpy() * 1e-3,
                regime: e.regime,
                alpha_w_per_m2_k: e.alpha,
                mdot_in_kg_s: e.mdot_in,
                mdot_out_kg_s: e.mdot_out,
                heat_kw: e.heat_kw,
                friction_kw: e.friction_kw,
                work_kw: e.work_kw,
            });
        }

        let per_radian = 1.0 / (params.omega * params.flow_divisor);
        let inducted = trapezoid(&nodes, |n| n.mdot_in_kg_s * per_radian);
        let delivered = trapezoid(&nodes, |n| n.mdot_out_kg_s * per_radian);
        let mass_balance_error = (inducted > 0.0).then(|| (inducted - delivered) / inducted);

        // -p dV/dθ is the reversible work rate over ω
        let indicated_work = trapezoid(&nodes, |n| n.work_kw / params.omega);

        let (peak_pressure, peak_theta) = nodes
            .iter()
            .map(|n| (n.p_pa, n.theta_rad))
            .fold((f64::NEG_INFINITY, 0.0), |acc, v| if v.0 > acc.0 { v } else { acc });
        let min_pressure = nodes.iter().map(|n| n.p_pa).fold(f64::INFINITY, f64::min);

        let last = y.ncols().saturating_sub(1);
        let periodicity_gap = [0, 1, 2].map(|r| (y[(r, last)] - y[(r, 0)]).abs());

        let summary = CycleSummary {
            converged: solution.success(),
            message: solution.message.clone(),
            iterations: solution.iterations,
            max_residual: solution.max_residual,
            nodes: nodes.len(),
            periodicity_gap,
            inducted_mass_kg: inducted,
            delivered_mass_kg: delivered,
            mass_balance_error,
            indicated_work_kj: indicated_work,
            indicated_power_kw: indicated_work * params.omega / (2.0 * PI),
            peak_pressure_pa: peak_pressure,
            peak_pressure_theta_rad: peak_theta,
            min_pressure_pa: min_pressure,
            outlet_valve_area_m2: area,
            outlet_area_commits: derivative.correction().commits(),
            outlet_area_converged,
        };

        Ok(Self { summary, nodes })
    }
}

fn trapezoid(nodes: &[NodeRecord], f: impl Fn(&NodeRecord) -> f64) -> f64 {
    nodes
        .windows(2)
        .map(|w| 0.5 * (f(&w[0]) + f(&w[1])) * (w[1].theta_rad - w[0].theta_rad))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, CycleConfig, PressureSpec};
    use crate::cycle::build_derivative;
    use nalgebra::DMatrix;
    use pc_core::numeric::linspace;
    use pc_fluids::IdealGasModel;
    use pc_solver::BvpStatus;

    #[test]
    fn frozen_gas_does_no_net_work() {
        let mut config = CycleConfig::default();
        config.backend = BackendConfig::IdealGas {
            cp_j_per_kg_k: 1670.0,
        };
        config.boundary.inlet_pressure = PressureSpec::Absolute { pa: 3.0e5 };
        config.boundary.outlet_pressure = PressureSpec::Absolute { pa: 9.0e5 };
        let model = IdealGasModel::new(1670.0).unwrap();
        let d = build_derivative(&config, &model).unwrap();
        let p = d.parameters().clone();

        let n = 361;
        let column = [p.reference_mass, p.inlet.internal_energy, 300.0];
        let solution = BvpSolution {
            x: linspace(0.0, 2.0 * PI, n),
            y: DMatrix::from_fn(3, n, |r, _| column[r]),
            yp: DMatrix::zeros(3, n),
            status: BvpStatus::Converged,
            message: BvpStatus::Converged.message().to_string(),
            iterations: 0,
            max_residual: 0.0,
        };

        let report = CycleReport::reconstruct(&d, &solution, true).unwrap();
        let s = &report.summary;
        assert_eq!(report.nodes.len(), n);
        assert_eq!(s.periodicity_gap, [0.0; 3]);

        // p·V is constant, so the loop encloses no area
        let scale = s.peak_pressure_pa * 1e-3 * p.geometry.max_volume();
        assert!(s.indicated_work_kj.abs() < 1e-2 * scale);

        // never below suction pressure, so nothing is drawn in
        assert!(s.delivered_mass_kg > 0.0);
        assert!(s.inducted_mass_kg < 1e-6 * s.delivered_mass_kg);
        assert!((s.min_pressure_pa - 3.0e5).abs() < 1.0);
        assert!((s.peak_pressure_theta_rad - PI).abs() < 1e-9);
        assert_eq!(s.outlet_valve_area_m2, d.correction().area());
        assert!(s.outlet_area_converged);
    }
}
