//! Right-hand side of the cylinder balances.
//!
//! The state at each crank angle is `(m, u, T_wall)`: in-cylinder mass [kg],
//! specific internal energy [kJ/kg] and wall temperature [K]. Derivatives are
//! taken with respect to crank angle, so every time rate is divided by the
//! angular speed. Pressures are handled in kPa, heat and work rates in kW.

use crate::correction::ValveCorrection;
use crate::error::{CycleError, CycleResult};
use crate::heat_transfer::{wall_heat_rate, woschni_coefficient};
use crate::kinematics::{CrankGeometry, KinematicPoint};
use crate::thermal_mass::ThermalMass;
use crate::valve::{Regime, orifice_mass_flow};
use nalgebra::{DMatrix, DVector};
use pc_fluids::{Composition, FluidError, FluidModel, StateInput, ThermoState};
use pc_solver::{EvalKind, PeriodicSystem};
use std::f64::consts::PI;
use uom::si::{pressure::kilopascal, thermodynamic_temperature::kelvin};

/// Suction line state in balance units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InletState {
    pub temperature_k: f64,
    pub specific_volume: f64,
    /// [kJ/kg]
    pub internal_energy: f64,
    /// [kJ/kg]
    pub enthalpy: f64,
}

/// Fixed inputs of the cylinder balances.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleParameters {
    pub geometry: CrankGeometry,
    /// Angular speed [rad/s]
    pub omega: f64,
    pub friction_kpa: f64,
    pub p_suction_kpa: f64,
    pub p_discharge_kpa: f64,
    pub inlet: InletState,
    /// Effective suction valve area [m²]
    pub inlet_area: f64,
    pub flow_divisor: f64,
    /// Suction gas filling the cylinder at bottom dead centre [kg]
    pub reference_mass: f64,
    /// Mass guesses above this are reset to `reference_mass` [kg]
    pub mass_ceiling: f64,
}

/// Everything computed at one node.
#[derive(Debug, Clone)]
pub struct NodeEvaluation {
    pub theta: f64,
    /// Mass after clamping [kg]
    pub mass: f64,
    /// Wall temperature after clamping [K]
    pub wall_temperature: f64,
    pub kinematics: KinematicPoint,
    pub state: ThermoState,
    pub regime: Regime,
    /// Heat-transfer coefficient [W/(m²·K)]
    pub alpha: f64,
    /// Orifice flows [kg/s]
    pub mdot_in: f64,
    pub mdot_out: f64,
    /// Heat flow from wall into gas [kW]
    pub heat_kw: f64,
    /// Friction work into gas [kW]
    pub friction_kw: f64,
    /// Reversible work into gas, -p·dV/dt [kW]
    pub work_kw: f64,
    /// d/dθ of (m, u, T_wall)
    pub derivative: [f64; 3],
}

/// Cylinder balances over one revolution for a fluid model.
///
/// Carries the discharge area between passes. While tracking is on, each
/// `Residual` pass recomputes it; with tracking off it stays frozen and only
/// [`set_discharge_area`](Self::set_discharge_area) moves it.
pub struct CycleStateDerivative<'a> {
    model: &'a dyn FluidModel,
    composition: Composition,
    params: CycleParameters,
    wall: ThermalMass,
    correction: ValveCorrection,
    tracking: bool,
}

impl std::fmt::Debug for CycleStateDerivative<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleStateDerivative")
            .field("model", &self.model.name())
            .field("composition", &self.composition.to_string())
            .field("params", &self.params)
            .field("correction", &self.correction)
            .field("tracking", &self.tracking)
            .finish_non_exhaustive()
    }
}

impl<'a> CycleStateDerivative<'a> {
    pub fn new(
        model: &'a dyn FluidModel,
        composition: Composition,
        params: CycleParameters,
        wall: ThermalMass,
    ) -> Self {
        let correction = ValveCorrection::new(params.geometry.bore());
        Self {
            model,
            composition,
            params,
            wall,
            correction,
            tracking: true,
        }
    }

    pub fn parameters(&self) -> &CycleParameters {
        &self.params
    }

    pub fn wall(&self) -> &ThermalMass {
        &self.wall
    }

    pub fn correction(&self) -> &ValveCorrection {
        &self.correction
    }

    /// Let `Residual` passes recompute the discharge area, or freeze it.
    pub fn track_discharge_area(&mut self, on: bool) {
        self.tracking = on;
    }

    pub fn is_tracking_discharge_area(&self) -> bool {
        self.tracking
    }

    /// Discharge area implied by one ascending pass over `(x, y)` at the
    /// current area, `None` when no node pushes out.
    pub fn discharge_area_target(
        &self,
        x: &[f64],
        y: &DMatrix<f64>,
    ) -> CycleResult<Option<f64>> {
        let (_, push_out) = self.pass(x, y, self.correction.area())?;
        Ok(self.correction.target(x, &push_out))
    }

    pub fn set_discharge_area(&mut self, area: f64) {
        self.correction.set_area(area);
    }

    /// Derivatives at every node plus the discharge flow of push-out nodes.
    fn pass(
        &self,
        x: &[f64],
        y: &DMatrix<f64>,
        area: f64,
    ) -> CycleResult<(DMatrix<f64>, Vec<Option<f64>>)> {
        let mut out = DMatrix::zeros(3, x.len());
        let mut push_out = Vec::with_capacity(x.len());

        for (i, &theta) in x.iter().enumerate() {
            let node = self.evaluate_with_area(theta, [y[(0, i)], y[(1, i)], y[(2, i)]], area)?;
            for (r, d) in node.derivative.iter().enumerate() {
                out[(r, i)] = *d;
            }
            push_out.push((node.regime == Regime::PushOut).then_some(node.mdot_out));
        }
        Ok((out, push_out))
    }

    /// Evaluate one node with the discharge area of the next pass.
    pub fn evaluate(&self, theta: f64, y: [f64; 3]) -> CycleResult<NodeEvaluation> {
        self.evaluate_with_area(theta, y, self.correction.area())
    }

    /// Evaluate one node with an explicit discharge valve area [m²].
    pub fn evaluate_with_area(
        &self,
        theta: f64,
        y: [f64; 3],
        outlet_area: f64,
    ) -> CycleResult<NodeEvaluation> {
        let p = &self.params;
        let [m_raw, u, t_wall_raw] = y;

        // keep the oracle away from non-physical guesses
        let mass = if m_raw > 0.0 && m_raw <= p.mass_ceiling {
            m_raw
        } else {
            p.reference_mass
        };
        let t_wall = if t_wall_raw > 0.0 {
            t_wall_raw
        } else {
            self.wall.ambient_temperature()
        };

        if !u.is_finite() {
            return Err(CycleError::InvalidState {
                theta,
                message: format!("non-finite internal energy {u} kJ/kg"),
            });
        }

        let kinematics = p.geometry.at(theta, p.omega);
        let v = kinematics.volume / mass;
        let state = self
            .model
            .state(StateInput::UV { u: u * 1e3, v }, &self.composition)
            .map_err(|e| oracle_error(theta, e))?;

        let p_kpa = state.pressure().get::<kilopascal>();
        let t_gas = state.temperature().get::<kelvin>();
        let h = state.enthalpy() * 1e-3;

        let regime = Regime::classify(theta, p_kpa, p.p_suction_kpa, p.p_discharge_kpa);
        let (mdot_in, mdot_out) = match regime {
            Regime::PushOut => (0.0, orifice_mass_flow(outlet_area, v, p_kpa - p.p_discharge_kpa)),
            Regime::Suction => (
                orifice_mass_flow(p.inlet_area, p.inlet.specific_volume, p.p_suction_kpa - p_kpa),
                0.0,
            ),
            Regime::Compression | Regime::Expansion => (0.0, 0.0),
        };

        let alpha = woschni_coefficient(
            p.geometry.bore(),
            p_kpa,
            t_gas,
            regime.woschni_factor(),
            kinematics.dx_dt,
        );
        let heat_kw = wall_heat_rate(alpha, kinematics.surface, t_wall, t_gas);
        let friction_kw = if theta <= PI {
            -p.friction_kpa * kinematics.dv_dt
        } else {
            p.friction_kpa * kinematics.dv_dt
        };
        let work_kw = -p_kpa * kinematics.dv_dt;

        let dm_in = mdot_in / (p.omega * p.flow_divisor);
        let dm_out = mdot_out / (p.omega * p.flow_divisor);
        let dm = dm_in - dm_out;
        let du = ((heat_kw + friction_kw + work_kw) / p.omega - dm * u - dm_out * h
            + dm_in * p.inlet.enthalpy)
            / mass;
        let dt_wall = self.wall.temperature_rate(heat_kw, t_wall) / p.omega;

        Ok(NodeEvaluation {
            theta,
            mass,
            wall_temperature: t_wall,
            kinematics,
            state,
            regime,
            alpha,
            mdot_in,
            mdot_out,
            heat_kw,
            friction_kw,
            work_kw,
            derivative: [dm, du, dt_wall],
        })
    }
}

fn oracle_error(theta: f64, e: FluidError) -> CycleError {
    if e.is_invalid_state() {
        CycleError::InvalidState {
            theta,
            message: e.to_string(),
        }
    } else {
        CycleError::Fluid(e)
    }
}

impl PeriodicSystem for CycleStateDerivative<'_> {
    type Error = CycleError;

    fn dim(&self) -> usize {
        3
    }

    fn scale(&self) -> DVector<f64> {
        DVector::from_column_slice(&[
            self.params.reference_mass,
            self.params.inlet.internal_energy.abs().max(1.0),
            self.wall.ambient_temperature(),
        ])
    }

    /// Nodes are visited in the given (ascending) order with the discharge area
    /// held fixed; a `Residual` pass then commits the area correction unless
    /// tracking is off.
    fn rhs(
        &mut self,
        x: &[f64],
        y: &DMatrix<f64>,
        kind: EvalKind,
    ) -> CycleResult<DMatrix<f64>> {
        let (out, push_out) = self.pass(x, y, self.correction.area())?;
        if kind == EvalKind::Residual && self.tracking {
            self.correction.commit(x, &push_out);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BackendConfig, CycleConfig, PressureSpec};
    use crate::cycle::build_derivative;
    use pc_fluids::IdealGasModel;

    fn config() -> CycleConfig {
        let mut config = CycleConfig::default();
        config.backend = BackendConfig::IdealGas {
            cp_j_per_kg_k: 1670.0,
        };
        config.boundary.inlet_pressure = PressureSpec::Absolute { pa: 3.0e5 };
        config.boundary.outlet_pressure = PressureSpec::Absolute { pa: 9.0e5 };
        config
    }

    fn model() -> IdealGasModel {
        IdealGasModel::new(1670.0).unwrap()
    }

    #[test]
    fn suction_gas_at_bottom_dead_centre_is_at_rest() {
        let model = model();
        let d = build_derivative(&config(), &model).unwrap();
        let p = d.parameters().clone();
        let node = d
            .evaluate(0.0, [p.reference_mass, p.inlet.internal_energy, 290.0])
            .unwrap();
        assert_eq!(node.regime, Regime::Compression);
        assert!((node.state.pressure().get::<kilopascal>() - 300.0).abs() < 1e-6);
        assert_eq!(node.mdot_in, 0.0);
        assert_eq!(node.mdot_out, 0.0);
        assert!(node.derivative[0].abs() < 1e-15);
        assert!(node.derivative[1].abs() < 1e-9);
    }

    #[test]
    fn expanded_gas_draws_in() {
        let model = model();
        let d = build_derivative(&config(), &model).unwrap();
        let p = d.parameters().clone();
        let node = d
            .evaluate(
                1.5 * PI,
                [0.3 * p.reference_mass, p.inlet.internal_energy, 290.0],
            )
            .unwrap();
        assert_eq!(node.regime, Regime::Suction);
        assert!(node.mdot_in > 0.0);
        assert!(node.derivative[0] > 0.0);
    }

    #[test]
    fn compressed_gas_pushes_out() {
        let model = model();
        let d = build_derivative(&config(), &model).unwrap();
        let p = d.parameters().clone();
        let node = d
            .evaluate(0.9 * PI, [p.reference_mass, p.inlet.internal_energy, 290.0])
            .unwrap();
        assert_eq!(node.regime, Regime::PushOut);
        assert!(node.mdot_out > 0.0);
        assert!(node.derivative[0] < 0.0);
        // compression work heats the gas
        assert!(node.work_kw > 0.0);
    }

    #[test]
    fn non_physical_guesses_are_clamped() {
        let model = model();
        let d = build_derivative(&config(), &model).unwrap();
        let p = d.parameters().clone();
        let node = d
            .evaluate(0.0, [-1.0, p.inlet.internal_energy, -5.0])
            .unwrap();
        assert_eq!(node.mass, p.reference_mass);
        assert_eq!(node.wall_temperature, 298.15);

        let node = d
            .evaluate(0.0, [10.0 * p.reference_mass, p.inlet.internal_energy, 290.0])
            .unwrap();
        assert_eq!(node.mass, p.reference_mass);
    }

    #[test]
    fn invalid_state_aborts_the_pass() {
        let model = model();
        let mut d = build_derivative(&config(), &model).unwrap();
        let m = d.parameters().reference_mass;
        let x = [0.0, 1.0, 2.0];
        let mut y = DMatrix::from_element(3, 3, 300.0);
        y.row_mut(0).fill(m);
        y[(1, 1)] = -100.0;

        let err = d.rhs(&x, &y, EvalKind::Residual).unwrap_err();
        match err {
            CycleError::InvalidState { theta, .. } => assert_eq!(theta, 1.0),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(d.correction().commits(), 0);
    }

    #[test]
    fn only_residual_passes_move_the_valve_area() {
        let model = model();
        let mut d = build_derivative(&config(), &model).unwrap();
        let p = d.parameters().clone();
        let x = [0.8 * PI, 0.9 * PI, 0.95 * PI];
        let mut y = DMatrix::zeros(3, 3);
        for i in 0..3 {
            y[(0, i)] = p.reference_mass;
            y[(1, i)] = p.inlet.internal_energy;
            y[(2, i)] = 300.0;
        }
        let seed = d.correction().area();

        d.rhs(&x, &y, EvalKind::Probe).unwrap();
        assert_eq!(d.correction().area(), seed);

        let f = d.rhs(&x, &y, EvalKind::Residual).unwrap();
        assert_eq!(d.correction().commits(), 1);
        assert_ne!(d.correction().area(), seed);
        assert!(f.row(0).iter().all(|dm| *dm < 0.0));
    }

    #[test]
    fn frozen_area_survives_residual_passes() {
        let model = model();
        let mut d = build_derivative(&config(), &model).unwrap();
        let p = d.parameters().clone();
        let x = [0.8 * PI, 0.9 * PI, 0.95 * PI];
        let mut y = DMatrix::zeros(3, 3);
        for i in 0..3 {
            y[(0, i)] = p.reference_mass;
            y[(1, i)] = p.inlet.internal_energy;
            y[(2, i)] = 300.0;
        }
        let seed = d.correction().area();

        d.track_discharge_area(false);
        let first = d.rhs(&x, &y, EvalKind::Residual).unwrap();
        let second = d.rhs(&x, &y, EvalKind::Residual).unwrap();
        assert_eq!(d.correction().area(), seed);
        assert_eq!(d.correction().commits(), 0);
        // identical iterates give identical residuals while frozen
        assert_eq!(first, second);

        let target = d.discharge_area_target(&x, &y).unwrap().unwrap();
        assert_ne!(target, seed);
        assert_eq!(d.correction().area(), seed);

        d.set_discharge_area(target);
        assert_eq!(d.correction().commits(), 1);
        assert_eq!(d.correction().area(), target);
        assert!(!d.is_tracking_discharge_area());
    }

    #[test]
    fn non_finite_energy_is_an_invalid_state() {
        let model = model();
        let d = build_derivative(&config(), &model).unwrap();
        let m = d.parameters().reference_mass;
        for u in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = d.evaluate(0.25, [m, u, 300.0]).unwrap_err();
            assert!(err.is_invalid_state(), "{err}");
            match err {
                CycleError::InvalidState { theta, .. } => assert_eq!(theta, 0.25),
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn debug_names_the_fluid_model() {
        let model = model();
        let d = build_derivative(&config(), &model).unwrap();
        let text = format!("{d:?}");
        assert!(text.contains("CycleStateDerivative"));
        assert!(text.contains(model.name()));
    }

    #[test]
    fn scale_is_physical() {
        let model = model();
        let d = build_derivative(&config(), &model).unwrap();
        let s = d.scale();
        assert_eq!(s[0], d.parameters().reference_mass);
        assert!(s[1] >= 1.0);
        assert_eq!(s[2], 298.15);
    }
}
