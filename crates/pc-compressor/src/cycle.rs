//! Cycle orchestration: from a configuration to a solved periodic trajectory.

use crate::boundary::PeriodicBoundaryCondition;
use crate::config::{BackendConfig, CycleConfig, InitialGuess, PressureSpec, SolverSettings};
use crate::derivative::{CycleParameters, CycleStateDerivative, InletState};
use crate::error::{CycleError, CycleResult};
use crate::kinematics::CrankGeometry;
use crate::report::CycleReport;
use crate::thermal_mass::{ThermalMass, outer_area};
use crate::valve::inlet_area;
use nalgebra::DMatrix;
use pc_core::units::{Pressure, k, pa};
use pc_fluids::{Composition, CoolPropModel, FluidModel, IdealGasModel, StateInput};
use pc_solver::{BvpConfig, BvpSolution, Mesh, NewtonConfig, march_periods, solve_periodic_bvp};
use std::f64::consts::PI;
use std::time::Instant;
use tracing::{debug, info, warn};
use uom::si::pressure::pascal;

/// Solved cycle with its reconstruction.
#[derive(Debug, Clone)]
pub struct CycleRun {
    pub solution: BvpSolution,
    pub report: CycleReport,
    /// Periodic solves run, one per discharge area tried
    pub valve_updates: usize,
    /// The discharge area the final solve used reproduces itself
    pub outlet_area_converged: bool,
    pub solve_time_s: f64,
}

impl CycleRun {
    /// Both the periodic orbit and the discharge area converged.
    pub fn success(&self) -> bool {
        self.solution.success() && self.outlet_area_converged
    }
}

/// Fluid backend selected by the configuration.
pub fn build_model(backend: &BackendConfig) -> CycleResult<Box<dyn FluidModel>> {
    Ok(match *backend {
        BackendConfig::CoolProp => Box::new(CoolPropModel::new()),
        BackendConfig::IdealGas { cp_j_per_kg_k } => Box::new(IdealGasModel::new(cp_j_per_kg_k)?),
    })
}

/// Boundary pressure, resolving saturation temperatures through `model`.
pub fn resolve_pressure(
    spec: PressureSpec,
    model: &dyn FluidModel,
    comp: &Composition,
) -> CycleResult<Pressure> {
    match spec {
        PressureSpec::Absolute { pa: value } => Ok(pa(value)),
        PressureSpec::Saturation { temperature_k } => {
            Ok(model.saturation_pressure(k(temperature_k), comp)?)
        }
    }
}

/// Build the cylinder balances for `config`.
pub fn build_derivative<'a>(
    config: &CycleConfig,
    model: &'a dyn FluidModel,
) -> CycleResult<CycleStateDerivative<'a>> {
    config.validate()?;
    let g = &config.geometry;
    let o = &config.operating;
    let b = &config.boundary;

    let composition = b.composition()?;
    let p_suction = resolve_pressure(b.inlet_pressure, model, &composition)?.get::<pascal>();
    let p_discharge = resolve_pressure(b.outlet_pressure, model, &composition)?.get::<pascal>();
    if !(p_discharge > p_suction) {
        return Err(CycleError::Config {
            what: format!(
                "outlet pressure {p_discharge:.1} Pa must exceed inlet pressure {p_suction:.1} Pa"
            ),
        });
    }

    let suction = model.state(
        StateInput::PT {
            p: pa(p_suction),
            t: k(b.inlet_temperature_k),
        },
        &composition,
    )?;
    let inlet = InletState {
        temperature_k: b.inlet_temperature_k,
        specific_volume: suction.specific_volume(),
        internal_energy: suction.internal_energy() * 1e-3,
        enthalpy: suction.enthalpy() * 1e-3,
    };

    let geometry = CrankGeometry::new(g.bore_m, g.stroke_m, g.rod_ratio, g.clearance_fraction)?;
    let molar_mass = model.molar_mass(&composition)?;
    let reference_mass = geometry.max_volume() / inlet.specific_volume;

    let params = CycleParameters {
        geometry,
        omega: 2.0 * PI * o.speed_hz,
        friction_kpa: o.friction_kpa,
        p_suction_kpa: p_suction * 1e-3,
        p_discharge_kpa: p_discharge * 1e-3,
        inlet,
        inlet_area: inlet_area(g.bore_m, molar_mass),
        flow_divisor: config.solver.flow_divisor,
        reference_mass,
        mass_ceiling: config.solver.mass_ceiling_factor * reference_mass,
    };
    let wall = ThermalMass::new(
        &config.thermal_mass,
        outer_area(g.bore_m, g.stroke_m, g.cylinders),
        o.ambient_temperature_k,
    );

    info!(
        model = model.name(),
        p_suction_pa = p_suction,
        p_discharge_pa = p_discharge,
        inlet_area_m2 = params.inlet_area,
        reference_mass_kg = reference_mass,
        "cycle set up"
    );

    Ok(CycleStateDerivative::new(model, composition, params, wall))
}

/// Starting trajectory (3 × n).
pub fn initial_trajectory(
    guess: InitialGuess,
    derivative: &CycleStateDerivative<'_>,
    n: usize,
) -> DMatrix<f64> {
    let column = match guess {
        InitialGuess::FromBoundary => {
            let p = derivative.parameters();
            let t_amb = derivative.wall().ambient_temperature();
            [
                p.reference_mass,
                p.inlet.internal_energy,
                0.5 * (t_amb + p.inlet.temperature_k),
            ]
        }
        InitialGuess::Constant {
            mass_kg,
            energy_kj_per_kg,
            wall_temperature_k,
        } => [mass_kg, energy_kj_per_kg, wall_temperature_k],
    };
    DMatrix::from_fn(3, n, |r, _| column[r])
}

pub fn bvp_config(settings: &SolverSettings) -> BvpConfig {
    BvpConfig {
        tol: settings.tolerance,
        max_nodes: settings.max_nodes,
        newton: NewtonConfig {
            max_iterations: settings.max_newton_iterations,
            abs_tol: 0.1 * settings.tolerance,
            ..NewtonConfig::default()
        },
        warmup_periods: settings.warmup_revolutions,
        march_substeps: settings.march_substeps,
    }
}

/// Solve the periodic cycle for `config` with fluid `model`.
///
/// The warm start marches with the discharge area tracking each revolution.
/// Each periodic solve then holds the area fixed, so the Newton iteration
/// sees one smooth system. After a converged solve the area is recomputed
/// from the orbit and the orbit re-solved on the refined mesh until the
/// relative area change falls below `solver.valve_area_tolerance`.
///
/// Non-convergence of either loop is reported through [`CycleRun::success`].
/// An invalid fluid state anywhere on a trajectory the solver visits aborts
/// with [`CycleError::InvalidState`].
pub fn solve_cycle(config: &CycleConfig, model: &dyn FluidModel) -> CycleResult<CycleRun> {
    let mut derivative = build_derivative(config, model)?;
    let settings = &config.solver;
    let bc = PeriodicBoundaryCondition;
    let bvp = BvpConfig {
        warmup_periods: 0,
        ..bvp_config(settings)
    };

    let mut mesh = Mesh::uniform(0.0, 2.0 * PI, settings.resolution)?;
    let mut guess = initial_trajectory(settings.initial_guess, &derivative, mesh.len());

    let start = Instant::now();
    if settings.warmup_revolutions > 0 {
        let y0 = guess.column(0).into_owned();
        match march_periods(
            &mut derivative,
            &mesh,
            &y0,
            settings.warmup_revolutions,
            settings.march_substeps,
        ) {
            Ok(trajectory) => guess = trajectory,
            Err(e) => warn!(error = %e, "warm start abandoned"),
        }
    }
    derivative.track_discharge_area(false);

    let mut valve_updates = 0;
    let (solution, outlet_area_converged) = loop {
        let area = derivative.correction().area();
        let solution = solve_periodic_bvp(&mut derivative, &bc, mesh, guess, &bvp)?;
        valve_updates += 1;
        if !solution.success() {
            break (solution, false);
        }

        let target = derivative.discharge_area_target(&solution.x, &solution.y)?;
        let change = target.map_or(0.0, |a| (a - area).abs() / area);
        debug!(
            update = valve_updates,
            area_m2 = area,
            change,
            "discharge area update"
        );
        if change <= settings.valve_area_tolerance {
            break (solution, true);
        }
        if valve_updates >= settings.max_valve_updates {
            warn!(
                updates = valve_updates,
                change, "discharge area did not settle"
            );
            break (solution, false);
        }
        if let Some(a) = target {
            derivative.set_discharge_area(a);
        }

        mesh = Mesh::from_nodes(solution.x.clone())?;
        guess = solution.y;
    };
    let solve_time_s = start.elapsed().as_secs_f64();

    let report = CycleReport::reconstruct(&derivative, &solution, outlet_area_converged)?;
    info!(
        converged = solution.success(),
        outlet_area_converged,
        valve_updates,
        nodes = solution.x.len(),
        iterations = solution.iterations,
        peak_pressure_pa = report.summary.peak_pressure_pa,
        indicated_power_kw = report.summary.indicated_power_kw,
        solve_time_s,
        "cycle solved"
    );

    Ok(CycleRun {
        solution,
        report,
        valve_updates,
        outlet_area_converged,
        solve_time_s,
    })
}
