//! pc-compressor: periodic cycle model of a reciprocating compressor cylinder.
//!
//! The cylinder is described by three states over one crank revolution: gas
//! mass, specific internal energy and a lumped wall temperature. Valves are
//! instantaneous orifices driven by the pressure difference to the suction
//! and discharge lines, heat exchange follows a Woschni-type correlation, and
//! the steady operating point is the periodic orbit `y(2π) = y(0)` found by
//! the boundary-value solver in `pc-solver`.
//!
//! # Example
//!
//! ```no_run
//! use pc_compressor::{CycleConfig, build_model, solve_cycle};
//!
//! let config = CycleConfig::default();
//! let model = build_model(&config.backend).unwrap();
//! let run = solve_cycle(&config, model.as_ref()).unwrap();
//! println!(
//!     "{}: peak {:.0} Pa",
//!     run.solution.message, run.report.summary.peak_pressure_pa
//! );
//! ```

pub mod boundary;
pub mod config;
pub mod correction;
pub mod cycle;
pub mod derivative;
pub mod error;
pub mod heat_transfer;
pub mod kinematics;
pub mod report;
pub mod thermal_mass;
pub mod valve;

pub use boundary::PeriodicBoundaryCondition;
pub use config::{
    BackendConfig, BoundaryConfig, CycleConfig, FluidComponent, GeometryConfig, InitialGuess,
    OperatingConfig, PressureSpec, SolverSettings,
};
pub use correction::ValveCorrection;
pub use cycle::{
    CycleRun, build_derivative, build_model, bvp_config, initial_trajectory, resolve_pressure,
    solve_cycle,
};
pub use derivative::{CycleParameters, CycleStateDerivative, InletState, NodeEvaluation};
pub use error::{CycleError, CycleResult};
pub use kinematics::{CrankGeometry, KinematicPoint};
pub use report::{CycleReport, CycleSummary, NodeRecord};
pub use thermal_mass::{ThermalMass, ThermalMassConfig};
pub use valve::Regime;
