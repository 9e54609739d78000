//! Periodic boundary-value solver.
//!
//! Finds trajectories of `y' = f(x, y)` over one period that satisfy a
//! two-point boundary condition, typically `y(b) = y(a)`. The problem is posed
//! as trapezoidal collocation on a mesh and solved with a damped Newton
//! iteration whose linear step exploits the block structure of the
//! collocation Jacobian. Meshes are refined where the midpoint residual of the
//! cubic Hermite interpolant is too large.
//!
//! Systems implement [`PeriodicSystem`] and evaluate the whole mesh in one
//! call. Evaluations are tagged with [`EvalKind`] so a system that carries a
//! correction between passes can tell accepted iterates from probes.

mod collocation;
pub mod error;
pub mod jacobian;
pub mod march;
pub mod mesh;
pub mod newton;
pub mod periodic;
pub mod system;

pub use error::{SolverError, SolverResult};
pub use march::{Rk4, march_periods};
pub use mesh::Mesh;
pub use newton::{NewtonConfig, NewtonOutcome, NewtonResult};
pub use periodic::{BvpConfig, BvpSolution, BvpStatus, solve_periodic_bvp};
pub use system::{BoundaryCondition, EvalKind, PeriodicSystem};
