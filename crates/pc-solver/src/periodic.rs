//! Periodic boundary-value solve with mesh refinement.

use crate::collocation::Collocation;
use crate::error::SolverError;
use crate::march::march_periods;
use crate::mesh::{Mesh, interpolate};
use crate::newton::{NewtonConfig, NewtonOutcome, newton_solve};
use crate::system::{BoundaryCondition, EvalKind, PeriodicSystem};
use nalgebra::DMatrix;
use pc_core::numeric::ensure_positive;
use tracing::{debug, info, warn};

/// Boundary-value solver configuration.
#[derive(Debug, Clone)]
pub struct BvpConfig {
    /// Tolerance on the relative midpoint collocation residual
    pub tol: f64,
    /// Largest mesh the refinement may produce
    pub max_nodes: usize,
    /// Newton settings for each mesh; `abs_tol` bounds the scaled node residual
    pub newton: NewtonConfig,
    /// Periods marched from the first column of the guess before Newton (0 = off)
    pub warmup_periods: usize,
    /// RK4 steps per mesh interval while marching
    pub march_substeps: usize,
}

impl Default for BvpConfig {
    fn default() -> Self {
        Self {
            tol: 1e-3,
            max_nodes: 1000,
            newton: NewtonConfig {
                abs_tol: 1e-4,
                ..NewtonConfig::default()
            },
            warmup_periods: 0,
            march_substeps: 4,
        }
    }
}

/// Final status of a boundary-value solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BvpStatus {
    Converged,
    MaxNodesExceeded,
    SingularJacobian,
    NewtonFailed,
}

impl BvpStatus {
    pub fn message(&self) -> &'static str {
        match self {
            BvpStatus::Converged => "The algorithm converged to the desired accuracy.",
            BvpStatus::MaxNodesExceeded => "The maximum number of mesh nodes is exceeded.",
            BvpStatus::SingularJacobian => {
                "A singular Jacobian encountered when solving the collocation system."
            }
            BvpStatus::NewtonFailed => "The Newton iteration did not converge on the current mesh.",
        }
    }
}

/// Trajectory and diagnostics returned by [`solve_periodic_bvp`].
#[derive(Debug, Clone)]
pub struct BvpSolution {
    /// Mesh nodes
    pub x: Vec<f64>,
    /// State at each node (dim × N)
    pub y: DMatrix<f64>,
    /// Derivative at each node (dim × N)
    pub yp: DMatrix<f64>,
    pub status: BvpStatus,
    pub message: String,
    /// Newton iterations summed over all meshes
    pub iterations: usize,
    /// Largest relative midpoint residual on the final mesh
    pub max_residual: f64,
}

impl BvpSolution {
    pub fn success(&self) -> bool {
        self.status == BvpStatus::Converged
    }
}

/// Solve `y' = f(x, y)` on `mesh` subject to `bc`, starting from `guess` (dim × N).
///
/// The trajectory is found by trapezoidal collocation and damped Newton. When
/// the midpoint residual exceeds `config.tol` on some intervals, nodes are
/// inserted there and the solve repeats on the finer mesh.
///
/// Failing to converge is reported in [`BvpSolution::status`]. Errors from the
/// system abort the solve and are returned as `Err`; an error while marching
/// the warm start only abandons the warm start.
pub fn solve_periodic_bvp<S, B>(
    system: &mut S,
    bc: &B,
    mesh: Mesh,
    guess: DMatrix<f64>,
    config: &BvpConfig,
) -> Result<BvpSolution, S::Error>
where
    S: PeriodicSystem,
    B: BoundaryCondition,
{
    validate(system, &mesh, &guess, config)?;

    let mut mesh = mesh;
    let mut y = guess;

    if config.warmup_periods > 0 {
        let start = y.column(0).into_owned();
        match march_periods(
            system,
            &mesh,
            &start,
            config.warmup_periods,
            config.march_substeps,
        ) {
            Ok(trajectory) => y = trajectory,
            Err(e) => warn!(error = %e, "warm start abandoned"),
        }
    }

    let mut iterations = 0;
    loop {
        let mut collocation = Collocation::new(system, bc, &mesh);
        let result = newton_solve(
            &mut collocation,
            Collocation::<S, B>::pack(&y),
            &config.newton,
        )?;
        iterations += result.iterations;
        let accepted = collocation.accepted_derivative().cloned();
        y = DMatrix::from_column_slice(y.nrows(), mesh.len(), result.x.as_slice());
        let f = match accepted {
            Some(f) => f,
            None => system.rhs(mesh.nodes(), &y, EvalKind::Probe)?,
        };

        let failed = match result.outcome {
            NewtonOutcome::Converged => None,
            NewtonOutcome::SingularJacobian => Some(BvpStatus::SingularJacobian),
            NewtonOutcome::MaxIterations | NewtonOutcome::Stagnated => {
                Some(BvpStatus::NewtonFailed)
            }
        };
        if let Some(status) = failed {
            warn!(nodes = mesh.len(), ?status, "periodic solve stopped");
            return Ok(finish(mesh, y, f, status, iterations, result.residual_max));
        }

        let mut collocation = Collocation::new(system, bc, &mesh);
        let residuals = collocation.midpoint_residuals(&y, &f)?;
        let max_residual = residuals.iter().copied().fold(0.0, f64::max);
        debug!(nodes = mesh.len(), max_residual, "midpoint residual");

        if max_residual <= config.tol {
            info!(nodes = mesh.len(), iterations, max_residual, "periodic solve converged");
            return Ok(finish(
                mesh,
                y,
                f,
                BvpStatus::Converged,
                iterations,
                max_residual,
            ));
        }

        let x = mesh.nodes();
        let mut inserted = Vec::new();
        for (i, &r) in residuals.iter().enumerate() {
            if r <= config.tol {
                continue;
            }
            let h = x[i + 1] - x[i];
            if r > 100.0 * config.tol {
                inserted.push(x[i] + h / 3.0);
                inserted.push(x[i] + 2.0 * h / 3.0);
            } else {
                inserted.push(x[i] + 0.5 * h);
            }
        }

        if mesh.len() + inserted.len() > config.max_nodes {
            warn!(
                nodes = mesh.len(),
                requested = inserted.len(),
                max_nodes = config.max_nodes,
                "mesh refinement limit reached"
            );
            return Ok(finish(
                mesh,
                y,
                f,
                BvpStatus::MaxNodesExceeded,
                iterations,
                max_residual,
            ));
        }

        let finer = mesh.with_nodes(&inserted)?;
        info!(from = mesh.len(), to = finer.len(), max_residual, "refining mesh");
        y = interpolate(&mesh, &y, &f, finer.nodes());
        mesh = finer;
    }
}

fn validate<S: PeriodicSystem>(
    system: &S,
    mesh: &Mesh,
    guess: &DMatrix<f64>,
    config: &BvpConfig,
) -> Result<(), SolverError> {
    if guess.nrows() != system.dim() || guess.ncols() != mesh.len() {
        return Err(SolverError::ProblemSetup {
            what: format!(
                "guess is {}×{}, expected {}×{}",
                guess.nrows(),
                guess.ncols(),
                system.dim(),
                mesh.len()
            ),
        });
    }
    ensure_positive(config.tol, "bvp tolerance")?;
    if mesh.len() > config.max_nodes {
        return Err(SolverError::ProblemSetup {
            what: format!(
                "initial mesh has {} nodes, limit is {}",
                mesh.len(),
                config.max_nodes
            ),
        });
    }
    if system.scale().iter().any(|s| !(*s > 0.0) || !s.is_finite()) {
        return Err(SolverError::ProblemSetup {
            what: "component scales must be positive and finite".to_string(),
        });
    }
    Ok(())
}

fn finish(
    mesh: Mesh,
    y: DMatrix<f64>,
    yp: DMatrix<f64>,
    status: BvpStatus,
    iterations: usize,
    max_residual: f64,
) -> BvpSolution {
    BvpSolution {
        x: mesh.nodes().to_vec(),
        y,
        yp,
        status,
        message: status.message().to_string(),
        iterations,
        max_residual,
    }
}
