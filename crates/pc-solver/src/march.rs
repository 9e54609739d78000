//! Fixed-step marching used to warm-start a periodic solve.

use crate::error::SolverError;
use crate::mesh::Mesh;
use crate::system::{EvalKind, PeriodicSystem};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

/// Classical RK4 (Runge-Kutta 4th order) integrator.
#[derive(Clone, Debug)]
pub struct Rk4;

impl Rk4 {
    /// Advance `y` from `x` by `dx` with probe evaluations of `system`.
    pub fn step<S: PeriodicSystem>(
        &self,
        system: &mut S,
        x: f64,
        y: &DVector<f64>,
        dx: f64,
    ) -> Result<DVector<f64>, S::Error> {
        let k1 = eval_point(system, x, y)?;

        let y2 = y + &k1 * (0.5 * dx);
        let k2 = eval_point(system, x + 0.5 * dx, &y2)?;

        let y3 = y + &k2 * (0.5 * dx);
        let k3 = eval_point(system, x + 0.5 * dx, &y3)?;

        let y4 = y + &k3 * dx;
        let k4 = eval_point(system, x + dx, &y4)?;

        // y_new = y + (dx/6) * (k1 + 2*k2 + 2*k3 + k4)
        let k_sum = k1 + k2 * 2.0 + k3 * 2.0 + k4;
        Ok(y + k_sum * (dx / 6.0))
    }
}

fn eval_point<S: PeriodicSystem>(
    system: &mut S,
    x: f64,
    y: &DVector<f64>,
) -> Result<DVector<f64>, S::Error> {
    let column = DMatrix::from_column_slice(y.len(), 1, y.as_slice());
    let f = system.rhs(&[x], &column, EvalKind::Probe)?;
    Ok(f.column(0).into_owned())
}

/// March `periods` times across the mesh starting from `y_start`.
///
/// Each period is integrated with `substeps` RK4 steps per mesh interval and
/// then handed to the system as one ascending `Residual` pass. The next period
/// starts from the end state of the previous one. Returns the trajectory of the
/// last period on the mesh nodes.
pub fn march_periods<S: PeriodicSystem>(
    system: &mut S,
    mesh: &Mesh,
    y_start: &DVector<f64>,
    periods: usize,
    substeps: usize,
) -> Result<DMatrix<f64>, S::Error> {
    let x = mesh.nodes();
    let substeps = substeps.max(1);
    let rk4 = Rk4;
    let mut trajectory = DMatrix::zeros(y_start.len(), x.len());
    let mut y = y_start.clone();

    for period in 0..periods {
        trajectory.set_column(0, &y);
        for i in 0..x.len() - 1 {
            let dx = (x[i + 1] - x[i]) / substeps as f64;
            for k in 0..substeps {
                y = rk4.step(system, x[i] + k as f64 * dx, &y, dx)?;
            }
            if y.iter().any(|v| !v.is_finite()) {
                return Err(SolverError::Numeric {
                    what: format!("non-finite state while marching at x={}", x[i + 1]),
                }
                .into());
            }
            trajectory.set_column(i + 1, &y);
        }
        system.rhs(x, &trajectory, EvalKind::Residual)?;
        debug!(
            period,
            drift = (&y - &trajectory.column(0)).amax(),
            "warm-start period"
        );
    }

    Ok(trajectory)
}
