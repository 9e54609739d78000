//! Problem definition traits for periodic boundary-value solves.

use crate::error::SolverError;
use crate::jacobian::{FD_EPSILON, finite_difference_jacobian};
use nalgebra::{DMatrix, DVector};

/// Purpose of a right-hand-side evaluation.
///
/// `Residual` passes evaluate the whole trajectory in ascending order at an
/// accepted iterate. Systems that carry state between passes may update it
/// after such a pass. `Probe` passes (Jacobian columns, line-search trials,
/// midpoint checks, warm-start stages) must leave that state untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalKind {
    Residual,
    Probe,
}

/// First-order ODE system `y' = f(x, y)` evaluated over a whole mesh at once.
pub trait PeriodicSystem {
    type Error: From<SolverError> + std::fmt::Display;

    /// Number of state components.
    fn dim(&self) -> usize;

    /// Typical magnitude of each component.
    ///
    /// Used to scale residuals and finite-difference steps.
    fn scale(&self) -> DVector<f64> {
        DVector::from_element(self.dim(), 1.0)
    }

    /// Evaluate `f` at every column of `y` (dim × N) for the abscissae `x`.
    ///
    /// `x` is ascending. Column `i` of the result may depend only on `x[i]`,
    /// column `i` of `y` and state frozen for the duration of the pass.
    fn rhs(
        &mut self,
        x: &[f64],
        y: &DMatrix<f64>,
        kind: EvalKind,
    ) -> Result<DMatrix<f64>, Self::Error>;
}

/// Two-point boundary condition `g(y(a), y(b)) = 0`.
pub trait BoundaryCondition {
    fn residual(&self, ya: &DVector<f64>, yb: &DVector<f64>) -> DVector<f64>;

    /// `(∂g/∂ya, ∂g/∂yb)`, by forward differences unless overridden.
    fn jacobians(
        &self,
        ya: &DVector<f64>,
        yb: &DVector<f64>,
        scale: &DVector<f64>,
    ) -> (DMatrix<f64>, DMatrix<f64>) {
        let ga = finite_difference_jacobian(ya, |v| self.residual(v, yb), scale, FD_EPSILON);
        let gb = finite_difference_jacobian(yb, |v| self.residual(ya, v), scale, FD_EPSILON);
        (ga, gb)
    }
}
