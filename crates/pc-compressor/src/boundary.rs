//! Periodicity condition for the cycle.

use nalgebra::{DMatrix, DVector};
use pc_solver::BoundaryCondition;

/// `y(2π) - y(0) = 0` for every state component.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodicBoundaryCondition;

impl BoundaryCondition for PeriodicBoundaryCondition {
    fn residual(&self, ya: &DVector<f64>, yb: &DVector<f64>) -> DVector<f64> {
        yb - ya
    }

    fn jacobians(
        &self,
        ya: &DVector<f64>,
        _yb: &DVector<f64>,
        _scale: &DVector<f64>,
    ) -> (DMatrix<f64>, DMatrix<f64>) {
        let n = ya.len();
        (-DMatrix::identity(n, n), DMatrix::identity(n, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn residual_is_end_minus_start() {
        let bc = PeriodicBoundaryCondition;
        let ya = DVector::from_column_slice(&[1.0, 2.0, 3.0]);
        let yb = DVector::from_column_slice(&[1.5, 2.0, 2.0]);
        assert_eq!(bc.residual(&ya, &yb).as_slice(), &[0.5, 0.0, -1.0]);
    }

    #[test]
    fn jacobians_are_signed_identities() {
        let bc = PeriodicBoundaryCondition;
        let y = DVector::from_element(3, 1.0);
        let (ga, gb) = bc.jacobians(&y, &y, &y);
        assert_eq!(ga, -DMatrix::<f64>::identity(3, 3));
        assert_eq!(gb, DMatrix::<f64>::identity(3, 3));
    }
}
