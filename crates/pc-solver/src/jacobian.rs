//! Finite difference Jacobians.

use crate::system::{EvalKind, PeriodicSystem};
use nalgebra::{DMatrix, DVector};

/// Relative step for forward differences, about sqrt(machine epsilon).
pub const FD_EPSILON: f64 = 1.5e-8;

/// Compute Jacobian using forward finite differences.
///
/// For each column j, perturbs x[j] by `epsilon·max(|x_j|, scale_j)` and
/// computes (f(x+e) - f(x))/e.
pub fn finite_difference_jacobian<F>(
    x: &DVector<f64>,
    f: F,
    scale: &DVector<f64>,
    epsilon: f64,
) -> DMatrix<f64>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let n = x.len();
    let f_x = f(x);
    let m = f_x.len();

    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let mut x_perturbed = x.clone();
        let dx = epsilon * x[j].abs().max(scale[j]);
        x_perturbed[j] += dx;

        let df = (f(&x_perturbed) - &f_x) / dx;
        jac.set_column(j, &df);
    }

    jac
}

/// Per-node Jacobian blocks `∂f(x_i, y_i)/∂y_i` of a pointwise system.
///
/// Since column `i` of the right-hand side depends only on column `i` of the
/// state, one component can be perturbed at every node in the same pass, so
/// the whole set of blocks costs `dim` probe evaluations.
pub fn block_jacobians<S: PeriodicSystem>(
    system: &mut S,
    x: &[f64],
    y: &DMatrix<f64>,
    f0: &DMatrix<f64>,
    scale: &DVector<f64>,
) -> Result<Vec<DMatrix<f64>>, S::Error> {
    let d = y.nrows();
    let n = y.ncols();
    let mut blocks = vec![DMatrix::zeros(d, d); n];

    for c in 0..d {
        let mut y_perturbed = y.clone();
        let mut steps = vec![0.0; n];
        for (i, step) in steps.iter_mut().enumerate() {
            let dy = FD_EPSILON * y[(c, i)].abs().max(scale[c]);
            y_perturbed[(c, i)] += dy;
            *step = dy;
        }

        let f_perturbed = system.rhs(x, &y_perturbed, EvalKind::Probe)?;
        for (i, block) in blocks.iter_mut().enumerate() {
            for r in 0..d {
                block[(r, c)] = (f_perturbed[(r, i)] - f0[(r, i)]) / steps[i];
            }
        }
    }

    Ok(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;

    #[test]
    fn jacobian_linear() {
        // f(x) = 2*x, J = 2
        let f = |x: &DVector<f64>| DVector::from_element(1, 2.0 * x[0]);

        let x = DVector::from_element(1, 3.0);
        let jac = finite_difference_jacobian(&x, f, &DVector::from_element(1, 1.0), 1e-7);

        assert!((jac[(0, 0)] - 2.0).abs() < 1e-5);
    }

    #[test]
    fn jacobian_quadratic() {
        // f(x) = x^2, J = 2*x
        let f = |x: &DVector<f64>| DVector::from_element(1, x[0] * x[0]);

        let x = DVector::from_element(1, 3.0);
        let jac = finite_difference_jacobian(&x, f, &DVector::from_element(1, 1.0), 1e-7);

        assert!((jac[(0, 0)] - 6.0).abs() < 1e-5);
    }

    /// y0' = x·y1, y1' = y0²
    struct Coupled;

    impl PeriodicSystem for Coupled {
        type Error = SolverError;

        fn dim(&self) -> usize {
            2
        }

        fn rhs(
            &mut self,
            x: &[f64],
            y: &DMatrix<f64>,
            _kind: EvalKind,
        ) -> Result<DMatrix<f64>, SolverError> {
            Ok(DMatrix::from_fn(2, x.len(), |r, i| match r {
                0 => x[i] * y[(1, i)],
                _ => y[(0, i)] * y[(0, i)],
            }))
        }
    }

    #[test]
    fn blocks_match_analytic() {
        let mut system = Coupled;
        let x = [0.5, 2.0];
        let y = DMatrix::from_column_slice(2, 2, &[1.0, 4.0, -3.0, 0.5]);
        let f0 = system.rhs(&x, &y, EvalKind::Probe).unwrap();
        let scale = DVector::from_element(2, 1.0);
        let blocks = block_jacobians(&mut system, &x, &y, &f0, &scale).unwrap();

        assert!((blocks[0][(0, 1)] - 0.5).abs() < 1e-5);
        assert!((blocks[0][(1, 0)] - 2.0).abs() < 1e-5);
        assert!(blocks[0][(0, 0)].abs() < 1e-5);
        assert!((blocks[1][(0, 1)] - 2.0).abs() < 1e-5);
        assert!((blocks[1][(1, 0)] + 6.0).abs() < 1e-5);
    }
}
