//! Damped Newton iteration with backtracking line search.

use nalgebra::DVector;
use tracing::{debug, warn};

/// Newton solver configuration.
#[derive(Debug, Clone)]
pub struct NewtonConfig {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Tolerance on the largest scaled residual component
    pub abs_tol: f64,
    /// Line search backtracking factor
    pub line_search_beta: f64,
    /// Maximum line search iterations
    pub max_line_search_iters: usize,
    /// Step length below which the iteration is declared stagnant
    pub min_step: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            abs_tol: 1e-6,
            line_search_beta: 0.5,
            max_line_search_iters: 20,
            min_step: 1e-10,
        }
    }
}

/// How a Newton iteration ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewtonOutcome {
    Converged,
    MaxIterations,
    Stagnated,
    SingularJacobian,
}

/// Newton iteration result.
#[derive(Debug, Clone)]
pub struct NewtonResult {
    /// Solution vector
    pub x: DVector<f64>,
    /// Largest scaled residual component at `x`
    pub residual_max: f64,
    /// Number of iterations
    pub iterations: usize,
    pub outcome: NewtonOutcome,
}

impl NewtonResult {
    pub fn converged(&self) -> bool {
        self.outcome == NewtonOutcome::Converged
    }
}

/// Nonlinear system `r(x) = 0` as seen by [`newton_solve`].
///
/// Residuals are returned already scaled so that convergence is a bound on
/// their largest component.
pub trait NewtonProblem {
    type Error;

    /// Residual at an accepted iterate. May update state carried between iterates.
    fn accept(&mut self, x: &DVector<f64>) -> Result<DVector<f64>, Self::Error>;

    /// Residual at a trial point. Must not update carried state.
    fn trial(&mut self, x: &DVector<f64>) -> Result<DVector<f64>, Self::Error>;

    /// Newton direction at the last accepted iterate, `None` if the linear system is singular.
    fn direction(&mut self, x: &DVector<f64>) -> Result<Option<DVector<f64>>, Self::Error>;
}

/// Newton solver with line search.
///
/// Running out of iterations, stagnating or meeting a singular Jacobian is
/// reported through [`NewtonOutcome`]; only problem errors are returned as `Err`.
pub fn newton_solve<P: NewtonProblem>(
    problem: &mut P,
    x0: DVector<f64>,
    config: &NewtonConfig,
) -> Result<NewtonResult, P::Error> {
    let mut x = x0;
    let mut r = problem.accept(&x)?;
    let mut r_norm = r.norm();

    for iter in 0..config.max_iterations {
        let r_max = r.amax();
        debug!(iteration = iter, residual_max = r_max, "newton iteration");

        // Check convergence
        if r_max <= config.abs_tol {
            return Ok(NewtonResult {
                x,
                residual_max: r_max,
                iterations: iter,
                outcome: NewtonOutcome::Converged,
            });
        }

        let Some(dx) = problem.direction(&x)? else {
            warn!(iteration = iter, "singular Newton system");
            return Ok(NewtonResult {
                x,
                residual_max: r_max,
                iterations: iter,
                outcome: NewtonOutcome::SingularJacobian,
            });
        };

        // Backtracking line search on the residual 2-norm
        let mut alpha = 1.0;
        let mut x_new = &x + &dx * alpha;
        let mut r_new_norm = problem.trial(&x_new)?.norm();

        for _ in 0..config.max_line_search_iters {
            if r_new_norm.is_finite() && r_new_norm < r_norm {
                break;
            }
            alpha *= config.line_search_beta;
            x_new = &x + &dx * alpha;
            r_new_norm = problem.trial(&x_new)?.norm();
        }

        if alpha < config.min_step || !r_new_norm.is_finite() {
            warn!(iteration = iter, alpha, "line search stagnated");
            return Ok(NewtonResult {
                x,
                residual_max: r_max,
                iterations: iter,
                outcome: NewtonOutcome::Stagnated,
            });
        }

        // Update solution
        x = x_new;
        r = problem.accept(&x)?;
        r_norm = r.norm();
    }

    Ok(NewtonResult {
        residual_max: r.amax(),
        x,
        iterations: config.max_iterations,
        outcome: NewtonOutcome::MaxIterations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// x^2 - 4 = 0
    struct Quadratic {
        accepted: usize,
    }

    impl NewtonProblem for Quadratic {
        type Error = ();

        fn accept(&mut self, x: &DVector<f64>) -> Result<DVector<f64>, ()> {
            self.accepted += 1;
            self.trial(x)
        }

        fn trial(&mut self, x: &DVector<f64>) -> Result<DVector<f64>, ()> {
            Ok(DVector::from_element(1, x[0] * x[0] - 4.0))
        }

        fn direction(&mut self, x: &DVector<f64>) -> Result<Option<DVector<f64>>, ()> {
            if x[0] == 0.0 {
                return Ok(None);
            }
            let r = x[0] * x[0] - 4.0;
            Ok(Some(DVector::from_element(1, -r / (2.0 * x[0]))))
        }
    }

    #[test]
    fn simple_quadratic() {
        let mut problem = Quadratic { accepted: 0 };
        let x0 = DVector::from_element(1, 3.0);
        let result = newton_solve(&mut problem, x0, &NewtonConfig::default()).unwrap();

        assert!(result.converged());
        assert!((result.x[0] - 2.0).abs() < 1e-6);
        // one accept per iterate, including the start
        assert_eq!(problem.accepted, result.iterations + 1);
    }

    #[test]
    fn singular_start_is_reported() {
        let mut problem = Quadratic { accepted: 0 };
        let x0 = DVector::from_element(1, 0.0);
        let result = newton_solve(&mut problem, x0, &NewtonConfig::default()).unwrap();
        assert_eq!(result.outcome, NewtonOutcome::SingularJacobian);
    }
}
