//! Trapezoidal collocation residual and its condensed Newton step.
//!
//! Unknowns are the states at every mesh node, stacked column by column. The
//! residual holds one block per interval,
//! `R_i = y_{i+1} - y_i - h_i/2·(f_i + f_{i+1})`, followed by the boundary
//! block `g(y_0, y_{N-1})`.
//!
//! The Jacobian of that system is block bidiagonal plus one boundary row, so a
//! Newton step is found by eliminating the interval blocks one after another
//! and solving a single `dim × dim` system for the first node.

use crate::jacobian::block_jacobians;
use crate::mesh::{Mesh, hermite};
use crate::newton::NewtonProblem;
use crate::system::{BoundaryCondition, EvalKind, PeriodicSystem};
use nalgebra::{DMatrix, DVector};

pub(crate) struct Collocation<'a, S: PeriodicSystem, B: BoundaryCondition> {
    system: &'a mut S,
    bc: &'a B,
    x: Vec<f64>,
    h: Vec<f64>,
    scale: DVector<f64>,
    /// State and derivative at the last accepted iterate.
    accepted: Option<(DMatrix<f64>, DMatrix<f64>)>,
}

impl<'a, S: PeriodicSystem, B: BoundaryCondition> Collocation<'a, S, B> {
    pub(crate) fn new(system: &'a mut S, bc: &'a B, mesh: &Mesh) -> Self {
        let scale = system.scale();
        Self {
            system,
            bc,
            x: mesh.nodes().to_vec(),
            h: mesh.steps(),
            scale,
            accepted: None,
        }
    }

    fn dim(&self) -> usize {
        self.scale.len()
    }

    pub(crate) fn pack(y: &DMatrix<f64>) -> DVector<f64> {
        DVector::from_column_slice(y.as_slice())
    }

    fn unpack(&self, v: &DVector<f64>) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.dim(), self.x.len(), v.as_slice())
    }

    /// Derivative at the last accepted iterate.
    pub(crate) fn accepted_derivative(&self) -> Option<&DMatrix<f64>> {
        self.accepted.as_ref().map(|(_, f)| f)
    }

    fn boundary(&self, y: &DMatrix<f64>) -> (DVector<f64>, DVector<f64>) {
        let n = y.ncols();
        (y.column(0).into_owned(), y.column(n - 1).into_owned())
    }

    /// Unscaled interval residual `R_i`.
    fn interval_residual(&self, y: &DMatrix<f64>, f: &DMatrix<f64>, i: usize) -> DVector<f64> {
        let half = 0.5 * self.h[i];
        let slope_sum = &f.column(i) + &f.column(i + 1);
        &y.column(i + 1) - &y.column(i) - slope_sum * half
    }

    /// Scaled residual vector: interval blocks relative to `h·(scale + |f̄|)`,
    /// boundary block relative to `scale`.
    fn scaled_residual(&self, y: &DMatrix<f64>, f: &DMatrix<f64>) -> DVector<f64> {
        let d = self.dim();
        let n = self.x.len();
        let mut out = DVector::zeros(d * n);

        for i in 0..n - 1 {
            let r = self.interval_residual(y, f, i);
            for c in 0..d {
                let f_mean = 0.5 * (f[(c, i)] + f[(c, i + 1)]).abs();
                out[i * d + c] = r[c] / (self.h[i] * (self.scale[c] + f_mean));
            }
        }

        let (ya, yb) = self.boundary(y);
        let g = self.bc.residual(&ya, &yb);
        for c in 0..d {
            out[(n - 1) * d + c] = g[c] / self.scale[c];
        }

        out
    }

    fn evaluate(
        &mut self,
        v: &DVector<f64>,
        kind: EvalKind,
    ) -> Result<(DMatrix<f64>, DMatrix<f64>), S::Error> {
        let y = self.unpack(v);
        let f = self.system.rhs(&self.x, &y, kind)?;
        Ok((y, f))
    }

    /// Relative collocation residual at each interval midpoint.
    ///
    /// The solution is interpolated with the cubic Hermite polynomial built
    /// from node values and slopes; the mismatch between its slope and `f` at
    /// the midpoint is taken relative to `scale + |f|`.
    pub(crate) fn midpoint_residuals(
        &mut self,
        y: &DMatrix<f64>,
        f: &DMatrix<f64>,
    ) -> Result<Vec<f64>, S::Error> {
        let d = self.dim();
        let intervals = self.h.len();
        let mut x_mid = Vec::with_capacity(intervals);
        let mut y_mid = DMatrix::zeros(d, intervals);
        let mut yp_mid = DMatrix::zeros(d, intervals);

        for i in 0..intervals {
            let (value, slope) = hermite(
                &y.column(i).into_owned(),
                &y.column(i + 1).into_owned(),
                &f.column(i).into_owned(),
                &f.column(i + 1).into_owned(),
                self.h[i],
                0.5,
            );
            x_mid.push(self.x[i] + 0.5 * self.h[i]);
            y_mid.set_column(i, &value);
            yp_mid.set_column(i, &slope);
        }

        let f_mid = self.system.rhs(&x_mid, &y_mid, EvalKind::Probe)?;

        Ok((0..intervals)
            .map(|i| {
                (0..d)
                    .map(|c| {
                        (yp_mid[(c, i)] - f_mid[(c, i)]).abs()
                            / (self.scale[c] + f_mid[(c, i)].abs())
                    })
                    .fold(0.0, f64::max)
            })
            .collect())
    }
}

impl<S: PeriodicSystem, B: BoundaryCondition> NewtonProblem for Collocation<'_, S, B> {
    type Error = S::Error;

    fn accept(&mut self, v: &DVector<f64>) -> Result<DVector<f64>, S::Error> {
        let (y, f) = self.evaluate(v, EvalKind::Residual)?;
        let r = self.scaled_residual(&y, &f);
        self.accepted = Some((y, f));
        Ok(r)
    }

    fn trial(&mut self, v: &DVector<f64>) -> Result<DVector<f64>, S::Error> {
        let (y, f) = self.evaluate(v, EvalKind::Probe)?;
        Ok(self.scaled_residual(&y, &f))
    }

    fn direction(&mut self, v: &DVector<f64>) -> Result<Option<DVector<f64>>, S::Error> {
        let (y, f) = match self.accepted.take() {
            Some(pair) => pair,
            None => self.evaluate(v, EvalKind::Probe)?,
        };
        let d = self.dim();
        let n = self.x.len();
        let jac = block_jacobians(&mut *self.system, &self.x, &y, &f, &self.scale)?;

        // δ_{i+1} = M_i·δ_i + c_i, so δ_i = P_i·δ_0 + q_i
        let identity = DMatrix::<f64>::identity(d, d);
        let mut transfer = Vec::with_capacity(n - 1);
        let mut p = identity.clone();
        let mut q = DVector::zeros(d);
        for i in 0..n - 1 {
            let half = 0.5 * self.h[i];
            let a = -&identity - &jac[i] * half;
            let b = &identity - &jac[i + 1] * half;
            let r = self.interval_residual(&y, &f, i);

            let lu = b.lu();
            let (Some(m), Some(c)) = (lu.solve(&(-a)), lu.solve(&(-r))) else {
                self.accepted = Some((y, f));
                return Ok(None);
            };
            p = &m * p;
            q = &m * q + &c;
            transfer.push((m, c));
        }

        let (ya, yb) = self.boundary(&y);
        let g = self.bc.residual(&ya, &yb);
        let (ga, gb) = self.bc.jacobians(&ya, &yb, &self.scale);
        let lhs = ga + &gb * p;
        let rhs = -g - &gb * q;
        self.accepted = Some((y, f));

        let Some(delta0) = lhs.lu().solve(&rhs) else {
            return Ok(None);
        };

        let mut step = DVector::zeros(d * n);
        let mut delta = delta0;
        step.rows_mut(0, d).copy_from(&delta);
        for (i, (m, c)) in transfer.iter().enumerate() {
            delta = m * delta + c;
            step.rows_mut((i + 1) * d, d).copy_from(&delta);
        }

        if step.iter().any(|v| !v.is_finite()) {
            return Ok(None);
        }
        Ok(Some(step))
    }
}
