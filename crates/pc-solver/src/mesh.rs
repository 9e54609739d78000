//! Collocation mesh, cubic Hermite interpolation and node insertion.

use crate::error::{SolverError, SolverResult};
use nalgebra::{DMatrix, DVector};
use pc_core::numeric::linspace;

/// Strictly increasing abscissae over `[a, b]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    x: Vec<f64>,
}

impl Mesh {
    /// `n` evenly spaced nodes over `[a, b]`, both ends included.
    pub fn uniform(a: f64, b: f64, n: usize) -> SolverResult<Self> {
        if n < 2 {
            return Err(SolverError::InvalidMesh {
                what: format!("need at least 2 nodes, got {n}"),
            });
        }
        Self::from_nodes(linspace(a, b, n))
    }

    /// Wrap existing nodes after checking they are finite and strictly increasing.
    pub fn from_nodes(x: Vec<f64>) -> SolverResult<Self> {
        if x.len() < 2 {
            return Err(SolverError::InvalidMesh {
                what: format!("need at least 2 nodes, got {}", x.len()),
            });
        }
        if x.iter().any(|v| !v.is_finite()) {
            return Err(SolverError::InvalidMesh {
                what: "non-finite node".to_string(),
            });
        }
        if let Some(i) = x.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SolverError::InvalidMesh {
                what: format!("nodes not strictly increasing at index {}", i + 1),
            });
        }
        Ok(Self { x })
    }

    /// Same mesh with `extra` inserted. `extra` need not be sorted.
    pub fn with_nodes(&self, extra: &[f64]) -> SolverResult<Self> {
        let mut x = self.x.clone();
        x.extend_from_slice(extra);
        x.sort_by(f64::total_cmp);
        Self::from_nodes(x)
    }

    pub fn nodes(&self) -> &[f64] {
        &self.x
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn start(&self) -> f64 {
        self.x[0]
    }

    pub fn end(&self) -> f64 {
        self.x[self.x.len() - 1]
    }

    /// Interval widths `h_i = x_{i+1} - x_i`.
    pub fn steps(&self) -> Vec<f64> {
        self.x.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Index `i` of the interval `[x_i, x_{i+1}]` containing `t` (clamped to the ends).
    pub fn interval_of(&self, t: f64) -> usize {
        let last = self.x.len() - 2;
        match self.x.partition_point(|&xi| xi <= t) {
            0 => 0,
            p => (p - 1).min(last),
        }
    }
}

/// Cubic Hermite interpolant on one interval, evaluated at fraction `s` in [0, 1].
///
/// Returns the value and the derivative with respect to x.
pub fn hermite(
    y0: &DVector<f64>,
    y1: &DVector<f64>,
    f0: &DVector<f64>,
    f1: &DVector<f64>,
    h: f64,
    s: f64,
) -> (DVector<f64>, DVector<f64>) {
    let s2 = s * s;
    let s3 = s2 * s;
    let h00 = 2.0 * s3 - 3.0 * s2 + 1.0;
    let h10 = s3 - 2.0 * s2 + s;
    let h01 = -2.0 * s3 + 3.0 * s2;
    let h11 = s3 - s2;
    let value = y0 * h00 + f0 * (h * h10) + y1 * h01 + f1 * (h * h11);

    let d00 = 6.0 * s2 - 6.0 * s;
    let d10 = 3.0 * s2 - 4.0 * s + 1.0;
    let d11 = 3.0 * s2 - 2.0 * s;
    let slope = (y1 - y0) * (-d00 / h) + f0 * d10 + f1 * d11;

    (value, slope)
}

/// Interpolate a trajectory known at `mesh` onto `target` nodes.
pub fn interpolate(
    mesh: &Mesh,
    y: &DMatrix<f64>,
    f: &DMatrix<f64>,
    target: &[f64],
) -> DMatrix<f64> {
    let x = mesh.nodes();
    let mut out = DMatrix::zeros(y.nrows(), target.len());
    for (j, &t) in target.iter().enumerate() {
        let i = mesh.interval_of(t);
        let h = x[i + 1] - x[i];
        let s = (t - x[i]) / h;
        let (value, _) = hermite(
            &y.column(i).into_owned(),
            &y.column(i + 1).into_owned(),
            &f.column(i).into_owned(),
            &f.column(i + 1).into_owned(),
            h,
            s,
        );
        out.set_column(j, &value);
    }
    out
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn interval_of_brackets_point(n in 2usize..200, frac in 0.0f64..=1.0) {
            let mesh = Mesh::uniform(-1.0, 3.0, n).unwrap();
            let t = -1.0 + 4.0 * frac;
            let i = mesh.interval_of(t);
            let x = mesh.nodes();
            prop_assert!(x[i] <= t && t <= x[i + 1]);
        }
    }
}
