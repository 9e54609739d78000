//! Discharge valve area carried between passes over the mesh.
//!
//! The effective discharge area depends on the mean mass flux through the
//! valve, which in turn depends on the trajectory being solved for. The area
//! is held fixed while a pass over the mesh is evaluated and is only
//! recomputed from a complete ascending pass's push-out nodes.

use crate::valve::{outlet_area_from_flux, outlet_seed_area};
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub struct ValveCorrection {
    bore: f64,
    /// Area applied to the next pass [m²]
    area: f64,
    commits: usize,
}

impl ValveCorrection {
    /// Start from the empirical seed area for `bore`.
    pub fn new(bore: f64) -> Self {
        let seed = outlet_seed_area(bore);
        Self {
            bore,
            area: seed,
            commits: 0,
        }
    }

    /// Area for the next pass [m²].
    pub fn area(&self) -> f64 {
        self.area
    }

    /// Number of times the area has been recomputed.
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Area implied by a finished pass, `None` without push-out nodes.
    ///
    /// `theta` holds the ascending pass abscissae and `push_out` the discharge
    /// mass flow [kg/s] at each node, `None` where the discharge valve was
    /// closed. The mean flux weights each node by half its adjacent intervals.
    pub fn target(&self, theta: &[f64], push_out: &[Option<f64>]) -> Option<f64> {
        let n = theta.len();
        if n < 2 {
            return None;
        }

        let mut weighted_flow = 0.0;
        let mut weight_sum = 0.0;
        for (i, mdot) in push_out.iter().enumerate() {
            let Some(mdot) = mdot else { continue };
            let left = if i > 0 { theta[i] - theta[i - 1] } else { 0.0 };
            let right = if i + 1 < n { theta[i + 1] - theta[i] } else { 0.0 };
            let w = 0.5 * (left + right);
            weighted_flow += mdot * w;
            weight_sum += w;
        }

        if weight_sum <= 0.0 || weighted_flow <= 0.0 {
            return None;
        }

        let flux = weighted_flow / (weight_sum * self.area);
        let updated = outlet_area_from_flux(self.bore, flux);
        (updated.is_finite() && updated > 0.0).then_some(updated)
    }

    /// Replace the area for later passes.
    pub fn set_area(&mut self, area: f64) {
        trace!(from = self.area, to = area, "discharge area committed");
        self.area = area;
        self.commits += 1;
    }

    /// Recompute the area from a finished pass. Without push-out nodes the
    /// area is kept. Returns the relative change.
    pub fn commit(&mut self, theta: &[f64], push_out: &[Option<f64>]) -> f64 {
        match self.target(theta, push_out) {
            Some(updated) => {
                let change = (updated - self.area).abs() / self.area;
                self.set_area(updated);
                change
            }
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_seed() {
        let c = ValveCorrection::new(0.034);
        assert!((c.area() - 1.5e-5).abs() < 1e-20);
        assert_eq!(c.commits(), 0);
    }

    #[test]
    fn no_push_out_keeps_area() {
        let mut c = ValveCorrection::new(0.034);
        assert_eq!(c.commit(&[0.0, 1.0, 2.0], &[None, None, None]), 0.0);
        assert_eq!(c.area(), outlet_seed_area(0.034));
        assert_eq!(c.commits(), 0);
    }

    #[test]
    fn commit_uses_weighted_mean_flux() {
        let mut c = ValveCorrection::new(0.034);
        let seed = c.area();
        // uniform flow of 0.015 kg/s over interior nodes
        let theta = [0.0, 1.0, 2.0, 3.0];
        let push_out = [None, Some(0.015), Some(0.015), None];
        let expected = outlet_area_from_flux(0.034, 0.015 / seed);
        assert_eq!(c.target(&theta, &push_out), Some(expected));
        assert_eq!(c.commits(), 0);

        let change = c.commit(&theta, &push_out);
        assert!((c.area() - expected).abs() < 1e-18);
        assert!((change - (expected - seed).abs() / seed).abs() < 1e-12);
        assert_eq!(c.commits(), 1);
    }

    #[test]
    fn flow_proportional_to_area_is_a_fixed_point() {
        let mut c = ValveCorrection::new(0.034);
        let mut changes = Vec::new();
        for _ in 0..3 {
            let mdot = 1500.0 * c.area();
            changes.push(c.commit(&[0.0, 1.0, 2.0], &[Some(mdot), Some(mdot), Some(mdot)]));
        }
        let expected = outlet_area_from_flux(0.034, 1500.0);
        assert!((c.area() - expected).abs() / expected < 1e-12);
        assert_eq!(c.commits(), 3);
        assert!(changes[0] > 0.0);
        assert!(changes[2] < 1e-12);
    }
}
