//! Slider-crank kinematics.
//!
//! Crank angle θ = 0 is bottom dead centre (largest volume) and θ = π is top
//! dead centre. Piston position is measured from the cylinder head and
//! includes the clearance gap, so the cylinder volume is `head_area · position`.

use crate::error::{CycleError, CycleResult};
use std::f64::consts::PI;

/// Cylinder and crank geometry, all lengths in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrankGeometry {
    bore: f64,
    stroke: f64,
    /// Connecting rod length over crank radius
    rod_ratio: f64,
    /// Clearance gap as a fraction of the stroke
    clearance: f64,
}

/// Kinematic quantities at one crank angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KinematicPoint {
    /// Distance from head to piston [m]
    pub position: f64,
    /// Cylinder volume [m³]
    pub volume: f64,
    /// Heat-transfer surface: liner up to the piston plus head and piston crown [m²]
    pub surface: f64,
    /// Piston velocity [m/s]
    pub dx_dt: f64,
    /// Volume rate [m³/s]
    pub dv_dt: f64,
}

impl CrankGeometry {
    pub fn new(bore: f64, stroke: f64, rod_ratio: f64, clearance: f64) -> CycleResult<Self> {
        if !(bore.is_finite() && bore > 0.0) {
            return Err(CycleError::InvalidArg {
                what: "bore must be positive",
            });
        }
        if !(stroke.is_finite() && stroke > 0.0) {
            return Err(CycleError::InvalidArg {
                what: "stroke must be positive",
            });
        }
        if !(rod_ratio.is_finite() && rod_ratio > 1.0) {
            return Err(CycleError::InvalidArg {
                what: "rod ratio must exceed 1",
            });
        }
        if !(clearance.is_finite() && clearance > 0.0) {
            return Err(CycleError::InvalidArg {
                what: "clearance fraction must be positive",
            });
        }
        Ok(Self {
            bore,
            stroke,
            rod_ratio,
            clearance,
        })
    }

    pub fn bore(&self) -> f64 {
        self.bore
    }

    pub fn stroke(&self) -> f64 {
        self.stroke
    }

    pub fn head_area(&self) -> f64 {
        PI / 4.0 * self.bore * self.bore
    }

    /// Piston position [m].
    pub fn position(&self, theta: f64) -> f64 {
        let h = self.stroke;
        let l = self.rod_ratio;
        let s = theta.sin() / l;
        -(h / 2.0 * (1.0 - theta.cos() + l * (1.0 - (1.0 - s * s).sqrt()))) + self.clearance * h + h
    }

    /// Exact derivative of [`position`](Self::position) with respect to θ [m/rad].
    pub fn dx_dtheta(&self, theta: f64) -> f64 {
        let l = self.rod_ratio;
        let s = theta.sin() / l;
        -self.stroke / 2.0 * theta.sin() * (1.0 + theta.cos() / (l * (1.0 - s * s).sqrt()))
    }

    pub fn volume(&self, theta: f64) -> f64 {
        self.head_area() * self.position(theta)
    }

    pub fn surface(&self, theta: f64) -> f64 {
        PI * self.bore * self.position(theta) + 2.0 * self.head_area()
    }

    /// Volume at bottom dead centre [m³].
    pub fn max_volume(&self) -> f64 {
        self.volume(0.0)
    }

    /// Volume at top dead centre [m³].
    pub fn min_volume(&self) -> f64 {
        self.volume(PI)
    }

    /// Everything at angle `theta` for angular speed `omega` [rad/s].
    pub fn at(&self, theta: f64, omega: f64) -> KinematicPoint {
        let position = self.position(theta);
        let dx_dt = self.dx_dtheta(theta) * omega;
        KinematicPoint {
            position,
            volume: self.head_area() * position,
            surface: PI * self.bore * position + 2.0 * self.head_area(),
            dx_dt,
            dv_dt: self.head_area() * dx_dt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> CrankGeometry {
        CrankGeometry::new(0.034, 0.034, 2.0, 0.04).unwrap()
    }

    #[test]
    fn dead_centres() {
        let g = reference();
        // BDC: full stroke plus clearance; TDC: clearance only
        assert!((g.position(0.0) - 1.04 * 0.034).abs() < 1e-15);
        assert!((g.position(PI) - 0.04 * 0.034).abs() < 1e-15);
        assert!((g.position(2.0 * PI) - g.position(0.0)).abs() < 1e-15);
        assert!(g.max_volume() > g.min_volume());
    }

    #[test]
    fn volume_rate_changes_sign_at_dead_centres() {
        let g = reference();
        let omega = 2.0 * PI * 25.0;
        let eps = 1e-3;
        assert!(g.at(eps, omega).dv_dt < 0.0);
        assert!(g.at(PI - eps, omega).dv_dt < 0.0);
        assert!(g.at(PI + eps, omega).dv_dt > 0.0);
        assert!(g.at(2.0 * PI - eps, omega).dv_dt > 0.0);
        assert!(g.at(0.0, omega).dv_dt.abs() < 1e-12);
        assert!(g.at(PI, omega).dv_dt.abs() < 1e-12);
    }

    #[test]
    fn derivative_matches_central_difference() {
        let g = reference();
        for i in 0..20 {
            let theta = 0.1 + i as f64 * 0.3;
            let d = 1e-6;
            let fd = (g.position(theta + d) - g.position(theta - d)) / (2.0 * d);
            assert!((g.dx_dtheta(theta) - fd).abs() < 1e-8, "theta = {theta}");
        }
    }

    #[test]
    fn surface_includes_head_and_crown() {
        let g = reference();
        let expected = PI * 0.034 * g.position(PI) + 2.0 * g.head_area();
        assert!((g.surface(PI) - expected).abs() < 1e-15);
    }

    #[test]
    fn rejects_short_rod() {
        assert!(CrankGeometry::new(0.034, 0.034, 1.0, 0.04).is_err());
        assert!(CrankGeometry::new(0.034, 0.034, 2.0, 0.0).is_err());
    }
}
