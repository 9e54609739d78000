// pc-core/src/units.rs

use uom::si::f64::{Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature};

// Public canonical unit types (SI, f64)
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

pub mod constants {
    /// Molar gas constant [J/(mol·K)].
    pub const R_UNIVERSAL: f64 = 8.314_462_618;

    /// Standard ambient temperature used by the lumped wall model [K].
    pub const T_AMBIENT_K: f64 = 298.15;
}

#[cfg(test)]
mod tests {
    use super::*;
    use uom::si::pressure::kilopascal;

    #[test]
    fn constructors_store_si_values() {
        assert_eq!(pa(3.0e5).value, 3.0e5);
        assert_eq!(k(282.65).value, 282.65);
    }

    #[test]
    fn pressure_converts_to_kilopascal() {
        assert!((pa(3.0e5).get::<kilopascal>() - 300.0).abs() < 1e-12);
    }
}
