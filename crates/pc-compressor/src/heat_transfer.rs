//! Gas-to-wall heat transfer (Woschni-type correlation).

/// Fitted leading constant of the correlation.
pub const WOSCHNI_C1: f64 = 127.93;

/// Heat-transfer coefficient [W/(m²·K)].
///
/// `p_kpa` and `t_k` must be positive; `factor` is the regime velocity factor
/// from [`Regime::woschni_factor`](crate::valve::Regime::woschni_factor).
pub fn woschni_coefficient(bore: f64, p_kpa: f64, t_k: f64, factor: f64, dx_dt: f64) -> f64 {
    WOSCHNI_C1
        * bore.powf(-0.2)
        * (p_kpa * 1e-2).powf(0.8)
        * t_k.powf(-0.55)
        * (factor * dx_dt.abs()).powf(0.8)
}

/// Heat flow from wall into gas [kW].
pub fn wall_heat_rate(alpha: f64, surface: f64, t_wall: f64, t_gas: f64) -> f64 {
    alpha * surface * (t_wall - t_gas) * 1e-3
}
