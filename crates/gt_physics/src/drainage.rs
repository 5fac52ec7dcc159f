// crates/gt_physics/src/drainage.rs

//! 超限液态水排出
//!
//! 层内含水量超过 ω_max 时，超出部分乘层厚作为排出水厚度，焓重置为
//! ω_max 对应的值。排出水携带的能量不计入，属于已知的能量损失。

use crate::enthalpy::EnthalpyConverter;

/// 排出单层的超限液态水
///
/// - `thickness`: 冰厚 H
/// - `z`: 层高度，压力取 `p(H - z)`
/// - `dz`: 层厚
///
/// 返回 `(新焓, 排出水厚度)`，后者恒不小于 0。
pub fn drain_excess_liquid(
    ec: &dyn EnthalpyConverter,
    omega_max: f64,
    thickness: f64,
    z: f64,
    dz: f64,
    enthalpy: f64,
) -> (f64, f64) {
    let p = ec.pressure_from_depth(thickness - z);
    let omega = ec.water_fraction_limited(enthalpy, p);
    if omega > omega_max {
        let drained = (omega - omega_max) * dz;
        (ec.enthalpy_at_water_fraction(omega_max, p), drained)
    } else {
        (enthalpy, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enthalpy::DefaultEnthalpyConverter;

    #[test]
    fn test_excess_is_drained() {
        let ec = DefaultEnthalpyConverter::default();
        let p = ec.pressure_from_depth(1000.0 - 100.0);
        let e = ec.enthalpy_at_water_fraction(0.05, p);
        let (e_new, drained) = drain_excess_liquid(&ec, 0.01, 1000.0, 100.0, 10.0, e);
        assert!((drained - 0.04 * 10.0).abs() < 1e-9);
        assert!((ec.water_fraction(e_new, p).unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_below_cap_unchanged() {
        let ec = DefaultEnthalpyConverter::default();
        let p = ec.pressure_from_depth(500.0);
        let e = ec.enthalpy_at_water_fraction(0.005, p);
        assert_eq!(drain_excess_liquid(&ec, 0.01, 600.0, 100.0, 10.0, e), (e, 0.0));

        let cold = ec.enthalpy_permissive(250.0, 0.0, p);
        assert_eq!(drain_excess_liquid(&ec, 0.01, 600.0, 100.0, 10.0, cold), (cold, 0.0));
    }

    #[test]
    fn test_fully_melted_is_capped() {
        let ec = DefaultEnthalpyConverter::default();
        let p = ec.pressure_from_depth(50.0);
        let e = ec.enthalpy_interval(p).1 + 1.0e5;
        let (e_new, drained) = drain_excess_liquid(&ec, 0.01, 60.0, 10.0, 5.0, e);
        assert!((drained - 0.99 * 5.0).abs() < 1e-12);
        assert!(!ec.is_liquified(e_new, p));
    }
}
