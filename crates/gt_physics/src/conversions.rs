// crates/gt_physics/src/conversions.rs

//! 分块场的焓-温度换算（存储层）
//!
//! 第 k 层压力取 `p(H - z_k)`，冰面以上为大气压。只写拥有格点；
//! 生成焓的换算之后由调用方做幽灵交换。

use gt_grid::{Field2, Field3};

use crate::enthalpy::{EnthalpyConverter, EnthalpyError};
use crate::error::ThermoResult;

/// 冷冰温度 → 焓（宽松：高于融点时取 CTS 焓）
pub fn enthalpy_from_temperature_cold(
    ec: &dyn EnthalpyConverter,
    thickness: &Field2<f64>,
    temperature: &Field3,
    enthalpy: &mut Field3,
) -> ThermoResult<()> {
    for_each_level(thickness, &[temperature], enthalpy, |v, depth| {
        let p = ec.pressure_from_depth(depth);
        Ok(ec.enthalpy_permissive(v[0], 0.0, p))
    })
}

/// 温度与含水量 → 焓（严格，非法组合报错）
pub fn enthalpy_from_temperature_and_liquid_fraction(
    ec: &dyn EnthalpyConverter,
    thickness: &Field2<f64>,
    temperature: &Field3,
    liquid_fraction: &Field3,
    enthalpy: &mut Field3,
) -> ThermoResult<()> {
    for_each_level(thickness, &[temperature, liquid_fraction], enthalpy, |v, depth| {
        let p = ec.pressure_from_depth(depth);
        Ok(ec.enthalpy(v[0], v[1], p)?)
    })
}

/// 焓 → 绝对温度
///
/// 完全融化的层取压力融点，返回此类层数。
pub fn temperature_from_enthalpy(
    ec: &dyn EnthalpyConverter,
    thickness: &Field2<f64>,
    enthalpy: &Field3,
    temperature: &mut Field3,
) -> ThermoResult<usize> {
    let mut melted = 0;
    for_each_level(thickness, &[enthalpy], temperature, |v, depth| {
        let p = ec.pressure_from_depth(depth);
        match ec.absolute_temperature(v[0], p) {
            Ok(t) => Ok(t),
            Err(EnthalpyError::FullyMelted { .. }) => {
                melted += 1;
                Ok(ec.melting_temperature(p))
            }
            Err(e) => Err(e.into()),
        }
    })?;
    Ok(melted)
}

/// 焓 → 含水量（限制到 [0, 1]）
pub fn liquid_fraction_from_enthalpy(
    ec: &dyn EnthalpyConverter,
    thickness: &Field2<f64>,
    enthalpy: &Field3,
    liquid_fraction: &mut Field3,
) -> ThermoResult<()> {
    for_each_level(thickness, &[enthalpy], liquid_fraction, |v, depth| {
        Ok(ec.water_fraction_limited(v[0], ec.pressure_from_depth(depth)))
    })
}

/// 焓 → 压力修正温度
///
/// 完全融化的层取标准融点，返回此类层数。
pub fn pressure_adjusted_temperature_from_enthalpy(
    ec: &dyn EnthalpyConverter,
    thickness: &Field2<f64>,
    enthalpy: &Field3,
    pa_temperature: &mut Field3,
) -> ThermoResult<usize> {
    let mut melted = 0;
    for_each_level(thickness, &[enthalpy], pa_temperature, |v, depth| {
        match ec.pressure_adjusted_temperature(v[0], ec.pressure_from_depth(depth)) {
            Ok(t) => Ok(t),
            Err(EnthalpyError::FullyMelted { .. }) => {
                melted += 1;
                Ok(ec.standard_melting_temperature())
            }
            Err(e) => Err(e.into()),
        }
    })?;
    Ok(melted)
}

/// 焓 → CTS 比值 E/E_s
pub fn cts_from_enthalpy(
    ec: &dyn EnthalpyConverter,
    thickness: &Field2<f64>,
    enthalpy: &Field3,
    cts: &mut Field3,
) -> ThermoResult<()> {
    for_each_level(thickness, &[enthalpy], cts, |v, depth| {
        Ok(ec.cts_ratio(v[0], ec.pressure_from_depth(depth)))
    })
}

/// 对拥有格点的每一存储层调用 `f(输入值, 冰中深度)`，结果写入 out
fn for_each_level(
    thickness: &Field2<f64>,
    sources: &[&Field3],
    out: &mut Field3,
    mut f: impl FnMut(&[f64], f64) -> ThermoResult<f64>,
) -> ThermoResult<()> {
    let patch = *out.patch();
    let levels = out.levels().to_vec();
    let mut values = vec![0.0; sources.len()];
    let mut column = vec![0.0; levels.len()];
    for (i, j) in patch.owned() {
        let (ii, jj) = (i as isize, j as isize);
        let h = thickness.get(ii, jj)?;
        for (k, &z) in levels.iter().enumerate() {
            for (v, source) in values.iter_mut().zip(sources) {
                *v = source.column(ii, jj)?[k];
            }
            column[k] = f(&values, h - z)?;
        }
        out.column_mut(i, j)?.copy_from_slice(&column);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enthalpy::DefaultEnthalpyConverter;
    use gt_grid::{HorizontalPatch, LevelKind};
    use std::sync::Arc;

    fn patch() -> HorizontalPatch {
        HorizontalPatch {
            rank: 0,
            xs: 0,
            xm: 2,
            ys: 0,
            ym: 1,
        }
    }

    fn field3(name: &str, fill: f64) -> Field3 {
        let levels: Arc<[f64]> = vec![0.0, 500.0, 1000.0, 1500.0].into();
        Field3::new(name, LevelKind::Ice, levels, patch(), (2, 1), fill)
    }

    #[test]
    fn test_cold_round_trip() {
        let ec = DefaultEnthalpyConverter::default();
        let thk = Field2::new("thk", patch(), (2, 1), 1, 1200.0);
        let temp = field3("temp", 260.0);
        let mut enth = field3("enthalpy", 0.0);
        enthalpy_from_temperature_cold(&ec, &thk, &temp, &mut enth).unwrap();
        assert!(!enth.ghosts_valid());

        let mut back = field3("temp", 0.0);
        let melted = temperature_from_enthalpy(&ec, &thk, &enth, &mut back).unwrap();
        assert_eq!(melted, 0);
        for v in back.column(1, 0).unwrap() {
            assert!((v - 260.0).abs() < 1e-9);
        }

        let mut omega = field3("liqfrac", 1.0);
        liquid_fraction_from_enthalpy(&ec, &thk, &enth, &mut omega).unwrap();
        assert!(omega.column(0, 0).unwrap().iter().all(|&w| w == 0.0));

        let mut cts = field3("cts", 0.0);
        cts_from_enthalpy(&ec, &thk, &enth, &mut cts).unwrap();
        assert!(cts.column(0, 0).unwrap().iter().all(|&r| r < 1.0));
    }

    #[test]
    fn test_pressure_adjusted_temperature_at_base() {
        let ec = DefaultEnthalpyConverter::default();
        let thk = Field2::new("thk", patch(), (2, 1), 1, 1500.0);
        let temp = field3("temp", 300.0);
        let mut enth = field3("enthalpy", 0.0);
        // 高于融点的温度被压到融点
        enthalpy_from_temperature_cold(&ec, &thk, &temp, &mut enth).unwrap();
        let mut pa = field3("temp_pa", 0.0);
        let melted = pressure_adjusted_temperature_from_enthalpy(&ec, &thk, &enth, &mut pa).unwrap();
        assert_eq!(melted, 0);
        for v in pa.column(0, 0).unwrap() {
            assert!((v - 273.15).abs() < 1e-9);
        }
    }

    #[test]
    fn test_strict_conversion_rejects_wet_cold_ice() {
        let ec = DefaultEnthalpyConverter::default();
        let thk = Field2::new("thk", patch(), (2, 1), 1, 1000.0);
        let temp = field3("temp", 250.0);
        let omega = field3("liqfrac", 0.1);
        let mut enth = field3("enthalpy", 0.0);
        assert!(enthalpy_from_temperature_and_liquid_fraction(&ec, &thk, &temp, &omega, &mut enth)
            .is_err());
    }

    #[test]
    fn test_fully_melted_levels_counted() {
        let ec = DefaultEnthalpyConverter::default();
        let thk = Field2::new("thk", patch(), (2, 1), 1, 1000.0);
        let enth = field3("enthalpy", 1.0e6);
        let mut temp = field3("temp", 0.0);
        let melted = temperature_from_enthalpy(&ec, &thk, &enth, &mut temp).unwrap();
        assert_eq!(melted, 2 * 4);
    }
}
