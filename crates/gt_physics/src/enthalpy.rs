// crates/gt_physics/src/enthalpy.rs

//! 焓-温度-压力转换
//!
//! 冷冰与温冰统一用焓描述，焓零点取参考温度 T0：
//!
//! ```text
//! p        = p_air + ρ·g·depth          (depth > 0)
//! T_m(p)   = T_melt - β·p                压力融点
//! E_s(p)   = c_i·(T_m(p) - T0)           CTS 焓（冷温转换）
//! E_l(p)   = E_s(p) + L                  完全融化焓
//! E < E_s  冷冰:  T = E/c_i + T0, ω = 0
//! E_s ≤ E < E_l  温冰:  T = T_m, ω = (E - E_s)/L
//! ```
//!
//! [`EnthalpyConverter`] 是纯函数接口，柱求解器只通过它访问转换律。

use gt_config::ThermalConfig;

/// 转换律错误
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EnthalpyError {
    /// 焓达到或超过完全融化焓，冰已完全融化
    #[error("焓 {enthalpy} J/kg 在压力 {pressure} Pa 下已完全融化")]
    FullyMelted {
        /// 焓 [J/kg]
        enthalpy: f64,
        /// 压力 [Pa]
        pressure: f64,
    },

    /// 温度高于压力融点
    #[error("温度 {temperature} K 高于压力融点 {melting} K")]
    AboveMelting {
        /// 温度 [K]
        temperature: f64,
        /// 压力融点 [K]
        melting: f64,
    },

    /// 含水量无效
    #[error("含水量 {omega} 无效: {reason}")]
    InvalidWaterFraction {
        /// 含水量
        omega: f64,
        /// 原因
        reason: &'static str,
    },
}

/// 转换律结果类型
pub type EnthalpyResult<T> = Result<T, EnthalpyError>;

/// 焓转换律
///
/// 全部方法都是无状态纯函数。
pub trait EnthalpyConverter: Send + Sync {
    /// 冰面（冰中深度 depth 处）压力 [Pa]
    fn pressure_from_depth(&self, depth: f64) -> f64;

    /// 压力融点 [K]
    fn melting_temperature(&self, pressure: f64) -> f64;

    /// CTS 焓 E_s(p)
    fn enthalpy_cts(&self, pressure: f64) -> f64;

    /// 融化潜热 L
    fn latent_heat(&self) -> f64;

    /// 冰比热 c_i
    fn specific_heat(&self) -> f64;

    /// 焓零点温度 T0
    fn reference_temperature(&self) -> f64;

    /// 标准大气压下的融点
    fn standard_melting_temperature(&self) -> f64;

    /// (E_s, E_l)
    fn enthalpy_interval(&self, pressure: f64) -> (f64, f64) {
        let e_s = self.enthalpy_cts(pressure);
        (e_s, e_s + self.latent_heat())
    }

    /// 是否为温冰（焓不低于 CTS 焓）
    fn is_temperate(&self, enthalpy: f64, pressure: f64) -> bool {
        enthalpy >= self.enthalpy_cts(pressure)
    }

    /// 是否完全融化
    fn is_liquified(&self, enthalpy: f64, pressure: f64) -> bool {
        enthalpy >= self.enthalpy_interval(pressure).1
    }

    /// 绝对温度 [K]；完全融化时返回 [`EnthalpyError::FullyMelted`]
    fn absolute_temperature(&self, enthalpy: f64, pressure: f64) -> EnthalpyResult<f64> {
        let (e_s, e_l) = self.enthalpy_interval(pressure);
        if enthalpy >= e_l {
            return Err(EnthalpyError::FullyMelted { enthalpy, pressure });
        }
        if enthalpy < e_s {
            Ok(enthalpy / self.specific_heat() + self.reference_temperature())
        } else {
            Ok(self.melting_temperature(pressure))
        }
    }

    /// 压力修正温度：相对压力融点的温度，再平移到标准融点
    fn pressure_adjusted_temperature(&self, enthalpy: f64, pressure: f64) -> EnthalpyResult<f64> {
        let t = self.absolute_temperature(enthalpy, pressure)?;
        Ok(t + (self.standard_melting_temperature() - self.melting_temperature(pressure)))
    }

    /// 含水量 ω；完全融化时报错
    fn water_fraction(&self, enthalpy: f64, pressure: f64) -> EnthalpyResult<f64> {
        let (e_s, e_l) = self.enthalpy_interval(pressure);
        if enthalpy >= e_l {
            return Err(EnthalpyError::FullyMelted { enthalpy, pressure });
        }
        if enthalpy <= e_s {
            Ok(0.0)
        } else {
            Ok((enthalpy - e_s) / self.latent_heat())
        }
    }

    /// 限制到 [0, 1] 的含水量
    fn water_fraction_limited(&self, enthalpy: f64, pressure: f64) -> f64 {
        let e_s = self.enthalpy_cts(pressure);
        ((enthalpy - e_s) / self.latent_heat()).clamp(0.0, 1.0)
    }

    /// 由温度与含水量求焓（严格）
    ///
    /// 温度不得高于压力融点；低于融点时含水量必须为零。
    fn enthalpy(&self, temperature: f64, omega: f64, pressure: f64) -> EnthalpyResult<f64> {
        if !(0.0..=1.0).contains(&omega) {
            return Err(EnthalpyError::InvalidWaterFraction {
                omega,
                reason: "必须位于 [0, 1]",
            });
        }
        let t_m = self.melting_temperature(pressure);
        if temperature > t_m {
            return Err(EnthalpyError::AboveMelting {
                temperature,
                melting: t_m,
            });
        }
        if temperature < t_m {
            if omega > 0.0 {
                return Err(EnthalpyError::InvalidWaterFraction {
                    omega,
                    reason: "冷冰不能含水",
                });
            }
            Ok(self.specific_heat() * (temperature - self.reference_temperature()))
        } else {
            Ok(self.enthalpy_at_water_fraction(omega, pressure))
        }
    }

    /// 由温度与含水量求焓（宽松）：温度达到融点后按限制后的含水量计算
    fn enthalpy_permissive(&self, temperature: f64, omega: f64, pressure: f64) -> f64 {
        let t_m = self.melting_temperature(pressure);
        if temperature < t_m {
            self.specific_heat() * (temperature - self.reference_temperature())
        } else {
            self.enthalpy_at_water_fraction(omega.clamp(0.0, 1.0), pressure)
        }
    }

    /// 给定含水量对应的温冰焓
    fn enthalpy_at_water_fraction(&self, omega: f64, pressure: f64) -> f64 {
        self.enthalpy_cts(pressure) + omega * self.latent_heat()
    }

    /// CTS 比值 E/E_s，等于 1 处即冷温转换面
    fn cts_ratio(&self, enthalpy: f64, pressure: f64) -> f64 {
        enthalpy / self.enthalpy_cts(pressure)
    }

    /// 常数信息文本
    fn describe(&self) -> String;
}

/// 默认转换律
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultEnthalpyConverter {
    beta: f64,
    c_i: f64,
    g: f64,
    l: f64,
    p_air: f64,
    rho_i: f64,
    t_melting: f64,
    t_0: f64,
}

impl DefaultEnthalpyConverter {
    /// 从热力学配置创建
    pub fn new(config: &ThermalConfig) -> Self {
        Self {
            beta: config.beta_cc,
            c_i: config.ice_specific_heat_capacity,
            g: config.standard_gravity,
            l: config.water_latent_heat_fusion,
            p_air: config.surface_pressure,
            rho_i: config.ice_density,
            t_melting: config.water_melting_temperature,
            t_0: config.enthalpy_reference_temperature,
        }
    }
}

impl Default for DefaultEnthalpyConverter {
    fn default() -> Self {
        Self::new(&ThermalConfig::default())
    }
}

impl EnthalpyConverter for DefaultEnthalpyConverter {
    #[inline]
    fn pressure_from_depth(&self, depth: f64) -> f64 {
        if depth > 0.0 {
            self.p_air + self.rho_i * self.g * depth
        } else {
            self.p_air
        }
    }

    #[inline]
    fn melting_temperature(&self, pressure: f64) -> f64 {
        self.t_melting - self.beta * pressure
    }

    #[inline]
    fn enthalpy_cts(&self, pressure: f64) -> f64 {
        self.c_i * (self.melting_temperature(pressure) - self.t_0)
    }

    #[inline]
    fn latent_heat(&self) -> f64 {
        self.l
    }

    #[inline]
    fn specific_heat(&self) -> f64 {
        self.c_i
    }

    #[inline]
    fn reference_temperature(&self) -> f64 {
        self.t_0
    }

    #[inline]
    fn standard_melting_temperature(&self) -> f64 {
        self.t_melting
    }

    fn describe(&self) -> String {
        format!(
            "焓转换律常数: beta={:.3e} K/Pa c_i={:.2} J/(kg K) g={:.3} m/s2 L={:.4e} J/kg \
             p_air={:.4e} Pa rho_i={:.1} kg/m3 T_melting={:.3} K T_0={:.3} K",
            self.beta, self.c_i, self.g, self.l, self.p_air, self.rho_i, self.t_melting, self.t_0
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ec() -> DefaultEnthalpyConverter {
        DefaultEnthalpyConverter::default()
    }

    #[test]
    fn test_pressure_from_depth() {
        let ec = ec();
        assert_eq!(ec.pressure_from_depth(-5.0), 1.0e5);
        assert!((ec.pressure_from_depth(1000.0) - (1.0e5 + 910.0 * 9.81 * 1000.0)).abs() < 1e-6);
    }

    #[test]
    fn test_cold_round_trip() {
        let ec = ec();
        let p = ec.pressure_from_depth(500.0);
        let e = ec.enthalpy(250.0, 0.0, p).unwrap();
        assert!((e - 2009.0 * (250.0 - 223.15)).abs() < 1e-9);
        assert!((ec.absolute_temperature(e, p).unwrap() - 250.0).abs() < 1e-9);
        assert_eq!(ec.water_fraction(e, p).unwrap(), 0.0);
        assert!(!ec.is_temperate(e, p));
    }

    #[test]
    fn test_temperate_ice() {
        let ec = ec();
        let p = ec.pressure_from_depth(2000.0);
        let e = ec.enthalpy_at_water_fraction(0.02, p);
        assert!(ec.is_temperate(e, p));
        assert!((ec.water_fraction(e, p).unwrap() - 0.02).abs() < 1e-12);
        assert_eq!(ec.absolute_temperature(e, p).unwrap(), ec.melting_temperature(p));
        assert!((ec.pressure_adjusted_temperature(e, p).unwrap() - 273.15).abs() < 1e-9);
        assert!(ec.cts_ratio(e, p) > 1.0);
    }

    #[test]
    fn test_fully_melted() {
        let ec = ec();
        let p = ec.pressure_from_depth(100.0);
        let (_, e_l) = ec.enthalpy_interval(p);
        assert!(ec.is_liquified(e_l, p));
        assert!(matches!(
            ec.absolute_temperature(e_l + 1.0, p),
            Err(EnthalpyError::FullyMelted { .. })
        ));
        assert_eq!(ec.water_fraction_limited(e_l + 1.0e6, p), 1.0);
    }

    #[test]
    fn test_strict_enthalpy_rejects_bad_input() {
        let ec = ec();
        let p = ec.pressure_from_depth(0.0);
        assert!(ec.enthalpy(280.0, 0.0, p).is_err());
        assert!(ec.enthalpy(250.0, 0.1, p).is_err());
        assert!(ec.enthalpy(250.0, -0.1, p).is_err());
    }

    #[test]
    fn test_permissive_enthalpy_caps_at_melting() {
        let ec = ec();
        let p = ec.pressure_from_depth(0.0);
        let e_warm = ec.enthalpy_permissive(280.0, 0.0, p);
        assert!((e_warm - ec.enthalpy_cts(p)).abs() < 1e-9);
        let e_wet = ec.enthalpy_permissive(280.0, 2.0, p);
        assert!((e_wet - ec.enthalpy_interval(p).1).abs() < 1e-9);
    }
}
