// crates/gt_config/src/thermal.rs

//! ThermalConfig - 热力学物理常数与数值参数（全 f64，SI 单位）
//!
//! 同时提供 [`FlatConfig`]：参数名到标量值的扁平映射，
//! 便于与外部按键名组织的参数文件互相转换。
//!
//! # 键名
//!
//! 扁平键名与结构体字段名一致，例如 `ice_density`、`hmelt_max`。
//! 布尔参数 `update_hmelt` 在扁平映射中以 0/1 表示。

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{ConfigError, ConfigResult};

/// 热力学配置
///
/// 冰、基岩与水的物理常数，以及排水、基底水与边界混合相关的数值参数。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalConfig {
    /// 冰密度 [kg/m³]
    #[serde(default = "default_ice_density")]
    pub ice_density: f64,

    /// 冰比热容 [J/(kg·K)]
    #[serde(default = "default_ice_specific_heat_capacity")]
    pub ice_specific_heat_capacity: f64,

    /// 冰热导率 [W/(m·K)]
    #[serde(default = "default_ice_thermal_conductivity")]
    pub ice_thermal_conductivity: f64,

    /// 水的融化潜热 [J/kg]
    #[serde(default = "default_water_latent_heat_fusion")]
    pub water_latent_heat_fusion: f64,

    /// 标准大气压下水的融点 [K]
    #[serde(default = "default_water_melting_temperature")]
    pub water_melting_temperature: f64,

    /// 焓零点对应的参考温度 [K]
    #[serde(default = "default_enthalpy_reference_temperature")]
    pub enthalpy_reference_temperature: f64,

    /// Clausius-Clapeyron 常数 [K/Pa]
    #[serde(default = "default_beta_cc")]
    pub beta_cc: f64,

    /// 重力加速度 [m/s²]
    #[serde(default = "default_standard_gravity")]
    pub standard_gravity: f64,

    /// 冰面大气压 [Pa]
    #[serde(default = "default_surface_pressure")]
    pub surface_pressure: f64,

    /// 基岩密度 [kg/m³]
    #[serde(default = "default_bedrock_thermal_density")]
    pub bedrock_thermal_density: f64,

    /// 基岩比热容 [J/(kg·K)]
    #[serde(default = "default_bedrock_thermal_specific_heat_capacity")]
    pub bedrock_thermal_specific_heat_capacity: f64,

    /// 基岩热导率 [W/(m·K)]
    #[serde(default = "default_bedrock_thermal_conductivity")]
    pub bedrock_thermal_conductivity: f64,

    /// 冰中液态水含量上限（超出部分排至底部）
    #[serde(default = "default_liquid_water_fraction_max")]
    pub liquid_water_fraction_max: f64,

    /// 基底储水厚度上限 [m]
    #[serde(default = "default_hmelt_max")]
    pub hmelt_max: f64,

    /// 暖底边界混合窗口占潜热的比例
    ///
    /// 基底焓在 `[E_s, E_s + fraction·L)` 内时，底部方程在通量条件与
    /// 融点/出流条件之间连续混合。
    #[serde(default = "default_warm_base_flux_enthalpy_fraction")]
    pub warm_base_flux_enthalpy_fraction: f64,

    /// 边缘薄冰判定厚度 [m]
    #[serde(default = "default_marginal_ice_thickness")]
    pub marginal_ice_thickness: f64,

    /// 是否更新基底储水
    #[serde(default = "default_update_hmelt")]
    pub update_hmelt: bool,
}

fn default_ice_density() -> f64 { 910.0 }
fn default_ice_specific_heat_capacity() -> f64 { 2009.0 }
fn default_ice_thermal_conductivity() -> f64 { 2.10 }
fn default_water_latent_heat_fusion() -> f64 { 3.34e5 }
fn default_water_melting_temperature() -> f64 { 273.15 }
fn default_enthalpy_reference_temperature() -> f64 { 223.15 }
fn default_beta_cc() -> f64 { 7.9e-8 }
fn default_standard_gravity() -> f64 { 9.81 }
fn default_surface_pressure() -> f64 { 1.0e5 }
fn default_bedrock_thermal_density() -> f64 { 3300.0 }
fn default_bedrock_thermal_specific_heat_capacity() -> f64 { 1000.0 }
fn default_bedrock_thermal_conductivity() -> f64 { 3.0 }
fn default_liquid_water_fraction_max() -> f64 { 0.01 }
fn default_hmelt_max() -> f64 { 2.0 }
fn default_warm_base_flux_enthalpy_fraction() -> f64 { 0.6 }
fn default_marginal_ice_thickness() -> f64 { 100.0 }
fn default_update_hmelt() -> bool { true }

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            ice_density: default_ice_density(),
            ice_specific_heat_capacity: default_ice_specific_heat_capacity(),
            ice_thermal_conductivity: default_ice_thermal_conductivity(),
            water_latent_heat_fusion: default_water_latent_heat_fusion(),
            water_melting_temperature: default_water_melting_temperature(),
            enthalpy_reference_temperature: default_enthalpy_reference_temperature(),
            beta_cc: default_beta_cc(),
            standard_gravity: default_standard_gravity(),
            surface_pressure: default_surface_pressure(),
            bedrock_thermal_density: default_bedrock_thermal_density(),
            bedrock_thermal_specific_heat_capacity: default_bedrock_thermal_specific_heat_capacity(),
            bedrock_thermal_conductivity: default_bedrock_thermal_conductivity(),
            liquid_water_fraction_max: default_liquid_water_fraction_max(),
            hmelt_max: default_hmelt_max(),
            warm_base_flux_enthalpy_fraction: default_warm_base_flux_enthalpy_fraction(),
            marginal_ice_thickness: default_marginal_ice_thickness(),
            update_hmelt: default_update_hmelt(),
        }
    }
}

/// 扁平键名列表（与字段顺序一致）
pub const FLAT_KEYS: [&str; 17] = [
    "ice_density",
    "ice_specific_heat_capacity",
    "ice_thermal_conductivity",
    "water_latent_heat_fusion",
    "water_melting_temperature",
    "enthalpy_reference_temperature",
    "beta_cc",
    "standard_gravity",
    "surface_pressure",
    "bedrock_thermal_density",
    "bedrock_thermal_specific_heat_capacity",
    "bedrock_thermal_conductivity",
    "liquid_water_fraction_max",
    "hmelt_max",
    "warm_base_flux_enthalpy_fraction",
    "marginal_ice_thickness",
    "update_hmelt",
];

impl ThermalConfig {
    /// 冰的体积热容 ρc [J/(m³·K)]
    #[inline]
    pub fn ice_rho_c(&self) -> f64 {
        self.ice_density * self.ice_specific_heat_capacity
    }

    /// 基岩的体积热容 ρc [J/(m³·K)]
    #[inline]
    pub fn bedrock_rho_c(&self) -> f64 {
        self.bedrock_thermal_density * self.bedrock_thermal_specific_heat_capacity
    }

    /// 暖底混合窗口宽度 ΔE [J/kg]
    #[inline]
    pub fn warm_base_enthalpy_window(&self) -> f64 {
        self.warm_base_flux_enthalpy_fraction * self.water_latent_heat_fusion
    }

    /// 按键名读取参数
    pub fn get(&self, key: &str) -> ConfigResult<f64> {
        let value = match key {
            "ice_density" => self.ice_density,
            "ice_specific_heat_capacity" => self.ice_specific_heat_capacity,
            "ice_thermal_conductivity" => self.ice_thermal_conductivity,
            "water_latent_heat_fusion" => self.water_latent_heat_fusion,
            "water_melting_temperature" => self.water_melting_temperature,
            "enthalpy_reference_temperature" => self.enthalpy_reference_temperature,
            "beta_cc" => self.beta_cc,
            "standard_gravity" => self.standard_gravity,
            "surface_pressure" => self.surface_pressure,
            "bedrock_thermal_density" => self.bedrock_thermal_density,
            "bedrock_thermal_specific_heat_capacity" => self.bedrock_thermal_specific_heat_capacity,
            "bedrock_thermal_conductivity" => self.bedrock_thermal_conductivity,
            "liquid_water_fraction_max" => self.liquid_water_fraction_max,
            "hmelt_max" => self.hmelt_max,
            "warm_base_flux_enthalpy_fraction" => self.warm_base_flux_enthalpy_fraction,
            "marginal_ice_thickness" => self.marginal_ice_thickness,
            "update_hmelt" => {
                if self.update_hmelt {
                    1.0
                } else {
                    0.0
                }
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        };
        Ok(value)
    }

    /// 按键名设置参数
    pub fn set(&mut self, key: &str, value: f64) -> ConfigResult<()> {
        match key {
            "ice_density" => self.ice_density = value,
            "ice_specific_heat_capacity" => self.ice_specific_heat_capacity = value,
            "ice_thermal_conductivity" => self.ice_thermal_conductivity = value,
            "water_latent_heat_fusion" => self.water_latent_heat_fusion = value,
            "water_melting_temperature" => self.water_melting_temperature = value,
            "enthalpy_reference_temperature" => self.enthalpy_reference_temperature = value,
            "beta_cc" => self.beta_cc = value,
            "standard_gravity" => self.standard_gravity = value,
            "surface_pressure" => self.surface_pressure = value,
            "bedrock_thermal_density" => self.bedrock_thermal_density = value,
            "bedrock_thermal_specific_heat_capacity" => {
                self.bedrock_thermal_specific_heat_capacity = value
            }
            "bedrock_thermal_conductivity" => self.bedrock_thermal_conductivity = value,
            "liquid_water_fraction_max" => self.liquid_water_fraction_max = value,
            "hmelt_max" => self.hmelt_max = value,
            "warm_base_flux_enthalpy_fraction" => self.warm_base_flux_enthalpy_fraction = value,
            "marginal_ice_thickness" => self.marginal_ice_thickness = value,
            "update_hmelt" => {
                if value != 0.0 && value != 1.0 {
                    return Err(ConfigError::invalid(key, value, "布尔参数只能取 0 或 1"));
                }
                self.update_hmelt = value == 1.0;
            }
            other => return Err(ConfigError::UnknownKey(other.to_string())),
        }
        Ok(())
    }

    /// 从扁平映射构造；缺失的键取默认值，未知键报错
    pub fn from_flat(flat: &FlatConfig) -> ConfigResult<Self> {
        let mut config = Self::default();
        for (key, &value) in flat.iter() {
            config.set(key, value)?;
        }
        Ok(config)
    }

    /// 导出为扁平映射
    pub fn to_flat(&self) -> FlatConfig {
        let mut flat = FlatConfig::new();
        for key in FLAT_KEYS {
            // FLAT_KEYS 与 get 的分支一一对应
            if let Ok(value) = self.get(key) {
                flat.insert(key, value);
            }
        }
        flat
    }

    /// 校验所有参数，返回全部违规项
    pub fn validate(&self) -> ConfigResult<()> {
        let mut problems = Vec::new();

        let positive = [
            ("ice_density", self.ice_density),
            ("ice_specific_heat_capacity", self.ice_specific_heat_capacity),
            ("water_latent_heat_fusion", self.water_latent_heat_fusion),
            ("water_melting_temperature", self.water_melting_temperature),
            ("enthalpy_reference_temperature", self.enthalpy_reference_temperature),
            ("standard_gravity", self.standard_gravity),
            ("bedrock_thermal_density", self.bedrock_thermal_density),
            (
                "bedrock_thermal_specific_heat_capacity",
                self.bedrock_thermal_specific_heat_capacity,
            ),
        ];
        for (key, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                problems.push(format!("{key}={value} 必须为正"));
            }
        }

        let non_negative = [
            ("ice_thermal_conductivity", self.ice_thermal_conductivity),
            ("bedrock_thermal_conductivity", self.bedrock_thermal_conductivity),
            ("beta_cc", self.beta_cc),
            ("surface_pressure", self.surface_pressure),
            ("hmelt_max", self.hmelt_max),
            ("marginal_ice_thickness", self.marginal_ice_thickness),
        ];
        for (key, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                problems.push(format!("{key}={value} 必须为非负"));
            }
        }

        if !(self.liquid_water_fraction_max > 0.0 && self.liquid_water_fraction_max < 1.0) {
            problems.push(format!(
                "liquid_water_fraction_max={} 必须位于 (0, 1)",
                self.liquid_water_fraction_max
            ));
        }
        if !(self.warm_base_flux_enthalpy_fraction > 0.0
            && self.warm_base_flux_enthalpy_fraction <= 1.0)
        {
            problems.push(format!(
                "warm_base_flux_enthalpy_fraction={} 必须位于 (0, 1]",
                self.warm_base_flux_enthalpy_fraction
            ));
        }
        if self.enthalpy_reference_temperature >= self.water_melting_temperature {
            problems.push("enthalpy_reference_temperature 必须低于 water_melting_temperature".into());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems))
        }
    }
}

/// 扁平配置：参数名 → 标量值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatConfig {
    values: BTreeMap<String, f64>,
}

impl FlatConfig {
    /// 创建空映射
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖一个参数
    pub fn insert(&mut self, key: impl Into<String>, value: f64) {
        self.values.insert(key.into(), value);
    }

    /// 读取参数，缺失时返回错误
    pub fn get(&self, key: &str) -> ConfigResult<f64> {
        self.values
            .get(key)
            .copied()
            .ok_or_else(|| ConfigError::Missing(key.to_string()))
    }

    /// 遍历所有参数（按键名排序）
    pub fn iter(&self) -> impl Iterator<Item = (&String, &f64)> {
        self.values.iter()
    }

    /// 参数个数
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for FlatConfig {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        let mut flat = Self::new();
        for (k, v) in iter {
            flat.insert(k, v);
        }
        flat
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ThermalConfig::default().validate().is_ok());
    }

    #[test]
    fn test_flat_round_trip_preserves_overrides() {
        let mut config = ThermalConfig::default();
        config.hmelt_max = 3.5;
        config.update_hmelt = false;

        let flat = config.to_flat();
        assert_eq!(flat.len(), FLAT_KEYS.len());
        assert_eq!(flat.get("hmelt_max").unwrap(), 3.5);
        assert_eq!(flat.get("update_hmelt").unwrap(), 0.0);

        let back = ThermalConfig::from_flat(&flat).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_from_flat_partial_uses_defaults() {
        let flat: FlatConfig = [("ice_density", 917.0)].into_iter().collect();
        let config = ThermalConfig::from_flat(&flat).unwrap();
        assert_eq!(config.ice_density, 917.0);
        assert_eq!(config.ice_specific_heat_capacity, 2009.0);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let flat: FlatConfig = [("ice_colour", 1.0)].into_iter().collect();
        assert!(matches!(
            ThermalConfig::from_flat(&flat),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_update_hmelt_must_be_boolean() {
        let mut config = ThermalConfig::default();
        assert!(config.set("update_hmelt", 0.5).is_err());
        assert!(config.set("update_hmelt", 0.0).is_ok());
        assert!(!config.update_hmelt);
    }

    #[test]
    fn test_validate_collects_all_problems() {
        let config = ThermalConfig {
            ice_density: -1.0,
            liquid_water_fraction_max: 1.5,
            hmelt_max: -2.0,
            ..Default::default()
        };
        match config.validate() {
            Err(ConfigError::Validation(problems)) => assert_eq!(problems.len(), 3),
            other => panic!("期望校验失败, 实际 {other:?}"),
        }
    }

    #[test]
    fn test_derived_quantities() {
        let config = ThermalConfig::default();
        assert!((config.ice_rho_c() - 910.0 * 2009.0).abs() < 1e-6);
        assert!((config.warm_base_enthalpy_window() - 0.6 * 3.34e5).abs() < 1e-6);
    }

    #[test]
    fn test_missing_flat_key() {
        let flat = FlatConfig::new();
        assert!(matches!(flat.get("ice_density"), Err(ConfigError::Missing(_))));
    }
}
