// crates/gt_config/src/coupler_config.rs

//! 耦合器与试验配置
//!
//! - [`AtmosphereConfig`]: 大气模型选择（均匀温度或 Fausto 参数化）
//! - [`OceanConfig`]: 冰架底部质量通量与温度
//! - [`ExperimentConfig`]: 命令行试验的初始几何与底部热通量

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Fausto 等 (2009) 格陵兰近地面气温参数化常数
///
/// `T = d + γ·h + c·lat + κ·(-lon)`，年均 (ma) 与七月均值 (mj) 各一组。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FaustoConfig {
    /// 年均温截距 [K]
    #[serde(default = "default_d_ma")]
    pub d_ma: f64,
    /// 年均温高程递减率 [K/m]
    #[serde(default = "default_gamma_ma")]
    pub gamma_ma: f64,
    /// 年均温纬度系数 [K/°N]
    #[serde(default = "default_c_ma")]
    pub c_ma: f64,
    /// 年均温经度系数 [K/°W]
    #[serde(default = "default_kappa_ma")]
    pub kappa_ma: f64,
    /// 七月均温截距 [K]
    #[serde(default = "default_d_mj")]
    pub d_mj: f64,
    /// 七月均温高程递减率 [K/m]
    #[serde(default = "default_gamma_mj")]
    pub gamma_mj: f64,
    /// 七月均温纬度系数 [K/°N]
    #[serde(default = "default_c_mj")]
    pub c_mj: f64,
    /// 七月均温经度系数 [K/°W]
    #[serde(default = "default_kappa_mj")]
    pub kappa_mj: f64,
    /// 年周期最暖日（自年初起的天数）
    #[serde(default = "default_july_day")]
    pub july_day: f64,
}

fn default_d_ma() -> f64 { 314.98 }
fn default_gamma_ma() -> f64 { -0.006309 }
fn default_c_ma() -> f64 { -0.7189 }
fn default_kappa_ma() -> f64 { 0.0672 }
fn default_d_mj() -> f64 { 287.85 }
fn default_gamma_mj() -> f64 { -0.005426 }
fn default_c_mj() -> f64 { -0.1585 }
fn default_kappa_mj() -> f64 { 0.0518 }
fn default_july_day() -> f64 { 196.0 }

impl Default for FaustoConfig {
    fn default() -> Self {
        Self {
            d_ma: default_d_ma(),
            gamma_ma: default_gamma_ma(),
            c_ma: default_c_ma(),
            kappa_ma: default_kappa_ma(),
            d_mj: default_d_mj(),
            gamma_mj: default_gamma_mj(),
            c_mj: default_c_mj(),
            kappa_mj: default_kappa_mj(),
            july_day: default_july_day(),
        }
    }
}

/// 大气模型配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum AtmosphereConfig {
    /// 全域均匀的冰面温度
    Uniform {
        /// 冰面温度 [K]
        temperature: f64,
    },
    /// Fausto 参数化
    Fausto(FaustoConfig),
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self::Uniform {
            temperature: 248.15,
        }
    }
}

/// 海洋模型配置（全域均匀）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OceanConfig {
    /// 冰架底部质量通量（冰当量）[m/s]
    #[serde(default)]
    pub shelf_base_mass_flux: f64,
    /// 冰架底部温度 [K]
    #[serde(default = "default_shelf_base_temperature")]
    pub shelf_base_temperature: f64,
}

fn default_shelf_base_temperature() -> f64 { 271.15 }

impl Default for OceanConfig {
    fn default() -> Self {
        Self {
            shelf_base_mass_flux: 0.0,
            shelf_base_temperature: default_shelf_base_temperature(),
        }
    }
}

/// 命令行试验配置：抛物面冰穹与均匀底部条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// 冰穹中心厚度 [m]
    #[serde(default = "default_dome_thickness")]
    pub dome_thickness: f64,
    /// 冰穹半径占 x 方向半宽的比例
    #[serde(default = "default_dome_radius_fraction")]
    pub dome_radius_fraction: f64,
    /// 地热通量 [W/m²]
    #[serde(default = "default_geothermal_flux")]
    pub geothermal_flux: f64,
    /// 初始冰温 [K]
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,
    /// 中心纬度 [°N]（Fausto 模型使用）
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    /// 中心经度 [°E]（Fausto 模型使用）
    #[serde(default = "default_longitude")]
    pub longitude: f64,
}

fn default_dome_thickness() -> f64 { 2000.0 }
fn default_dome_radius_fraction() -> f64 { 0.75 }
fn default_geothermal_flux() -> f64 { 0.042 }
fn default_initial_temperature() -> f64 { 253.15 }
fn default_latitude() -> f64 { 72.0 }
fn default_longitude() -> f64 { -40.0 }

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            dome_thickness: default_dome_thickness(),
            dome_radius_fraction: default_dome_radius_fraction(),
            geothermal_flux: default_geothermal_flux(),
            initial_temperature: default_initial_temperature(),
            latitude: default_latitude(),
            longitude: default_longitude(),
        }
    }
}

impl ExperimentConfig {
    /// 校验试验参数
    pub fn validate(&self) -> ConfigResult<()> {
        let mut problems = Vec::new();
        if !(self.dome_thickness >= 0.0) {
            problems.push(format!("dome_thickness={} 必须为非负", self.dome_thickness));
        }
        if !(self.dome_radius_fraction > 0.0 && self.dome_radius_fraction <= 1.0) {
            problems.push(format!(
                "dome_radius_fraction={} 必须位于 (0, 1]",
                self.dome_radius_fraction
            ));
        }
        if !(self.initial_temperature > 0.0) {
            problems.push(format!(
                "initial_temperature={} 必须为正",
                self.initial_temperature
            ));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_atmosphere_config_json() {
        let uniform: AtmosphereConfig =
            serde_json::from_str(r#"{"model":"uniform","temperature":250.0}"#).unwrap();
        assert_eq!(uniform, AtmosphereConfig::Uniform { temperature: 250.0 });

        let fausto: AtmosphereConfig = serde_json::from_str(r#"{"model":"fausto"}"#).unwrap();
        assert_eq!(fausto, AtmosphereConfig::Fausto(FaustoConfig::default()));
    }

    #[test]
    fn test_fausto_defaults() {
        let f = FaustoConfig::default();
        assert!((f.d_ma - 314.98).abs() < 1e-12);
        assert!((f.july_day - 196.0).abs() < 1e-12);
    }

    #[test]
    fn test_experiment_validation() {
        assert!(ExperimentConfig::default().validate().is_ok());
        let bad = ExperimentConfig {
            dome_radius_fraction: 0.0,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }
}
