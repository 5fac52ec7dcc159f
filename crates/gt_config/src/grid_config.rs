// crates/gt_config/src/grid_config.rs

//! GridConfig - 计算网格配置
//!
//! 描述水平方向（周期性）矩形网格与冰/基岩垂向离散。

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// 冰层垂向间距策略
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SpacingPolicy {
    /// 等间距
    #[default]
    Equal,
    /// 二次间距（底部加密）
    ///
    /// z_k = Lz · (ζ/λ) · (1 + (λ-1)·ζ)，ζ = k/(Mz-1)
    Quadratic {
        /// 加密参数 λ（≥1，越大底部越密）
        lambda: f64,
    },
}

impl SpacingPolicy {
    /// 默认加密参数的二次间距
    pub fn quadratic() -> Self {
        Self::Quadratic { lambda: 4.0 }
    }
}

/// 网格配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// x 方向格点数
    #[serde(default = "default_mx")]
    pub mx: usize,
    /// y 方向格点数
    #[serde(default = "default_my")]
    pub my: usize,
    /// x 方向半宽 [m]
    #[serde(default = "default_half_width")]
    pub lx: f64,
    /// y 方向半宽 [m]
    #[serde(default = "default_half_width")]
    pub ly: f64,
    /// 网格中心 x 坐标 [m]
    #[serde(default)]
    pub x0: f64,
    /// 网格中心 y 坐标 [m]
    #[serde(default)]
    pub y0: f64,
    /// 冰层垂向层数
    #[serde(default = "default_mz")]
    pub mz: usize,
    /// 基岩垂向层数（1 表示无基岩热层）
    #[serde(default = "default_mbz")]
    pub mbz: usize,
    /// 冰层计算域高度 [m]
    #[serde(default = "default_lz")]
    pub lz: f64,
    /// 基岩热层厚度 [m]
    #[serde(default)]
    pub lbz: f64,
    /// 冰层垂向间距策略
    #[serde(default)]
    pub spacing: SpacingPolicy,
    /// x 方向进程（分块）数，缺省时自动选择
    #[serde(default)]
    pub procs_x: Option<usize>,
    /// y 方向进程（分块）数，缺省时自动选择
    #[serde(default)]
    pub procs_y: Option<usize>,
}

fn default_mx() -> usize { 61 }
fn default_my() -> usize { 61 }
fn default_half_width() -> f64 { 1500.0e3 }
fn default_mz() -> usize { 31 }
fn default_mbz() -> usize { 1 }
fn default_lz() -> f64 { 4000.0 }

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            mx: default_mx(),
            my: default_my(),
            lx: default_half_width(),
            ly: default_half_width(),
            x0: 0.0,
            y0: 0.0,
            mz: default_mz(),
            mbz: default_mbz(),
            lz: default_lz(),
            lbz: 0.0,
            spacing: SpacingPolicy::Equal,
            procs_x: None,
            procs_y: None,
        }
    }
}

impl GridConfig {
    /// 校验网格配置，返回全部违规项
    pub fn validate(&self) -> ConfigResult<()> {
        let mut problems = Vec::new();

        if self.mx < 3 || self.my < 3 {
            problems.push(format!("Mx={} My={} 至少为 3", self.mx, self.my));
        }
        if !(self.lx > 0.0 && self.ly > 0.0) {
            problems.push(format!("Lx={} Ly={} 必须为正", self.lx, self.ly));
        }
        if self.mz < 2 {
            problems.push(format!("Mz={} 至少为 2", self.mz));
        }
        if !(self.lz > 0.0) {
            problems.push(format!("Lz={} 必须为正", self.lz));
        }
        if self.mbz == 0 {
            problems.push("Mbz 至少为 1".to_string());
        }
        if self.mbz > 1 && !(self.lbz > 0.0) {
            problems.push(format!("Mbz={} 时 Lbz={} 必须为正", self.mbz, self.lbz));
        }
        if self.mbz == 1 && self.lbz != 0.0 {
            problems.push(format!("Mbz=1 时 Lbz 必须为 0, 实际 {}", self.lbz));
        }
        if let SpacingPolicy::Quadratic { lambda } = self.spacing {
            if !(lambda >= 1.0) {
                problems.push(format!("二次间距参数 lambda={lambda} 必须 ≥ 1"));
            }
        }
        if self.procs_x.is_some() != self.procs_y.is_some() {
            problems.push("procs_x 与 procs_y 必须同时给出".to_string());
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
    fn test_default_grid_valid() {
        assert!(GridConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bedrock_requires_thickness() {
        let config = GridConfig {
            mbz: 5,
            lbz: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_spacing_policy_json() {
        let json = r#"{"type":"quadratic","lambda":4.0}"#;
        let policy: SpacingPolicy = serde_json::from_str(json).unwrap();
        assert_eq!(policy, SpacingPolicy::quadratic());
    }

    #[test]
    fn test_half_given_procs_rejected() {
        let config = GridConfig {
            procs_x: Some(2),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
