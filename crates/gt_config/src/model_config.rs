// crates/gt_config/src/model_config.rs

//! ModelConfig - 模型总配置
//!
//! 汇总热力学参数、网格、运行参数与耦合器设置，支持 JSON 文件读写。

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::coupler_config::{AtmosphereConfig, ExperimentConfig, OceanConfig};
use crate::error::{ConfigError, ConfigResult};
use crate::grid_config::GridConfig;
use crate::thermal::ThermalConfig;

/// 运行参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// 起始时间 [a]
    #[serde(default)]
    pub start_year: f64,

    /// 热力学时间步长 [a]
    #[serde(default = "default_dt_years")]
    pub dt_years: f64,

    /// 时间步数
    #[serde(default = "default_n_steps")]
    pub n_steps: usize,

    /// 探测柱 (i, j)：记录该柱的线性系统与解
    #[serde(default)]
    pub sounding: Option<[usize; 2]>,

    /// 诊断文件输出目录
    #[serde(default = "default_dump_dir")]
    pub dump_dir: PathBuf,
}

fn default_dt_years() -> f64 { 1.0 }
fn default_n_steps() -> usize { 10 }
fn default_dump_dir() -> PathBuf { PathBuf::from(".") }

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            start_year: 0.0,
            dt_years: default_dt_years(),
            n_steps: default_n_steps(),
            sounding: None,
            dump_dir: default_dump_dir(),
        }
    }
}

impl RunConfig {
    /// 校验运行参数
    pub fn validate(&self) -> ConfigResult<()> {
        if !(self.dt_years.is_finite() && self.dt_years > 0.0) {
            return Err(ConfigError::invalid("dt_years", self.dt_years, "必须为正"));
        }
        Ok(())
    }
}

/// 模型总配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// 热力学参数
    #[serde(default)]
    pub thermal: ThermalConfig,

    /// 网格配置
    #[serde(default)]
    pub grid: GridConfig,

    /// 运行参数
    #[serde(default)]
    pub run: RunConfig,

    /// 大气模型
    #[serde(default)]
    pub atmosphere: AtmosphereConfig,

    /// 海洋模型
    #[serde(default)]
    pub ocean: OceanConfig,

    /// 命令行试验设置
    #[serde(default)]
    pub experiment: ExperimentConfig,
}

impl ModelConfig {
    /// 从 JSON 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// 保存为 JSON 文件
    pub fn to_file(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// 校验全部子配置，汇总违规项
    pub fn validate(&self) -> ConfigResult<()> {
        let mut problems = Vec::new();
        for result in [
            self.thermal.validate(),
            self.grid.validate(),
            self.run.validate(),
            self.experiment.validate(),
        ] {
            match result {
                Ok(()) => {}
                Err(ConfigError::Validation(mut list)) => problems.append(&mut list),
                Err(other) => problems.push(other.to_string()),
            }
        }
        if let Some([i, j]) = self.run.sounding {
            if i >= self.grid.mx || j >= self.grid.my {
                problems.push(format!(
                    "探测柱 ({i}, {j}) 超出网格 {}x{}",
                    self.grid.mx, self.grid.my
                ));
            }
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(problems))
        }
    }
}
