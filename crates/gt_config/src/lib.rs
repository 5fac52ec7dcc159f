// crates/gt_config/src/lib.rs

//! Glacitherm Config Layer (Layer 1)
//!
//! 配置层，提供热力学核心所需的全部参数。
//! 所有参数在模型建立时一次性构造，之后以不可变引用传入网格与求解器，
//! 不在计算过程中按字符串键临时查找。
//!
//! # 模块概览
//!
//! - [`thermal`]: ThermalConfig 物理常数与数值参数、FlatConfig 扁平键值映射
//! - [`grid_config`]: GridConfig 网格尺寸与垂向间距策略
//! - [`coupler_config`]: 大气/海洋耦合器与命令行试验设置
//! - [`model_config`]: ModelConfig 总配置、RunConfig 运行参数、JSON 读写
//! - [`error`]: 配置错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 4: gt_cli      ─> uses ModelConfig
//! Layer 3: gt_physics  ─> ThermalConfig 驱动柱求解器
//! Layer 2: gt_grid     ─> GridConfig 驱动分布式网格
//! Layer 1: gt_config   ─> (本层)
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod coupler_config;
pub mod error;
pub mod grid_config;
pub mod model_config;
pub mod thermal;

/// 层级标识
pub const LAYER: u8 = 1;

/// 一年的秒数
pub const SECONDS_PER_YEAR: f64 = 3.155_692_597_47e7;

// 重导出核心类型
pub use coupler_config::{AtmosphereConfig, ExperimentConfig, FaustoConfig, OceanConfig};
pub use error::{ConfigError, ConfigResult};
pub use grid_config::{GridConfig, SpacingPolicy};
pub use model_config::{ModelConfig, RunConfig};
pub use thermal::{FlatConfig, ThermalConfig};
