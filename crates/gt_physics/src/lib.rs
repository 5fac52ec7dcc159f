// crates/gt_physics/src/lib.rs

//! Glacitherm Physics Layer (Layer 3)
//!
//! 冰盖焓守恒热力学核心：逐柱隐式求解冰焓与基岩温度，更新基底融化率、
//! 基底储水并排出超限液态水。
//!
//! # 模块概览
//!
//! - [`enthalpy`]: EnthalpyConverter 焓-温度-含水量换算
//! - [`column`]: 柱方程组（联合、仅基岩、仅冰焓）与三对角求解
//! - [`cts`]: CTS 焓廓线与 λ 上风权重
//! - [`basal`]: 基底状态分类
//! - [`drainage`]: 超限液态水排出
//! - [`step`]: EnthalpyDrainageStep 单分块单步推进
//! - [`state`]: ThermalState 全部分块的并行推进
//! - [`conversions`]: 分块场的焓-温度换算
//! - [`coupler`]: 大气与海洋耦合器
//! - [`error`]: 错误类型
//!
//! # 层级架构
//!
//! ```text
//! Layer 4: gt_cli      ─> 建立试验并推进 ThermalState
//! Layer 3: gt_physics  ─> (本层)
//! Layer 2: gt_grid     ─> 分块场与幽灵交换
//! Layer 1: gt_config   ─> ThermalConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod basal;
pub mod column;
pub mod conversions;
pub mod coupler;
pub mod cts;
pub mod drainage;
pub mod enthalpy;
pub mod error;
pub mod state;
pub mod step;

/// 层级标识
pub const LAYER: u8 = 3;

// 重导出核心类型
pub use basal::BasalState;
pub use column::{
    ColumnDiagnostics, ColumnParams, ColumnState, ColumnSystem, ColumnView, SolverVariant,
    TridiagonalSystem,
};
pub use coupler::{
    AtmosphereModel, Couplers, FaustoAtmosphere, OceanModel, UniformAtmosphere, UniformOcean,
    VariableRegistry,
};
pub use enthalpy::{DefaultEnthalpyConverter, EnthalpyConverter, EnthalpyError, EnthalpyResult};
pub use error::{ThermoError, ThermoResult};
pub use state::{ThermalFields, ThermalState};
pub use step::{EnthalpyDrainageStep, PatchInputs, PatchOutputs, StepOptions, StepReport};
