// crates/gt_physics/src/error.rs

//! 热力学层错误类型
//!
//! | 错误 | 性质 |
//! |------|------|
//! | `SingularSystem` | 致命：柱方程组出现零主元，携带完整诊断 |
//! | `MissingCollaborator` | 致命：缺少耦合器或派生场，在逐柱计算前检出 |
//! | `InvalidConfiguration` | 致命：如基岩细网格恰为两层 |
//! | `StaleGhosts` | 致命：读取邻居前幽灵值未交换 |
//! | `IceExceedsGrid` | 致命：冰厚超出计算域高度 |
//!
//! 完全融化（[`EnthalpyError::FullyMelted`]）在逐柱流程中只计数，不走本类型。

use gt_config::ConfigError;
use gt_grid::GridError;

use crate::column::ColumnDiagnostics;
use crate::enthalpy::EnthalpyError;

/// 热力学层错误
#[derive(Debug, thiserror::Error)]
pub enum ThermoError {
    /// 柱方程组奇异
    #[error("柱 ({}, {}) 的{}方程组在第 {} 行出现零主元", .0.i, .0.j, .0.variant, .0.pivot)]
    SingularSystem(Box<ColumnDiagnostics>),

    /// 缺少协作方
    #[error("缺少协作方: {name}")]
    MissingCollaborator {
        /// 名称
        name: String,
    },

    /// 配置不可用
    #[error("无效配置: {reason}")]
    InvalidConfiguration {
        /// 原因
        reason: String,
    },

    /// 幽灵值过期
    #[error("场 {field} 的幽灵值已过期，需先做幽灵交换")]
    StaleGhosts {
        /// 场名
        field: String,
    },

    /// 冰厚超出计算域
    #[error("柱 ({i}, {j}) 冰厚 {thickness} m 超出计算域高度 Lz={lz} m")]
    IceExceedsGrid {
        /// i 索引
        i: usize,
        /// j 索引
        j: usize,
        /// 冰厚 [m]
        thickness: f64,
        /// 计算域高度 [m]
        lz: f64,
    },

    /// 转换律错误
    #[error(transparent)]
    Enthalpy(#[from] EnthalpyError),

    /// 网格层错误
    #[error(transparent)]
    Grid(#[from] GridError),

    /// 配置层错误
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// 诊断文件写入失败
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),
}

impl ThermoError {
    /// 缺少协作方
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingCollaborator { name: name.into() }
    }

    /// 无效配置
    pub fn invalid_configuration(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// 场的幽灵值须有效
    pub fn check_ghosts(field: &str, valid: bool) -> ThermoResult<()> {
        if valid {
            Ok(())
        } else {
            Err(Self::StaleGhosts {
                field: field.to_string(),
            })
        }
    }

    /// 奇异方程组的诊断信息
    pub fn diagnostics(&self) -> Option<&ColumnDiagnostics> {
        match self {
            Self::SingularSystem(d) => Some(d),
            _ => None,
        }
    }
}

/// 热力学层结果类型
pub type ThermoResult<T> = Result<T, ThermoError>;
