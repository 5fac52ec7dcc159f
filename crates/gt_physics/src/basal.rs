// crates/gt_physics/src/basal.rs

//! 基底热状态分类
//!
//! 每步由基底焓与 CTS 焓的比较及漂浮掩码重新导出，不持久化。

use std::fmt;

use crate::column::SolverVariant;

/// 基底状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasalState {
    /// 冷底接地，基岩细网格多于一层
    GroundedColdWithBedrock,
    /// 冷底接地，无基岩层
    GroundedColdNoBedrock,
    /// 温底接地
    GroundedTemperate,
    /// 漂浮
    Floating,
}

impl BasalState {
    /// 分类
    ///
    /// `e0`/`e_s0` 为基底焓与基底 CTS 焓，`mbz_fine` 为细网格基岩层数。
    pub fn classify(e0: f64, e_s0: f64, floating: bool, mbz_fine: usize) -> Self {
        if floating {
            Self::Floating
        } else if e0 < e_s0 {
            if mbz_fine > 1 {
                Self::GroundedColdWithBedrock
            } else {
                Self::GroundedColdNoBedrock
            }
        } else {
            Self::GroundedTemperate
        }
    }

    /// 是否使用联合方程组
    #[inline]
    pub fn uses_combined(self) -> bool {
        matches!(self, Self::GroundedColdWithBedrock)
    }

    /// 冰柱求解所用的方程组变体
    pub fn ice_variant(self) -> SolverVariant {
        if self.uses_combined() {
            SolverVariant::Combined
        } else {
            SolverVariant::IceEnthalpyOnly
        }
    }
}

impl fmt::Display for BasalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::GroundedColdWithBedrock => "冷底接地(有基岩)",
            Self::GroundedColdNoBedrock => "冷底接地(无基岩)",
            Self::GroundedTemperate => "温底接地",
            Self::Floating => "漂浮",
        };
        f.write_str(name)
    }
}
