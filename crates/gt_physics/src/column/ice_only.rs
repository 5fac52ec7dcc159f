// crates/gt_physics/src/column/ice_only.rs

//! 仅冰焓方程组
//!
//! 层 0..=ks，顶行 Dirichlet 取冰面焓，底行由 [`Level0Eqn`] 给出：
//!
//! - 冷底无基岩：通量条件 `E0 - E1 = (c·dz/k)·(G + Rb)`
//! - 其余：w0<0 时出流迎风行，否则 Dirichlet 取 E_s
//! - 暖底接地在窗口 `[E_s, E_s + ΔE)` 内两者按 α 连续混合

use super::{ColumnParams, ColumnState, ColumnSystem, SolverVariant, TridiagonalSystem};

/// 底行方程 `a0·E0 + a1·E1 = b`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Level0Eqn {
    /// E0 系数
    pub a0: f64,
    /// E1 系数
    pub a1: f64,
    /// 右端
    pub b: f64,
}

impl Level0Eqn {
    /// Dirichlet 行 `E0 = value`
    pub fn dirichlet(value: f64) -> Self {
        Self {
            a0: 1.0,
            a1: 0.0,
            b: value,
        }
    }

    /// 通量行 `E0 - E1 = (c·dz/k)·heat_flux`
    pub fn neumann(params: &ColumnParams, heat_flux: f64) -> Self {
        Self {
            a0: 1.0,
            a1: -1.0,
            b: params.flux_scale() * heat_flux,
        }
    }

    /// 出流行：w0<0 时对底层做迎风平流，否则固定为 CTS 焓
    pub fn outflow(params: &ColumnParams, state: &ColumnState) -> Self {
        let w0 = state.w[0];
        if w0 < 0.0 {
            let nuw0 = params.nu() * w0;
            Self {
                a0: 1.0 - nuw0,
                a1: nuw0,
                b: params.ice_rhs(state, 0),
            }
        } else {
            Self::dirichlet(state.enth_s[0])
        }
    }

    /// `(1-α)·self + α·other`
    pub fn blend(self, other: Self, alpha: f64) -> Self {
        Self {
            a0: (1.0 - alpha) * self.a0 + alpha * other.a0,
            a1: (1.0 - alpha) * self.a1 + alpha * other.a1,
            b: (1.0 - alpha) * self.b + alpha * other.b,
        }
    }
}

/// 暖底混合系数 α
///
/// `E0 < E_s + ΔE` 时 `α = 1 - (E0 - E_s)/ΔE`，否则为 0，结果限制到 [0, 1]。
pub fn warm_base_alpha(e0: f64, e_s0: f64, window: f64) -> f64 {
    let alpha = if e0 < e_s0 + window {
        1.0 - (e0 - e_s0) / window
    } else {
        0.0
    };
    alpha.clamp(0.0, 1.0)
}

/// 仅冰焓方程组
#[derive(Debug, Clone)]
pub struct IceEnthalpySystem {
    params: ColumnParams,
    ij: (usize, usize),
    sys: TridiagonalSystem,
}

impl IceEnthalpySystem {
    /// 创建，mz 为细网格冰层数
    pub fn new(params: ColumnParams, mz: usize) -> Self {
        Self {
            params,
            ij: (0, 0),
            sys: TridiagonalSystem::with_capacity(mz),
        }
    }

    /// 常数
    pub fn params(&self) -> &ColumnParams {
        &self.params
    }

    /// 组装 ks+1 阶方程组
    ///
    /// ks 为 0 时整柱只有一行，直接取冰面焓。
    pub fn assemble(&mut self, state: &ColumnState, level0: Level0Eqn, enth_ks: f64) {
        let ks = state.ks;
        self.ij = (state.i, state.j);
        self.sys.clear(ks + 1);

        if ks == 0 {
            self.sys.set_row(0, 0.0, 1.0, 0.0, enth_ks);
            return;
        }

        self.sys.set_row(0, 0.0, level0.a0, level0.a1, level0.b);
        for k in 1..ks {
            let (l, d, u, rhs) = self.params.ice_row(state, k);
            self.sys.set_row(k, l, d, u, rhs);
        }
        self.sys.set_row(ks, 0.0, 1.0, 0.0, enth_ks);
    }
}

impl ColumnSystem for IceEnthalpySystem {
    fn variant(&self) -> SolverVariant {
        SolverVariant::IceEnthalpyOnly
    }

    fn indices(&self) -> (usize, usize) {
        self.ij
    }

    fn system(&self) -> &TridiagonalSystem {
        &self.sys
    }

    fn system_mut(&mut self) -> &mut TridiagonalSystem {
        &mut self.sys
    }

    fn constants(&self) -> String {
        self.params.describe()
    }
}
