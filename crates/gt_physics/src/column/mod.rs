// crates/gt_physics/src/column/mod.rs

//! 柱方程组
//!
//! 每个水平格点的垂向柱在等间距细网格上离散为三对角方程组，隐式推进一个时间步。
//! 三种变体共享同一生命周期：组装 → 求解 → （可选）查看：
//!
//! - [`IceEnthalpySystem`]: 冰层焓的扩散-平流-源项方程，底行按基底状态选取
//! - [`BedrockOnlySystem`]: 基岩纯导热，顶部 Dirichlet、底部地热通量
//! - [`CombinedSystem`]: 冷底接地且基岩多于一层时，基岩与冰联合求解
//!
//! 逐柱工作数组放在 [`ColumnState`] 中，每个工作单元分配一份并逐柱复用。

mod bedrock_only;
mod combined;
mod ice_only;
mod report;
mod tridiagonal;

pub use bedrock_only::BedrockOnlySystem;
pub use combined::CombinedSystem;
pub use ice_only::{warm_base_alpha, IceEnthalpySystem, Level0Eqn};
pub use report::{ColumnDiagnostics, ColumnView, SolverVariant};
pub use tridiagonal::TridiagonalSystem;

use gt_config::{ThermalConfig, SECONDS_PER_YEAR};
use gt_grid::PlaneStar;

use crate::error::{ThermoError, ThermoResult};

// ============================================================
// 常数
// ============================================================

/// 单柱求解所需的物理与离散常数
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnParams {
    /// 时间步长 [s]
    pub dt: f64,
    /// 细网格间距 [m]
    pub dz: f64,
    /// x 方向间距 [m]
    pub dx: f64,
    /// y 方向间距 [m]
    pub dy: f64,
    /// 冰密度
    pub ice_rho: f64,
    /// 冰比热
    pub ice_c: f64,
    /// 冰热导率
    pub ice_k: f64,
    /// 焓零点温度
    pub t_ref: f64,
    /// 基岩密度
    pub bed_rho: f64,
    /// 基岩比热
    pub bed_c: f64,
    /// 基岩热导率
    pub bed_k: f64,
}

impl ColumnParams {
    /// 由配置与离散参数创建
    pub fn new(config: &ThermalConfig, dt: f64, dz: f64, dx: f64, dy: f64) -> Self {
        Self {
            dt,
            dz,
            dx,
            dy,
            ice_rho: config.ice_density,
            ice_c: config.ice_specific_heat_capacity,
            ice_k: config.ice_thermal_conductivity,
            t_ref: config.enthalpy_reference_temperature,
            bed_rho: config.bedrock_thermal_density,
            bed_c: config.bedrock_thermal_specific_heat_capacity,
            bed_k: config.bedrock_thermal_conductivity,
        }
    }

    /// 冰的焓扩散数 `(k/c)·dt / (ρ·dz²)`
    #[inline]
    pub fn ice_r(&self) -> f64 {
        (self.ice_k / self.ice_c) * self.dt / (self.ice_rho * self.dz * self.dz)
    }

    /// 基岩扩散数 `k_b·dt / (ρ_b·c_b·dz²)`
    #[inline]
    pub fn bed_r(&self) -> f64 {
        self.bed_k * self.dt / (self.bed_rho * self.bed_c * self.dz * self.dz)
    }

    /// 垂向平流数 `dt/dz`
    #[inline]
    pub fn nu(&self) -> f64 {
        self.dt / self.dz
    }

    /// 冷底通量条件的比例系数 `c·dz/k`
    #[inline]
    pub fn flux_scale(&self) -> f64 {
        self.ice_c * self.dz / self.ice_k
    }

    /// 单层的 λ 上限 `2k / ((|w| + 1e-6 m/a)·ρc·dz)`
    #[inline]
    pub fn lambda_bound(&self, w: f64) -> f64 {
        let denom = (w.abs() + 1.0e-6 / SECONDS_PER_YEAR) * self.ice_rho * self.ice_c * self.dz;
        2.0 * self.ice_k / denom
    }

    /// 冰内部第 k 行 (L, D, U, rhs)
    ///
    /// λ=1 为中心隐式格式，λ<1 向迎风格式混合。
    pub fn ice_row(&self, state: &ColumnState, k: usize) -> (f64, f64, f64, f64) {
        let ice_r = self.ice_r();
        let aa = self.nu() * state.w[k];
        let lambda = state.lambda;
        let (l, d, u) = if state.w[k] >= 0.0 {
            (
                -ice_r - aa * (1.0 - lambda / 2.0),
                1.0 + 2.0 * ice_r + aa * (1.0 - lambda),
                -ice_r + aa * (lambda / 2.0),
            )
        } else {
            (
                -ice_r - aa * (lambda / 2.0),
                1.0 + 2.0 * ice_r - aa * (1.0 - lambda),
                -ice_r + aa * (1.0 - lambda / 2.0),
            )
        };
        (l, d, u, self.ice_rhs(state, k))
    }

    /// 第 k 层的显式部分：上一步焓加应变热与水平迎风平流
    ///
    /// 边缘薄冰省略应变热与水平平流。
    pub fn ice_rhs(&self, state: &ColumnState, k: usize) -> f64 {
        let s = state.star[k];
        if state.is_marginal {
            return s.ij;
        }
        let u = state.u[k];
        let v = state.v[k];
        let up_u = if u < 0.0 {
            u * (s.ip1 - s.ij) / self.dx
        } else {
            u * (s.ij - s.im1) / self.dx
        };
        let up_v = if v < 0.0 {
            v * (s.jp1 - s.ij) / self.dy
        } else {
            v * (s.ij - s.jm1) / self.dy
        };
        s.ij + self.dt * (state.sigma[k] / self.ice_rho - up_u - up_v)
    }

    /// 常数说明文本
    pub fn describe(&self) -> String {
        format!(
            "dt={:.6e} s dz={:.6e} m dx={:.6e} m dy={:.6e} m\n\
             ice: rho={:.3} c={:.3} k={:.4} iceR={:.6e} nu={:.6e}\n\
             bedrock: rho={:.3} c={:.3} k={:.4} bedR={:.6e}",
            self.dt,
            self.dz,
            self.dx,
            self.dy,
            self.ice_rho,
            self.ice_c,
            self.ice_k,
            self.ice_r(),
            self.nu(),
            self.bed_rho,
            self.bed_c,
            self.bed_k,
            self.bed_r()
        )
    }
}

// ============================================================
// 逐柱工作数组
// ============================================================

/// 逐柱工作数组（细网格）
///
/// 同一工作单元内的各柱依次复用，每柱开始时调用 [`ColumnState::set_indices_and_clear`]。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnState {
    /// i 索引
    pub i: usize,
    /// j 索引
    pub j: usize,
    /// 冰面所在细网格层
    pub ks: usize,
    /// 焓
    pub enth: Vec<f64>,
    /// 焓的水平五点模板
    pub star: Vec<PlaneStar>,
    /// CTS 焓
    pub enth_s: Vec<f64>,
    /// 水平速度 u
    pub u: Vec<f64>,
    /// 水平速度 v
    pub v: Vec<f64>,
    /// 垂向速度 w
    pub w: Vec<f64>,
    /// 应变热 Σ [W/m³]
    pub sigma: Vec<f64>,
    /// 基岩温度
    pub tb: Vec<f64>,
    /// 稳定性参数 λ ∈ [0, 1]
    pub lambda: f64,
    /// 是否为边缘薄冰
    pub is_marginal: bool,
}

impl ColumnState {
    /// 为 mz 个冰层、mbz 个基岩层分配
    pub fn new(mz: usize, mbz: usize) -> Self {
        Self {
            enth: vec![0.0; mz],
            star: vec![PlaneStar::default(); mz],
            enth_s: vec![0.0; mz],
            u: vec![0.0; mz],
            v: vec![0.0; mz],
            w: vec![0.0; mz],
            sigma: vec![0.0; mz],
            tb: vec![0.0; mbz],
            lambda: 1.0,
            ..Default::default()
        }
    }

    /// 冰层数
    #[inline]
    pub fn mz(&self) -> usize {
        self.enth.len()
    }

    /// 基岩层数
    #[inline]
    pub fn mbz(&self) -> usize {
        self.tb.len()
    }

    /// 开始新的一柱
    pub fn set_indices_and_clear(&mut self, i: usize, j: usize, ks: usize) -> ThermoResult<()> {
        if ks >= self.mz() {
            return Err(ThermoError::invalid_configuration(format!(
                "冰面层 ks={ks} 超出细网格层数 {}",
                self.mz()
            )));
        }
        self.i = i;
        self.j = j;
        self.ks = ks;
        self.lambda = 1.0;
        self.is_marginal = false;
        for buf in [
            &mut self.enth,
            &mut self.enth_s,
            &mut self.u,
            &mut self.v,
            &mut self.w,
            &mut self.sigma,
            &mut self.tb,
        ] {
            buf.iter_mut().for_each(|x| *x = 0.0);
        }
        self.star.iter_mut().for_each(|s| *s = PlaneStar::default());
        Ok(())
    }

    /// 由模板中心同步焓
    pub fn sync_enthalpy_from_star(&mut self) {
        for (e, s) in self.enth.iter_mut().zip(self.star.iter()) {
            *e = s.ij;
        }
    }

    /// 设置焓，邻居取相同值（水平均匀）
    pub fn set_uniform_enthalpy(&mut self, values: &[f64]) {
        for (k, &e) in values.iter().enumerate().take(self.mz()) {
            self.enth[k] = e;
            self.star[k] = PlaneStar {
                ij: e,
                ip1: e,
                im1: e,
                jp1: e,
                jm1: e,
            };
        }
    }
}

// ============================================================
// 公共接口
// ============================================================

/// 柱方程组公共能力：求解与查看
pub trait ColumnSystem {
    /// 变体
    fn variant(&self) -> SolverVariant;

    /// 当前柱 (i, j)
    fn indices(&self) -> (usize, usize);

    /// 已组装的方程组
    fn system(&self) -> &TridiagonalSystem;

    /// 已组装的方程组（求解用）
    fn system_mut(&mut self) -> &mut TridiagonalSystem;

    /// 常数说明
    fn constants(&self) -> String;

    /// 求解，解写入 `x[..n]`
    ///
    /// 零主元时返回带完整诊断的 [`ThermoError::SingularSystem`]。
    fn solve(&mut self, x: &mut [f64]) -> ThermoResult<()> {
        let variant = self.variant();
        let ij = self.indices();
        let sys = self.system_mut();
        match sys.solve(x) {
            Ok(()) => Ok(()),
            Err(pivot) => Err(ThermoError::SingularSystem(Box::new(
                ColumnDiagnostics::new(variant, ij, pivot, sys),
            ))),
        }
    }

    /// 方程组与解的快照
    fn view(&self, solution: &[f64]) -> ColumnView {
        let (i, j) = self.indices();
        let n = self.system().len();
        ColumnView {
            variant: self.variant(),
            i,
            j,
            system: self.system().clone(),
            solution: solution[..n.min(solution.len())].to_vec(),
            constants: self.constants(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ice_row_centered_is_symmetric_without_advection() {
        let params = ColumnParams::new(&ThermalConfig::default(), 3.15e7, 10.0, 1.0e4, 1.0e4);
        let mut state = ColumnState::new(5, 1);
        state.set_indices_and_clear(0, 0, 4).unwrap();
        state.set_uniform_enthalpy(&[1.0e5; 5]);
        let (l, d, u, rhs) = params.ice_row(&state, 2);
        assert!((l - u).abs() < 1e-15);
        assert!((d - 1.0 - 2.0 * params.ice_r()).abs() < 1e-12);
        assert!((rhs - 1.0e5).abs() < 1e-9);
    }

    #[test]
    fn test_ice_row_upwind_with_lambda_zero() {
        let params = ColumnParams::new(&ThermalConfig::default(), 1.0e6, 10.0, 1.0e4, 1.0e4);
        let mut state = ColumnState::new(5, 1);
        state.set_indices_and_clear(0, 0, 4).unwrap();
        state.lambda = 0.0;
        state.w[2] = -1.0e-6;
        let (_, d, u, _) = params.ice_row(&state, 2);
        let aa = params.nu() * state.w[2];
        assert!((d - (1.0 + 2.0 * params.ice_r() - aa)).abs() < 1e-12);
        assert!((u - (-params.ice_r() + aa)).abs() < 1e-12);
    }

    #[test]
    fn test_marginal_drops_explicit_terms() {
        let params = ColumnParams::new(&ThermalConfig::default(), 1.0e6, 10.0, 1.0e4, 1.0e4);
        let mut state = ColumnState::new(3, 1);
        state.set_indices_and_clear(0, 0, 2).unwrap();
        state.star[1] = PlaneStar {
            ij: 10.0,
            ip1: 20.0,
            im1: 0.0,
            jp1: 10.0,
            jm1: 10.0,
        };
        state.u[1] = 1.0e-5;
        state.sigma[1] = 1.0e-3;
        let full = params.ice_rhs(&state, 1);
        state.is_marginal = true;
        assert_eq!(params.ice_rhs(&state, 1), 10.0);
        let expected = 10.0 + 1.0e6 * (1.0e-3 / 910.0 - 1.0e-5 * 10.0 / 1.0e4);
        assert!((full - expected).abs() < 1e-9);
    }

    #[test]
    fn test_surface_index_checked() {
        let mut state = ColumnState::new(3, 1);
        assert!(state.set_indices_and_clear(0, 0, 3).is_err());
    }
}
