// crates/gt_physics/src/column/combined.rs

//! 基岩与冰联合方程组
//!
//! 冷底接地且基岩细网格多于一层时使用。未知量统一为焓，基岩层用等效焓
//! `E_b = c_i·(T_b - T0)`，使整个方程组保持对角占优：
//!
//! ```text
//! 行 0..k0-1      基岩导热（行 0 为地热通量）
//! 行 k0=mbz-1     冰-岩界面，平均体积热容的半格能量平衡 + 摩擦热
//! 行 k0+1..k0+ks-1 冰层，同仅冰焓方程组
//! 行 k0+ks        冰面 Dirichlet
//! ```

use super::{ColumnParams, ColumnState, ColumnSystem, SolverVariant, TridiagonalSystem};

/// 联合方程组
#[derive(Debug, Clone)]
pub struct CombinedSystem {
    params: ColumnParams,
    ij: (usize, usize),
    mbz: usize,
    sys: TridiagonalSystem,
}

impl CombinedSystem {
    /// 创建，mz/mbz 为细网格冰层与基岩层数
    pub fn new(params: ColumnParams, mz: usize, mbz: usize) -> Self {
        Self {
            params,
            ij: (0, 0),
            mbz,
            sys: TridiagonalSystem::with_capacity(mz + mbz),
        }
    }

    /// 界面所在行
    #[inline]
    pub fn interface_row(&self) -> usize {
        self.mbz - 1
    }

    /// 基岩温度到等效焓
    #[inline]
    pub fn bedrock_enthalpy(&self, tb: f64) -> f64 {
        self.params.ice_c * (tb - self.params.t_ref)
    }

    /// 等效焓到基岩温度
    #[inline]
    pub fn bedrock_temperature(&self, eb: f64) -> f64 {
        eb / self.params.ice_c + self.params.t_ref
    }

    /// 组装 mbz+ks 阶方程组
    ///
    /// `geothermal` 为底部地热通量，`friction` 为基底摩擦热，`enth_ks` 为冰面焓。
    pub fn assemble(&mut self, state: &ColumnState, geothermal: f64, friction: f64, enth_ks: f64) {
        let p = &self.params;
        let ks = state.ks;
        let k0 = self.mbz - 1;
        self.ij = (state.i, state.j);
        self.sys.clear(self.mbz + ks);

        // 基岩
        let bed_r = p.bed_r();
        let flux_rhs = p.ice_c * 2.0 * p.dt * geothermal / (p.bed_rho * p.bed_c * p.dz);
        if k0 > 0 {
            let eb0 = self.bedrock_enthalpy(state.tb[0]);
            self.sys.set_row(0, 0.0, 1.0 + 2.0 * bed_r, -2.0 * bed_r, eb0 + flux_rhs);
        }
        for k in 1..k0 {
            let eb = self.bedrock_enthalpy(state.tb[k]);
            self.sys.set_row(k, -bed_r, 1.0 + 2.0 * bed_r, -bed_r, eb);
        }

        // 界面
        if ks == 0 {
            self.sys.set_row(k0, 0.0, 1.0, 0.0, enth_ks);
            return;
        }
        let rho_c_av = 0.5 * (p.ice_rho * p.ice_c + p.bed_rho * p.bed_c);
        let ice_reff = p.ice_k * p.dt / (rho_c_av * p.dz * p.dz);
        let br_reff = p.bed_k * p.dt / (rho_c_av * p.dz * p.dz);
        self.sys.set_row(
            k0,
            -br_reff,
            1.0 + ice_reff + br_reff,
            -ice_reff,
            state.enth[0] + p.ice_c * p.dt * friction / (rho_c_av * p.dz),
        );

        // 冰
        for k in 1..ks {
            let (l, d, u, rhs) = p.ice_row(state, k);
            self.sys.set_row(k0 + k, l, d, u, rhs);
        }
        self.sys.set_row(k0 + ks, 0.0, 1.0, 0.0, enth_ks);
    }
}

impl ColumnSystem for CombinedSystem {
    fn variant(&self) -> SolverVariant {
        SolverVariant::Combined
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
        format!("{}\nmbz_fine={}", self.params.describe(), self.mbz)
    }
}
