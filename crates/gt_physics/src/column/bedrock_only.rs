// crates/gt_physics/src/column/bedrock_only.rs

//! 仅基岩方程组
//!
//! 未知量为基岩温度，层 0（最深）到 mbz-1（冰-岩界面）：
//!
//! ```text
//! 行 0      (1+2R)·T0 - 2R·T1 = T0_old + 2·dt·G/(ρc·dz)   地热通量
//! 内部行    -R·T(k-1) + (1+2R)·T(k) - R·T(k+1) = T(k)_old
//! 顶行      T(mbz-1) = T_top                               Dirichlet
//! ```

use super::{ColumnParams, ColumnSystem, SolverVariant, TridiagonalSystem};

/// 仅基岩方程组
#[derive(Debug, Clone)]
pub struct BedrockOnlySystem {
    params: ColumnParams,
    ij: (usize, usize),
    sys: TridiagonalSystem,
}

impl BedrockOnlySystem {
    /// 创建，mbz 为细网格基岩层数
    pub fn new(params: ColumnParams, mbz: usize) -> Self {
        Self {
            params,
            ij: (0, 0),
            sys: TridiagonalSystem::with_capacity(mbz),
        }
    }

    /// 组装 mbz 阶方程组
    ///
    /// `tb` 为上一步基岩温度，`geothermal` 为底部地热通量，`tb_top` 为界面温度。
    pub fn assemble(&mut self, ij: (usize, usize), tb: &[f64], geothermal: f64, tb_top: f64) {
        let n = tb.len();
        self.ij = ij;
        self.sys.clear(n);
        if n == 0 {
            return;
        }
        if n == 1 {
            self.sys.set_row(0, 0.0, 1.0, 0.0, tb_top);
            return;
        }

        let p = &self.params;
        let bed_r = p.bed_r();
        let flux_rhs = 2.0 * p.dt * geothermal / (p.bed_rho * p.bed_c * p.dz);
        self.sys.set_row(0, 0.0, 1.0 + 2.0 * bed_r, -2.0 * bed_r, tb[0] + flux_rhs);
        for k in 1..n - 1 {
            self.sys.set_row(k, -bed_r, 1.0 + 2.0 * bed_r, -bed_r, tb[k]);
        }
        self.sys.set_row(n - 1, 0.0, 1.0, 0.0, tb_top);
    }

    /// 由解求界面处向上的热通量 `-k_b·(T(n-1) - T(n-2))/dz`
    pub fn extract_heat_flux(&self, x: &[f64]) -> f64 {
        let n = self.sys.len();
        if n < 2 {
            return 0.0;
        }
        -self.params.bed_k * (x[n - 1] - x[n - 2]) / self.params.dz
    }
}

impl ColumnSystem for BedrockOnlySystem {
    fn variant(&self) -> SolverVariant {
        SolverVariant::BedrockOnly
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

#[cfg(test)]
mod tests {
    use super::*;
    use gt_config::ThermalConfig;

    #[test]
    fn test_steady_geothermal_gradient() {
        // 稳态线性廓线 T = T_top - G/k·z 满足方程组
        let config = ThermalConfig::default();
        let dz = 50.0;
        let params = ColumnParams::new(&config, 3.155e7, dz, 1.0e4, 1.0e4);
        let g = 0.042;
        let k = config.bedrock_thermal_conductivity;
        let n = 6;
        let t_top = 265.0;
        let tb: Vec<f64> = (0..n)
            .map(|m| t_top + g / k * dz * (n - 1 - m) as f64)
            .collect();

        let mut sys = BedrockOnlySystem::new(params, n);
        sys.assemble((1, 1), &tb, g, t_top);
        let mut x = vec![0.0; n];
        sys.solve(&mut x).unwrap();
        for m in 0..n {
            assert!((x[m] - tb[m]).abs() < 1e-8);
        }
        assert!((sys.extract_heat_flux(&x) - g).abs() < 1e-9);
    }

    #[test]
    fn test_single_level_is_dirichlet() {
        let params = ColumnParams::new(&ThermalConfig::default(), 1.0, 1.0, 1.0, 1.0);
        let mut sys = BedrockOnlySystem::new(params, 1);
        sys.assemble((0, 0), &[250.0], 0.05, 260.0);
        let mut x = [0.0];
        sys.solve(&mut x).unwrap();
        assert_eq!(x[0], 260.0);
        assert_eq!(sys.extract_heat_flux(&x), 0.0);
    }
}
