// crates/gt_physics/src/cts.rs

//! CTS 焓廓线与稳定性参数 λ
//!
//! 冰内各细网格层的 CTS 焓 `E_s(p(H - z))`，冰面以上取大气压下的值。
//!
//! λ 从 1 开始，逐层取 `min(λ, 2k/((|w|+1e-6 m/a)·ρc·dz))`；
//! 冰面层及以下（`0..=ks`）任一层焓不低于 CTS 焓时直接取 0（温冰存在时完全迎风）。

use crate::column::{ColumnParams, ColumnState};
use crate::enthalpy::EnthalpyConverter;

/// 计算 `state.enth_s` 与 `state.lambda`，返回 λ
///
/// 调用前 `state.enth`、`state.w` 与 `state.ks` 须已就绪。
pub fn cts_profile_and_lambda(
    ec: &dyn EnthalpyConverter,
    params: &ColumnParams,
    thickness: f64,
    zlevels: &[f64],
    state: &mut ColumnState,
) -> f64 {
    let ks = state.ks;
    let e_s_air = ec.enthalpy_cts(ec.pressure_from_depth(0.0));
    for (k, e_s) in state.enth_s.iter_mut().enumerate() {
        *e_s = if k <= ks {
            ec.enthalpy_cts(ec.pressure_from_depth(thickness - zlevels[k]))
        } else {
            e_s_air
        };
    }

    let mut lambda = 1.0_f64;
    for k in 0..=ks {
        if state.enth[k] >= state.enth_s[k] {
            lambda = 0.0;
            break;
        }
        lambda = lambda.min(params.lambda_bound(state.w[k]));
    }
    state.lambda = lambda;
    lambda
}
