// crates/gt_physics/src/step.rs

//! EnthalpyDrainageStep - 焓与排水的单步推进
//!
//! 对分块内每个拥有的水平格点：
//!
//! 1. `ks = floor(H / dz_fine)`，判定是否为边缘薄冰（八邻居冰厚均低于阈值）
//! 2. 计算 CTS 焓廓线与 λ
//! 3. 基底分类并选择方程组：
//!    - 冷底接地且有多层基岩：联合方程组，基底融化率为 0
//!    - 其余：先解基岩（若有）得界面热通量，再求融化率与底行，解仅冰焓方程组
//! 4. 累计基底储水，排出超限液态水
//! 5. 写入新焓、新基岩温度、融化率与储水
//!
//! 只写 `PatchOutputs`，不读写其他分块；新焓的幽灵交换由调用方在全部分块完成后进行。

use gt_config::ThermalConfig;
use gt_grid::{DistributedGrid, Field2, Field3};

use crate::basal::BasalState;
use crate::column::{
    warm_base_alpha, BedrockOnlySystem, ColumnParams, ColumnState, ColumnSystem, ColumnView,
    CombinedSystem, IceEnthalpySystem, Level0Eqn,
};
use crate::cts::cts_profile_and_lambda;
use crate::drainage::drain_excess_liquid;
use crate::enthalpy::{EnthalpyConverter, EnthalpyError};
use crate::error::{ThermoError, ThermoResult};

// ============================================================
// 输入输出
// ============================================================

/// 单个分块的输入（上一步状态与本步耦合数据）
///
/// `thickness` 与 `enthalpy` 须在调用前完成幽灵交换。
#[derive(Debug, Clone, Copy)]
pub struct PatchInputs<'a> {
    /// 冰厚 [m]
    pub thickness: &'a Field2<f64>,
    /// 漂浮掩码
    pub floating: &'a Field2<bool>,
    /// 基底摩擦热 [W/m²]
    pub basal_frictional_heating: &'a Field2<f64>,
    /// 地热通量 [W/m²]
    pub geothermal_flux: &'a Field2<f64>,
    /// 基底储水厚度 [m]
    pub hmelt: &'a Field2<f64>,
    /// 冰面温度 [K]
    pub surface_temperature: &'a Field2<f64>,
    /// 冰架底部质量通量 [m/s]
    pub shelf_base_mass_flux: &'a Field2<f64>,
    /// 冰架底部温度 [K]
    pub shelf_base_temperature: &'a Field2<f64>,
    /// 焓 [J/kg]
    pub enthalpy: &'a Field3,
    /// 水平速度 u [m/s]
    pub u: &'a Field3,
    /// 水平速度 v [m/s]
    pub v: &'a Field3,
    /// 垂向速度 w [m/s]
    pub w: &'a Field3,
    /// 应变热 [W/m³]
    pub strain_heating: &'a Field3,
    /// 基岩温度 [K]
    pub bedrock_temperature: &'a Field3,
}

/// 单个分块的输出（新缓冲区，不与输入共享）
#[derive(Debug, Clone)]
pub struct PatchOutputs {
    /// 新焓
    pub enthalpy: Field3,
    /// 新基岩温度
    pub bedrock_temperature: Field3,
    /// 基底融化率 [m/s]
    pub basal_melt_rate: Field2<f64>,
    /// 新基底储水厚度 [m]
    pub hmelt: Field2<f64>,
}

/// 选项
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepOptions {
    /// 探测柱，记录其方程组与解
    pub sounding: Option<(usize, usize)>,
}

/// 单步诊断
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepReport {
    /// λ<1（牺牲精度）的柱数
    pub sacrificed_columns: usize,
    /// 完全融化的层数：排水前的冰层，加上联合方程组界面值
    pub liquified_count: usize,
    /// 完全融化的冰当量体积 [m³]
    pub liquified_volume: f64,
    /// 使用联合方程组的柱数
    pub combined_columns: usize,
    /// 求解基岩方程组的柱数
    pub bedrock_only_columns: usize,
    /// 求解仅冰焓方程组的柱数
    pub ice_only_columns: usize,
    /// 回算基底温度时完全融化而取融点的次数
    pub fully_melted: usize,
    /// 探测柱的方程组快照
    pub views: Vec<ColumnView>,
}

impl StepReport {
    /// 合并另一分块的诊断
    pub fn merge(&mut self, other: StepReport) {
        self.sacrificed_columns += other.sacrificed_columns;
        self.liquified_count += other.liquified_count;
        self.liquified_volume += other.liquified_volume;
        self.combined_columns += other.combined_columns;
        self.bedrock_only_columns += other.bedrock_only_columns;
        self.ice_only_columns += other.ice_only_columns;
        self.fully_melted += other.fully_melted;
        self.views.extend(other.views);
    }
}

// ============================================================
// 单步推进
// ============================================================

/// 焓与排水单步
pub struct EnthalpyDrainageStep<'a> {
    config: ThermalConfig,
    ec: &'a dyn EnthalpyConverter,
    grid: &'a DistributedGrid,
    params: ColumnParams,
    options: StepOptions,
}

impl<'a> EnthalpyDrainageStep<'a> {
    /// 创建
    ///
    /// 基岩细网格恰为两层时联合方程组无法表示界面，返回
    /// [`ThermoError::InvalidConfiguration`]。
    pub fn new(
        config: &ThermalConfig,
        ec: &'a dyn EnthalpyConverter,
        grid: &'a DistributedGrid,
        dt: f64,
        options: StepOptions,
    ) -> ThermoResult<Self> {
        config.validate()?;
        if !(dt > 0.0) {
            return Err(ThermoError::invalid_configuration(format!(
                "时间步长 dt={dt} s 必须为正"
            )));
        }
        let fine = grid.fine();
        if fine.mbz() == 2 {
            return Err(ThermoError::invalid_configuration(
                "基岩细网格恰为两层，联合方程组无法表示",
            ));
        }
        let params = ColumnParams::new(config, dt, fine.dz, grid.dx(), grid.dy());
        log::debug!("{}", ec.describe());
        log::debug!("柱方程组常数:\n{}", params.describe());
        Ok(Self {
            config: config.clone(),
            ec,
            grid,
            params,
            options,
        })
    }

    /// 柱方程组常数
    pub fn params(&self) -> &ColumnParams {
        &self.params
    }

    /// 推进一个分块
    pub fn run(&self, inputs: &PatchInputs<'_>, outputs: &mut PatchOutputs) -> ThermoResult<StepReport> {
        let thickness = inputs.thickness;
        ThermoError::check_ghosts(thickness.name(), thickness.ghosts_valid())?;
        ThermoError::check_ghosts(inputs.enthalpy.name(), inputs.enthalpy.ghosts_valid())?;
        let patch = *thickness.patch();
        if *outputs.enthalpy.patch() != patch {
            return Err(ThermoError::invalid_configuration(format!(
                "输出分块 {} 与输入分块 {} 不一致",
                outputs.enthalpy.patch(),
                patch
            )));
        }

        let ec = self.ec;
        let config = &self.config;
        let params = &self.params;
        let fine = self.grid.fine();
        let (mz, mbz) = (fine.mz(), fine.mbz());
        let dz = fine.dz;
        let lz = self.grid.vertical().lz;
        let z = &fine.zlevels;
        let latent = config.water_latent_heat_fusion;
        let window = config.warm_base_enthalpy_window();

        let mut state = ColumnState::new(mz, mbz);
        let mut ice = IceEnthalpySystem::new(params.clone(), mz);
        let mut bedrock = BedrockOnlySystem::new(params.clone(), mbz);
        let mut combined = CombinedSystem::new(params.clone(), mz, mbz);
        let mut x = vec![0.0; mz + mbz];
        let mut enth_new = vec![0.0; mz];
        let mut tb_new = vec![0.0; mbz];
        let mut report = StepReport::default();

        for (i, j) in patch.owned() {
            let (ii, jj) = (i as isize, j as isize);

            // 1. 冰面层与边缘判定
            let h = thickness.get(ii, jj)?;
            if !(h >= 0.0 && h <= lz) {
                return Err(ThermoError::IceExceedsGrid {
                    i,
                    j,
                    thickness: h,
                    lz,
                });
            }
            let ks = ((h / dz).floor() as usize).min(mz - 1);
            state.set_indices_and_clear(i, j, ks)?;
            state.is_marginal = thickness
                .neighbors(i, j)?
                .iter()
                .all(|&n| n < config.marginal_ice_thickness);

            inputs.enthalpy.fine_plane_star(i, j, fine, &mut state.star)?;
            state.sync_enthalpy_from_star();
            inputs.u.fine_column(i, j, fine, &mut state.u)?;
            inputs.v.fine_column(i, j, fine, &mut state.v)?;
            inputs.w.fine_column(i, j, fine, &mut state.w)?;
            inputs.strain_heating.fine_column(i, j, fine, &mut state.sigma)?;
            inputs.bedrock_temperature.fine_column(i, j, fine, &mut state.tb)?;

            // 2. CTS 与 λ
            let lambda = cts_profile_and_lambda(ec, params, h, z, &mut state);
            if lambda < 1.0 {
                report.sacrificed_columns += 1;
            }

            let floating = inputs.floating.values(ii, jj)?[0];
            let geothermal = inputs.geothermal_flux.get(ii, jj)?;
            let friction = inputs.basal_frictional_heating.get(ii, jj)?;
            let p_basal = ec.pressure_from_depth(h);
            let artm = inputs.surface_temperature.get(ii, jj)?;
            let enth_ks = ec.enthalpy_permissive(artm, 0.0, ec.pressure_from_depth(h - z[ks]));

            let e0 = state.enth[0];
            let e_s0 = state.enth_s[0];
            let basal = BasalState::classify(e0, e_s0, floating, mbz);
            let sounding = self.options.sounding == Some((i, j));
            log::trace!("柱 ({i}, {j}): H={h:.2} ks={ks} λ={lambda:.4} 基底{basal}");

            // 3. 求解
            let mut melt;
            if basal.uses_combined() {
                combined.assemble(&state, geothermal, friction, enth_ks);
                combined.solve(&mut x)?;
                if sounding {
                    report.views.push(combined.view(&x));
                }
                report.combined_columns += 1;

                let k0 = combined.interface_row();
                for k in 0..k0 {
                    tb_new[k] = combined.bedrock_temperature(x[k]);
                }
                let (tb, melted) = self.basal_temperature(x[k0], p_basal)?;
                if melted {
                    report.fully_melted += 1;
                    report.liquified_count += 1;
                }
                tb_new[k0] = tb;
                enth_new[..=ks].copy_from_slice(&x[k0..=k0 + ks]);
                melt = 0.0;
            } else {
                let hf_base = if mbz > 1 {
                    let tb_top = if floating {
                        inputs.shelf_base_temperature.get(ii, jj)?
                    } else {
                        ec.melting_temperature(p_basal)
                    };
                    bedrock.assemble((i, j), &state.tb, geothermal, tb_top);
                    bedrock.solve(&mut x)?;
                    if sounding {
                        report.views.push(bedrock.view(&x));
                    }
                    report.bedrock_only_columns += 1;
                    tb_new.copy_from_slice(&x[..mbz]);
                    bedrock.extract_heat_flux(&x)
                } else {
                    geothermal
                };

                melt = if floating {
                    inputs.shelf_base_mass_flux.get(ii, jj)?
                } else if basal == BasalState::GroundedColdNoBedrock {
                    0.0
                } else {
                    (hf_base + friction) / (config.ice_density * latent)
                };

                let level0 = if floating {
                    Level0Eqn::outflow(params, &state)
                } else if basal == BasalState::GroundedColdNoBedrock {
                    Level0Eqn::neumann(params, hf_base + friction)
                } else {
                    let alpha = warm_base_alpha(e0, e_s0, window);
                    melt *= 1.0 - alpha;
                    Level0Eqn::outflow(params, &state)
                        .blend(Level0Eqn::neumann(params, hf_base + friction), alpha)
                };

                ice.assemble(&state, level0, enth_ks);
                ice.solve(&mut x)?;
                if sounding {
                    report.views.push(ice.view(&x));
                }
                report.ice_only_columns += 1;
                enth_new[..=ks].copy_from_slice(&x[..=ks]);
            }
            for e in enth_new[ks + 1..].iter_mut() {
                *e = enth_ks;
            }

            // 4. 储水与排水
            let hmelt_old = inputs.hmelt.get(ii, jj)?;
            let mut hmelt = hmelt_old;
            if !floating {
                hmelt += melt * params.dt;
            }
            let mut drained = 0.0;
            for k in 0..ks {
                let p = ec.pressure_from_depth(h - z[k]);
                if ec.is_liquified(enth_new[k], p) {
                    report.liquified_count += 1;
                }
                let (e, d) = drain_excess_liquid(
                    ec,
                    config.liquid_water_fraction_max,
                    h,
                    z[k],
                    dz,
                    enth_new[k],
                );
                enth_new[k] = e;
                drained += d;
            }
            if !floating {
                melt += drained / params.dt;
                hmelt += drained;
            }

            if mbz == 1 {
                tb_new[0] = if floating {
                    inputs.shelf_base_temperature.get(ii, jj)?
                } else {
                    let (tb, melted) = self.basal_temperature(enth_new[0], p_basal)?;
                    if melted {
                        report.fully_melted += 1;
                    }
                    tb
                };
            }

            let hmelt = if !config.update_hmelt {
                hmelt_old
            } else if floating {
                config.hmelt_max
            } else if ks == 0 {
                0.0
            } else {
                hmelt.clamp(0.0, config.hmelt_max)
            };

            // 5. 写入
            outputs.enthalpy.set_fine_column(i, j, fine, &enth_new)?;
            outputs.bedrock_temperature.set_fine_column(i, j, fine, &tb_new)?;
            outputs.basal_melt_rate.set(i, j, melt)?;
            outputs.hmelt.set(i, j, hmelt)?;
        }

        report.liquified_volume =
            report.liquified_count as f64 * dz * self.grid.dx() * self.grid.dy();
        if report.liquified_count > 0 {
            log::warn!(
                "分块 {}: {} 层完全融化, 冰当量体积 {:.3e} m³",
                patch,
                report.liquified_count,
                report.liquified_volume
            );
        }
        Ok(report)
    }

    /// 基底温度与是否完全融化；完全融化时取压力融点
    fn basal_temperature(&self, enthalpy: f64, pressure: f64) -> ThermoResult<(f64, bool)> {
        match self.ec.absolute_temperature(enthalpy, pressure) {
            Ok(t) => Ok((t, false)),
            Err(EnthalpyError::FullyMelted { .. }) => {
                Ok((self.ec.melting_temperature(pressure), true))
            }
            Err(e) => Err(e.into()),
        }
    }
}
