// crates/gt_physics/src/state.rs

//! ThermalState - 全部分块的热力学状态
//!
//! 持有当前场与"新"缓冲区。一步推进时各分块并行计算（每分块一个工作单元），
//! 全部成功后才交换缓冲区并对新焓做幽灵交换；任一柱失败则当前场保持不变。

use rayon::prelude::*;

use gt_config::{ThermalConfig, SECONDS_PER_YEAR};
use gt_grid::{DistributedGrid, Field2, Field3};

use crate::conversions;
use crate::coupler::{Couplers, VariableRegistry};
use crate::enthalpy::EnthalpyConverter;
use crate::error::ThermoResult;
use crate::step::{EnthalpyDrainageStep, PatchInputs, PatchOutputs, StepOptions, StepReport};

/// 当前场（每个分块一个副本）
#[derive(Debug, Clone)]
pub struct ThermalFields {
    /// 冰厚 [m]
    pub thickness: Vec<Field2<f64>>,
    /// 漂浮掩码
    pub floating: Vec<Field2<bool>>,
    /// 基底摩擦热 [W/m²]
    pub basal_frictional_heating: Vec<Field2<f64>>,
    /// 地热通量 [W/m²]
    pub geothermal_flux: Vec<Field2<f64>>,
    /// 基底储水 [m]
    pub hmelt: Vec<Field2<f64>>,
    /// 冰面温度 [K]（由大气模型填充）
    pub surface_temperature: Vec<Field2<f64>>,
    /// 冰架底部质量通量 [m/s]（由海洋模型填充）
    pub shelf_base_mass_flux: Vec<Field2<f64>>,
    /// 冰架底部温度 [K]（由海洋模型填充）
    pub shelf_base_temperature: Vec<Field2<f64>>,
    /// 焓 [J/kg]
    pub enthalpy: Vec<Field3>,
    /// 水平速度 u [m/s]
    pub u: Vec<Field3>,
    /// 水平速度 v [m/s]
    pub v: Vec<Field3>,
    /// 垂向速度 w [m/s]
    pub w: Vec<Field3>,
    /// 应变热 [W/m³]
    pub strain_heating: Vec<Field3>,
    /// 基岩温度 [K]
    pub bedrock_temperature: Vec<Field3>,
}

impl ThermalFields {
    /// 按网格分配，全部以 0 填充（漂浮掩码为 false）
    pub fn new(grid: &DistributedGrid) -> Self {
        Self {
            thickness: grid.create_field2("thk", 0.0),
            floating: grid.create_field2("floating_mask", false),
            basal_frictional_heating: grid.create_field2("bfrict", 0.0),
            geothermal_flux: grid.create_field2("bheatflx", 0.0),
            hmelt: grid.create_field2("bwat", 0.0),
            surface_temperature: grid.create_field2("artm", 0.0),
            shelf_base_mass_flux: grid.create_field2("shelfbmassflux", 0.0),
            shelf_base_temperature: grid.create_field2("shelfbtemp", 0.0),
            enthalpy: grid.create_ice_field3("enthalpy", 0.0),
            u: grid.create_ice_field3("uvel", 0.0),
            v: grid.create_ice_field3("vvel", 0.0),
            w: grid.create_ice_field3("wvel", 0.0),
            strain_heating: grid.create_ice_field3("Sigma", 0.0),
            bedrock_temperature: grid.create_bedrock_field3("litho_temp", 0.0),
        }
    }

    /// 分块个数
    pub fn patch_count(&self) -> usize {
        self.thickness.len()
    }

    /// rank 号分块的输入视图
    pub fn patch_inputs(&self, rank: usize) -> PatchInputs<'_> {
        PatchInputs {
            thickness: &self.thickness[rank],
            floating: &self.floating[rank],
            basal_frictional_heating: &self.basal_frictional_heating[rank],
            geothermal_flux: &self.geothermal_flux[rank],
            hmelt: &self.hmelt[rank],
            surface_temperature: &self.surface_temperature[rank],
            shelf_base_mass_flux: &self.shelf_base_mass_flux[rank],
            shelf_base_temperature: &self.shelf_base_temperature[rank],
            enthalpy: &self.enthalpy[rank],
            u: &self.u[rank],
            v: &self.v[rank],
            w: &self.w[rank],
            strain_heating: &self.strain_heating[rank],
            bedrock_temperature: &self.bedrock_temperature[rank],
        }
    }
}

/// 全部分块的热力学状态
#[derive(Debug, Clone)]
pub struct ThermalState {
    /// 模型时间 [a]
    pub year: f64,
    /// 当前场
    pub fields: ThermalFields,
    /// 最近一步的基底融化率 [m/s]
    pub basal_melt_rate: Vec<Field2<f64>>,
    new: Vec<PatchOutputs>,
}

impl ThermalState {
    /// 按网格分配
    pub fn new(grid: &DistributedGrid, start_year: f64) -> Self {
        let fields = ThermalFields::new(grid);
        let new = (0..fields.patch_count())
            .map(|rank| PatchOutputs {
                enthalpy: fields.enthalpy[rank].clone(),
                bedrock_temperature: fields.bedrock_temperature[rank].clone(),
                basal_melt_rate: fields.hmelt[rank].clone(),
                hmelt: fields.hmelt[rank].clone(),
            })
            .collect();
        Self {
            year: start_year,
            basal_melt_rate: grid.create_field2("bmelt", 0.0),
            fields,
            new,
        }
    }

    /// 对邻居会被读取的场（冰厚与焓）做幽灵交换
    pub fn update_ghosts(&mut self, grid: &DistributedGrid) -> ThermoResult<()> {
        grid.halo_exchange(&mut self.fields.thickness)?;
        grid.halo_exchange(&mut self.fields.enthalpy)?;
        Ok(())
    }

    /// 推进 dt_years 年
    ///
    /// 先检查配置与耦合器，再更新耦合器、填充边界场，然后在全部分块上并行推进；
    /// 只有全部分块成功才交换缓冲区、幽灵交换新焓并推进时间。
    #[allow(clippy::too_many_arguments)]
    pub fn step(
        &mut self,
        grid: &DistributedGrid,
        config: &ThermalConfig,
        ec: &dyn EnthalpyConverter,
        couplers: &mut Couplers,
        registry: &VariableRegistry,
        dt_years: f64,
        options: StepOptions,
    ) -> ThermoResult<StepReport> {
        let step = EnthalpyDrainageStep::new(
            config,
            ec,
            grid,
            dt_years * SECONDS_PER_YEAR,
            options,
        )?;

        couplers.atmosphere()?;
        couplers.ocean()?;
        couplers.update(self.year, dt_years, registry)?;
        let atmosphere = couplers.atmosphere()?;
        let ocean = couplers.ocean()?;
        for rank in 0..self.fields.patch_count() {
            atmosphere.mean_annual_temp(rank, &mut self.fields.surface_temperature[rank])?;
            ocean.shelf_base_mass_flux(rank, &mut self.fields.shelf_base_mass_flux[rank])?;
            ocean.shelf_base_temperature(rank, &mut self.fields.shelf_base_temperature[rank])?;
        }

        let fields = &self.fields;
        let reports = self
            .new
            .par_iter_mut()
            .enumerate()
            .map(|(rank, out)| step.run(&fields.patch_inputs(rank), out))
            .collect::<ThermoResult<Vec<StepReport>>>()?;

        for (rank, out) in self.new.iter_mut().enumerate() {
            std::mem::swap(&mut self.fields.enthalpy[rank], &mut out.enthalpy);
            std::mem::swap(
                &mut self.fields.bedrock_temperature[rank],
                &mut out.bedrock_temperature,
            );
            std::mem::swap(&mut self.fields.hmelt[rank], &mut out.hmelt);
            std::mem::swap(&mut self.basal_melt_rate[rank], &mut out.basal_melt_rate);
        }
        grid.halo_exchange(&mut self.fields.enthalpy)?;
        self.year += dt_years;

        let mut report = StepReport::default();
        for r in reports {
            report.merge(r);
        }
        if report.sacrificed_columns > 0 {
            log::warn!(
                "t={:.3} a: {} 柱 λ<1，以精度换取稳定",
                self.year,
                report.sacrificed_columns
            );
        }
        Ok(report)
    }

    // ============================================================
    // 场换算
    // ============================================================

    /// 由冷冰温度设置焓，并交换幽灵值
    pub fn set_enthalpy_from_temperature_cold(
        &mut self,
        grid: &DistributedGrid,
        ec: &dyn EnthalpyConverter,
        temperature: &[Field3],
    ) -> ThermoResult<()> {
        for (rank, temp) in temperature.iter().enumerate() {
            conversions::enthalpy_from_temperature_cold(
                ec,
                &self.fields.thickness[rank],
                temp,
                &mut self.fields.enthalpy[rank],
            )?;
        }
        grid.halo_exchange(&mut self.fields.enthalpy)?;
        Ok(())
    }

    /// 由温度与含水量设置焓，并交换幽灵值
    pub fn set_enthalpy_from_temperature_and_liquid_fraction(
        &mut self,
        grid: &DistributedGrid,
        ec: &dyn EnthalpyConverter,
        temperature: &[Field3],
        liquid_fraction: &[Field3],
    ) -> ThermoResult<()> {
        for (rank, (temp, omega)) in temperature.iter().zip(liquid_fraction).enumerate() {
            conversions::enthalpy_from_temperature_and_liquid_fraction(
                ec,
                &self.fields.thickness[rank],
                temp,
                omega,
                &mut self.fields.enthalpy[rank],
            )?;
        }
        grid.halo_exchange(&mut self.fields.enthalpy)?;
        Ok(())
    }

    /// 绝对温度场与完全融化层数
    pub fn temperature(
        &self,
        grid: &DistributedGrid,
        ec: &dyn EnthalpyConverter,
    ) -> ThermoResult<(Vec<Field3>, usize)> {
        let mut out = grid.create_ice_field3("temp", 0.0);
        let mut melted = 0;
        for (rank, temp) in out.iter_mut().enumerate() {
            melted += conversions::temperature_from_enthalpy(
                ec,
                &self.fields.thickness[rank],
                &self.fields.enthalpy[rank],
                temp,
            )?;
        }
        Ok((out, melted))
    }

    /// 含水量场
    pub fn liquid_fraction(
        &self,
        grid: &DistributedGrid,
        ec: &dyn EnthalpyConverter,
    ) -> ThermoResult<Vec<Field3>> {
        let mut out = grid.create_ice_field3("liqfrac", 0.0);
        for (rank, omega) in out.iter_mut().enumerate() {
            conversions::liquid_fraction_from_enthalpy(
                ec,
                &self.fields.thickness[rank],
                &self.fields.enthalpy[rank],
                omega,
            )?;
        }
        Ok(out)
    }

    /// 压力修正温度场与完全融化层数
    pub fn pressure_adjusted_temperature(
        &self,
        grid: &DistributedGrid,
        ec: &dyn EnthalpyConverter,
    ) -> ThermoResult<(Vec<Field3>, usize)> {
        let mut out = grid.create_ice_field3("temp_pa", 0.0);
        let mut melted = 0;
        for (rank, pa) in out.iter_mut().enumerate() {
            melted += conversions::pressure_adjusted_temperature_from_enthalpy(
                ec,
                &self.fields.thickness[rank],
                &self.fields.enthalpy[rank],
                pa,
            )?;
        }
        Ok((out, melted))
    }

    /// CTS 比值场
    pub fn cts(&self, grid: &DistributedGrid, ec: &dyn EnthalpyConverter) -> ThermoResult<Vec<Field3>> {
        let mut out = grid.create_ice_field3("cts", 0.0);
        for (rank, cts) in out.iter_mut().enumerate() {
            conversions::cts_from_enthalpy(
                ec,
                &self.fields.thickness[rank],
                &self.fields.enthalpy[rank],
                cts,
            )?;
        }
        Ok(out)
    }
}
