// crates/gt_physics/src/coupler/mod.rs

//! 气候耦合器
//!
//! 热力学步只通过以下接口读取边界数据：
//!
//! - [`AtmosphereModel`]: 冰面温度（年均）、瞬时温度与单点时间序列
//! - [`OceanModel`]: 冰架底部质量通量与温度
//!
//! 各模型先 `update(t, dt)`，再按分块编号把结果写入调用方的二维场。
//! 时间单位为年。

mod fausto;
mod registry;
mod uniform;

pub use fausto::FaustoAtmosphere;
pub use registry::VariableRegistry;
pub use uniform::{UniformAtmosphere, UniformOcean};

use gt_config::{AtmosphereConfig, OceanConfig};
use gt_grid::Field2;

use crate::error::{ThermoError, ThermoResult};

/// 大气模型
pub trait AtmosphereModel: Send + Sync {
    /// 模型名
    fn name(&self) -> &str;

    /// 更新到时段 [t, t+dt]
    fn update(&mut self, t_years: f64, dt_years: f64, registry: &VariableRegistry)
        -> ThermoResult<()>;

    /// 年均近地面气温（用作冰面温度），写入 rank 号分块的拥有格点
    fn mean_annual_temp(&self, rank: usize, out: &mut Field2<f64>) -> ThermoResult<()>;

    /// t 时刻的瞬时气温
    fn temp_snapshot(&self, t_years: f64, rank: usize, out: &mut Field2<f64>) -> ThermoResult<()>;

    /// 格点 (i, j) 在各时刻 ts 的气温
    fn temp_time_series(&self, i: usize, j: usize, ts: &[f64], values: &mut [f64])
        -> ThermoResult<()>;
}

/// 海洋模型
pub trait OceanModel: Send + Sync {
    /// 模型名
    fn name(&self) -> &str;

    /// 更新到时段 [t, t+dt]
    fn update(&mut self, t_years: f64, dt_years: f64) -> ThermoResult<()>;

    /// 冰架底部质量通量 [m/s]
    fn shelf_base_mass_flux(&self, rank: usize, out: &mut Field2<f64>) -> ThermoResult<()>;

    /// 冰架底部温度 [K]
    fn shelf_base_temperature(&self, rank: usize, out: &mut Field2<f64>) -> ThermoResult<()>;
}

/// 耦合器集合
#[derive(Default)]
pub struct Couplers {
    /// 大气模型
    pub atmosphere: Option<Box<dyn AtmosphereModel>>,
    /// 海洋模型
    pub ocean: Option<Box<dyn OceanModel>>,
}

impl Couplers {
    /// 按配置创建
    pub fn from_config(atmosphere: &AtmosphereConfig, ocean: &OceanConfig) -> Self {
        let atmosphere: Box<dyn AtmosphereModel> = match atmosphere {
            AtmosphereConfig::Uniform { temperature } => {
                Box::new(UniformAtmosphere::new(*temperature))
            }
            AtmosphereConfig::Fausto(config) => Box::new(FaustoAtmosphere::new(config.clone())),
        };
        Self {
            atmosphere: Some(atmosphere),
            ocean: Some(Box::new(UniformOcean::new(ocean))),
        }
    }

    /// 大气模型，缺失时报错
    pub fn atmosphere(&self) -> ThermoResult<&dyn AtmosphereModel> {
        self.atmosphere
            .as_deref()
            .ok_or_else(|| ThermoError::missing("atmosphere model"))
    }

    /// 海洋模型，缺失时报错
    pub fn ocean(&self) -> ThermoResult<&dyn OceanModel> {
        self.ocean
            .as_deref()
            .ok_or_else(|| ThermoError::missing("ocean model"))
    }

    /// 更新两个模型
    pub fn update(
        &mut self,
        t_years: f64,
        dt_years: f64,
        registry: &VariableRegistry,
    ) -> ThermoResult<()> {
        self.atmosphere
            .as_deref_mut()
            .ok_or_else(|| ThermoError::missing("atmosphere model"))?
            .update(t_years, dt_years, registry)?;
        self.ocean
            .as_deref_mut()
            .ok_or_else(|| ThermoError::missing("ocean model"))?
            .update(t_years, dt_years)
    }
}

impl std::fmt::Debug for Couplers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Couplers")
            .field("atmosphere", &self.atmosphere.as_ref().map(|m| m.name()))
            .field("ocean", &self.ocean.as_ref().map(|m| m.name()))
            .finish()
    }
}

/// 按 gsl_fcmp 语义比较：差值不超过 eps 乘以较大者的二进制量级
pub(crate) fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
    let max = a.abs().max(b.abs());
    let scale = if max == 0.0 {
        1.0
    } else {
        2.0_f64.powi(max.log2().floor() as i32 + 1)
    };
    (a - b).abs() <= eps * scale
}

/// 对 rank 号分块的拥有格点逐点写值
pub(crate) fn fill_owned(
    out: &mut Field2<f64>,
    mut value: impl FnMut(usize, usize) -> ThermoResult<f64>,
) -> ThermoResult<()> {
    let patch = *out.patch();
    for (i, j) in patch.owned() {
        let v = value(i, j)?;
        out.set(i, j, v)?;
    }
    Ok(())
}
