// crates/gt_physics/src/coupler/uniform.rs

//! 全域均匀的大气与海洋模型

use gt_config::OceanConfig;
use gt_grid::Field2;

use super::{fill_owned, AtmosphereModel, OceanModel, VariableRegistry};
use crate::error::ThermoResult;

/// 均匀冰面温度
#[derive(Debug, Clone, PartialEq)]
pub struct UniformAtmosphere {
    temperature: f64,
}

impl UniformAtmosphere {
    /// 创建
    pub fn new(temperature: f64) -> Self {
        Self { temperature }
    }
}

impl AtmosphereModel for UniformAtmosphere {
    fn name(&self) -> &str {
        "uniform"
    }

    fn update(&mut self, _t: f64, _dt: f64, _registry: &VariableRegistry) -> ThermoResult<()> {
        Ok(())
    }

    fn mean_annual_temp(&self, _rank: usize, out: &mut Field2<f64>) -> ThermoResult<()> {
        fill_owned(out, |_, _| Ok(self.temperature))
    }

    fn temp_snapshot(&self, _t: f64, rank: usize, out: &mut Field2<f64>) -> ThermoResult<()> {
        self.mean_annual_temp(rank, out)
    }

    fn temp_time_series(
        &self,
        _i: usize,
        _j: usize,
        _ts: &[f64],
        values: &mut [f64],
    ) -> ThermoResult<()> {
        values.iter_mut().for_each(|v| *v = self.temperature);
        Ok(())
    }
}

/// 均匀冰架底部条件
#[derive(Debug, Clone, PartialEq)]
pub struct UniformOcean {
    mass_flux: f64,
    temperature: f64,
}

impl UniformOcean {
    /// 由配置创建
    pub fn new(config: &OceanConfig) -> Self {
        Self {
            mass_flux: config.shelf_base_mass_flux,
            temperature: config.shelf_base_temperature,
        }
    }
}

impl OceanModel for UniformOcean {
    fn name(&self) -> &str {
        "uniform"
    }

    fn update(&mut self, _t: f64, _dt: f64) -> ThermoResult<()> {
        Ok(())
    }

    fn shelf_base_mass_flux(&self, _rank: usize, out: &mut Field2<f64>) -> ThermoResult<()> {
        fill_owned(out, |_, _| Ok(self.mass_flux))
    }

    fn shelf_base_temperature(&self, _rank: usize, out: &mut Field2<f64>) -> ThermoResult<()> {
        fill_owned(out, |_, _| Ok(self.temperature))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_grid::HorizontalPatch;

    fn field() -> Field2<f64> {
        let patch = HorizontalPatch {
            rank: 0,
            xs: 0,
            xm: 3,
            ys: 0,
            ym: 2,
        };
        Field2::new("out", patch, (3, 2), 1, 0.0)
    }

    #[test]
    fn test_uniform_ocean_fills_owned_points() {
        let ocean = UniformOcean::new(&OceanConfig {
            shelf_base_mass_flux: 1.0e-9,
            shelf_base_temperature: 270.0,
        });
        let mut out = field();
        ocean.shelf_base_mass_flux(0, &mut out).unwrap();
        assert_eq!(out.get(2, 1).unwrap(), 1.0e-9);
        ocean.shelf_base_temperature(0, &mut out).unwrap();
        assert_eq!(out.get(0, 0).unwrap(), 270.0);
    }

    #[test]
    fn test_uniform_atmosphere_series() {
        let atm = UniformAtmosphere::new(250.0);
        let mut values = [0.0; 3];
        atm.temp_time_series(0, 0, &[0.0, 0.5, 1.0], &mut values).unwrap();
        assert_eq!(values, [250.0; 3]);
    }
}
