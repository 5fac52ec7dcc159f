// crates/gt_physics/src/coupler/fausto.rs

//! Fausto 等 (2009) 格陵兰近地面气温参数化
//!
//! ```text
//! T_ma = d_ma + γ_ma·h + c_ma·lat + κ_ma·(-lon)
//! T_mj = d_mj + γ_mj·h + c_mj·lat + κ_mj·(-lon)
//! T(t) = T_ma + (T_mj - T_ma)·cos(2π/a·(t_sec - july_day·86400))
//! ```
//!
//! 其中 t_sec 为自年初起的秒数。需要注册表中的 `surface_altitude`、
//! `latitude`、`longitude` 三个场。

use std::f64::consts::PI;

use gt_config::{FaustoConfig, SECONDS_PER_YEAR};
use gt_grid::Field2;

use super::{approx_eq, fill_owned, AtmosphereModel, VariableRegistry};
use crate::error::{ThermoError, ThermoResult};

const SECONDS_PER_DAY: f64 = 8.64e4;
const UPDATE_EPS: f64 = 1.0e-4;

/// Fausto 大气模型
#[derive(Debug, Clone)]
pub struct FaustoAtmosphere {
    config: FaustoConfig,
    temp_ma: Vec<Field2<f64>>,
    temp_mj: Vec<Field2<f64>>,
    last: Option<(f64, f64)>,
}

impl FaustoAtmosphere {
    /// 创建（尚未计算，首次 update 时读取注册表）
    pub fn new(config: FaustoConfig) -> Self {
        Self {
            config,
            temp_ma: Vec::new(),
            temp_mj: Vec::new(),
            last: None,
        }
    }

    /// 参数
    pub fn config(&self) -> &FaustoConfig {
        &self.config
    }

    /// 年均气温场
    pub fn temp_ma(&self) -> &[Field2<f64>] {
        &self.temp_ma
    }

    /// 七月均温场
    pub fn temp_mj(&self) -> &[Field2<f64>] {
        &self.temp_mj
    }

    /// 一年内的余弦周期因子
    fn cycle(&self, t_years: f64) -> f64 {
        let t_sec = (t_years - t_years.floor()) * SECONDS_PER_YEAR;
        let july = SECONDS_PER_DAY * self.config.july_day;
        (2.0 * PI / SECONDS_PER_YEAR * (t_sec - july)).cos()
    }

    fn patch_fields(&self, rank: usize) -> ThermoResult<(&Field2<f64>, &Field2<f64>)> {
        match (self.temp_ma.get(rank), self.temp_mj.get(rank)) {
            (Some(ma), Some(mj)) => Ok((ma, mj)),
            _ => Err(ThermoError::missing(format!("fausto temperature on patch {rank}"))),
        }
    }
}

impl AtmosphereModel for FaustoAtmosphere {
    fn name(&self) -> &str {
        "fausto"
    }

    fn update(
        &mut self,
        t_years: f64,
        dt_years: f64,
        registry: &VariableRegistry,
    ) -> ThermoResult<()> {
        if let Some((t, dt)) = self.last {
            if approx_eq(t_years, t, UPDATE_EPS) && approx_eq(dt_years, dt, UPDATE_EPS) {
                return Ok(());
            }
        }

        let h = registry.get("surface_altitude")?;
        let lat = registry.get("latitude")?;
        let lon = registry.get("longitude")?;
        if h.len() != lat.len() || h.len() != lon.len() {
            return Err(ThermoError::invalid_configuration(
                "surface_altitude/latitude/longitude 的分块数不一致",
            ));
        }

        let c = &self.config;
        let mut temp_ma = Vec::with_capacity(h.len());
        let mut temp_mj = Vec::with_capacity(h.len());
        for ((h, lat), lon) in h.iter().zip(lat).zip(lon) {
            let mut ma = Field2::new("fausto_temp_ma", *h.patch(), h.global_size(), 1, 0.0);
            let mut mj = Field2::new("fausto_temp_mj", *h.patch(), h.global_size(), 1, 0.0);
            for (i, j) in h.patch().owned() {
                let (ii, jj) = (i as isize, j as isize);
                let elev = h.get(ii, jj)?;
                let lat_n = lat.get(ii, jj)?;
                let lon_e = lon.get(ii, jj)?;
                ma.set(i, j, c.d_ma + c.gamma_ma * elev + c.c_ma * lat_n + c.kappa_ma * (-lon_e))?;
                mj.set(i, j, c.d_mj + c.gamma_mj * elev + c.c_mj * lat_n + c.kappa_mj * (-lon_e))?;
            }
            temp_ma.push(ma);
            temp_mj.push(mj);
        }

        log::debug!("Fausto 气温更新: t={t_years} a, dt={dt_years} a");
        self.temp_ma = temp_ma;
        self.temp_mj = temp_mj;
        self.last = Some((t_years, dt_years));
        Ok(())
    }

    fn mean_annual_temp(&self, rank: usize, out: &mut Field2<f64>) -> ThermoResult<()> {
        let (ma, _) = self.patch_fields(rank)?;
        fill_owned(out, |i, j| Ok(ma.get(i as isize, j as isize)?))
    }

    fn temp_snapshot(&self, t_years: f64, rank: usize, out: &mut Field2<f64>) -> ThermoResult<()> {
        let (ma, mj) = self.patch_fields(rank)?;
        let factor = self.cycle(t_years);
        fill_owned(out, |i, j| {
            let (ii, jj) = (i as isize, j as isize);
            let a = ma.get(ii, jj)?;
            Ok(a + (mj.get(ii, jj)? - a) * factor)
        })
    }

    fn temp_time_series(
        &self,
        i: usize,
        j: usize,
        ts: &[f64],
        values: &mut [f64],
    ) -> ThermoResult<()> {
        let rank = self
            .temp_ma
            .iter()
            .position(|f| f.patch().owns(i, j))
            .ok_or_else(|| ThermoError::missing(format!("fausto temperature at ({i}, {j})")))?;
        let (ma, mj) = self.patch_fields(rank)?;
        let a = ma.get(i as isize, j as isize)?;
        let b = mj.get(i as isize, j as isize)?;
        for (v, &t) in values.iter_mut().zip(ts) {
            *v = a + (b - a) * self.cycle(t);
        }
        Ok(())
    }
}
