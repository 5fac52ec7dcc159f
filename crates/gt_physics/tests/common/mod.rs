// crates/gt_physics/tests/common/mod.rs

//! 集成测试公共装置：小网格、均匀耦合器与按全局索引读写分块场

#![allow(dead_code)]

use gt_config::{AtmosphereConfig, GridConfig, OceanConfig, ThermalConfig};
use gt_grid::{DistributedGrid, Field2, Field3};
use gt_physics::{
    Couplers, DefaultEnthalpyConverter, EnthalpyConverter, StepOptions, StepReport, ThermalState,
    ThermoResult, VariableRegistry,
};

/// 冰面温度 [K]
pub const SURFACE_TEMPERATURE: f64 = 250.0;
/// 冰架底部质量通量 [m/s]
pub const SHELF_MASS_FLUX: f64 = 1.0e-9;

/// 6x4 网格，冰层 11 层（细网格间距 100 m），基岩 mbz 层
pub fn grid_config(mbz: usize, lbz: f64, procs: (usize, usize)) -> GridConfig {
    GridConfig {
        mx: 6,
        my: 4,
        lx: 6000.0,
        ly: 4000.0,
        mz: 11,
        mbz,
        lz: 1000.0,
        lbz,
        procs_x: Some(procs.0),
        procs_y: Some(procs.1),
        ..Default::default()
    }
}

pub struct Harness {
    pub config: ThermalConfig,
    pub grid: DistributedGrid,
    pub ec: DefaultEnthalpyConverter,
    pub state: ThermalState,
    pub couplers: Couplers,
    pub registry: VariableRegistry,
}

impl Harness {
    pub fn new(config: ThermalConfig, grid: GridConfig) -> Self {
        let grid = DistributedGrid::new(&grid, 1).unwrap();
        let ec = DefaultEnthalpyConverter::new(&config);
        let state = ThermalState::new(&grid, 0.0);
        let couplers = Couplers::from_config(
            &AtmosphereConfig::Uniform {
                temperature: SURFACE_TEMPERATURE,
            },
            &OceanConfig {
                shelf_base_mass_flux: SHELF_MASS_FLUX,
                shelf_base_temperature: 271.15,
            },
        );
        Self {
            config,
            grid,
            ec,
            state,
            couplers,
            registry: VariableRegistry::new(),
        }
    }

    /// 设置冰厚、冷冰温度与基岩温度，地热通量取 0.042 W/m²
    pub fn cold_slab(&mut self, thickness: f64, temperature: f64, bedrock: f64) {
        set2(&mut self.state.fields.thickness, |_, _| thickness);
        set2(&mut self.state.fields.geothermal_flux, |_, _| 0.042);
        self.state.fields.bedrock_temperature =
            self.grid.create_bedrock_field3("litho_temp", bedrock);
        let temp = self.grid.create_ice_field3("temp", temperature);
        self.state
            .set_enthalpy_from_temperature_cold(&self.grid, &self.ec, &temp)
            .unwrap();
    }

    /// 冰面以下各层含水量为 omega 的温冰，冰面以上为冷冰
    pub fn temperate_slab(&mut self, thickness: f64, omega: f64) {
        set2(&mut self.state.fields.thickness, |_, _| thickness);
        set2(&mut self.state.fields.geothermal_flux, |_, _| 0.042);
        let ec = &self.ec;
        for field in self.state.fields.enthalpy.iter_mut() {
            let levels = field.levels().to_vec();
            let patch = *field.patch();
            for (i, j) in patch.owned() {
                let column = field.column_mut(i, j).unwrap();
                for (e, &z) in column.iter_mut().zip(&levels) {
                    let p = ec.pressure_from_depth(thickness - z);
                    *e = if z <= thickness {
                        ec.enthalpy_at_water_fraction(omega, p)
                    } else {
                        ec.enthalpy_permissive(SURFACE_TEMPERATURE, 0.0, p)
                    };
                }
            }
        }
    }

    /// 交换幽灵值后推进一步
    pub fn step(&mut self, dt_years: f64, options: StepOptions) -> ThermoResult<StepReport> {
        self.state.update_ghosts(&self.grid)?;
        self.state.step(
            &self.grid,
            &self.config,
            &self.ec,
            &mut self.couplers,
            &self.registry,
            dt_years,
            options,
        )
    }

    /// 全部格点
    pub fn points(&self) -> Vec<(usize, usize)> {
        let (mx, my) = self.grid.size();
        (0..my).flat_map(|j| (0..mx).map(move |i| (i, j))).collect()
    }
}

/// 对各分块的拥有格点逐点赋值
pub fn set2(fields: &mut [Field2<f64>], f: impl Fn(usize, usize) -> f64) {
    for field in fields.iter_mut() {
        let patch = *field.patch();
        for (i, j) in patch.owned() {
            field.set(i, j, f(i, j)).unwrap();
        }
    }
}

/// 按全局索引读取二维场
pub fn value2(fields: &[Field2<f64>], i: usize, j: usize) -> f64 {
    let field = fields.iter().find(|f| f.patch().owns(i, j)).unwrap();
    field.get(i as isize, j as isize).unwrap()
}

/// 按全局索引读取三维场的一柱
pub fn column3(fields: &[Field3], i: usize, j: usize) -> Vec<f64> {
    let field = fields.iter().find(|f| f.patch().owns(i, j)).unwrap();
    field.column(i as isize, j as isize).unwrap().to_vec()
}
