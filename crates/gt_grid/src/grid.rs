// crates/gt_grid/src/grid.rs

//! DistributedGrid - 分布式计算网格
//!
//! 汇总水平分块、水平坐标、存储层与细网格，并提供创建分块场与
//! 幽灵交换的入口。水平方向在 x、y 上均为周期性，间距 `dx = 2Lx/Mx`。

use std::sync::Arc;

use gt_config::GridConfig;

use crate::decomposition::{HorizontalPatch, PatchDecomposition};
use crate::error::{GridError, GridResult};
use crate::field::{Field2, Field3, LevelKind};
use crate::halo::{HaloExchange, HaloField, PeriodicHaloExchange};
use crate::vertical::{FineVerticalGrid, VerticalGrid};

/// 分布式网格
#[derive(Debug, Clone)]
pub struct DistributedGrid {
    mx: usize,
    my: usize,
    lx: f64,
    ly: f64,
    x0: f64,
    y0: f64,
    dx: f64,
    dy: f64,
    x: Vec<f64>,
    y: Vec<f64>,
    decomposition: PatchDecomposition,
    halo: PeriodicHaloExchange,
    vertical: VerticalGrid,
    fine: FineVerticalGrid,
    zlevels: Arc<[f64]>,
    zblevels: Arc<[f64]>,
}

impl DistributedGrid {
    /// 按配置建立网格
    ///
    /// 配置给出 procs_x/procs_y 时按其分块，否则为 `workers` 个工作单元自动选择布局。
    pub fn new(config: &GridConfig, workers: usize) -> GridResult<Self> {
        config.validate()?;
        let decomposition = match (config.procs_x, config.procs_y) {
            (Some(nx), Some(ny)) => PatchDecomposition::new(config.mx, config.my, nx, ny)?,
            _ => PatchDecomposition::auto(config.mx, config.my, workers)?,
        };
        Self::with_decomposition(config, decomposition)
    }

    /// 使用给定分块方案建立网格
    pub fn with_decomposition(
        config: &GridConfig,
        decomposition: PatchDecomposition,
    ) -> GridResult<Self> {
        config.validate()?;
        if decomposition.global_size() != (config.mx, config.my) {
            let (nx, ny) = decomposition.layout();
            return Err(GridError::decomposition(
                config.mx,
                config.my,
                nx,
                ny,
                "分块方案与网格尺寸不一致",
            ));
        }

        let vertical = VerticalGrid::new(config)?;
        let fine = FineVerticalGrid::new(&vertical)?;

        let dx = 2.0 * config.lx / config.mx as f64;
        let dy = 2.0 * config.ly / config.my as f64;
        let x = (0..config.mx)
            .map(|i| config.x0 - config.lx + i as f64 * dx)
            .collect();
        let y = (0..config.my)
            .map(|j| config.y0 - config.ly + j as f64 * dy)
            .collect();

        let (nx, ny) = decomposition.layout();
        log::debug!(
            "网格 {}x{} 分为 {}x{} 块, dx={:.1} m dy={:.1} m",
            config.mx,
            config.my,
            nx,
            ny,
            dx,
            dy
        );

        Ok(Self {
            mx: config.mx,
            my: config.my,
            lx: config.lx,
            ly: config.ly,
            x0: config.x0,
            y0: config.y0,
            dx,
            dy,
            x,
            y,
            halo: PeriodicHaloExchange::new(decomposition.clone()),
            decomposition,
            zlevels: vertical.zlevels.clone().into(),
            zblevels: vertical.zblevels.clone().into(),
            vertical,
            fine,
        })
    }

    /// 全局尺寸 (Mx, My)
    #[inline]
    pub fn size(&self) -> (usize, usize) {
        (self.mx, self.my)
    }

    /// 半宽 (Lx, Ly)
    #[inline]
    pub fn half_widths(&self) -> (f64, f64) {
        (self.lx, self.ly)
    }

    /// x 方向间距
    #[inline]
    pub fn dx(&self) -> f64 {
        self.dx
    }

    /// y 方向间距
    #[inline]
    pub fn dy(&self) -> f64 {
        self.dy
    }

    /// x 坐标
    #[inline]
    pub fn x(&self) -> &[f64] {
        &self.x
    }

    /// y 坐标
    #[inline]
    pub fn y(&self) -> &[f64] {
        &self.y
    }

    /// 格点 (i, j) 相对网格中心的坐标及距离 (x, y, r)
    pub fn mapcoords(&self, i: usize, j: usize) -> (f64, f64, f64) {
        let x = self.x[i % self.mx] - self.x0;
        let y = self.y[j % self.my] - self.y0;
        (x, y, x.hypot(y))
    }

    /// 分块方案
    #[inline]
    pub fn decomposition(&self) -> &PatchDecomposition {
        &self.decomposition
    }

    /// 全部分块
    #[inline]
    pub fn patches(&self) -> &[HorizontalPatch] {
        self.decomposition.patches()
    }

    /// 存储层
    #[inline]
    pub fn vertical(&self) -> &VerticalGrid {
        &self.vertical
    }

    /// 细网格
    #[inline]
    pub fn fine(&self) -> &FineVerticalGrid {
        &self.fine
    }

    /// 最高存储层索引，其高度不超过 height
    #[inline]
    pub fn k_below_height(&self, height: f64) -> GridResult<usize> {
        self.vertical.k_below_height(height)
    }

    /// 在每个分块上创建二维场
    pub fn create_field2<T: Copy>(&self, name: &str, fill: T) -> Vec<Field2<T>> {
        self.patches()
            .iter()
            .map(|&p| Field2::new(name, p, (self.mx, self.my), 1, fill))
            .collect()
    }

    /// 在每个分块上创建冰层三维场
    pub fn create_ice_field3(&self, name: &str, fill: f64) -> Vec<Field3> {
        self.create_field3(name, LevelKind::Ice, fill)
    }

    /// 在每个分块上创建基岩三维场
    pub fn create_bedrock_field3(&self, name: &str, fill: f64) -> Vec<Field3> {
        self.create_field3(name, LevelKind::Bedrock, fill)
    }

    fn create_field3(&self, name: &str, kind: LevelKind, fill: f64) -> Vec<Field3> {
        let levels = match kind {
            LevelKind::Ice => Arc::clone(&self.zlevels),
            LevelKind::Bedrock => Arc::clone(&self.zblevels),
        };
        self.patches()
            .iter()
            .map(|&p| Field3::new(name, kind, Arc::clone(&levels), p, (self.mx, self.my), fill))
            .collect()
    }

    /// 对一个场的全部分块副本做幽灵交换
    pub fn halo_exchange<F: HaloField>(&self, fields: &mut [F]) -> GridResult<()> {
        self.halo.exchange(fields)
    }

    /// 网格信息文本
    pub fn report(&self) -> String {
        let (nx, ny) = self.decomposition.layout();
        let mut text = format!(
            "水平: Mx={} My={} Lx={:.1} km Ly={:.1} km dx={:.3} km dy={:.3} km\n",
            self.mx,
            self.my,
            self.lx / 1000.0,
            self.ly / 1000.0,
            self.dx / 1000.0,
            self.dy / 1000.0
        );
        text.push_str(&format!(
            "分块: {}x{}, x 方向 {:?}, y 方向 {:?}\n",
            nx,
            ny,
            self.decomposition.ownership_x(),
            self.decomposition.ownership_y()
        ));
        text.push_str(&self.vertical.report());
        text.push_str(&format!(
            "细网格: Mz_fine={} Mbz_fine={} dz_fine={:.3} m\n",
            self.fine.mz(),
            self.fine.mbz(),
            self.fine.dz
        ));
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> GridConfig {
        GridConfig {
            mx: 8,
            my: 6,
            lx: 4000.0,
            ly: 3000.0,
            mz: 5,
            lz: 400.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_periodic_spacing_and_coordinates() {
        let grid = DistributedGrid::new(&config(), 1).unwrap();
        assert!((grid.dx() - 1000.0).abs() < 1e-12);
        assert!((grid.dy() - 1000.0).abs() < 1e-12);
        assert!((grid.x()[0] + 4000.0).abs() < 1e-12);
        let (x, y, r) = grid.mapcoords(4, 3);
        assert!(x.abs() < 1e-12 && y.abs() < 1e-12 && r.abs() < 1e-12);
    }

    #[test]
    fn test_explicit_layout() {
        let cfg = GridConfig {
            procs_x: Some(2),
            procs_y: Some(3),
            ..config()
        };
        let grid = DistributedGrid::new(&cfg, 1).unwrap();
        assert_eq!(grid.patches().len(), 6);
    }

    #[test]
    fn test_create_fields() {
        let grid = DistributedGrid::new(&config(), 4).unwrap();
        let thk = grid.create_field2("thk", 0.0);
        let enth = grid.create_ice_field3("enthalpy", 0.0);
        let tb = grid.create_bedrock_field3("litho_temp", 0.0);
        assert_eq!(thk.len(), 4);
        assert_eq!(enth[0].levels().len(), 5);
        assert_eq!(tb[0].levels().len(), 1);
    }

    #[test]
    fn test_report_mentions_fine_grid() {
        let grid = DistributedGrid::new(&config(), 1).unwrap();
        assert!(grid.report().contains("Mz_fine=5"));
    }
}
