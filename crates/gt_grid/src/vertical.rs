// crates/gt_grid/src/vertical.rs

//! 垂向离散
//!
//! - [`VerticalGrid`]: 存储层（冰层 Mz 层至 Lz，基岩 Mbz 层至 -Lbz），可非均匀
//! - [`FineVerticalGrid`]: 仅供柱求解器使用的等间距细网格，冰与基岩共用同一间距
//!
//! # 插值映射
//!
//! 细网格与存储层之间通过"正下方层"索引表互相插值：
//!
//! ```text
//! ice_storage_below_fine[k]  细网格第 k 层正下方（或重合）的存储层
//! ice_fine_below_storage[m]  存储层第 m 层正下方（或重合）的细网格层
//! ```
//!
//! 基岩同理。插值均为分段线性，超出源层范围时取端点值。

use serde::{Deserialize, Serialize};

use gt_config::{GridConfig, SpacingPolicy};

use crate::error::{GridError, GridResult};

/// 高度比较容差 [m]
const HEIGHT_EPS: f64 = 1.0e-6;

/// 存储层垂向网格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerticalGrid {
    /// 冰层高度（自底向上，首层 0，末层 Lz）
    pub zlevels: Vec<f64>,
    /// 基岩层高度（自底向上，首层 -Lbz，末层 0）
    pub zblevels: Vec<f64>,
    /// 冰层计算域高度
    pub lz: f64,
    /// 基岩热层厚度
    pub lbz: f64,
    /// 冰层最小间距
    pub dz_min: f64,
    /// 冰层最大间距
    pub dz_max: f64,
    /// 间距策略
    pub spacing: SpacingPolicy,
}

impl VerticalGrid {
    /// 按配置计算存储层
    pub fn new(config: &GridConfig) -> GridResult<Self> {
        Self::compute(config.spacing, config.mz, config.mbz, config.lz, config.lbz)
    }

    /// 计算存储层并检查严格单调
    pub fn compute(
        spacing: SpacingPolicy,
        mz: usize,
        mbz: usize,
        lz: f64,
        lbz: f64,
    ) -> GridResult<Self> {
        if mz < 2 {
            return Err(GridError::InvalidVertical(format!("Mz={mz} 至少为 2")));
        }
        if mbz == 0 {
            return Err(GridError::InvalidVertical("Mbz 至少为 1".into()));
        }
        if !(lz > 0.0) {
            return Err(GridError::InvalidVertical(format!("Lz={lz} 必须为正")));
        }
        if mbz > 1 && !(lbz > 0.0) {
            return Err(GridError::InvalidVertical(format!(
                "Mbz={mbz} 时 Lbz={lbz} 必须为正"
            )));
        }

        let top = (mz - 1) as f64;
        let mut zlevels: Vec<f64> = match spacing {
            SpacingPolicy::Equal => (0..mz).map(|k| lz * k as f64 / top).collect(),
            SpacingPolicy::Quadratic { lambda } => {
                if !(lambda >= 1.0) {
                    return Err(GridError::InvalidVertical(format!(
                        "二次间距参数 lambda={lambda} 必须 ≥ 1"
                    )));
                }
                (0..mz)
                    .map(|k| {
                        let zeta = k as f64 / top;
                        lz * (zeta / lambda) * (1.0 + (lambda - 1.0) * zeta)
                    })
                    .collect()
            }
        };
        zlevels[mz - 1] = lz;

        let zblevels: Vec<f64> = if mbz == 1 {
            vec![0.0]
        } else {
            let mut levels: Vec<f64> = (0..mbz)
                .map(|k| -lbz + lbz * k as f64 / (mbz - 1) as f64)
                .collect();
            levels[mbz - 1] = 0.0;
            levels
        };

        if !is_increasing(&zlevels) {
            return Err(GridError::InvalidVertical("冰层高度不是严格递增".into()));
        }
        if !is_increasing(&zblevels) {
            return Err(GridError::InvalidVertical("基岩层高度不是严格递增".into()));
        }

        let (dz_min, dz_max) = spacing_range(&zlevels);

        Ok(Self {
            zlevels,
            zblevels,
            lz,
            lbz: if mbz == 1 { 0.0 } else { lbz },
            dz_min,
            dz_max,
            spacing,
        })
    }

    /// 冰层层数
    #[inline]
    pub fn mz(&self) -> usize {
        self.zlevels.len()
    }

    /// 基岩层数
    #[inline]
    pub fn mbz(&self) -> usize {
        self.zblevels.len()
    }

    /// 冰层自然间距：等间距取 Lz/(Mz-1)，否则取最小间距
    pub fn ice_natural_spacing(&self) -> f64 {
        match self.spacing {
            SpacingPolicy::Equal => self.lz / (self.mz() - 1) as f64,
            SpacingPolicy::Quadratic { .. } => self.dz_min,
        }
    }

    /// 基岩自然间距；无基岩热层时为 None
    pub fn bedrock_natural_spacing(&self) -> Option<f64> {
        (self.mbz() > 1).then(|| self.lbz / (self.mbz() - 1) as f64)
    }

    /// 高度不超过 height 的最高存储层索引
    ///
    /// 允许 1e-6 m 的越界容差，超出 [0, Lz] 时报错。
    pub fn k_below_height(&self, height: f64) -> GridResult<usize> {
        if height < -HEIGHT_EPS || height > self.lz + HEIGHT_EPS {
            return Err(GridError::HeightOutOfRange {
                height,
                lz: self.lz,
            });
        }
        let above = self.zlevels.partition_point(|&z| z <= height);
        Ok(above.saturating_sub(1))
    }

    /// 垂向层信息文本
    pub fn report(&self) -> String {
        let mut text = format!(
            "冰层: Mz={} Lz={:.2} m, dz ∈ [{:.3}, {:.3}] m, 间距 {:?}\n",
            self.mz(),
            self.lz,
            self.dz_min,
            self.dz_max,
            self.spacing
        );
        text.push_str(&format_levels("  z", &self.zlevels));
        text.push_str(&format!("基岩: Mbz={} Lbz={:.2} m\n", self.mbz(), self.lbz));
        text.push_str(&format_levels("  zb", &self.zblevels));
        text
    }
}

/// 柱求解器使用的等间距细网格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FineVerticalGrid {
    /// 细网格间距（冰与基岩相同）
    pub dz: f64,
    /// 冰层细网格高度，0..=Lz
    pub zlevels: Vec<f64>,
    /// 基岩细网格高度，末层为 0
    pub zblevels: Vec<f64>,
    /// 细网格第 k 层正下方的冰存储层
    pub ice_storage_below_fine: Vec<usize>,
    /// 冰存储层第 m 层正下方的细网格层
    pub ice_fine_below_storage: Vec<usize>,
    /// 细网格第 k 层正下方的基岩存储层
    pub bed_storage_below_fine: Vec<usize>,
    /// 基岩存储层第 m 层正下方的细网格层
    pub bed_fine_below_storage: Vec<usize>,
}

impl FineVerticalGrid {
    /// 由存储层构造细网格
    ///
    /// 间距取冰与基岩自然间距的较小者，再调整为恰好整除 Lz。
    pub fn new(vertical: &VerticalGrid) -> GridResult<Self> {
        let natural = match vertical.bedrock_natural_spacing() {
            Some(dzb) => vertical.ice_natural_spacing().min(dzb),
            None => vertical.ice_natural_spacing(),
        };
        if !(natural > 0.0) {
            return Err(GridError::InvalidVertical(format!(
                "细网格间距 {natural} 必须为正"
            )));
        }

        let lz = vertical.lz;
        let n = ((lz / natural) - 1.0e-9).ceil().max(1.0) as usize;
        let dz = lz / n as f64;

        let mut zlevels: Vec<f64> = (0..=n).map(|k| k as f64 * dz).collect();
        zlevels[n] = lz;

        let mbz_fine = if vertical.mbz() > 1 {
            ((vertical.lbz / dz) - 1.0e-9).ceil() as usize + 1
        } else {
            1
        };
        let zblevels: Vec<f64> = (0..mbz_fine)
            .map(|k| -((mbz_fine - 1 - k) as f64) * dz)
            .collect();

        let ice_storage_below_fine = levels_below(&vertical.zlevels, &zlevels);
        let ice_fine_below_storage = levels_below(&zlevels, &vertical.zlevels);
        let bed_storage_below_fine = levels_below(&vertical.zblevels, &zblevels);
        let bed_fine_below_storage = levels_below(&zblevels, &vertical.zblevels);

        log::debug!(
            "细网格: Mz_fine={} Mbz_fine={} dz_fine={:.4} m",
            zlevels.len(),
            zblevels.len(),
            dz
        );

        Ok(Self {
            dz,
            zlevels,
            zblevels,
            ice_storage_below_fine,
            ice_fine_below_storage,
            bed_storage_below_fine,
            bed_fine_below_storage,
        })
    }

    /// 冰层细网格层数
    #[inline]
    pub fn mz(&self) -> usize {
        self.zlevels.len()
    }

    /// 基岩细网格层数
    #[inline]
    pub fn mbz(&self) -> usize {
        self.zblevels.len()
    }
}

/// 对 targets 中每个高度，求 levels 中高度不超过它的最高索引（不足时取 0）
fn levels_below(levels: &[f64], targets: &[f64]) -> Vec<usize> {
    targets
        .iter()
        .map(|&z| {
            levels.partition_point(|&l| l <= z).saturating_sub(1)
        })
        .collect()
}

/// 分段线性插值
///
/// 由 (`src_z`, `src`) 插值到 `dst_z`，`below[k]` 为 `dst_z[k]` 正下方的源层索引。
/// 写入 `out[..dst_z.len()]`；源层范围之外取端点值。
pub fn interpolate_column(
    src_z: &[f64],
    src: &[f64],
    below: &[usize],
    dst_z: &[f64],
    out: &mut [f64],
) {
    for (k, &z) in dst_z.iter().enumerate() {
        out[k] = interpolate_at(src_z, src, below[k], z);
    }
}

/// 在高度 z 处插值，m 为 z 正下方的源层索引
#[inline]
pub fn interpolate_at(src_z: &[f64], src: &[f64], m: usize, z: f64) -> f64 {
    let last = src_z.len() - 1;
    if m >= last {
        src[last]
    } else {
        let t = ((z - src_z[m]) / (src_z[m + 1] - src_z[m])).clamp(0.0, 1.0);
        src[m] + t * (src[m + 1] - src[m])
    }
}

fn is_increasing(levels: &[f64]) -> bool {
    levels.windows(2).all(|w| w[1] > w[0])
}

fn spacing_range(levels: &[f64]) -> (f64, f64) {
    levels
        .windows(2)
        .map(|w| w[1] - w[0])
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), dz| (lo.min(dz), hi.max(dz)))
}

fn format_levels(label: &str, levels: &[f64]) -> String {
    let body: Vec<String> = levels.iter().map(|z| format!("{z:.2}")).collect();
    format!("{label} = [{}]\n", body.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(spacing: SpacingPolicy, mz: usize, mbz: usize, lz: f64, lbz: f64) -> VerticalGrid {
        VerticalGrid::compute(spacing, mz, mbz, lz, lbz).unwrap()
    }

    #[test]
    fn test_equal_spacing() {
        let g = grid(SpacingPolicy::Equal, 5, 1, 400.0, 0.0);
        assert_eq!(g.zlevels, vec![0.0, 100.0, 200.0, 300.0, 400.0]);
        assert_eq!(g.zblevels, vec![0.0]);
        assert!((g.dz_min - 100.0).abs() < 1e-12);
        assert!((g.dz_max - 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_quadratic_spacing_monotone_and_refined_at_base() {
        let g = grid(SpacingPolicy::quadratic(), 11, 1, 4000.0, 0.0);
        assert!(g.zlevels.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(g.zlevels[10], 4000.0);
        assert!(g.zlevels[1] - g.zlevels[0] < g.zlevels[10] - g.zlevels[9]);
        assert!((g.dz_min - (g.zlevels[1] - g.zlevels[0])).abs() < 1e-9);
    }

    #[test]
    fn test_bedrock_levels() {
        let g = grid(SpacingPolicy::Equal, 5, 5, 400.0, 200.0);
        assert_eq!(g.zblevels, vec![-200.0, -150.0, -100.0, -50.0, 0.0]);
    }

    #[test]
    fn test_k_below_height() {
        let g = grid(SpacingPolicy::Equal, 5, 1, 400.0, 0.0);
        assert_eq!(g.k_below_height(0.0).unwrap(), 0);
        assert_eq!(g.k_below_height(150.0).unwrap(), 1);
        assert_eq!(g.k_below_height(200.0).unwrap(), 2);
        assert_eq!(g.k_below_height(400.0).unwrap(), 4);
        assert!(g.k_below_height(400.1).is_err());
        assert!(g.k_below_height(-1.0).is_err());
    }

    #[test]
    fn test_fine_grid_uses_smaller_spacing() {
        // 冰 100 m，基岩 50 m
        let g = grid(SpacingPolicy::Equal, 5, 5, 400.0, 200.0);
        let fine = FineVerticalGrid::new(&g).unwrap();
        assert!((fine.dz - 50.0).abs() < 1e-12);
        assert_eq!(fine.mz(), 9);
        assert_eq!(fine.mbz(), 5);
        assert_eq!(*fine.zblevels.last().unwrap(), 0.0);
        assert!((fine.zblevels[0] + 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_fine_grid_index_maps() {
        let g = grid(SpacingPolicy::Equal, 5, 1, 400.0, 0.0);
        let fine = FineVerticalGrid::new(&g).unwrap();
        assert_eq!(fine.mz(), 5);
        assert_eq!(fine.ice_storage_below_fine, vec![0, 1, 2, 3, 4]);
        assert_eq!(fine.ice_fine_below_storage, vec![0, 1, 2, 3, 4]);
        assert_eq!(fine.mbz(), 1);
    }

    #[test]
    fn test_interpolate_linear() {
        let src_z = [0.0, 100.0];
        let src = [1.0, 3.0];
        let dst_z = [0.0, 25.0, 100.0];
        let below = levels_below(&src_z, &dst_z);
        let mut out = [0.0; 3];
        interpolate_column(&src_z, &src, &below, &dst_z, &mut out);
        assert!((out[0] - 1.0).abs() < 1e-12);
        assert!((out[1] - 1.5).abs() < 1e-12);
        assert!((out[2] - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_report_lists_levels() {
        let g = grid(SpacingPolicy::Equal, 3, 1, 200.0, 0.0);
        let text = g.report();
        assert!(text.contains("Mz=3"));
        assert!(text.contains("100.00"));
    }
}
