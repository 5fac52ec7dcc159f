// crates/gt_grid/src/decomposition.rs

//! 水平分块
//!
//! 将 Mx × My 水平网格划分为 Nx × Ny 个矩形分块，每个工作单元拥有一块。
//!
//! # 划分规则
//!
//! 每个方向按均衡划分：长度 m 分成 n 段时，第 r 段长 `m/n + (r < m%n)`。
//! 分块按 `rank = py·Nx + px` 编号，共同无重叠地铺满整个区域（不含幽灵环）。

use serde::{Deserialize, Serialize};

use crate::error::{GridError, GridResult};

/// 单个工作单元拥有的矩形分块 `[xs, xs+xm) × [ys, ys+ym)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HorizontalPatch {
    /// 分块编号
    pub rank: usize,
    /// x 起始索引
    pub xs: usize,
    /// x 方向宽度
    pub xm: usize,
    /// y 起始索引
    pub ys: usize,
    /// y 方向宽度
    pub ym: usize,
}

impl HorizontalPatch {
    /// 拥有的格点数
    #[inline]
    pub fn len(&self) -> usize {
        self.xm * self.ym
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 是否拥有 (i, j)
    #[inline]
    pub fn owns(&self, i: usize, j: usize) -> bool {
        i >= self.xs && i < self.xs + self.xm && j >= self.ys && j < self.ys + self.ym
    }

    /// 按 i 外层、j 内层遍历拥有的格点
    pub fn owned(&self) -> impl Iterator<Item = (usize, usize)> {
        let (xs, xm, ys, ym) = (self.xs, self.xm, self.ys, self.ym);
        (xs..xs + xm).flat_map(move |i| (ys..ys + ym).map(move |j| (i, j)))
    }
}

impl std::fmt::Display for HorizontalPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} [{}, {}) x [{}, {})",
            self.rank,
            self.xs,
            self.xs + self.xm,
            self.ys,
            self.ys + self.ym
        )
    }
}

/// 均衡划分长度 m 为 n 段，返回各段 (起点, 长度)
fn split(m: usize, n: usize) -> Vec<(usize, usize)> {
    let mut ranges = Vec::with_capacity(n);
    let mut start = 0;
    for r in 0..n {
        let len = m / n + usize::from(r < m % n);
        ranges.push((start, len));
        start += len;
    }
    ranges
}

/// 水平分块方案
#[derive(Debug, Clone, PartialEq)]
pub struct PatchDecomposition {
    mx: usize,
    my: usize,
    nx: usize,
    ny: usize,
    x_ranges: Vec<(usize, usize)>,
    y_ranges: Vec<(usize, usize)>,
    patches: Vec<HorizontalPatch>,
}

impl PatchDecomposition {
    /// 按给定块数划分
    ///
    /// 块数为零或超过格点数时失败（否则会出现空分块）。
    pub fn new(mx: usize, my: usize, nx: usize, ny: usize) -> GridResult<Self> {
        if nx == 0 || ny == 0 {
            return Err(GridError::decomposition(mx, my, nx, ny, "块数必须为正"));
        }
        if nx > mx || ny > my {
            return Err(GridError::decomposition(mx, my, nx, ny, "块数超过格点数"));
        }

        let x_ranges = split(mx, nx);
        let y_ranges = split(my, ny);
        let mut patches = Vec::with_capacity(nx * ny);
        for (py, &(ys, ym)) in y_ranges.iter().enumerate() {
            for (px, &(xs, xm)) in x_ranges.iter().enumerate() {
                patches.push(HorizontalPatch {
                    rank: py * nx + px,
                    xs,
                    xm,
                    ys,
                    ym,
                });
            }
        }

        Ok(Self {
            mx,
            my,
            nx,
            ny,
            x_ranges,
            y_ranges,
            patches,
        })
    }

    /// 为 size 个工作单元自动选择 Nx × Ny
    ///
    /// 取 `Nx ≈ sqrt(size·Mx/My)` 并向下调整到 size 的因子；
    /// Mx > My 时保证 Nx ≥ Ny。
    pub fn auto(mx: usize, my: usize, size: usize) -> GridResult<Self> {
        let (nx, ny) = Self::auto_layout(mx, my, size)?;
        Self::new(mx, my, nx, ny)
    }

    /// 自动块数选择
    pub fn auto_layout(mx: usize, my: usize, size: usize) -> GridResult<(usize, usize)> {
        if size == 0 || my == 0 {
            return Err(GridError::decomposition(mx, my, 0, 0, "工作单元数必须为正"));
        }
        let guess = (0.5 + (mx as f64 * size as f64 / my as f64).sqrt()) as usize;
        let mut nx = guess.clamp(1, size);
        while size % nx != 0 {
            nx -= 1;
        }
        let mut ny = size / nx;
        if mx > my && nx < ny {
            std::mem::swap(&mut nx, &mut ny);
        }
        if mx / nx < 2 || my / ny < 2 {
            return Err(GridError::decomposition(
                mx,
                my,
                nx,
                ny,
                "每块每个方向至少需要 2 个格点",
            ));
        }
        Ok((nx, ny))
    }

    /// 全局尺寸 (Mx, My)
    #[inline]
    pub fn global_size(&self) -> (usize, usize) {
        (self.mx, self.my)
    }

    /// 块数 (Nx, Ny)
    #[inline]
    pub fn layout(&self) -> (usize, usize) {
        (self.nx, self.ny)
    }

    /// 全部分块
    #[inline]
    pub fn patches(&self) -> &[HorizontalPatch] {
        &self.patches
    }

    /// 分块个数
    #[inline]
    pub fn len(&self) -> usize {
        self.patches.len()
    }

    /// 是否无分块
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    /// x 方向各块拥有的格点数
    pub fn ownership_x(&self) -> Vec<usize> {
        self.x_ranges.iter().map(|&(_, len)| len).collect()
    }

    /// y 方向各块拥有的格点数
    pub fn ownership_y(&self) -> Vec<usize> {
        self.y_ranges.iter().map(|&(_, len)| len).collect()
    }

    /// 周期折回全局索引
    #[inline]
    pub fn wrap(&self, i: isize, j: isize) -> (usize, usize) {
        (
            i.rem_euclid(self.mx as isize) as usize,
            j.rem_euclid(self.my as isize) as usize,
        )
    }

    /// 拥有 (i, j) 的分块编号（索引先做周期折回）
    pub fn owner_of(&self, i: isize, j: isize) -> usize {
        let (i, j) = self.wrap(i, j);
        let px = self
            .x_ranges
            .iter()
            .position(|&(s, len)| i >= s && i < s + len)
            .unwrap_or(0);
        let py = self
            .y_ranges
            .iter()
            .position(|&(s, len)| j >= s && j < s + len)
            .unwrap_or(0);
        py * self.nx + px
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patches_tile_domain() {
        let decomp = PatchDecomposition::new(11, 7, 3, 2).unwrap();
        let mut seen = vec![0usize; 11 * 7];
        for patch in decomp.patches() {
            for (i, j) in patch.owned() {
                seen[j * 11 + i] += 1;
            }
        }
        assert!(seen.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_balanced_split() {
        let decomp = PatchDecomposition::new(11, 7, 3, 2).unwrap();
        assert_eq!(decomp.ownership_x(), vec![4, 4, 3]);
        assert_eq!(decomp.ownership_y(), vec![4, 3]);
    }

    #[test]
    fn test_too_many_procs_rejected() {
        assert!(PatchDecomposition::new(4, 4, 5, 1).is_err());
        assert!(PatchDecomposition::new(4, 4, 0, 1).is_err());
    }

    #[test]
    fn test_owner_with_wrap() {
        let decomp = PatchDecomposition::new(10, 10, 2, 2).unwrap();
        assert_eq!(decomp.owner_of(0, 0), 0);
        assert_eq!(decomp.owner_of(-1, 0), 1);
        assert_eq!(decomp.owner_of(0, -1), 2);
        assert_eq!(decomp.owner_of(10, 10), 0);
    }

    #[test]
    fn test_auto_layout() {
        assert_eq!(PatchDecomposition::auto_layout(61, 61, 4).unwrap(), (2, 2));
        assert_eq!(PatchDecomposition::auto_layout(100, 25, 4).unwrap(), (4, 1));
        assert_eq!(PatchDecomposition::auto_layout(61, 61, 1).unwrap(), (1, 1));
        assert!(PatchDecomposition::auto_layout(3, 3, 4).is_err());
    }
}
