// crates/gt_grid/src/field.rs

//! 分块场
//!
//! 每个分块的场数据连同一圈幽灵单元（模板宽度 1）一起存储，
//! 通过全局索引 (i, j) 访问，索引在域边界做周期折回。
//!
//! # 幽灵值有效性
//!
//! 任何可变访问都会把场标记为"幽灵值过期"；只有幽灵交换
//! （见 [`crate::halo`]）之后才重新标记为有效。读取邻居值的计算
//! 应先检查 [`PatchArray::ghosts_valid`]。
//!
//! # 布局
//!
//! ```text
//! 局部索引 li = i - xs + 1 ∈ [0, xm+2)，lj 同理
//! 偏移 = ((li · (ym+2)) + lj) · dof + k
//! ```

use std::sync::Arc;

use crate::decomposition::HorizontalPatch;
use crate::error::{GridError, GridResult};
use crate::vertical::{interpolate_at, interpolate_column, FineVerticalGrid};

/// 幽灵环宽度
pub const GHOST_WIDTH: usize = 1;

/// 带幽灵环的分块数组，每个格点 dof 个值
#[derive(Debug, Clone, PartialEq)]
pub struct PatchArray<T> {
    name: String,
    patch: HorizontalPatch,
    global: (usize, usize),
    dof: usize,
    data: Vec<T>,
    ghosts_valid: bool,
}

/// 二维场（每格点一个值）
pub type Field2<T> = PatchArray<T>;

impl<T: Copy> PatchArray<T> {
    /// 创建以 fill 填充的数组
    ///
    /// 新建数组的幽灵环与内部同值，视为有效。
    pub fn new(
        name: impl Into<String>,
        patch: HorizontalPatch,
        global: (usize, usize),
        dof: usize,
        fill: T,
    ) -> Self {
        let len = (patch.xm + 2 * GHOST_WIDTH) * (patch.ym + 2 * GHOST_WIDTH) * dof;
        Self {
            name: name.into(),
            patch,
            global,
            dof,
            data: vec![fill; len],
            ghosts_valid: true,
        }
    }

    /// 场名
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 所属分块
    #[inline]
    pub fn patch(&self) -> &HorizontalPatch {
        &self.patch
    }

    /// 全局尺寸 (Mx, My)
    #[inline]
    pub fn global_size(&self) -> (usize, usize) {
        self.global
    }

    /// 每格点值个数
    #[inline]
    pub fn dof(&self) -> usize {
        self.dof
    }

    /// 幽灵值是否有效
    #[inline]
    pub fn ghosts_valid(&self) -> bool {
        self.ghosts_valid
    }

    /// 幽灵交换完成后标记为有效
    #[inline]
    pub fn mark_ghosts_valid(&mut self) {
        self.ghosts_valid = true;
    }

    /// 局部一维索引（格点起始偏移）
    ///
    /// 接受分块及幽灵环内的全局索引，并尝试一次周期折回。
    fn offset(&self, i: isize, j: isize) -> Option<usize> {
        let li = local(i, self.patch.xs, self.patch.xm, self.global.0)?;
        let lj = local(j, self.patch.ys, self.patch.ym, self.global.1)?;
        Some((li * (self.patch.ym + 2 * GHOST_WIDTH) + lj) * self.dof)
    }

    fn checked_offset(&self, i: isize, j: isize) -> GridResult<usize> {
        self.offset(i, j).ok_or_else(|| GridError::OutOfPatch {
            i,
            j,
            patch: self.patch.to_string(),
        })
    }

    /// 读取格点的全部 dof 值（可含幽灵环）
    pub fn values(&self, i: isize, j: isize) -> GridResult<&[T]> {
        let off = self.checked_offset(i, j)?;
        Ok(&self.data[off..off + self.dof])
    }

    /// 可写访问拥有格点的全部 dof 值，幽灵值随之过期
    pub fn values_mut(&mut self, i: usize, j: usize) -> GridResult<&mut [T]> {
        if !self.patch.owns(i, j) {
            return Err(GridError::OutOfPatch {
                i: i as isize,
                j: j as isize,
                patch: self.patch.to_string(),
            });
        }
        let off = self.checked_offset(i as isize, j as isize)?;
        self.ghosts_valid = false;
        Ok(&mut self.data[off..off + self.dof])
    }

    /// 以 fill 覆盖全部数据（含幽灵环，故幽灵值保持有效）
    pub fn fill(&mut self, value: T) {
        self.data.iter_mut().for_each(|v| *v = value);
        self.ghosts_valid = true;
    }

    /// 复制另一同形数组的全部数据（含幽灵环与有效标记）
    pub fn copy_from(&mut self, other: &Self) -> GridResult<()> {
        GridError::check_size("copy_from", self.data.len(), other.data.len())?;
        self.data.copy_from_slice(&other.data);
        self.ghosts_valid = other.ghosts_valid;
        Ok(())
    }

    /// 直接写入幽灵环中的格点，供幽灵交换使用
    pub(crate) fn write_ghost(&mut self, i: isize, j: isize, values: &[T]) {
        if let Some(off) = self.offset(i, j) {
            self.data[off..off + self.dof].copy_from_slice(values);
        }
    }

    /// 幽灵环上的全部全局索引（未折回）
    pub(crate) fn ghost_ring(&self) -> Vec<(isize, isize)> {
        let p = &self.patch;
        let x0 = p.xs as isize - 1;
        let x1 = (p.xs + p.xm) as isize;
        let y0 = p.ys as isize - 1;
        let y1 = (p.ys + p.ym) as isize;
        let mut ring = Vec::with_capacity(2 * (p.xm + p.ym) + 4);
        for i in x0..=x1 {
            for j in y0..=y1 {
                if i == x0 || i == x1 || j == y0 || j == y1 {
                    ring.push((i, j));
                }
            }
        }
        ring
    }
}

impl PatchArray<f64> {
    /// 读取二维场的值（dof 须为 1）
    #[inline]
    pub fn get(&self, i: isize, j: isize) -> GridResult<f64> {
        Ok(self.values(i, j)?[0])
    }

    /// 设置二维场在拥有格点处的值
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> GridResult<()> {
        self.values_mut(i, j)?[0] = value;
        Ok(())
    }

    /// 八邻居的值，顺序为 E, NE, N, NW, W, SW, S, SE
    pub fn neighbors(&self, i: usize, j: usize) -> GridResult<[f64; 8]> {
        let (i, j) = (i as isize, j as isize);
        Ok([
            self.get(i + 1, j)?,
            self.get(i + 1, j + 1)?,
            self.get(i, j + 1)?,
            self.get(i - 1, j + 1)?,
            self.get(i - 1, j)?,
            self.get(i - 1, j - 1)?,
            self.get(i, j - 1)?,
            self.get(i + 1, j - 1)?,
        ])
    }
}

/// 全局索引到局部（含幽灵）索引，必要时做一次周期折回
fn local(g: isize, start: usize, width: usize, global: usize) -> Option<usize> {
    let lo = start as isize - GHOST_WIDTH as isize;
    let span = (width + 2 * GHOST_WIDTH) as isize;
    let n = global as isize;
    [g, g + n, g - n]
        .into_iter()
        .map(|c| c - lo)
        .find(|&l| (0..span).contains(&l))
        .map(|l| l as usize)
}

/// 三维场所在介质
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelKind {
    /// 冰层
    Ice,
    /// 基岩
    Bedrock,
}

/// 水平面上某层的五点模板
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlaneStar {
    /// 中心
    pub ij: f64,
    /// i+1
    pub ip1: f64,
    /// i-1
    pub im1: f64,
    /// j+1
    pub jp1: f64,
    /// j-1
    pub jm1: f64,
}

/// 三维场：每个水平格点一个垂向柱（存储层）
#[derive(Debug, Clone, PartialEq)]
pub struct Field3 {
    kind: LevelKind,
    levels: Arc<[f64]>,
    array: PatchArray<f64>,
}

impl Field3 {
    /// 创建以 fill 填充的三维场
    pub fn new(
        name: impl Into<String>,
        kind: LevelKind,
        levels: Arc<[f64]>,
        patch: HorizontalPatch,
        global: (usize, usize),
        fill: f64,
    ) -> Self {
        let dof = levels.len();
        Self {
            kind,
            array: PatchArray::new(name, patch, global, dof, fill),
            levels,
        }
    }

    /// 介质
    #[inline]
    pub fn kind(&self) -> LevelKind {
        self.kind
    }

    /// 存储层高度
    #[inline]
    pub fn levels(&self) -> &[f64] {
        &self.levels
    }

    /// 底层数组
    #[inline]
    pub fn array(&self) -> &PatchArray<f64> {
        &self.array
    }

    /// 底层数组（可写，幽灵交换使用）
    #[inline]
    pub(crate) fn array_mut(&mut self) -> &mut PatchArray<f64> {
        &mut self.array
    }

    /// 场名
    #[inline]
    pub fn name(&self) -> &str {
        self.array.name()
    }

    /// 所属分块
    #[inline]
    pub fn patch(&self) -> &HorizontalPatch {
        self.array.patch()
    }

    /// 幽灵值是否有效
    #[inline]
    pub fn ghosts_valid(&self) -> bool {
        self.array.ghosts_valid()
    }

    /// 存储层上的柱
    #[inline]
    pub fn column(&self, i: isize, j: isize) -> GridResult<&[f64]> {
        self.array.values(i, j)
    }

    /// 可写访问拥有格点的柱
    #[inline]
    pub fn column_mut(&mut self, i: usize, j: usize) -> GridResult<&mut [f64]> {
        self.array.values_mut(i, j)
    }

    /// 以 fill 覆盖全部数据
    pub fn fill(&mut self, value: f64) {
        self.array.fill(value);
    }

    /// 复制另一同形场
    pub fn copy_from(&mut self, other: &Field3) -> GridResult<()> {
        self.array.copy_from(&other.array)
    }

    /// 第 k 存储层的水平五点模板
    pub fn plane_star(&self, i: usize, j: usize, k: usize) -> GridResult<PlaneStar> {
        let (i, j) = (i as isize, j as isize);
        let at = |i: isize, j: isize| -> GridResult<f64> { Ok(self.array.values(i, j)?[k]) };
        Ok(PlaneStar {
            ij: at(i, j)?,
            ip1: at(i + 1, j)?,
            im1: at(i - 1, j)?,
            jp1: at(i, j + 1)?,
            jm1: at(i, j - 1)?,
        })
    }

    /// 把柱插值到细网格，写入 `out[..n_fine]`
    pub fn fine_column(
        &self,
        i: usize,
        j: usize,
        fine: &FineVerticalGrid,
        out: &mut [f64],
    ) -> GridResult<()> {
        let column = self.array.values(i as isize, j as isize)?;
        let (dst_z, below) = match self.kind {
            LevelKind::Ice => (&fine.zlevels, &fine.ice_storage_below_fine),
            LevelKind::Bedrock => (&fine.zblevels, &fine.bed_storage_below_fine),
        };
        if out.len() < dst_z.len() {
            return Err(GridError::SizeMismatch {
                name: "fine column",
                expected: dst_z.len(),
                actual: out.len(),
            });
        }
        interpolate_column(&self.levels, column, below, dst_z, out);
        Ok(())
    }

    /// 细网格各层上的水平五点模板，写入 `out[..n_fine]`
    ///
    /// 邻居柱可位于幽灵环中，调用前幽灵值须有效。
    pub fn fine_plane_star(
        &self,
        i: usize,
        j: usize,
        fine: &FineVerticalGrid,
        out: &mut [PlaneStar],
    ) -> GridResult<()> {
        let (i, j) = (i as isize, j as isize);
        let (dst_z, below) = match self.kind {
            LevelKind::Ice => (&fine.zlevels, &fine.ice_storage_below_fine),
            LevelKind::Bedrock => (&fine.zblevels, &fine.bed_storage_below_fine),
        };
        if out.len() < dst_z.len() {
            return Err(GridError::SizeMismatch {
                name: "fine plane star",
                expected: dst_z.len(),
                actual: out.len(),
            });
        }
        let ij = self.array.values(i, j)?;
        let ip1 = self.array.values(i + 1, j)?;
        let im1 = self.array.values(i - 1, j)?;
        let jp1 = self.array.values(i, j + 1)?;
        let jm1 = self.array.values(i, j - 1)?;
        let z = &self.levels;
        for (k, &zk) in dst_z.iter().enumerate() {
            let m = below[k];
            out[k] = PlaneStar {
                ij: interpolate_at(z, ij, m, zk),
                ip1: interpolate_at(z, ip1, m, zk),
                im1: interpolate_at(z, im1, m, zk),
                jp1: interpolate_at(z, jp1, m, zk),
                jm1: interpolate_at(z, jm1, m, zk),
            };
        }
        Ok(())
    }

    /// 由细网格上的柱分段线性插值回存储层
    pub fn set_fine_column(
        &mut self,
        i: usize,
        j: usize,
        fine: &FineVerticalGrid,
        values: &[f64],
    ) -> GridResult<()> {
        let (src_z, below) = match self.kind {
            LevelKind::Ice => (&fine.zlevels, &fine.ice_fine_below_storage),
            LevelKind::Bedrock => (&fine.zblevels, &fine.bed_fine_below_storage),
        };
        GridError::check_size("fine column", src_z.len(), values.len())?;
        let levels = Arc::clone(&self.levels);
        let column = self.array.values_mut(i, j)?;
        interpolate_column(src_z, values, below, &levels, column);
        Ok(())
    }
}
