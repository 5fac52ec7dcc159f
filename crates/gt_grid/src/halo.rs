// crates/gt_grid/src/halo.rs

//! 幽灵交换
//!
//! 对同一场在所有分块上的副本执行一次集体交换：
//! 交换后每个分块幽灵环中的值等于其拥有者分块中对应格点的值。
//!
//! 交换分两阶段，先只读地从拥有者处收集全部幽灵值，再统一写入，
//! 因此结果与分块处理顺序无关。调用点即同步点：所有分块的写入
//! 都必须在交换前完成。

use crate::decomposition::PatchDecomposition;
use crate::error::{GridError, GridResult};
use crate::field::{Field3, PatchArray};

/// 可参与幽灵交换的分块场
pub trait HaloField {
    /// 格点值类型
    type Value: Copy;

    /// 底层分块数组
    fn array(&self) -> &PatchArray<Self::Value>;

    /// 底层分块数组（可写）
    fn array_mut(&mut self) -> &mut PatchArray<Self::Value>;
}

impl<T: Copy> HaloField for PatchArray<T> {
    type Value = T;

    fn array(&self) -> &PatchArray<T> {
        self
    }

    fn array_mut(&mut self) -> &mut PatchArray<T> {
        self
    }
}

impl HaloField for Field3 {
    type Value = f64;

    fn array(&self) -> &PatchArray<f64> {
        self.array()
    }

    fn array_mut(&mut self) -> &mut PatchArray<f64> {
        self.array_mut()
    }
}

/// 幽灵交换能力
pub trait HaloExchange {
    /// 刷新 fields 中每个分块副本的幽灵环
    ///
    /// `fields[r]` 必须是编号为 r 的分块上的副本。
    fn exchange<F: HaloField>(&self, fields: &mut [F]) -> GridResult<()>;
}

/// 双向周期边界上的幽灵交换
#[derive(Debug, Clone)]
pub struct PeriodicHaloExchange {
    decomposition: PatchDecomposition,
}

impl PeriodicHaloExchange {
    /// 基于分块方案创建
    pub fn new(decomposition: PatchDecomposition) -> Self {
        Self { decomposition }
    }

    fn check_layout<T: Copy>(&self, arrays: &[&PatchArray<T>]) -> GridResult<()> {
        GridError::check_size("halo fields", self.decomposition.len(), arrays.len())?;
        for (rank, array) in arrays.iter().enumerate() {
            if array.patch() != &self.decomposition.patches()[rank] {
                return Err(GridError::OutOfPatch {
                    i: array.patch().xs as isize,
                    j: array.patch().ys as isize,
                    patch: format!("期望分块 #{rank}"),
                });
            }
            if array.dof() != arrays[0].dof() {
                return Err(GridError::SizeMismatch {
                    name: "halo dof",
                    expected: arrays[0].dof(),
                    actual: array.dof(),
                });
            }
        }
        Ok(())
    }
}

impl HaloExchange for PeriodicHaloExchange {
    fn exchange<F: HaloField>(&self, fields: &mut [F]) -> GridResult<()> {
        // 收集阶段：只读
        let mut packed: Vec<Vec<(isize, isize, Vec<F::Value>)>> = Vec::with_capacity(fields.len());
        {
            let arrays: Vec<&PatchArray<F::Value>> = fields.iter().map(|f| f.array()).collect();
            self.check_layout(&arrays)?;

            for array in &arrays {
                let mut ghosts = Vec::new();
                for (gi, gj) in array.ghost_ring() {
                    let (wi, wj) = self.decomposition.wrap(gi, gj);
                    let owner = self.decomposition.owner_of(gi, gj);
                    let values = arrays[owner].values(wi as isize, wj as isize)?;
                    ghosts.push((gi, gj, values.to_vec()));
                }
                packed.push(ghosts);
            }
        }

        // 写入阶段
        for (field, ghosts) in fields.iter_mut().zip(packed) {
            let array = field.array_mut();
            for (gi, gj, values) in ghosts {
                array.write_ghost(gi, gj, &values);
            }
            array.mark_ghosts_valid();
        }

        log::trace!("幽灵交换完成: {} 个分块", self.decomposition.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Field2;

    fn filled(decomp: &PatchDecomposition) -> Vec<Field2<f64>> {
        let (mx, my) = decomp.global_size();
        decomp
            .patches()
            .iter()
            .map(|&p| {
                let mut f = Field2::new("id", p, (mx, my), 1, -1.0);
                for (i, j) in p.owned() {
                    f.set(i, j, (i * 100 + j) as f64).unwrap();
                }
                f
            })
            .collect()
    }

    #[test]
    fn test_exchange_fills_ghosts_from_owners() {
        let decomp = PatchDecomposition::new(6, 5, 2, 2).unwrap();
        let halo = PeriodicHaloExchange::new(decomp.clone());
        let mut fields = filled(&decomp);
        assert!(fields.iter().all(|f| !f.ghosts_valid()));

        halo.exchange(&mut fields).unwrap();

        for f in &fields {
            assert!(f.ghosts_valid());
            for (gi, gj) in f.ghost_ring() {
                let (wi, wj) = decomp.wrap(gi, gj);
                assert_eq!(f.get(gi, gj).unwrap(), (wi * 100 + wj) as f64);
            }
        }
    }

    #[test]
    fn test_single_patch_periodic_wrap() {
        let decomp = PatchDecomposition::new(4, 3, 1, 1).unwrap();
        let halo = PeriodicHaloExchange::new(decomp.clone());
        let mut fields = filled(&decomp);
        halo.exchange(&mut fields).unwrap();
        assert_eq!(fields[0].get(-1, 0).unwrap(), 300.0);
        assert_eq!(fields[0].get(4, 3).unwrap(), 0.0);
    }

    #[test]
    fn test_wrong_field_count_rejected() {
        let decomp = PatchDecomposition::new(6, 5, 2, 2).unwrap();
        let halo = PeriodicHaloExchange::new(decomp.clone());
        let mut fields = filled(&decomp);
        fields.pop();
        assert!(halo.exchange(&mut fields).is_err());
    }
}
