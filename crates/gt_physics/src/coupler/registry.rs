// crates/gt_physics/src/coupler/registry.rs

//! 变量注册表：按名称共享派生二维场（每个分块一个副本）

use std::collections::BTreeMap;

use gt_grid::Field2;

use crate::error::{ThermoError, ThermoResult};

/// 变量注册表
#[derive(Debug, Clone, Default)]
pub struct VariableRegistry {
    fields: BTreeMap<String, Vec<Field2<f64>>>,
}

impl VariableRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册或替换一个场
    pub fn insert(&mut self, name: impl Into<String>, patches: Vec<Field2<f64>>) {
        self.fields.insert(name.into(), patches);
    }

    /// 按名称取场，缺失时返回 [`ThermoError::MissingCollaborator`]
    pub fn get(&self, name: &str) -> ThermoResult<&[Field2<f64>]> {
        self.fields
            .get(name)
            .map(Vec::as_slice)
            .ok_or_else(|| ThermoError::missing(name))
    }

    /// 可写访问
    pub fn get_mut(&mut self, name: &str) -> ThermoResult<&mut Vec<Field2<f64>>> {
        self.fields
            .get_mut(name)
            .ok_or_else(|| ThermoError::missing(name))
    }

    /// 是否已注册
    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// 全部名称（有序）
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gt_grid::HorizontalPatch;

    #[test]
    fn test_insert_and_get() {
        let patch = HorizontalPatch {
            rank: 0,
            xs: 0,
            xm: 2,
            ys: 0,
            ym: 2,
        };
        let mut reg = VariableRegistry::new();
        reg.insert("latitude", vec![Field2::new("latitude", patch, (2, 2), 1, 70.0)]);
        assert!(reg.contains("latitude"));
        assert_eq!(reg.get("latitude").unwrap()[0].get(1, 1).unwrap(), 70.0);
        assert!(matches!(
            reg.get("longitude"),
            Err(ThermoError::MissingCollaborator { .. })
        ));
        assert_eq!(reg.names().collect::<Vec<_>>(), vec!["latitude"]);
    }
}
