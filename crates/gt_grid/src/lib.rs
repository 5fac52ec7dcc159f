// crates/gt_grid/src/lib.rs

//! Glacitherm Grid Layer (Layer 2)
//!
//! 分布式网格层：水平分块、垂向离散与幽灵交换。
//!
//! # 设计原则
//!
//! 1. **分块独立**: 每个工作单元只写自己拥有的格点
//! 2. **显式交换**: 可变访问使幽灵值过期，须调用幽灵交换后才能读取邻居
//! 3. **细网格解耦**: 柱求解器只在等间距细网格上工作，通过索引表与存储层互相插值
//!
//! # 模块概览
//!
//! - [`decomposition`]: HorizontalPatch 与 PatchDecomposition
//! - [`vertical`]: VerticalGrid 存储层、FineVerticalGrid 细网格
//! - [`field`]: 带幽灵环的分块场 PatchArray/Field2/Field3
//! - [`halo`]: HaloExchange 与周期幽灵交换
//! - [`grid`]: DistributedGrid 汇总入口
//!
//! # 层级架构
//!
//! ```text
//! Layer 3: gt_physics  ─> 在分块场上逐柱求解
//! Layer 2: gt_grid     ─> (本层)
//! Layer 1: gt_config   ─> GridConfig
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod decomposition;
pub mod error;
pub mod field;
pub mod grid;
pub mod halo;
pub mod vertical;

/// 层级标识
pub const LAYER: u8 = 2;

// 重导出核心类型
pub use decomposition::{HorizontalPatch, PatchDecomposition};
pub use error::{GridError, GridResult};
pub use field::{Field2, Field3, LevelKind, PatchArray, PlaneStar, GHOST_WIDTH};
pub use grid::DistributedGrid;
pub use halo::{HaloExchange, HaloField, PeriodicHaloExchange};
pub use vertical::{interpolate_at, interpolate_column, FineVerticalGrid, VerticalGrid};
