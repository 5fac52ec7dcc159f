// crates/gt_physics/src/column/report.rs

//! 柱方程组诊断输出
//!
//! - [`ColumnDiagnostics`]: 零主元失败时携带的完整方程组，可写为
//!   `{prefix}_i{i}_j{j}_zeropivot{pos}.m`
//! - [`ColumnView`]: 探测柱的方程组与解，可写为 `{prefix}_i{i}_j{j}.m`

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use super::tridiagonal::{vector_text, TridiagonalSystem};

/// 柱求解器变体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverVariant {
    /// 基岩与冰联合
    Combined,
    /// 仅基岩
    BedrockOnly,
    /// 仅冰焓
    IceEnthalpyOnly,
}

impl SolverVariant {
    /// 诊断文件名前缀
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Combined => "combined",
            Self::BedrockOnly => "bedrockOnly",
            Self::IceEnthalpyOnly => "iceenthOnly",
        }
    }
}

impl fmt::Display for SolverVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Combined => "联合",
            Self::BedrockOnly => "仅基岩",
            Self::IceEnthalpyOnly => "仅冰焓",
        };
        f.write_str(name)
    }
}

/// 零主元诊断
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDiagnostics {
    /// 求解器变体
    pub variant: SolverVariant,
    /// i 索引
    pub i: usize,
    /// j 索引
    pub j: usize,
    /// 零主元位置（从 1 计数）
    pub pivot: usize,
    /// 1-范数
    pub norm1: f64,
    /// 对角占优比
    pub ddratio: f64,
    /// 组装好的方程组
    pub system: TridiagonalSystem,
}

impl ColumnDiagnostics {
    /// 由失败的方程组生成诊断
    pub fn new(
        variant: SolverVariant,
        (i, j): (usize, usize),
        pivot: usize,
        system: &TridiagonalSystem,
    ) -> Self {
        Self {
            variant,
            i,
            j,
            pivot,
            norm1: system.norm1(),
            ddratio: system.ddratio(),
            system: system.clone(),
        }
    }

    /// 诊断文件名
    pub fn file_name(&self) -> String {
        format!(
            "{}_i{}_j{}_zeropivot{}.m",
            self.variant.prefix(),
            self.i,
            self.j,
            self.pivot
        )
    }

    /// 文件内容
    pub fn text(&self) -> String {
        let mut text = format!(
            "% {} system at column (i, j) = ({}, {}) has zero pivot at position {}\n",
            self.variant.prefix(),
            self.i,
            self.j,
            self.pivot
        );
        text.push_str(&dominance_line(self.norm1, self.ddratio));
        text.push_str(&self.system.matlab_text(self.variant.prefix()));
        text
    }

    /// 写入 dir 下的诊断文件，返回其路径
    pub fn write_dump(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(self.file_name());
        fs::write(&path, self.text())?;
        Ok(path)
    }
}

/// 探测柱的方程组与解
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnView {
    /// 求解器变体
    pub variant: SolverVariant,
    /// i 索引
    pub i: usize,
    /// j 索引
    pub j: usize,
    /// 方程组（求解前）
    pub system: TridiagonalSystem,
    /// 解
    pub solution: Vec<f64>,
    /// 求解器常数说明
    pub constants: String,
}

impl ColumnView {
    /// 文件名
    pub fn file_name(&self) -> String {
        format!("{}_i{}_j{}.m", self.variant.prefix(), self.i, self.j)
    }

    /// 文件内容
    pub fn text(&self) -> String {
        let prefix = self.variant.prefix();
        let mut text = format!(
            "% viewing {} system at column (i, j) = ({}, {})\n",
            prefix, self.i, self.j
        );
        for line in self.constants.lines() {
            text.push_str("% ");
            text.push_str(line);
            text.push('\n');
        }
        text.push_str(&dominance_line(self.system.norm1(), self.system.ddratio()));
        text.push_str(&self.system.matlab_text(prefix));
        text.push_str(&vector_text(&format!("{prefix}_x"), &self.solution));
        text
    }

    /// 写入 dir，返回路径
    pub fn write(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(self.file_name());
        fs::write(&path, self.text())?;
        Ok(path)
    }
}

fn dominance_line(norm1: f64, ddratio: f64) -> String {
    format!(
        "% system has 1-norm = {norm1:.3e} and diagonal-dominance ratio = {ddratio:.5}\n"
    )
}
