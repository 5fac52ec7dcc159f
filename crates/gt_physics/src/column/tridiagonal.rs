// crates/gt_physics/src/column/tridiagonal.rs

//! 三对角方程组与 Thomas 消元
//!
//! 第 k 行为 `L[k]·x[k-1] + D[k]·x[k] + U[k]·x[k+1] = rhs[k]`，
//! 约定 `L[0] = 0`、`U[n-1] = 0`。
//!
//! 求解失败时返回从 1 开始计数的零主元位置。系数或主元非有限
//! 同样视为零主元。

use std::fmt::Write as _;

/// 主元判零的相对阈值（相对 1-范数）
const DOMINANCE_EPS: f64 = 1.0e-12;

/// 三对角方程组
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TridiagonalSystem {
    lower: Vec<f64>,
    diag: Vec<f64>,
    upper: Vec<f64>,
    rhs: Vec<f64>,
    work: Vec<f64>,
}

impl TridiagonalSystem {
    /// 预分配最大阶数
    pub fn with_capacity(n: usize) -> Self {
        Self {
            lower: Vec::with_capacity(n),
            diag: Vec::with_capacity(n),
            upper: Vec::with_capacity(n),
            rhs: Vec::with_capacity(n),
            work: Vec::with_capacity(n),
        }
    }

    /// 重设阶数并清零
    pub fn clear(&mut self, n: usize) {
        for v in [
            &mut self.lower,
            &mut self.diag,
            &mut self.upper,
            &mut self.rhs,
            &mut self.work,
        ] {
            v.clear();
            v.resize(n, 0.0);
        }
    }

    /// 阶数
    #[inline]
    pub fn len(&self) -> usize {
        self.diag.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.diag.is_empty()
    }

    /// 设置第 k 行
    #[inline]
    pub fn set_row(&mut self, k: usize, lower: f64, diag: f64, upper: f64, rhs: f64) {
        self.lower[k] = lower;
        self.diag[k] = diag;
        self.upper[k] = upper;
        self.rhs[k] = rhs;
    }

    /// 第 k 行 (L, D, U, rhs)
    #[inline]
    pub fn row(&self, k: usize) -> (f64, f64, f64, f64) {
        (self.lower[k], self.diag[k], self.upper[k], self.rhs[k])
    }

    /// 下对角
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// 主对角
    pub fn diag(&self) -> &[f64] {
        &self.diag
    }

    /// 上对角
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// 右端项
    pub fn rhs(&self) -> &[f64] {
        &self.rhs
    }

    /// Thomas 消元，解写入 `x[..n]`
    ///
    /// 失败时返回零主元所在行（从 1 计数）。
    pub fn solve(&mut self, x: &mut [f64]) -> Result<(), usize> {
        let n = self.len();
        if n == 0 {
            return Ok(());
        }
        debug_assert!(x.len() >= n);

        let row_finite = |k: usize| {
            self.lower[k].is_finite()
                && self.diag[k].is_finite()
                && self.upper[k].is_finite()
                && self.rhs[k].is_finite()
        };

        let mut b = self.diag[0];
        if !row_finite(0) || b == 0.0 {
            return Err(1);
        }
        x[0] = self.rhs[0] / b;
        for k in 1..n {
            if !row_finite(k) {
                return Err(k + 1);
            }
            self.work[k] = self.upper[k - 1] / b;
            b = self.diag[k] - self.lower[k] * self.work[k];
            if b == 0.0 || !b.is_finite() {
                return Err(k + 1);
            }
            x[k] = (self.rhs[k] - self.lower[k] * x[k - 1]) / b;
        }
        for k in (0..n - 1).rev() {
            x[k] -= self.work[k + 1] * x[k + 1];
        }
        Ok(())
    }

    /// 矩阵 1-范数（列绝对值和的最大值）
    pub fn norm1(&self) -> f64 {
        let n = self.len();
        (0..n)
            .map(|k| {
                let mut s = self.diag[k].abs();
                if k + 1 < n {
                    s += self.lower[k + 1].abs();
                }
                if k > 0 {
                    s += self.upper[k - 1].abs();
                }
                s
            })
            .fold(0.0, f64::max)
    }

    /// 对角占优比 `max_k (|L_k| + |U_k|) / |D_k|`
    ///
    /// 任一对角元相对 1-范数小于 1e-12 时返回 -1。小于 1 即严格对角占优。
    pub fn ddratio(&self) -> f64 {
        let n = self.len();
        let scale = self.norm1();
        let mut z = 0.0_f64;
        for k in 0..n {
            let d = self.diag[k].abs();
            if !(d / scale >= DOMINANCE_EPS) {
                return -1.0;
            }
            let off = if k > 0 { self.lower[k].abs() } else { 0.0 }
                + if k + 1 < n { self.upper[k].abs() } else { 0.0 };
            z = z.max(off / d);
        }
        z
    }

    /// Matlab 格式文本：完整矩阵与右端项，变量名带前缀
    pub fn matlab_text(&self, name: &str) -> String {
        let n = self.len();
        let mut text = String::new();
        let _ = writeln!(text, "{name}_A = [");
        for k in 0..n {
            let row: Vec<String> = (0..n)
                .map(|c| {
                    let v = if c + 1 == k {
                        self.lower[k]
                    } else if c == k {
                        self.diag[k]
                    } else if c == k + 1 {
                        self.upper[k]
                    } else {
                        0.0
                    };
                    format!("{v:.15e}")
                })
                .collect();
            let _ = writeln!(text, "  {};", row.join(" "));
        }
        let _ = writeln!(text, "];");
        text.push_str(&vector_text(&format!("{name}_rhs"), &self.rhs));
        text
    }
}

/// Matlab 列向量文本
pub(crate) fn vector_text(name: &str, values: &[f64]) -> String {
    let mut text = format!("{name} = [\n");
    for v in values {
        let _ = writeln!(text, "  {v:.15e};");
    }
    text.push_str("];\n");
    text
}
