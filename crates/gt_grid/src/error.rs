// crates/gt_grid/src/error.rs

//! 网格层错误类型

use gt_config::ConfigError;

/// 网格层结果类型
pub type GridResult<T> = Result<T, GridError>;

/// 网格错误
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// 配置错误
    #[error("网格配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 无法分块
    #[error("无法将 {mx}x{my} 网格划分为 {nx}x{ny} 块: {reason}")]
    InvalidDecomposition {
        /// x 方向格点数
        mx: usize,
        /// y 方向格点数
        my: usize,
        /// x 方向块数
        nx: usize,
        /// y 方向块数
        ny: usize,
        /// 原因
        reason: String,
    },

    /// 垂向层无效
    #[error("垂向层无效: {0}")]
    InvalidVertical(String),

    /// 高度超出计算域
    #[error("高度 {height} m 超出冰层计算域 [0, {lz}] m")]
    HeightOutOfRange {
        /// 查询高度
        height: f64,
        /// 计算域高度
        lz: f64,
    },

    /// 索引不在分块（含幽灵环）内
    #[error("索引 ({i}, {j}) 不在分块 {patch} 内")]
    OutOfPatch {
        /// x 索引
        i: isize,
        /// y 索引
        j: isize,
        /// 分块描述
        patch: String,
    },

    /// 尺寸不匹配
    #[error("尺寸不匹配: {name} 期望 {expected}, 实际 {actual}")]
    SizeMismatch {
        /// 数据名称
        name: &'static str,
        /// 期望尺寸
        expected: usize,
        /// 实际尺寸
        actual: usize,
    },
}

impl GridError {
    /// 构造分块错误
    pub fn decomposition(mx: usize, my: usize, nx: usize, ny: usize, reason: impl Into<String>) -> Self {
        Self::InvalidDecomposition {
            mx,
            my,
            nx,
            ny,
            reason: reason.into(),
        }
    }

    /// 检查尺寸
    #[inline]
    pub fn check_size(name: &'static str, expected: usize, actual: usize) -> GridResult<()> {
        if expected != actual {
            Err(Self::SizeMismatch {
                name,
                expected,
                actual,
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_size() {
        assert!(GridError::check_size("thk", 4, 4).is_ok());
        let err = GridError::check_size("thk", 4, 5).unwrap_err();
        assert!(err.to_string().contains("thk"));
    }

    #[test]
    fn test_config_error_converts() {
        let err: GridError = ConfigError::Missing("mx".into()).into();
        assert!(matches!(err, GridError::Config(_)));
    }
}
