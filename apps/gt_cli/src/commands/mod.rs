// apps/gt_cli/src/commands/mod.rs

//! 子命令

pub mod info;
pub mod run;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use gt_config::ModelConfig;

/// 读取配置文件，缺省时使用默认配置
pub fn load_config(path: Option<&Path>) -> Result<ModelConfig> {
    match path {
        Some(path) => ModelConfig::from_file(path)
            .with_context(|| format!("无法读取配置文件 {}", path.display())),
        None => Ok(ModelConfig::default()),
    }
}
