// apps/gt_cli/src/commands/validate.rs

//! 配置验证命令
//!
//! 解析配置、汇总全部违规项，并建立网格检查细网格与冰穹几何。

use anyhow::{bail, Result};
use clap::Args;
use gt_config::{ConfigError, ModelConfig};
use gt_grid::DistributedGrid;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// 验证参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: PathBuf,

    /// 严格模式（警告也视为错误）
    #[arg(long)]
    pub strict: bool,
}

/// 验证结果
#[derive(Default)]
struct ValidationResult {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl ValidationResult {
    fn add_error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn add_warning(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn is_ok(&self, strict: bool) -> bool {
        self.errors.is_empty() && (!strict || self.warnings.is_empty())
    }
}

/// 执行验证命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    info!("=== Glacitherm 配置验证 ===");
    println!("检查配置文件: {}", args.config.display());

    let mut result = ValidationResult::default();
    match ModelConfig::from_file(&args.config) {
        Ok(config) => check_config(&config, &mut result),
        Err(e) => result.add_error(e.to_string()),
    }

    for w in &result.warnings {
        warn!("{}", w);
        println!("  ⚠ {w}");
    }
    for e in &result.errors {
        error!("{}", e);
        println!("  ✗ {e}");
    }

    if result.is_ok(args.strict) {
        println!("  ✓ 配置有效");
        Ok(())
    } else {
        bail!(
            "验证失败: {} 个错误, {} 个警告",
            result.errors.len(),
            result.warnings.len()
        )
    }
}

fn check_config(config: &ModelConfig, result: &mut ValidationResult) {
    match config.validate() {
        Ok(()) => {}
        Err(ConfigError::Validation(problems)) => {
            for p in problems {
                result.add_error(p);
            }
            return;
        }
        Err(e) => {
            result.add_error(e.to_string());
            return;
        }
    }

    let grid = match DistributedGrid::new(&config.grid, 1) {
        Ok(grid) => grid,
        Err(e) => {
            result.add_error(format!("建立网格失败: {e}"));
            return;
        }
    };
    let fine = grid.fine();
    if fine.mbz() == 2 {
        result.add_error(format!(
            "基岩细网格恰为两层 (Lbz={} m, dz_fine={:.3} m)，联合方程组无法表示",
            config.grid.lbz, fine.dz
        ));
    }
    if config.experiment.dome_thickness > config.grid.lz {
        result.add_error(format!(
            "冰穹厚度 {} m 超出计算域高度 Lz={} m",
            config.experiment.dome_thickness, config.grid.lz
        ));
    }
    if config.thermal.ice_thermal_conductivity == 0.0 {
        result.add_warning("冰导热系数为 0，冷底通量行将出现零主元");
    }
    if let Some([i, j]) = config.run.sounding {
        info!("探测柱 ({i}, {j})，方程组写入 {}", config.run.dump_dir.display());
    }
    println!(
        "  细网格: Mz_fine={} Mbz_fine={} dz_fine={:.3} m",
        fine.mz(),
        fine.mbz(),
        fine.dz
    );
}
