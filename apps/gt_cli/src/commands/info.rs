// apps/gt_cli/src/commands/info.rs

//! 信息显示命令
//!
//! 显示版本、网格分块与垂向离散、转换律与柱方程组常数。

use anyhow::{Context, Result};
use clap::Args;
use gt_config::{ModelConfig, SECONDS_PER_YEAR};
use gt_grid::DistributedGrid;
use gt_physics::{ColumnParams, DefaultEnthalpyConverter, EnthalpyConverter};
use std::path::PathBuf;
use tracing::info;

use super::load_config;

/// 信息显示参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 工作单元数
    #[arg(short, long, default_value = "1")]
    pub workers: usize,

    /// 以 JSON 输出默认配置
    #[arg(long)]
    pub defaults: bool,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    info!("=== Glacitherm 信息 ===");

    if args.defaults {
        let json = serde_json::to_string_pretty(&ModelConfig::default())?;
        println!("{json}");
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    print_version();
    println!();
    print_grid(&config, args.workers)?;
    println!();
    print_constants(&config)?;
    Ok(())
}

fn print_version() {
    println!("=== 版本 ===");
    println!("gt_cli 版本: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "层级: gt_config={} gt_grid={} gt_physics={}",
        gt_config::LAYER,
        gt_grid::LAYER,
        gt_physics::LAYER
    );
    println!("可用并行度: {}", available_threads());
}

fn print_grid(config: &ModelConfig, workers: usize) -> Result<()> {
    println!("=== 网格 ===");
    let grid = DistributedGrid::new(&config.grid, workers.max(1)).context("建立网格失败")?;
    print!("{}", grid.report());
    if grid.fine().mbz() == 2 {
        println!("警告: 基岩细网格恰为两层，热力学步将拒绝该配置");
    }
    Ok(())
}

fn print_constants(config: &ModelConfig) -> Result<()> {
    println!("=== 常数 ===");
    let ec = DefaultEnthalpyConverter::new(&config.thermal);
    println!("{}", ec.describe());

    let grid = DistributedGrid::new(&config.grid, 1).context("建立网格失败")?;
    let params = ColumnParams::new(
        &config.thermal,
        config.run.dt_years * SECONDS_PER_YEAR,
        grid.fine().dz,
        grid.dx(),
        grid.dy(),
    );
    println!("{}", params.describe());
    Ok(())
}

fn available_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
