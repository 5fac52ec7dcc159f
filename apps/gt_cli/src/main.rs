// apps/gt_cli/src/main.rs

//! Glacitherm 命令行界面
//!
//! 在抛物面冰穹试验上推进冰盖焓守恒热力学，或检查配置与网格。
//!
//! # 架构层级
//!
//! 本模块属于 **Layer 4: Application**：
//! - 只通过 `ModelConfig` 建立网格、耦合器与 `ThermalState`
//! - 库层的 `log` 记录经 tracing-subscriber 输出

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Glacitherm 冰盖热力学命令行工具
#[derive(Parser)]
#[command(name = "gt_cli")]
#[command(author = "Glacitherm Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Glacitherm ice-sheet enthalpy thermodynamics", long_about = None)]
struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行冰穹试验
    Run(commands::run::RunArgs),
    /// 显示网格与常数信息
    Info(commands::info::InfoArgs),
    /// 验证配置
    Validate(commands::validate::ValidateArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 初始化日志
    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // try_init 同时桥接 log 门面
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("初始化日志失败: {e}"))?;

    // 执行命令
    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Info(args) => commands::info::execute(args),
        Commands::Validate(args) => commands::validate::execute(args),
    }
}
