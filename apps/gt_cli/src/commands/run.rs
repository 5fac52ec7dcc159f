// apps/gt_cli/src/commands/run.rs

//! 运行冰穹试验命令
//!
//! 冰厚取抛物面 `H = H0·(1 - (r/R)²)`（r < R），R 为 x 方向半宽的给定比例；
//! 冰与基岩初始为均匀温度，地热通量均匀。按配置的大气与海洋模型逐步推进。
//! 出现零主元时把诊断写入输出目录后终止。

use anyhow::{ensure, Context, Result};
use clap::Args;
use gt_config::ModelConfig;
use gt_grid::{DistributedGrid, Field2};
use gt_physics::{
    Couplers, DefaultEnthalpyConverter, StepOptions, StepReport, ThermalState, VariableRegistry,
};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{error, info, warn};

use super::load_config;

/// 运行参数
#[derive(Args)]
pub struct RunArgs {
    /// 配置文件路径（JSON），缺省使用默认配置
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 时间步数（覆盖配置）
    #[arg(short = 'n', long)]
    pub steps: Option<usize>,

    /// 时间步长 [a]（覆盖配置）
    #[arg(long)]
    pub dt: Option<f64>,

    /// 探测柱 "i,j"（覆盖配置）
    #[arg(long, value_delimiter = ',', num_args = 2)]
    pub sounding: Option<Vec<usize>>,

    /// 诊断输出目录（覆盖配置）
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// 工作单元数（未指定分块布局时用于自动分块）
    #[arg(short, long, default_value = "1")]
    pub workers: usize,
}

/// 执行运行命令
pub fn execute(args: RunArgs) -> Result<()> {
    info!("=== Glacitherm 热力学运行 ===");

    let mut config = load_config(args.config.as_deref())?;
    if let Some(n) = args.steps {
        config.run.n_steps = n;
    }
    if let Some(dt) = args.dt {
        config.run.dt_years = dt;
    }
    if let Some(ij) = &args.sounding {
        config.run.sounding = Some([ij[0], ij[1]]);
    }
    if let Some(dir) = args.output {
        config.run.dump_dir = dir;
    }
    config.validate().context("配置校验失败")?;

    let grid = DistributedGrid::new(&config.grid, args.workers.max(1)).context("建立网格失败")?;
    for line in grid.report().lines() {
        info!("{}", line);
    }

    let ec = DefaultEnthalpyConverter::new(&config.thermal);
    let mut state = ThermalState::new(&grid, config.run.start_year);
    let registry = build_dome(&grid, &config, &ec, &mut state)?;
    let mut couplers = Couplers::from_config(&config.atmosphere, &config.ocean);
    info!("耦合器: {:?}", couplers);

    let options = StepOptions {
        sounding: config.run.sounding.map(|[i, j]| (i, j)),
    };
    let dump_dir = &config.run.dump_dir;
    std::fs::create_dir_all(dump_dir)
        .with_context(|| format!("无法创建输出目录 {}", dump_dir.display()))?;

    let start = Instant::now();
    let mut total = StepReport::default();
    for n in 1..=config.run.n_steps {
        let result = state.step(
            &grid,
            &config.thermal,
            &ec,
            &mut couplers,
            &registry,
            config.run.dt_years,
            options.clone(),
        );
        let report = match result {
            Ok(report) => report,
            Err(err) => {
                if let Some(diag) = err.diagnostics() {
                    let path = diag.write_dump(dump_dir).context("写入零主元诊断失败")?;
                    error!("零主元诊断已写入 {}", path.display());
                }
                return Err(err).with_context(|| format!("第 {n} 步失败"));
            }
        };

        for view in &report.views {
            let path = view.write(dump_dir).context("写入探测柱方程组失败")?;
            info!("探测柱方程组已写入 {}", path.display());
        }
        if report.fully_melted > 0 {
            warn!("{} 个基底点完全融化，温度取压力融点", report.fully_melted);
        }

        info!(
            "t={:.2} a: 联合 {} / 仅基岩 {} / 仅冰焓 {}, λ<1 {} 柱, 最大融化率 {:.3e} m/a, 最大储水 {:.3} m",
            state.year,
            report.combined_columns,
            report.bedrock_only_columns,
            report.ice_only_columns,
            report.sacrificed_columns,
            owned_max(&state.basal_melt_rate) * gt_config::SECONDS_PER_YEAR,
            owned_max(&state.fields.hmelt)
        );
        total.merge(report);
    }

    let (_, melted) = state.temperature(&grid, &ec)?;
    let elapsed = start.elapsed();

    info!("=== 运行完成 ===");
    info!("总步数: {}", config.run.n_steps);
    info!("计算时间: {:.2} s", elapsed.as_secs_f64());
    info!(
        "完全融化层: {} (冰当量 {:.3e} m³), 温度换算饱和 {} 层",
        total.liquified_count, total.liquified_volume, melted
    );

    Ok(())
}

/// 建立冰穹初始场并返回 Fausto 模型所需的派生场
fn build_dome(
    grid: &DistributedGrid,
    config: &ModelConfig,
    ec: &DefaultEnthalpyConverter,
    state: &mut ThermalState,
) -> Result<VariableRegistry> {
    let exp = &config.experiment;
    let lz = grid.vertical().lz;
    ensure!(
        exp.dome_thickness <= lz,
        "冰穹厚度 {} m 超出计算域高度 Lz={} m",
        exp.dome_thickness,
        lz
    );

    let radius = exp.dome_radius_fraction * grid.half_widths().0;
    for field in state.fields.thickness.iter_mut() {
        let patch = *field.patch();
        for (i, j) in patch.owned() {
            let (_, _, r) = grid.mapcoords(i, j);
            let h = if r < radius {
                exp.dome_thickness * (1.0 - (r / radius).powi(2))
            } else {
                0.0
            };
            field.set(i, j, h)?;
        }
    }
    for field in state.fields.geothermal_flux.iter_mut() {
        field.fill(exp.geothermal_flux);
    }
    state.fields.bedrock_temperature =
        grid.create_bedrock_field3("litho_temp", exp.initial_temperature);

    let temp = grid.create_ice_field3("temp", exp.initial_temperature);
    state.set_enthalpy_from_temperature_cold(grid, ec, &temp)?;
    state.update_ghosts(grid)?;
    info!(
        "冰穹: H0={} m, R={:.1} km, 初始温度 {} K",
        exp.dome_thickness,
        radius / 1000.0,
        exp.initial_temperature
    );

    // 基岩高程为 0，冰面高程即冰厚
    let mut registry = VariableRegistry::new();
    registry.insert("surface_altitude", state.fields.thickness.clone());
    registry.insert("latitude", grid.create_field2("lat", exp.latitude));
    registry.insert("longitude", grid.create_field2("lon", exp.longitude));
    Ok(registry)
}

/// 全部分块拥有格点上的最大值
fn owned_max(fields: &[Field2<f64>]) -> f64 {
    fields
        .iter()
        .flat_map(|f| {
            f.patch()
                .owned()
                .filter_map(move |(i, j)| f.get(i as isize, j as isize).ok())
        })
        .fold(f64::NEG_INFINITY, f64::max)
}
