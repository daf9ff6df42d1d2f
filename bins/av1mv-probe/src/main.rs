//! av1mv-probe - AV1 运动向量预测探测工具
//!
//! 读取 JSON 场景描述 (帧头, 参考帧运动场, 按解码顺序排列的块),
//! 运行完整的帧级/块级预测流程, 输出每个块的候选栈、上下文与 warp 样本.

mod analysis;
mod scene;

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use av1mv::logging::{self, LoggingConfig};
use clap::Parser;

use analysis::{BlockReport, ProbeOutput};
use scene::Scene;

/// AV1 运动向量预测探测工具
#[derive(Parser, Debug)]
#[command(name = "av1mv-probe", version, about = "AV1 运动向量预测探测工具")]
struct Cli {
    /// 场景文件路径 (JSON)
    input: PathBuf,

    /// 输出 JSON 格式
    #[arg(long)]
    json: bool,

    /// 投影运动场使用的线程数, 1 表示顺序执行
    #[arg(long, default_value_t = 1)]
    threads: usize,

    /// 日志目录
    #[arg(long, default_value = "logs")]
    log_dir: PathBuf,

    /// 日志详细程度 (-v: debug, -vv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = init_logging(&cli) {
        eprintln!("警告: 日志初始化失败: {err:#}");
    }
    if let Err(err) = run(&cli) {
        eprintln!("错误: {err:#}");
        process::exit(1);
    }
}

fn init_logging(cli: &Cli) -> Result<()> {
    let (file_level, console_level) = match cli.verbose {
        0 => ("info", "warn"),
        1 => ("debug", "debug"),
        _ => ("trace", "trace"),
    };
    let mut config = LoggingConfig::new(file_level, &cli.log_dir, "av1mv-probe");
    config.console_level = console_level.to_string();
    logging::init(config)
}

fn run(cli: &Cli) -> Result<()> {
    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("无法读取场景文件 '{}'", cli.input.display()))?;
    let scene: Scene = serde_json::from_str(&text)
        .with_context(|| format!("场景文件格式错误 '{}'", cli.input.display()))?;
    log::info!(
        "场景: {}x{} 个 4x4 单元, {} 个参考帧, {} 个块",
        scene.frame.rows4x4,
        scene.frame.columns4x4,
        scene.reference_frames.len(),
        scene.blocks.len()
    );

    let output = analysis::analyze(&scene, cli.threads)?;
    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("序列化结果失败")?;
        println!("{json}");
    } else {
        print_text(&output);
    }
    Ok(())
}

fn print_text(output: &ProbeOutput) {
    println!("[FRAME]");
    println!(
        "  尺寸 (4x4)   : {}x{}",
        output.frame.rows4x4, output.frame.columns4x4
    );
    println!("  order hint   : {}", output.frame.order_hint);
    println!("  时域运动场   : {}", output.frame.use_ref_frame_mvs);
    println!("  投影参考帧   : {:?}", output.projection.contributed);
    println!("  有效投影位置 : {}", output.projection.valid_positions);
    println!("  保存位置     : {}", output.saved_motion_positions);
    println!("[/FRAME]");
    println!();
    for (index, block) in output.blocks.iter().enumerate() {
        print_block_text(index, block);
    }
}

fn print_block_text(index: usize, block: &BlockReport) {
    println!("[BLOCK #{index}]");
    println!("  位置         : ({}, {})", block.row4x4, block.column4x4);
    println!("  尺寸         : {}", block.size);
    println!("  参考帧       : {:?}", block.references);
    println!("  模式         : {}", block.mode);
    if let Some(prediction) = &block.prediction {
        println!("  全局 MV      : {:?}", prediction.global_mv);
        println!(
            "  候选数       : nearest {} / total {}",
            prediction.nearest_mv_count, prediction.ref_mv_count
        );
        println!(
            "  上下文       : new {} / zero {} / ref {}",
            prediction.new_mv_context, prediction.zero_mv_context, prediction.reference_mv_context
        );
        for (i, candidate) in prediction.candidates.iter().enumerate() {
            println!("    #{i}: {:?} 权重 {}", candidate.mv, candidate.weight);
        }
    }
    if let Some(warp) = &block.warp {
        println!(
            "  warp 样本    : {} 个有效 / {} 个扫描",
            warp.num_warp_samples, warp.num_samples_scanned
        );
        for sample in &warp.samples {
            println!("    {sample:?}");
        }
    }
    println!("[/BLOCK]");
    println!();
}
