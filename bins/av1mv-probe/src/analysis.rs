//! 场景分析: 投影时域运动场, 按解码顺序为每个块构建候选栈并收集 warp 样本.

use anyhow::{Context, Result, bail};
use av1mv_core::MotionVector;
use av1mv_predict::{
    Block, BlockGrid, MvStack, PredictionParameters, ProjectionSummary, SavedMotionField,
    TemporalMotionField, TileBounds, TileContext, WarpSamples, find_mv_stack, find_warp_samples,
    project_motion_field_parallel, setup_motion_field,
};
use log::{debug, info};
use serde::Serialize;

use crate::scene::Scene;

/// 完整分析结果
#[derive(Debug, Serialize)]
pub struct ProbeOutput {
    pub frame: FrameSummary,
    pub projection: ProjectionReport,
    pub blocks: Vec<BlockReport>,
    /// 当前帧保存后可供后续帧投影的 8x8 位置数
    pub saved_motion_positions: usize,
}

#[derive(Debug, Serialize)]
pub struct FrameSummary {
    pub rows4x4: usize,
    pub columns4x4: usize,
    pub order_hint: u32,
    pub use_ref_frame_mvs: bool,
}

#[derive(Debug, Serialize)]
pub struct ProjectionReport {
    pub contributed: Vec<String>,
    pub valid_positions: usize,
    pub threads: usize,
}

#[derive(Debug, Serialize)]
pub struct BlockReport {
    pub row4x4: usize,
    pub column4x4: usize,
    pub size: String,
    pub references: Vec<String>,
    pub mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warp: Option<WarpReport>,
}

#[derive(Debug, Serialize)]
pub struct PredictionReport {
    pub global_mv: Vec<[i16; 2]>,
    pub nearest_mv_count: usize,
    pub ref_mv_count: usize,
    pub new_mv_context: i32,
    pub zero_mv_context: i32,
    pub reference_mv_context: i32,
    pub candidates: Vec<CandidateReport>,
}

#[derive(Debug, Serialize)]
pub struct CandidateReport {
    pub mv: Vec<[i16; 2]>,
    pub weight: u32,
}

#[derive(Debug, Serialize)]
pub struct WarpReport {
    pub num_warp_samples: usize,
    pub num_samples_scanned: usize,
    pub samples: Vec<[i32; 4]>,
}

/// 分析场景
///
/// `threads > 1` 时在独立的 rayon 线程池中并行投影运动场.
pub fn analyze(scene: &Scene, threads: usize) -> Result<ProbeOutput> {
    let header = scene.frame.to_header()?;
    let references = scene.reference_slots()?;
    let mut field = TemporalMotionField::for_frame(&header)?;

    let summary = if threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .context("创建投影线程池失败")?;
        pool.install(|| project_motion_field_parallel(&header, &references, &mut field))?
    } else {
        let bounds = TileBounds::whole_frame(&header);
        setup_motion_field(&header, &references, bounds, &mut field)?
    };
    info!(
        "时域运动场: {} 个参考帧参与, 有效位置 {}",
        summary.count(),
        field.valid_count()
    );

    let mut grid = BlockGrid::new(header.rows4x4, header.columns4x4)?;
    let mut blocks = Vec::with_capacity(scene.blocks.len());
    for (index, desc) in scene.blocks.iter().enumerate() {
        if desc.row4x4 >= header.rows4x4 || desc.column4x4 >= header.columns4x4 {
            bail!("块 #{index} 的原点 ({}, {}) 超出帧范围", desc.row4x4, desc.column4x4);
        }
        let mut params = desc
            .to_parameters()
            .with_context(|| format!("块 #{index} 描述无效"))?;
        let (prediction, warp) = if params.is_inter {
            let tile = TileContext::new(&header, &grid).with_motion_field(&field);
            let block = Block::new(tile, desc.row4x4 as i32, desc.column4x4 as i32, &params);
            let result = find_mv_stack(&block);
            let warp = desc.warp.then(|| find_warp_samples(&block));
            (Some(result), warp)
        } else {
            (None, None)
        };

        let mut report = BlockReport {
            row4x4: desc.row4x4,
            column4x4: desc.column4x4,
            size: params.size.to_string(),
            references: params
                .reference_frame
                .iter()
                .filter(|r| r.is_inter())
                .map(|r| r.name().to_string())
                .collect(),
            mode: params.y_mode.name().to_string(),
            prediction: None,
            warp: warp.as_ref().map(warp_report),
        };
        if let Some(result) = prediction {
            debug!(
                "块 #{index} ({}, {}): {} 个候选",
                desc.row4x4,
                desc.column4x4,
                result.prediction.ref_mv_count
            );
            report.prediction = Some(PredictionReport {
                global_mv: global_mv_report(&result.prediction),
                nearest_mv_count: result.prediction.nearest_mv_count,
                ref_mv_count: result.prediction.ref_mv_count,
                new_mv_context: result.contexts.new_mv,
                zero_mv_context: result.contexts.zero_mv,
                reference_mv_context: result.contexts.reference_mv,
                candidates: candidate_reports(&result.prediction.stack),
            });
            params.prediction_parameters = result.prediction;
        }
        grid.insert(desc.row4x4, desc.column4x4, params)
            .with_context(|| format!("块 #{index} 无法登记到网格"))?;
        blocks.push(report);
    }

    let saved = SavedMotionField::store(&header, &grid, scene.frame.is_intra_frame)?;
    Ok(ProbeOutput {
        frame: FrameSummary {
            rows4x4: header.rows4x4,
            columns4x4: header.columns4x4,
            order_hint: header.order_hint,
            use_ref_frame_mvs: header.use_ref_frame_mvs,
        },
        projection: projection_report(&summary, &field, threads),
        blocks,
        saved_motion_positions: saved.usable_count(),
    })
}

fn projection_report(
    summary: &ProjectionSummary,
    field: &TemporalMotionField,
    threads: usize,
) -> ProjectionReport {
    ProjectionReport {
        contributed: summary.references().map(|r| r.name().to_string()).collect(),
        valid_positions: field.valid_count(),
        threads: threads.max(1),
    }
}

fn global_mv_report(prediction: &PredictionParameters) -> Vec<[i16; 2]> {
    let directions = if prediction.stack.is_compound() { 2 } else { 1 };
    prediction.global_mv[..directions]
        .iter()
        .map(|mv| mv.components())
        .collect()
}

fn candidate_reports(stack: &MvStack) -> Vec<CandidateReport> {
    let report = |mv: &[MotionVector], weight: u32| CandidateReport {
        mv: mv.iter().map(|mv| mv.components()).collect(),
        weight,
    };
    match stack {
        MvStack::Single(stack) => stack
            .iter()
            .map(|c| report(std::slice::from_ref(&c.mv), c.weight))
            .collect(),
        MvStack::Compound(stack) => stack.iter().map(|c| report(&c.mv.mv, c.weight)).collect(),
    }
}

fn warp_report(samples: &WarpSamples) -> WarpReport {
    WarpReport {
        num_warp_samples: samples.num_warp_samples,
        num_samples_scanned: samples.num_samples_scanned,
        samples: samples.samples().to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(json: &str) -> Scene {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_neighbor_feeds_next_block() {
        let scene = scene(
            r#"{
                "frame": {"rows4x4": 16, "columns4x4": 16},
                "blocks": [
                    {"row4x4": 0, "column4x4": 0, "size": "8x8", "references": ["last"], "mv": [[4, 8]]},
                    {"row4x4": 0, "column4x4": 2, "size": "8x8", "references": ["last"], "warp": true}
                ]
            }"#,
        );
        let output = analyze(&scene, 1).unwrap();
        assert_eq!(output.blocks.len(), 2);
        let second = &output.blocks[1];
        let prediction = second.prediction.as_ref().unwrap();
        assert_eq!(prediction.candidates[0].mv, vec![[4, 8]]);
        assert_eq!(prediction.ref_mv_count, 1);
        let warp = second.warp.as_ref().unwrap();
        assert_eq!(warp.num_samples_scanned, 1);
        // 两个块都使用过去的 Last 参考: order hint 关闭时距离为 0, 不保存
        assert_eq!(output.saved_motion_positions, 0);
    }

    #[test]
    fn test_parallel_projection_matches_sequential() {
        let json = r#"{
            "frame": {"rows4x4": 32, "columns4x4": 32, "order_hint_bits": 7, "order_hint": 8,
                      "use_ref_frame_mvs": true, "references": {"last": 6, "bwdref": 10}},
            "reference_frames": [
                {"slot": 4, "order_hint": 10, "references": {"last": 6},
                 "motion": [{"y8": 4, "x8": 4, "reference": "last", "mv": [0, 0]},
                            {"y8": 2, "x8": 3, "reference": "last", "mv": [256, -128]}]}
            ],
            "blocks": [{"row4x4": 8, "column4x4": 8, "size": "8x8", "references": ["last"]}]
        }"#;
        let sequential = analyze(&scene(json), 1).unwrap();
        let parallel = analyze(&scene(json), 4).unwrap();
        assert_eq!(sequential.projection.valid_positions, 2);
        assert_eq!(parallel.projection.valid_positions, 2);
        assert_eq!(sequential.projection.contributed, vec!["bwdref".to_string()]);
        assert_eq!(parallel.projection.contributed, sequential.projection.contributed);
        let prediction = sequential.blocks[0].prediction.as_ref().unwrap();
        // 块 (8, 8) 的首个时域探测点是 8x8 位置 (4, 4)
        assert!(!prediction.candidates.is_empty());
        assert_eq!(prediction.zero_mv_context, 0);
    }

    #[test]
    fn test_block_outside_frame_rejected() {
        let scene = scene(
            r#"{
                "frame": {"rows4x4": 16, "columns4x4": 16},
                "blocks": [{"row4x4": 16, "column4x4": 0, "size": "8x8", "references": ["last"]}]
            }"#,
        );
        assert!(analyze(&scene, 1).is_err());
    }
}
