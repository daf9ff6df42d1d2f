//! 时域候选扫描.
//!
//! 在块内及其右下方的 8x8 格点读取时域运动场, 按当前块自身的参考距离重新缩放后入栈.

use arrayvec::ArrayVec;
use av1mv_core::{BlockSize, MotionVector};
use log::trace;

use crate::block::Block;
use crate::candidate_stack::{CandidateStack, StackCandidate};
use crate::prediction::ZERO_MV_CONTEXT_UNSET;
use crate::projection::{get_mv_projection, lower_mv_precision};

/// 单块最多收集的时域样本数
pub const MAX_TEMPORAL_MV_CANDIDATES: usize = 19;

/// 时域候选的入栈权重
const TEMPORAL_WEIGHT: u32 = 2;

/// 时域扫描结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalScanOutcome {
    /// `zero_mv` 上下文, 没有可用样本时保持 [`ZERO_MV_CONTEXT_UNSET`]
    pub zero_mv: i32,
    /// 收集到的有效样本数
    pub samples: usize,
}

/// 额外探测右下角三个样本的块尺寸
fn probes_corner_samples(size: BlockSize) -> bool {
    matches!(
        size,
        BlockSize::Block8x8
            | BlockSize::Block8x16
            | BlockSize::Block8x32
            | BlockSize::Block16x8
            | BlockSize::Block16x16
            | BlockSize::Block16x32
            | BlockSize::Block32x8
            | BlockSize::Block32x16
            | BlockSize::Block32x32
    )
}

/// 偏移后的位置是否仍在块所在的 64x64 区域内
fn is_within_same_64x64(block: &Block<'_>, delta_row: i32, delta_column: i32) -> bool {
    let row = (block.row4x4 & 15) + delta_row;
    let column = (block.column4x4 & 15) + delta_column;
    row < 16 && (0..16).contains(&column)
}

/// 时域扫描
pub fn temporal_scan<T: StackCandidate>(
    block: &Block<'_>,
    global_mv: &[MotionVector; 2],
    stack: &mut CandidateStack<T>,
) -> TemporalScanOutcome {
    let tile = &block.tile;
    let mut zero_mv = ZERO_MV_CONTEXT_UNSET;
    // 未提供运动场时与刚重置的运动场等价: 所有位置都无效
    let sample_at = |mv_row: i32, mv_column: i32| {
        tile.motion_field
            .and_then(|field| field.get(mv_row >> 1, mv_column >> 1))
            .filter(|(mv, _)| !mv.is_invalid())
    };

    let step_w = if block.width4x4 >= 16 { 4 } else { 2 };
    let step_h = if block.height4x4 >= 16 { 4 } else { 2 };
    let row_start = block.row4x4 | 1;
    let column_start = block.column4x4 | 1;
    let row_end = row_start + block.height4x4.min(16);
    let column_end = column_start + block.width4x4.min(16);

    let mut samples = ArrayVec::<(MotionVector, i32), MAX_TEMPORAL_MV_CANDIDATES>::new();
    let mut mv_row = row_start;
    loop {
        let mut mv_column = column_start;
        loop {
            // 偏移都为正, 只需检查下边界和右边界
            if tile.bounds.is_bottom_right_inside(mv_row, mv_column) {
                match sample_at(mv_row, mv_column) {
                    Some((mv, offset)) => samples.push((mv, i32::from(offset))),
                    None if mv_row == row_start && mv_column == column_start => zero_mv = 1,
                    None => {}
                }
            }
            mv_column += step_w;
            if mv_column >= column_end {
                break;
            }
        }
        mv_row += step_h;
        if mv_row >= row_end {
            break;
        }
    }

    if probes_corner_samples(block.size) {
        let corners = [
            (block.height4x4, -2),
            (block.height4x4, block.width4x4),
            (block.height4x4 - 2, block.width4x4),
        ];
        for (delta_row, delta_column) in corners {
            if !is_within_same_64x64(block, delta_row, delta_column) {
                continue;
            }
            let mv_row = row_start + delta_row;
            let mv_column = column_start + delta_column;
            if !tile.bounds.is_bottom_right_inside(mv_row, mv_column) {
                continue;
            }
            if let Some((mv, offset)) = sample_at(mv_row, mv_column) {
                samples.push((mv, i32::from(offset)));
            }
        }
    }

    if samples.is_empty() {
        return TemporalScanOutcome { zero_mv, samples: 0 };
    }

    let header = block.header();
    let mut reference_offsets = [0i32; 2];
    for (direction, offset) in reference_offsets.iter_mut().enumerate().take(T::DIRECTIONS) {
        *offset = header.reference_offset(block.reference_frame(direction));
    }
    for &(temporal_mv, temporal_offset) in &samples {
        let mut candidate = T::default();
        for (direction, &offset) in reference_offsets.iter().enumerate().take(T::DIRECTIONS) {
            if offset != 0 {
                let projected = get_mv_projection(temporal_mv, offset, temporal_offset);
                candidate.set_direction(direction, lower_mv_precision(header, projected));
            }
        }
        if zero_mv == ZERO_MV_CONTEXT_UNSET {
            let max_difference = (0..T::DIRECTIONS)
                .map(|d| candidate.direction(d).max_abs_difference(global_mv[d]))
                .max()
                .unwrap_or(0);
            zero_mv = i32::from(max_difference >= 16);
        }
        stack.insert(candidate, TEMPORAL_WEIGHT);
    }
    trace!(
        "时域扫描: 块 ({}, {}) 样本 {} 个, zero_mv = {}",
        block.row4x4,
        block.column4x4,
        samples.len(),
        zero_mv
    );
    TemporalScanOutcome {
        zero_mv,
        samples: samples.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::TileContext;
    use crate::block_grid::{BlockGrid, BlockParameters};
    use crate::frame_header::FrameHeader;
    use crate::motion_field::TemporalMotionField;
    use av1mv_core::{CompoundMotionVector, PredictionMode, ReferenceFrameType};

    fn header() -> FrameHeader {
        let mut header = FrameHeader::new(32, 32)
            .unwrap()
            .with_order_hints(
                7,
                8,
                &[
                    (ReferenceFrameType::Last, 6),
                    (ReferenceFrameType::BackwardAlt, 10),
                ],
            )
            .unwrap();
        header.use_ref_frame_mvs = true;
        header
    }

    fn single(size: BlockSize) -> BlockParameters {
        BlockParameters::inter(
            size,
            [ReferenceFrameType::Last, ReferenceFrameType::None],
            CompoundMotionVector::ZERO,
            PredictionMode::NearestMv,
        )
    }

    #[test]
    fn test_invalid_first_probe_sets_zero_mv() {
        let header = header();
        let grid = BlockGrid::new(32, 32).unwrap();
        let field = TemporalMotionField::for_frame(&header).unwrap();
        let params = single(BlockSize::Block8x8);
        let tile = TileContext::new(&header, &grid).with_motion_field(&field);
        let block = Block::new(tile, 4, 4, &params);
        let mut stack = CandidateStack::<MotionVector>::new();
        let outcome = temporal_scan(&block, &[MotionVector::ZERO; 2], &mut stack);
        assert_eq!(outcome, TemporalScanOutcome { zero_mv: 1, samples: 0 });
        assert!(stack.is_empty());
    }

    #[test]
    fn test_samples_rescaled_to_block_distance() {
        let header = header();
        let grid = BlockGrid::new(32, 32).unwrap();
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        // 块 (4, 4) 的首个探测点位于 8x8 坐标 (2, 2)
        field.set(2, 2, MotionVector::new(32, -16), 4).unwrap();
        let params = single(BlockSize::Block8x8);
        let tile = TileContext::new(&header, &grid).with_motion_field(&field);
        let block = Block::new(tile, 4, 4, &params);
        let mut stack = CandidateStack::<MotionVector>::new();
        let outcome = temporal_scan(&block, &[MotionVector::ZERO; 2], &mut stack);
        // Last 距离 2, 源距离 4: 缩放一半
        assert_eq!(stack.mv(0), Some(MotionVector::new(16, -8)));
        assert_eq!(stack.get(0).unwrap().weight, 2);
        assert_eq!(outcome.samples, 1);
        assert_eq!(outcome.zero_mv, 1);
    }

    #[test]
    fn test_small_difference_gives_zero_context() {
        let header = header();
        let grid = BlockGrid::new(32, 32).unwrap();
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        field.set(2, 2, MotionVector::new(8, 8), 2).unwrap();
        field.set(2, 3, MotionVector::new(8, 8), 2).unwrap();
        let params = single(BlockSize::Block16x16);
        let tile = TileContext::new(&header, &grid).with_motion_field(&field);
        let block = Block::new(tile, 4, 4, &params);
        let mut stack = CandidateStack::<MotionVector>::new();
        let outcome = temporal_scan(&block, &[MotionVector::ZERO; 2], &mut stack);
        assert_eq!(outcome.zero_mv, 0);
        // 两个相同样本合并
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.get(0).unwrap().weight, 4);
    }

    #[test]
    fn test_corner_samples_respect_64x64_region() {
        let header = header();
        let grid = BlockGrid::new(32, 32).unwrap();
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        // 8x8 块 (0, 0): 右下角样本 (row_start + 2, column_start + 2) = (3, 3)
        field.set(1, 1, MotionVector::new(4, 4), 2).unwrap();
        let params = single(BlockSize::Block8x8);
        let tile = TileContext::new(&header, &grid).with_motion_field(&field);
        let block = Block::new(tile, 0, 0, &params);
        let mut stack = CandidateStack::<MotionVector>::new();
        let outcome = temporal_scan(&block, &[MotionVector::ZERO; 2], &mut stack);
        assert_eq!(outcome.samples, 1);
        assert_eq!(outcome.zero_mv, 1);

        // 64x64 区域右边缘的块不探测右侧样本
        let block = Block::new(tile, 0, 14, &params);
        assert!(!is_within_same_64x64(&block, 2, 2));
        assert!(is_within_same_64x64(&block, 2, -2));
    }

    #[test]
    fn test_compound_zero_reference_distance_keeps_zero() {
        let mut header = header();
        header.reference_order_hints[4] = 8;
        let grid = BlockGrid::new(32, 32).unwrap();
        let mut field = TemporalMotionField::for_frame(&header).unwrap();
        field.set(2, 2, MotionVector::new(32, 32), 2).unwrap();
        let params = BlockParameters::inter(
            BlockSize::Block8x8,
            [ReferenceFrameType::Last, ReferenceFrameType::Golden],
            CompoundMotionVector::ZERO,
            PredictionMode::NearestNearestMv,
        );
        let tile = TileContext::new(&header, &grid).with_motion_field(&field);
        let block = Block::new(tile, 4, 4, &params);
        let mut stack = CandidateStack::<CompoundMotionVector>::new();
        temporal_scan(&block, &[MotionVector::ZERO; 2], &mut stack);
        let candidate = stack.mv(0).unwrap();
        assert_eq!(candidate.mv[0], MotionVector::new(32, 32));
        // Golden 与当前帧 order hint 相同, 该方向保持零向量
        assert_eq!(candidate.mv[1], MotionVector::ZERO);
    }
}
