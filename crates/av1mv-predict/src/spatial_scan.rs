//! 空间邻居扫描.
//!
//! 逐行/逐列遍历已解码的 4x4 邻居单元, 把参考帧匹配的邻居运动向量加入候选栈.
//! 每次扫描返回 [`ScanOutcome`], 由调用方决定合并到哪个匹配标志.

use av1mv_core::{MotionVector, ReferenceFrameType};

use crate::block::Block;
use crate::block_grid::BlockParameters;
use crate::candidate_stack::{CandidateStack, StackCandidate};

/// 一次扫描的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOutcome {
    /// 某个匹配邻居使用了带新 MV 残差的模式
    pub found_new_mv: bool,
    /// 至少一个邻居的参考帧与当前块匹配
    pub found_match: bool,
}

impl ScanOutcome {
    pub fn merge(&mut self, other: ScanOutcome) {
        self.found_new_mv |= other.found_new_mv;
        self.found_match |= other.found_match;
    }
}

/// 邻居在方向 `direction` 上贡献的运动向量
///
/// 邻居以全局运动模式编码且当前参考为旋转缩放/仿射时, 改用当前块的全局运动向量.
fn neighbor_mv(
    block: &Block<'_>,
    global_mv: &[MotionVector; 2],
    neighbor: &BlockParameters,
    slot: usize,
    direction: usize,
) -> MotionVector {
    let reference = block.reference_frame(direction);
    if neighbor.is_global_mv_block && block.header().global_motion(reference).is_warped() {
        global_mv[direction]
    } else {
        neighbor.mv.mv[slot]
    }
}

/// 尝试把邻居加入候选栈
///
/// 复合块要求两个参考帧完全一致; 单参考块对邻居的每个参考槽分别检查.
pub fn add_reference_mv_candidate<T: StackCandidate>(
    block: &Block<'_>,
    global_mv: &[MotionVector; 2],
    neighbor: &BlockParameters,
    weight: u32,
    stack: &mut CandidateStack<T>,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    if !neighbor.is_inter {
        return outcome;
    }
    let mut add = |candidate: T, outcome: &mut ScanOutcome| {
        outcome.found_new_mv |= neighbor.y_mode.has_new_mv();
        outcome.found_match = true;
        stack.insert(candidate, weight);
    };
    if T::DIRECTIONS == 2 {
        if neighbor.reference_frame == block.params.reference_frame {
            let mut candidate = T::default();
            for direction in 0..2 {
                let mv = neighbor_mv(block, global_mv, neighbor, direction, direction);
                candidate.set_direction(direction, mv);
            }
            add(candidate, &mut outcome);
        }
        return outcome;
    }
    for slot in 0..2 {
        if neighbor.reference_frame[slot] == block.reference_frame(0) {
            let mut candidate = T::default();
            candidate.set_direction(0, neighbor_mv(block, global_mv, neighbor, slot, 0));
            add(candidate, &mut outcome);
        }
    }
    outcome
}

/// 最小步长: 大块每次至少跨 4 个单元, 远距离扫描至少跨 2 个
fn minimum_step(extent4x4: i32, delta: i32) -> i32 {
    debug_assert!(delta < 0);
    if extent4x4 >= 16 {
        4
    } else if delta < -1 {
        2
    } else {
        0
    }
}

/// 扫描块上方第 `-delta_row` 行, 从列 `mv_column` 开始
pub fn scan_row<T: StackCandidate>(
    block: &Block<'_>,
    global_mv: &[MotionVector; 2],
    stack: &mut CandidateStack<T>,
    mv_column: i32,
    delta_row: i32,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let tile = &block.tile;
    let mv_row = block.row4x4 + delta_row;
    if !tile.bounds.is_top_inside(mv_row + 1) {
        return outcome;
    }
    let width4x4 = block.width4x4;
    let min_step = minimum_step(width4x4, delta_row);
    let end = width4x4
        .min(tile.header.columns4x4 as i32 - block.column4x4)
        .min(16);
    let mut i = 0;
    loop {
        let Some(neighbor) = tile.parameters(mv_row, mv_column + i) else {
            break;
        };
        let step = width4x4
            .min(neighbor.size.width4x4() as i32)
            .max(min_step);
        outcome.merge(add_reference_mv_candidate(
            block,
            global_mv,
            neighbor,
            2 * step as u32,
            stack,
        ));
        i += step;
        if i >= end {
            break;
        }
    }
    outcome
}

/// 扫描块左侧第 `-delta_column` 列, 从行 `mv_row` 开始
pub fn scan_column<T: StackCandidate>(
    block: &Block<'_>,
    global_mv: &[MotionVector; 2],
    stack: &mut CandidateStack<T>,
    mv_row: i32,
    delta_column: i32,
) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();
    let tile = &block.tile;
    let mv_column = block.column4x4 + delta_column;
    if !tile.bounds.is_left_inside(mv_column + 1) {
        return outcome;
    }
    let height4x4 = block.height4x4;
    let min_step = minimum_step(height4x4, delta_column);
    let end = height4x4
        .min(tile.header.rows4x4 as i32 - block.row4x4)
        .min(16);
    let mut i = 0;
    loop {
        let Some(neighbor) = tile.parameters(mv_row + i, mv_column) else {
            break;
        };
        let step = height4x4
            .min(neighbor.size.height4x4() as i32)
            .max(min_step);
        outcome.merge(add_reference_mv_candidate(
            block,
            global_mv,
            neighbor,
            2 * step as u32,
            stack,
        ));
        i += step;
        if i >= end {
            break;
        }
    }
    outcome
}

/// 检查单个角点 (权重 4)
pub fn scan_point<T: StackCandidate>(
    block: &Block<'_>,
    global_mv: &[MotionVector; 2],
    stack: &mut CandidateStack<T>,
    delta_row: i32,
    delta_column: i32,
) -> ScanOutcome {
    let Some(neighbor) = block
        .tile
        .parameters(block.row4x4 + delta_row, block.column4x4 + delta_column)
    else {
        return ScanOutcome::default();
    };
    if neighbor.reference_frame[0] == ReferenceFrameType::None {
        return ScanOutcome::default();
    }
    add_reference_mv_candidate(block, global_mv, neighbor, 4, stack)
}
