//! 候选不足两个时的补充搜索.
//!
//! 沿上方一行和左侧一列再走一遍 (最多 16 个单元), 收集参考帧相同的向量
//! 以及按 sign bias 翻转后的异参考向量; 仍不足时用全局运动向量补齐.

use arrayvec::ArrayVec;
use av1mv_core::{CompoundMotionVector, MotionVector};

use crate::block::Block;
use crate::block_grid::BlockParameters;
use crate::candidate_stack::{CandidateStack, StackCandidate};

/// 补充搜索, 单参考与复合块各自实现
pub trait ExtraSearch: StackCandidate {
    /// 补齐候选栈, 返回实际找到的候选数 (不含全局运动向量填充)
    fn extra_search(
        block: &Block<'_>,
        global_mv: &[MotionVector; 2],
        stack: &mut CandidateStack<Self>,
    ) -> usize;
}

/// 依次访问上方一行和左侧一列的邻居, `visit` 返回 false 时结束当前方向
fn walk_neighbors(block: &Block<'_>, mut visit: impl FnMut(&BlockParameters) -> bool) {
    let tile = &block.tile;
    let header = tile.header;
    let num4x4 = block
        .width4x4
        .min(header.columns4x4 as i32 - block.column4x4)
        .min(block.height4x4)
        .min(header.rows4x4 as i32 - block.row4x4)
        .min(16);
    for pass in 0..2 {
        let mut i = 0;
        while i < num4x4 {
            let (mv_row, mv_column) = if pass == 0 {
                (block.row4x4 - 1, block.column4x4 + i)
            } else {
                (block.row4x4 + i, block.column4x4 - 1)
            };
            if !tile.bounds.is_top_left_inside(mv_row + 1, mv_column + 1) {
                break;
            }
            let Some(neighbor) = tile.parameters(mv_row, mv_column) else {
                break;
            };
            if !visit(neighbor) {
                return;
            }
            i += if pass == 0 {
                neighbor.size.width4x4() as i32
            } else {
                neighbor.size.height4x4() as i32
            };
        }
    }
}

/// 邻居参考与块参考的 sign bias 不同时翻转运动向量
fn align_sign(
    block: &Block<'_>,
    neighbor: &BlockParameters,
    slot: usize,
    direction: usize,
) -> MotionVector {
    let header = block.header();
    let mv = neighbor.mv.mv[slot];
    let neighbor_bias = header.sign_bias(neighbor.reference_frame[slot]);
    if neighbor_bias != header.sign_bias(block.reference_frame(direction)) {
        mv.negated()
    } else {
        mv
    }
}

impl ExtraSearch for MotionVector {
    fn extra_search(
        block: &Block<'_>,
        global_mv: &[MotionVector; 2],
        stack: &mut CandidateStack<Self>,
    ) -> usize {
        walk_neighbors(block, |neighbor| {
            for slot in 0..2 {
                if !neighbor.reference_frame[slot].is_inter() {
                    continue;
                }
                let candidate = align_sign(block, neighbor, slot, 0);
                let duplicate = (0..stack.len().min(2)).any(|i| stack.mv(i) == Some(candidate));
                if !duplicate {
                    stack.pad(candidate, 0);
                }
            }
            stack.len() < 2
        });
        let found = stack.len();
        while stack.len() < 2 {
            stack.pad(global_mv[0], 0);
        }
        found
    }
}

/// 复合块的每个方向最多收集两个同参考向量和两个异参考向量
#[derive(Debug, Default)]
struct DirectionMatches {
    same: ArrayVec<MotionVector, 2>,
    different: ArrayVec<MotionVector, 2>,
}

impl ExtraSearch for CompoundMotionVector {
    fn extra_search(
        block: &Block<'_>,
        global_mv: &[MotionVector; 2],
        stack: &mut CandidateStack<Self>,
    ) -> usize {
        let mut matches: [DirectionMatches; 2] = Default::default();
        walk_neighbors(block, |neighbor| {
            for slot in 0..2 {
                let reference = neighbor.reference_frame[slot];
                if !reference.is_inter() {
                    continue;
                }
                for (direction, found) in matches.iter_mut().enumerate() {
                    if reference == block.reference_frame(direction) && !found.same.is_full() {
                        found.same.push(neighbor.mv.mv[slot]);
                    } else if !found.different.is_full() {
                        found.different.push(align_sign(block, neighbor, slot, direction));
                    }
                }
            }
            true
        });

        // 按 同参考 -> 异参考 -> 全局运动向量 的顺序拼出两个复合候选
        let mut combined = [CompoundMotionVector::ZERO; 2];
        for (direction, found) in matches.iter().enumerate() {
            let fill = found
                .same
                .iter()
                .chain(&found.different)
                .copied()
                .chain(std::iter::repeat(global_mv[direction]));
            for (candidate, mv) in combined.iter_mut().zip(fill) {
                candidate.mv[direction] = mv;
            }
        }

        if stack.len() == 1 {
            let second = if stack.mv(0) == Some(combined[0]) {
                combined[1]
            } else {
                combined[0]
            };
            stack.set(1, second, 0);
        } else {
            debug_assert!(stack.is_empty());
            stack.set(0, combined[0], 0);
            stack.set(1, combined[1], 0);
        }
        2
    }
}
