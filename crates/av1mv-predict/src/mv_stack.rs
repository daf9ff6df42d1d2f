//! 块级候选栈构建.
//!
//! 扫描顺序固定:
//! 1. 全局运动向量基线
//! 2. 上方一行, 左侧一列, 右上角点 (块不大于 64 像素时)
//! 3. 时域扫描 (启用时域运动场时)
//! 4. 左上角点
//! 5. 上方第 3/5 行与左侧第 3/5 列的远距离扫描
//! 6. 候选不足两个时补充搜索, 否则分两段按权重排序
//! 7. 由匹配统计推导上下文

use av1mv_core::{CompoundMotionVector, MotionVector};
use log::trace;

use crate::block::Block;
use crate::candidate_stack::CandidateStack;
use crate::contexts::compute_contexts;
use crate::extra_search::ExtraSearch;
use crate::global_mv::setup_global_mv;
use crate::prediction::{MvContexts, MvStack, PredictionParameters};
use crate::spatial_scan::{scan_column, scan_point, scan_row};
use crate::temporal_scan::temporal_scan;

/// 候选栈构建结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MvStackResult {
    pub prediction: PredictionParameters,
    pub contexts: MvContexts,
}

/// 为块构建候选栈并推导上下文
///
/// 单参考或复合由块自身的第二参考帧决定.
pub fn find_mv_stack(block: &Block<'_>) -> MvStackResult {
    let mut global_mv = [MotionVector::ZERO; 2];
    global_mv[0] = setup_global_mv(block, 0);
    if block.is_compound() {
        global_mv[1] = setup_global_mv(block, 1);
        let built = build_stack::<CompoundMotionVector>(block, &global_mv);
        built.finish(global_mv, MvStack::Compound)
    } else {
        let built = build_stack::<MotionVector>(block, &global_mv);
        built.finish(global_mv, MvStack::Single)
    }
}

struct BuiltStack<T> {
    stack: CandidateStack<T>,
    nearest_mv_count: usize,
    ref_mv_count: usize,
    contexts: MvContexts,
}

impl<T> BuiltStack<T> {
    fn finish(
        self,
        global_mv: [MotionVector; 2],
        wrap: impl FnOnce(CandidateStack<T>) -> MvStack,
    ) -> MvStackResult {
        MvStackResult {
            prediction: PredictionParameters {
                global_mv,
                stack: wrap(self.stack),
                nearest_mv_count: self.nearest_mv_count,
                ref_mv_count: self.ref_mv_count,
            },
            contexts: self.contexts,
        }
    }
}

fn build_stack<T: ExtraSearch>(
    block: &Block<'_>,
    global_mv: &[MotionVector; 2],
) -> BuiltStack<T> {
    let mut stack = CandidateStack::<T>::new();
    let mut contexts = MvContexts::default();

    let row = scan_row(block, global_mv, &mut stack, block.column4x4, -1);
    let column = scan_column(block, global_mv, &mut stack, block.row4x4, -1);
    let mut found_new_mv = row.found_new_mv || column.found_new_mv;
    let mut found_row_match = row.found_match;
    let mut found_column_match = column.found_match;
    if block.width4x4.max(block.height4x4) <= 16 {
        let top_right = scan_point(block, global_mv, &mut stack, -1, block.width4x4);
        found_new_mv |= top_right.found_new_mv;
        found_row_match |= top_right.found_match;
    }
    let nearest_matches = u32::from(found_row_match) + u32::from(found_column_match);
    let nearest_mv_count = stack.len();

    if block.header().use_ref_frame_mvs {
        contexts.zero_mv = temporal_scan(block, global_mv, &mut stack).zero_mv;
    } else {
        contexts.zero_mv = 0;
    }

    // 以下扫描只影响匹配标志, 不再影响 found_new_mv
    found_row_match |= scan_point(block, global_mv, &mut stack, -1, -1).found_match;
    for (i, delta) in [-3, -5].into_iter().enumerate() {
        if i == 0 || block.height4x4 > 1 {
            let delta_row = delta + (block.row4x4 & 1);
            let mv_column = block.column4x4 | 1;
            let outcome = scan_row(block, global_mv, &mut stack, mv_column, delta_row);
            found_row_match |= outcome.found_match;
        }
        if i == 0 || block.width4x4 > 1 {
            let delta_column = delta + (block.column4x4 & 1);
            let mv_row = block.row4x4 | 1;
            let outcome = scan_column(block, global_mv, &mut stack, mv_row, delta_column);
            found_column_match |= outcome.found_match;
        }
    }

    let ref_mv_count = if stack.len() < 2 {
        T::extra_search(block, global_mv, &mut stack)
    } else {
        stack.rank_range(0..nearest_mv_count);
        // 只有前 4 个候选会被用到
        if nearest_mv_count < 4 {
            stack.rank_range(nearest_mv_count..stack.len());
        }
        stack.len()
    };

    let total_matches = u32::from(found_row_match) + u32::from(found_column_match);
    let (new_mv, reference_mv) = compute_contexts(found_new_mv, nearest_matches, total_matches);
    contexts.new_mv = new_mv;
    contexts.reference_mv = reference_mv;

    trace!(
        "候选栈: 块 ({}, {}) {} nearest={} count={} ctx=({}, {}, {})",
        block.row4x4,
        block.column4x4,
        block.size,
        nearest_mv_count,
        ref_mv_count,
        contexts.new_mv,
        contexts.zero_mv,
        contexts.reference_mv
    );

    BuiltStack {
        stack,
        nearest_mv_count,
        ref_mv_count,
        contexts,
    }
}
