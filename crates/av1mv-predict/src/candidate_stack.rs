//! 候选运动向量栈.
//!
//! 所有扫描器共用的有界栈: 相同候选合并权重而不是重复追加,
//! 排序只按权重降序且保持插入顺序 (稳定排序).

use std::ops::Range;

use arrayvec::ArrayVec;
use av1mv_core::{CompoundMotionVector, MotionVector};

/// 候选栈容量
pub const MAX_REF_MV_STACK_SIZE: usize = 8;

/// 可放入候选栈的运动向量: 单参考 (1 个方向) 或复合 (2 个方向)
pub trait StackCandidate: Copy + PartialEq + Default + std::fmt::Debug {
    /// 预测方向数
    const DIRECTIONS: usize;

    fn direction(&self, index: usize) -> MotionVector;

    fn set_direction(&mut self, index: usize, mv: MotionVector);
}

impl StackCandidate for MotionVector {
    const DIRECTIONS: usize = 1;

    fn direction(&self, _index: usize) -> MotionVector {
        *self
    }

    fn set_direction(&mut self, _index: usize, mv: MotionVector) {
        *self = mv;
    }
}

impl StackCandidate for CompoundMotionVector {
    const DIRECTIONS: usize = 2;

    fn direction(&self, index: usize) -> MotionVector {
        self.mv[index]
    }

    fn set_direction(&mut self, index: usize, mv: MotionVector) {
        self.mv[index] = mv;
    }
}

/// 栈中的一个候选及其累计权重
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<T> {
    pub mv: T,
    pub weight: u32,
}

/// 候选运动向量栈
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateStack<T> {
    entries: ArrayVec<Candidate<T>, MAX_REF_MV_STACK_SIZE>,
}

impl<T> Default for CandidateStack<T> {
    fn default() -> Self {
        Self {
            entries: ArrayVec::new(),
        }
    }
}

impl<T: StackCandidate> CandidateStack<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入候选
    ///
    /// 已有相同候选时累加权重, 否则在未满时追加; 栈满后新候选被丢弃.
    /// 返回候选是否作为新条目追加.
    pub fn insert(&mut self, mv: T, weight: u32) -> bool {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.mv == mv) {
            entry.weight += weight;
            return false;
        }
        self.entries.try_push(Candidate { mv, weight }).is_ok()
    }

    /// 不做合并直接追加 (候选不足时的兜底填充)
    pub fn pad(&mut self, mv: T, weight: u32) {
        let _ = self.entries.try_push(Candidate { mv, weight });
    }

    /// 覆盖或追加位置 `index` 的条目
    pub fn set(&mut self, index: usize, mv: T, weight: u32) {
        if index < self.entries.len() {
            self.entries[index] = Candidate { mv, weight };
        } else if index == self.entries.len() {
            self.pad(mv, weight);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.entries.is_full()
    }

    pub fn get(&self, index: usize) -> Option<&Candidate<T>> {
        self.entries.get(index)
    }

    pub fn mv(&self, index: usize) -> Option<T> {
        self.entries.get(index).map(|e| e.mv)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate<T>> {
        self.entries.iter()
    }

    pub fn as_slice(&self) -> &[Candidate<T>] {
        &self.entries
    }

    pub fn weights(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.iter().map(|e| e.weight)
    }

    /// 对整个栈按权重降序排序
    pub fn rank(&mut self) {
        let len = self.entries.len();
        self.rank_range(0..len);
    }

    /// 对 `range` 内的条目按权重降序排序, 范围外的条目保持不动
    pub fn rank_range(&mut self, range: Range<usize>) {
        let end = range.end.min(self.entries.len());
        if range.start >= end {
            return;
        }
        sort_descending_by_weight(&mut self.entries[range.start..end]);
    }
}

fn descending_order_two<T>(entries: &mut [Candidate<T>], a: usize, b: usize) {
    if entries[a].weight < entries[b].weight {
        entries.swap(a, b);
    }
}

/// 稳定的权重降序排序
///
/// 3 个以内展开为固定的比较交换序列, 更长时使用标准库稳定排序, 两条路径结果一致.
fn sort_descending_by_weight<T>(entries: &mut [Candidate<T>]) {
    match entries.len() {
        0 | 1 => {}
        2 => descending_order_two(entries, 0, 1),
        3 => {
            descending_order_two(entries, 0, 1);
            descending_order_two(entries, 1, 2);
            descending_order_two(entries, 0, 1);
        }
        _ => entries.sort_by(|lhs, rhs| rhs.weight.cmp(&lhs.weight)),
    }
}
