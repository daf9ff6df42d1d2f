//! 块级预测结果: 候选栈, 全局 MV 与熵解码上下文.

use av1mv_core::{CompoundMotionVector, MotionVector};

use crate::candidate_stack::CandidateStack;

/// 单参考或复合候选栈, 每个块只会选择其中一种
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MvStack {
    Single(CandidateStack<MotionVector>),
    Compound(CandidateStack<CompoundMotionVector>),
}

impl Default for MvStack {
    fn default() -> Self {
        Self::Single(CandidateStack::new())
    }
}

impl MvStack {
    pub fn len(&self) -> usize {
        match self {
            Self::Single(s) => s.len(),
            Self::Compound(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Compound(_))
    }

    /// 按排序后的位置列出权重
    pub fn weights(&self) -> Vec<u32> {
        match self {
            Self::Single(s) => s.weights().collect(),
            Self::Compound(s) => s.weights().collect(),
        }
    }
}

/// 块的预测参数, 由候选栈构建过程产出, 归所属块独占
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PredictionParameters {
    /// 每个参考方向的全局运动向量
    pub global_mv: [MotionVector; 2],
    pub stack: MvStack,
    /// 前三次空间扫描后栈中的候选数
    pub nearest_mv_count: usize,
    /// 实际找到的候选数 (兜底填充的全局 MV 不计入)
    pub ref_mv_count: usize,
}

impl PredictionParameters {
    pub fn ref_mv_stack(&self) -> Option<&CandidateStack<MotionVector>> {
        match &self.stack {
            MvStack::Single(s) => Some(s),
            MvStack::Compound(_) => None,
        }
    }

    pub fn compound_ref_mv_stack(&self) -> Option<&CandidateStack<CompoundMotionVector>> {
        match &self.stack {
            MvStack::Compound(s) => Some(s),
            MvStack::Single(_) => None,
        }
    }

    /// 排序后第 `index` 个单参考候选
    pub fn ref_mv(&self, index: usize) -> Option<MotionVector> {
        self.ref_mv_stack()?.mv(index)
    }

    /// 排序后第 `index` 个复合候选
    pub fn compound_ref_mv(&self, index: usize) -> Option<CompoundMotionVector> {
        self.compound_ref_mv_stack()?.mv(index)
    }

    /// 排序后第 `index` 个候选的权重
    pub fn weight(&self, index: usize) -> Option<u32> {
        match &self.stack {
            MvStack::Single(s) => s.get(index).map(|c| c.weight),
            MvStack::Compound(s) => s.get(index).map(|c| c.weight),
        }
    }
}

/// `zero_mv` 上下文尚未确定时的取值
pub const ZERO_MV_CONTEXT_UNSET: i32 = -1;

/// 熵解码器使用的三个上下文下标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MvContexts {
    pub new_mv: i32,
    pub zero_mv: i32,
    pub reference_mv: i32,
}

impl Default for MvContexts {
    fn default() -> Self {
        Self {
            new_mv: 0,
            zero_mv: ZERO_MV_CONTEXT_UNSET,
            reference_mv: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty_single_stack() {
        let pp = PredictionParameters::default();
        assert!(pp.ref_mv_stack().is_some());
        assert!(pp.compound_ref_mv_stack().is_none());
        assert!(pp.stack.is_empty());
        assert_eq!(MvContexts::default().zero_mv, ZERO_MV_CONTEXT_UNSET);
    }

    #[test]
    fn test_accessors_follow_stack_kind() {
        let mut stack = CandidateStack::new();
        stack.insert(
            CompoundMotionVector::new(MotionVector::new(1, 2), MotionVector::new(3, 4)),
            6,
        );
        let pp = PredictionParameters {
            stack: MvStack::Compound(stack),
            ..Default::default()
        };
        assert_eq!(pp.ref_mv(0), None);
        assert_eq!(
            pp.compound_ref_mv(0).unwrap().mv[1],
            MotionVector::new(3, 4)
        );
        assert_eq!(pp.weight(0), Some(6));
        assert_eq!(pp.stack.weights(), vec![6]);
    }
}
