//! # av1mv-predict
//!
//! AV1 运动向量预测引擎: 为每个帧间块构建加权候选栈并推导熵解码上下文,
//! 每帧投影一次时域运动场, 并为局部 warp 模型收集样本.
//!
//! ## 处理流程
//!
//! 1. 帧开始: [`setup_motion_field`] (或 [`project_motion_field_parallel`])
//!    从参考帧保存的 [`SavedMotionField`] 投影出当前帧的 [`TemporalMotionField`]
//! 2. 逐块: 用 [`TileContext`] 与 [`Block`] 描述当前块, 调用 [`find_mv_stack`]
//!    得到 [`PredictionParameters`] 与 [`MvContexts`], 需要时调用 [`find_warp_samples`]
//! 3. 块解码完成后登记到 [`BlockGrid`], 供后续块作为邻居读取
//! 4. 帧结束: [`SavedMotionField::store`] 保存运动场, 供后续帧投影
//!
//! ## 使用示例
//!
//! ```rust
//! use av1mv_core::{BlockSize, CompoundMotionVector, PredictionMode, ReferenceFrameType};
//! use av1mv_predict::{find_mv_stack, Block, BlockGrid, BlockParameters, FrameHeader, TileContext};
//!
//! let header = FrameHeader::new(16, 16).unwrap();
//! let grid = BlockGrid::new(16, 16).unwrap();
//! let params = BlockParameters::inter(
//!     BlockSize::Block8x8,
//!     [ReferenceFrameType::Last, ReferenceFrameType::None],
//!     CompoundMotionVector::ZERO,
//!     PredictionMode::NearestMv,
//! );
//! let block = Block::new(TileContext::new(&header, &grid), 0, 0, &params);
//! let result = find_mv_stack(&block);
//! assert_eq!(result.prediction.stack.len(), 2);
//! ```

pub mod block;
pub mod block_grid;
pub mod candidate_stack;
pub mod contexts;
pub mod extra_search;
pub mod frame_header;
pub mod global_mv;
pub mod motion_field;
pub mod mv_stack;
pub mod prediction;
pub mod projection;
pub mod projector;
pub mod spatial_scan;
pub mod temporal_scan;
pub mod warp_samples;

// 重导出常用类型
pub use block::{Block, TileContext};
pub use block_grid::{BlockGrid, BlockId, BlockParameters};
pub use candidate_stack::{Candidate, CandidateStack, MAX_REF_MV_STACK_SIZE, StackCandidate};
pub use contexts::compute_contexts;
pub use frame_header::{FrameHeader, TileBounds};
pub use global_mv::setup_global_mv;
pub use motion_field::{SavedMotionField, TemporalMotionField};
pub use mv_stack::{MvStackResult, find_mv_stack};
pub use prediction::{MvContexts, MvStack, PredictionParameters};
pub use projector::{ProjectionSummary, project_motion_field_parallel, setup_motion_field};
pub use warp_samples::{MAX_LEAST_SQUARES_SAMPLES, WarpSamples, find_warp_samples};
