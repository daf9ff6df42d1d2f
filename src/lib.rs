//! # av1mv
//!
//! 纯 Rust 实现的 AV1 运动向量预测引擎.
//!
//! - 每个帧间块: 扫描已解码邻居与时域运动场, 构建加权候选栈并推导熵解码上下文
//! - 每帧: 把参考帧保存的运动场投影为当前帧的时域运动场
//! - 局部 warp: 收集邻居的位置/运动样本
//!
//! # 快速开始
//!
//! ```rust
//! use av1mv::core::{BlockSize, CompoundMotionVector, PredictionMode, ReferenceFrameType};
//! use av1mv::predict::{
//!     find_mv_stack, Block, BlockGrid, BlockParameters, FrameHeader, TileContext,
//! };
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
//! println!("候选数: {}", result.prediction.ref_mv_count);
//! ```
//!
//! # Crate 结构
//!
//! | Crate | 功能 |
//! |-------|------|
//! | `av1mv-core` | 运动向量、参考帧、块尺寸等基础类型与定点运算 |
//! | `av1mv-predict` | 候选栈、时域投影、上下文推导与 warp 采样 |

/// 基础类型与工具
pub use av1mv_core as core;

/// 预测引擎
pub use av1mv_predict as predict;

pub mod logging;

/// 获取版本号
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
