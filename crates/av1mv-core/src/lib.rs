//! # av1mv-core
//!
//! AV1 运动向量预测核心库, 提供基础类型定义、错误处理和定点运算工具.
//!
//! 本 crate 为 `av1mv-predict` 提供底层词汇类型, 不包含任何预测算法.

pub mod block_size;
pub mod error;
pub mod global_motion;
pub mod math;
pub mod motion_vector;
pub mod prediction_mode;
pub mod reference_frame;

// 重导出常用类型
pub use block_size::BlockSize;
pub use error::{MvError, MvResult};
pub use global_motion::{GlobalMotion, GlobalMotionType};
pub use motion_vector::{CompoundMotionVector, MotionVector};
pub use prediction_mode::PredictionMode;
pub use reference_frame::ReferenceFrameType;
