//! 统一错误类型定义.
//!
//! 预测算法本身不产生可恢复错误 (容量饱和与参考帧跳过都是规范行为),
//! 错误只出现在网格/帧头/运动场的构造与校验边界上.

use thiserror::Error;

/// av1mv 统一错误类型
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MvError {
    /// 无效参数
    #[error("无效参数: {0}")]
    InvalidArgument(String),

    /// 无效数据 (损坏的场景描述等)
    #[error("无效数据: {0}")]
    InvalidData(String),

    /// 坐标超出网格范围
    #[error("坐标越界: ({row}, {column}) 不在 {rows}x{columns} 网格内")]
    OutOfRange {
        row: usize,
        column: usize,
        rows: usize,
        columns: usize,
    },

    /// 内部错误 (不应发生)
    #[error("内部错误: {0}")]
    Internal(String),
}

/// av1mv 统一 Result 类型
pub type MvResult<T> = Result<T, MvError>;
