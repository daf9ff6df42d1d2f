//! 全局运动参数.
//!
//! 每个参考帧类型一组, 由帧头给出, 整帧只读.

use std::fmt;

/// warp 模型参数的小数精度 (位)
pub const WARPED_MODEL_PRECISION_BITS: u32 = 16;

/// 全局运动变换类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GlobalMotionType {
    #[default]
    Identity,
    Translation,
    RotZoom,
    Affine,
}

impl GlobalMotionType {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Identity => "identity",
            Self::Translation => "translation",
            Self::RotZoom => "rotzoom",
            Self::Affine => "affine",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        [
            Self::Identity,
            Self::Translation,
            Self::RotZoom,
            Self::Affine,
        ]
        .into_iter()
        .find(|t| t.name() == name)
    }
}

impl fmt::Display for GlobalMotionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 全局运动模型
///
/// 参数布局与码流一致: `params[0..2]` 为平移量,
/// `params[2..6]` 为 2x2 矩阵 (对角元带 `1 << WARPED_MODEL_PRECISION_BITS` 偏置).
/// 仿射求值时 `params[0]` 加到水平坐标; 纯平移类型按码流规则把 `params[0]` 当作行分量.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlobalMotion {
    pub kind: GlobalMotionType,
    pub params: [i32; 6],
}

impl Default for GlobalMotion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl GlobalMotion {
    /// 恒等变换
    pub const IDENTITY: Self = Self {
        kind: GlobalMotionType::Identity,
        params: [
            0,
            0,
            1 << WARPED_MODEL_PRECISION_BITS,
            0,
            0,
            1 << WARPED_MODEL_PRECISION_BITS,
        ],
    };

    /// 纯平移, 参数按 warp 精度给出 (`p0` 即 `params[0]`)
    pub const fn translation(p0: i32, p1: i32) -> Self {
        let mut gm = Self::IDENTITY;
        gm.kind = GlobalMotionType::Translation;
        gm.params[0] = p0;
        gm.params[1] = p1;
        gm
    }

    /// 旋转缩放或仿射
    pub const fn with_params(kind: GlobalMotionType, params: [i32; 6]) -> Self {
        Self { kind, params }
    }

    /// 类型是否超过平移 (rotzoom/affine)
    pub fn is_warped(&self) -> bool {
        self.kind > GlobalMotionType::Translation
    }
}
