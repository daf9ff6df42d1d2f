//! 亮度预测模式.

use std::fmt;

/// 预测模式 (帧内 + 单参考帧间 + 复合帧间)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PredictionMode {
    #[default]
    Dc,
    Vertical,
    Horizontal,
    D45,
    D135,
    D113,
    D157,
    D203,
    D67,
    Smooth,
    SmoothVertical,
    SmoothHorizontal,
    Paeth,
    ChromaFromLuma,
    // 单参考
    NearestMv,
    NearMv,
    GlobalMv,
    NewMv,
    // 复合
    NearestNearestMv,
    NearNearMv,
    NearestNewMv,
    NewNearestMv,
    NearNewMv,
    NewNearMv,
    GlobalGlobalMv,
    NewNewMv,
}

const NAMES: [(PredictionMode, &str); 26] = [
    (PredictionMode::Dc, "dc"),
    (PredictionMode::Vertical, "v"),
    (PredictionMode::Horizontal, "h"),
    (PredictionMode::D45, "d45"),
    (PredictionMode::D135, "d135"),
    (PredictionMode::D113, "d113"),
    (PredictionMode::D157, "d157"),
    (PredictionMode::D203, "d203"),
    (PredictionMode::D67, "d67"),
    (PredictionMode::Smooth, "smooth"),
    (PredictionMode::SmoothVertical, "smooth_v"),
    (PredictionMode::SmoothHorizontal, "smooth_h"),
    (PredictionMode::Paeth, "paeth"),
    (PredictionMode::ChromaFromLuma, "cfl"),
    (PredictionMode::NearestMv, "nearest"),
    (PredictionMode::NearMv, "near"),
    (PredictionMode::GlobalMv, "global"),
    (PredictionMode::NewMv, "new"),
    (PredictionMode::NearestNearestMv, "nearest_nearest"),
    (PredictionMode::NearNearMv, "near_near"),
    (PredictionMode::NearestNewMv, "nearest_new"),
    (PredictionMode::NewNearestMv, "new_nearest"),
    (PredictionMode::NearNewMv, "near_new"),
    (PredictionMode::NewNearMv, "new_near"),
    (PredictionMode::GlobalGlobalMv, "global_global"),
    (PredictionMode::NewNewMv, "new_new"),
];

impl PredictionMode {
    /// 是否至少有一个方向编码了新的 MV 残差
    pub const fn has_new_mv(self) -> bool {
        matches!(
            self,
            Self::NewMv
                | Self::NewNewMv
                | Self::NearNewMv
                | Self::NewNearMv
                | Self::NearestNewMv
                | Self::NewNearestMv
        )
    }

    /// 是否为全局运动模式
    pub const fn is_global(self) -> bool {
        matches!(self, Self::GlobalMv | Self::GlobalGlobalMv)
    }

    /// 是否为帧间模式
    pub const fn is_inter(self) -> bool {
        (self as u8) >= (Self::NearestMv as u8)
    }

    /// 是否为复合帧间模式
    pub const fn is_compound(self) -> bool {
        (self as u8) >= (Self::NearestNearestMv as u8)
    }

    pub fn name(self) -> &'static str {
        NAMES
            .iter()
            .find(|(m, _)| *m == self)
            .map(|(_, n)| *n)
            .unwrap_or("?")
    }

    pub fn from_name(name: &str) -> Option<Self> {
        NAMES.iter().find(|(_, n)| *n == name).map(|(m, _)| *m)
    }
}

impl fmt::Display for PredictionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
