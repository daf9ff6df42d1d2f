//! 参考帧类型.
//!
//! 取值顺序与码流一致: `None < Intra < Last < ... < Alt`, 比较运算直接依赖该顺序.

use std::fmt;

/// 参考帧类型数量 (含 Intra, 不含 None)
pub const NUM_REFERENCE_FRAME_TYPES: usize = 8;

/// 帧间参考帧数量 (Last..=Alt)
pub const NUM_INTER_REFERENCE_FRAME_TYPES: usize = 7;

/// 参考帧类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(i8)]
pub enum ReferenceFrameType {
    /// 未使用 (单参考块的第二参考)
    #[default]
    None = -1,
    /// 帧内
    Intra = 0,
    Last = 1,
    Last2 = 2,
    Last3 = 3,
    Golden = 4,
    BackwardAlt = 5,
    Alt2 = 6,
    Alt = 7,
}

impl ReferenceFrameType {
    /// 全部帧间参考类型, 按码流顺序
    pub const INTER: [Self; NUM_INTER_REFERENCE_FRAME_TYPES] = [
        Self::Last,
        Self::Last2,
        Self::Last3,
        Self::Golden,
        Self::BackwardAlt,
        Self::Alt2,
        Self::Alt,
    ];

    /// 作为 `[T; NUM_REFERENCE_FRAME_TYPES]` 表的下标 (None 没有下标)
    pub const fn index(self) -> Option<usize> {
        match self {
            Self::None => None,
            other => Some(other as i8 as usize),
        }
    }

    /// 由表下标还原
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Intra),
            1 => Some(Self::Last),
            2 => Some(Self::Last2),
            3 => Some(Self::Last3),
            4 => Some(Self::Golden),
            5 => Some(Self::BackwardAlt),
            6 => Some(Self::Alt2),
            7 => Some(Self::Alt),
            _ => None,
        }
    }

    /// 是否为帧间参考 (大于 Intra)
    pub const fn is_inter(self) -> bool {
        (self as i8) > (Self::Intra as i8)
    }

    /// 名称 (用于日志与探测工具输出)
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Intra => "intra",
            Self::Last => "last",
            Self::Last2 => "last2",
            Self::Last3 => "last3",
            Self::Golden => "golden",
            Self::BackwardAlt => "bwdref",
            Self::Alt2 => "altref2",
            Self::Alt => "altref",
        }
    }

    /// 按名称解析, 与 [`name`](Self::name) 互逆
    pub fn from_name(name: &str) -> Option<Self> {
        [Self::None, Self::Intra]
            .into_iter()
            .chain(Self::INTER)
            .find(|r| r.name() == name)
    }
}

impl fmt::Display for ReferenceFrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_follows_bitstream() {
        assert!(ReferenceFrameType::None < ReferenceFrameType::Intra);
        assert!(ReferenceFrameType::Intra < ReferenceFrameType::Last);
        assert!(ReferenceFrameType::Golden < ReferenceFrameType::BackwardAlt);
        assert!(!ReferenceFrameType::Intra.is_inter());
        assert!(ReferenceFrameType::Alt.is_inter());
    }

    #[test]
    fn test_index_roundtrip() {
        for r in ReferenceFrameType::INTER {
            let idx = r.index().unwrap();
            assert_eq!(ReferenceFrameType::from_index(idx), Some(r));
        }
        assert_eq!(ReferenceFrameType::None.index(), None);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(
            ReferenceFrameType::from_name("altref2"),
            Some(ReferenceFrameType::Alt2)
        );
        assert_eq!(ReferenceFrameType::from_name("bogus"), None);
    }
}
