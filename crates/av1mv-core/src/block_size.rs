//! 编码块尺寸.
//!
//! 22 种块尺寸按码流顺序排列, 宽高以 4x4 单元为单位查表.

use std::fmt;

/// 块尺寸数量
pub const NUM_BLOCK_SIZES: usize = 22;

/// 编码块尺寸 (宽 x 高, 像素)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BlockSize {
    Block4x4,
    Block4x8,
    Block4x16,
    Block8x4,
    Block8x8,
    Block8x16,
    Block8x32,
    Block16x4,
    Block16x8,
    Block16x16,
    Block16x32,
    Block16x64,
    Block32x8,
    Block32x16,
    Block32x32,
    Block32x64,
    Block64x16,
    Block64x32,
    Block64x64,
    Block64x128,
    Block128x64,
    Block128x128,
}

const NUM_4X4_BLOCKS_WIDE: [u8; NUM_BLOCK_SIZES] = [
    1, 1, 1, 2, 2, 2, 2, 4, 4, 4, 4, 4, 8, 8, 8, 8, 16, 16, 16, 16, 32, 32,
];

const NUM_4X4_BLOCKS_HIGH: [u8; NUM_BLOCK_SIZES] = [
    1, 2, 4, 1, 2, 4, 8, 1, 2, 4, 8, 16, 2, 4, 8, 16, 4, 8, 16, 32, 16, 32,
];

impl BlockSize {
    /// 全部块尺寸, 按码流顺序
    pub const ALL: [Self; NUM_BLOCK_SIZES] = [
        Self::Block4x4,
        Self::Block4x8,
        Self::Block4x16,
        Self::Block8x4,
        Self::Block8x8,
        Self::Block8x16,
        Self::Block8x32,
        Self::Block16x4,
        Self::Block16x8,
        Self::Block16x16,
        Self::Block16x32,
        Self::Block16x64,
        Self::Block32x8,
        Self::Block32x16,
        Self::Block32x32,
        Self::Block32x64,
        Self::Block64x16,
        Self::Block64x32,
        Self::Block64x64,
        Self::Block64x128,
        Self::Block128x64,
        Self::Block128x128,
    ];

    /// 宽度 (4x4 单元数)
    pub const fn width4x4(self) -> usize {
        NUM_4X4_BLOCKS_WIDE[self as usize] as usize
    }

    /// 高度 (4x4 单元数)
    pub const fn height4x4(self) -> usize {
        NUM_4X4_BLOCKS_HIGH[self as usize] as usize
    }

    /// 宽度 (像素)
    pub const fn width(self) -> usize {
        self.width4x4() * 4
    }

    /// 高度 (像素)
    pub const fn height(self) -> usize {
        self.height4x4() * 4
    }

    /// 由像素宽高查找块尺寸
    pub fn from_dimensions(width: usize, height: usize) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.width() == width && s.height() == height)
    }

    /// 解析 "WxH" 形式的名称
    pub fn from_name(name: &str) -> Option<Self> {
        let (w, h) = name.split_once('x')?;
        Self::from_dimensions(w.trim().parse().ok()?, h.trim().parse().ok()?)
    }
}

impl fmt::Display for BlockSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_table() {
        assert_eq!(BlockSize::Block4x4.width4x4(), 1);
        assert_eq!(BlockSize::Block16x64.width4x4(), 4);
        assert_eq!(BlockSize::Block16x64.height4x4(), 16);
        assert_eq!(BlockSize::Block128x64.width(), 128);
        for size in BlockSize::ALL {
            assert_eq!(
                BlockSize::from_dimensions(size.width(), size.height()),
                Some(size)
            );
        }
    }

    #[test]
    fn test_name_roundtrip() {
        assert_eq!(BlockSize::from_name("32x8"), Some(BlockSize::Block32x8));
        assert_eq!(BlockSize::Block64x128.to_string(), "64x128");
        assert_eq!(BlockSize::from_name("12x12"), None);
    }

    #[test]
    fn test_ordering() {
        assert!(BlockSize::Block64x64 < BlockSize::Block64x128);
        assert!(BlockSize::Block32x64 <= BlockSize::Block64x64);
    }
}
