//! 帧级只读状态: 帧头字段与 tile 边界.
//!
//! 这些值在整帧 (或整个 tile) 内保持不变, 以只读引用的形式显式传给各个扫描器.

use av1mv_core::global_motion::GlobalMotion;
use av1mv_core::math::get_relative_distance;
use av1mv_core::reference_frame::{
    NUM_INTER_REFERENCE_FRAME_TYPES, NUM_REFERENCE_FRAME_TYPES, ReferenceFrameType,
};
use av1mv_core::{MvError, MvResult};

/// 参考帧缓冲槽数量
pub const NUM_REFERENCE_SLOTS: usize = 8;

/// order hint 最大位数
pub const MAX_ORDER_HINT_BITS: u32 = 8;

/// 运动向量预测所需的帧头字段
#[derive(Debug, Clone)]
pub struct FrameHeader {
    /// 帧高 (4x4 单元, 恒为偶数)
    pub rows4x4: usize,
    /// 帧宽 (4x4 单元, 恒为偶数)
    pub columns4x4: usize,
    pub allow_high_precision_mv: bool,
    pub force_integer_mv: bool,
    /// 是否启用时域运动场
    pub use_ref_frame_mvs: bool,
    /// 当前帧 order hint
    pub order_hint: u32,
    /// 每个参考帧类型对应帧的 order hint (下标为参考帧类型)
    pub reference_order_hints: [u32; NUM_REFERENCE_FRAME_TYPES],
    /// Last..=Alt 到参考缓冲槽的映射
    pub reference_frame_index: [usize; NUM_INTER_REFERENCE_FRAME_TYPES],
    /// 参考帧是否在当前帧之后 (下标为参考帧类型)
    pub reference_frame_sign_bias: [bool; NUM_REFERENCE_FRAME_TYPES],
    /// 每个参考帧类型的全局运动 (下标为参考帧类型)
    pub global_motion: [GlobalMotion; NUM_REFERENCE_FRAME_TYPES],
    order_hint_bits: u32,
}

impl FrameHeader {
    /// 创建帧头, 其余字段取默认值 (高精度 MV, 不使用时域运动场, order hint 关闭)
    pub fn new(rows4x4: usize, columns4x4: usize) -> MvResult<Self> {
        if rows4x4 == 0 || columns4x4 == 0 {
            return Err(MvError::InvalidArgument(format!(
                "帧尺寸不能为 0: {rows4x4}x{columns4x4}"
            )));
        }
        if rows4x4 % 2 != 0 || columns4x4 % 2 != 0 {
            return Err(MvError::InvalidArgument(format!(
                "4x4 单元行列数必须为偶数: {rows4x4}x{columns4x4}"
            )));
        }
        Ok(Self {
            rows4x4,
            columns4x4,
            allow_high_precision_mv: true,
            force_integer_mv: false,
            use_ref_frame_mvs: false,
            order_hint: 0,
            reference_order_hints: [0; NUM_REFERENCE_FRAME_TYPES],
            reference_frame_index: [0, 1, 2, 3, 4, 5, 6],
            reference_frame_sign_bias: [false; NUM_REFERENCE_FRAME_TYPES],
            global_motion: [GlobalMotion::IDENTITY; NUM_REFERENCE_FRAME_TYPES],
            order_hint_bits: 0,
        })
    }

    /// 由像素尺寸创建, 行列数按 8 像素对齐后换算
    pub fn from_frame_size(width: usize, height: usize) -> MvResult<Self> {
        Self::new(2 * height.div_ceil(8), 2 * width.div_ceil(8))
    }

    /// 设置 order hint 位数 (0 表示关闭)
    pub fn set_order_hint_bits(&mut self, bits: u32) -> MvResult<()> {
        if bits > MAX_ORDER_HINT_BITS {
            return Err(MvError::InvalidArgument(format!(
                "order_hint_bits 超出范围: {bits}"
            )));
        }
        self.order_hint_bits = bits;
        Ok(())
    }

    pub fn order_hint_bits(&self) -> u32 {
        self.order_hint_bits
    }

    /// 计算相对距离时使用的移位量
    pub fn order_hint_shift_bits(&self) -> u32 {
        if self.order_hint_bits == 0 {
            0
        } else {
            32 - self.order_hint_bits
        }
    }

    /// 设置当前帧与各参考帧的 order hint, 并据此推导 sign bias
    pub fn with_order_hints(
        mut self,
        order_hint_bits: u32,
        order_hint: u32,
        references: &[(ReferenceFrameType, u32)],
    ) -> MvResult<Self> {
        self.set_order_hint_bits(order_hint_bits)?;
        let mask = (1u32 << order_hint_bits) - 1;
        self.order_hint = order_hint & mask;
        for &(reference, hint) in references {
            let Some(index) = reference.index() else {
                return Err(MvError::InvalidArgument(
                    "参考帧类型不能为 none".to_string(),
                ));
            };
            self.reference_order_hints[index] = hint & mask;
        }
        self.derive_sign_bias();
        Ok(self)
    }

    /// 按 order hint 推导 sign bias: 参考帧在当前帧之后为 true
    pub fn derive_sign_bias(&mut self) {
        for reference in ReferenceFrameType::INTER {
            let distance =
                self.relative_distance(self.reference_order_hint(reference), self.order_hint);
            if let Some(index) = reference.index() {
                self.reference_frame_sign_bias[index] = distance > 0;
            }
        }
    }

    /// `a - b` 的相对距离
    pub fn relative_distance(&self, a: u32, b: u32) -> i32 {
        get_relative_distance(a, b, self.order_hint_shift_bits())
    }

    pub fn reference_order_hint(&self, reference: ReferenceFrameType) -> u32 {
        reference
            .index()
            .map(|i| self.reference_order_hints[i])
            .unwrap_or(0)
    }

    /// 当前帧到参考帧的相对距离 (参考帧在过去时为负)
    pub fn reference_offset(&self, reference: ReferenceFrameType) -> i32 {
        self.relative_distance(self.order_hint, self.reference_order_hint(reference))
    }

    pub fn sign_bias(&self, reference: ReferenceFrameType) -> bool {
        reference
            .index()
            .map(|i| self.reference_frame_sign_bias[i])
            .unwrap_or(false)
    }

    /// 参考帧类型对应的全局运动, intra/none 返回恒等变换
    pub fn global_motion(&self, reference: ReferenceFrameType) -> &GlobalMotion {
        match reference.index() {
            Some(i) if reference.is_inter() => &self.global_motion[i],
            _ => &GlobalMotion::IDENTITY,
        }
    }

    /// 帧间参考类型对应的缓冲槽
    pub fn reference_slot(&self, reference: ReferenceFrameType) -> Option<usize> {
        if !reference.is_inter() {
            return None;
        }
        let index = reference.index()? - 1;
        Some(self.reference_frame_index[index])
    }
}

/// tile 在 4x4 网格上的范围, 左闭右开
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileBounds {
    pub row4x4_start: i32,
    pub row4x4_end: i32,
    pub column4x4_start: i32,
    pub column4x4_end: i32,
}

impl TileBounds {
    pub fn new(
        row4x4_start: i32,
        row4x4_end: i32,
        column4x4_start: i32,
        column4x4_end: i32,
    ) -> Self {
        Self {
            row4x4_start,
            row4x4_end,
            column4x4_start,
            column4x4_end,
        }
    }

    /// 覆盖整帧的 tile
    pub fn whole_frame(header: &FrameHeader) -> Self {
        Self::new(0, header.rows4x4 as i32, 0, header.columns4x4 as i32)
    }

    /// 行 `row4x4` 的上方一行是否仍在 tile 内
    pub fn is_top_inside(&self, row4x4: i32) -> bool {
        row4x4 > self.row4x4_start
    }

    /// 列 `column4x4` 的左侧一列是否仍在 tile 内
    pub fn is_left_inside(&self, column4x4: i32) -> bool {
        column4x4 > self.column4x4_start
    }

    pub fn is_top_left_inside(&self, row4x4: i32, column4x4: i32) -> bool {
        self.is_top_inside(row4x4) && self.is_left_inside(column4x4)
    }

    /// 只检查下边界和右边界 (调用方保证坐标不会越过上/左边界)
    pub fn is_bottom_right_inside(&self, row4x4: i32, column4x4: i32) -> bool {
        column4x4 < self.column4x4_end && row4x4 < self.row4x4_end
    }

    pub fn is_inside(&self, row4x4: i32, column4x4: i32) -> bool {
        (self.row4x4_start..self.row4x4_end).contains(&row4x4)
            && (self.column4x4_start..self.column4x4_end).contains(&column4x4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_odd_or_empty() {
        assert!(FrameHeader::new(0, 4).is_err());
        assert!(FrameHeader::new(3, 4).is_err());
        let header = FrameHeader::from_frame_size(100, 60).unwrap();
        assert_eq!(header.columns4x4, 26);
        assert_eq!(header.rows4x4, 16);
    }

    #[test]
    fn test_order_hints_and_sign_bias() {
        let header = FrameHeader::new(16, 16)
            .unwrap()
            .with_order_hints(
                7,
                5,
                &[
                    (ReferenceFrameType::Last, 4),
                    (ReferenceFrameType::BackwardAlt, 8),
                ],
            )
            .unwrap();
        assert_eq!(header.order_hint_shift_bits(), 25);
        assert_eq!(header.reference_offset(ReferenceFrameType::Last), 1);
        assert_eq!(header.reference_offset(ReferenceFrameType::BackwardAlt), -3);
        assert!(!header.sign_bias(ReferenceFrameType::Last));
        assert!(header.sign_bias(ReferenceFrameType::BackwardAlt));
    }

    #[test]
    fn test_order_hint_bits_range() {
        let mut header = FrameHeader::new(8, 8).unwrap();
        assert!(header.set_order_hint_bits(9).is_err());
        assert!(header.set_order_hint_bits(8).is_ok());
        assert_eq!(header.order_hint_shift_bits(), 24);
    }

    #[test]
    fn test_reference_slot_mapping() {
        let mut header = FrameHeader::new(8, 8).unwrap();
        header.reference_frame_index = [3, 3, 3, 3, 1, 0, 2];
        assert_eq!(header.reference_slot(ReferenceFrameType::Last), Some(3));
        assert_eq!(header.reference_slot(ReferenceFrameType::Alt), Some(2));
        assert_eq!(header.reference_slot(ReferenceFrameType::Intra), None);
    }

    #[test]
    fn test_tile_bounds_checks() {
        let tile = TileBounds::new(16, 32, 0, 24);
        assert!(!tile.is_top_inside(16));
        assert!(tile.is_top_inside(17));
        assert!(tile.is_inside(16, 0));
        assert!(!tile.is_inside(15, 0));
        assert!(tile.is_bottom_right_inside(31, 23));
        assert!(!tile.is_bottom_right_inside(31, 24));
    }
}
