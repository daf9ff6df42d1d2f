//! 运动向量时域缩放与精度降低.

use av1mv_core::MotionVector;
use av1mv_core::math::{apply_sign, clip3, right_shift_with_rounding_signed};

use crate::frame_header::FrameHeader;

/// 参与投影的最大帧距离
pub const MAX_FRAME_DISTANCE: i32 = 31;

/// 投影结果分量的钳位幅度
pub const PROJECTION_MV_CLAMP: i32 = (1 << 14) - 1;

/// 投影目标列相对源 8 列组的最大水平偏移 (8x8 单元)
pub const PROJECTION_MV_MAX_HORIZONTAL_OFFSET: i32 = 8;

/// 帧距离倒数表: `16384 / d`, 用乘法代替运行时除法
pub const PROJECTION_MV_DIVISION_LOOKUP: [i32; MAX_FRAME_DISTANCE as usize + 1] = [
    0, 16384, 8192, 5461, 4096, 3276, 2730, 2340, 2048, 1820, 1638, 1489, 1365, 1260, 1170, 1092,
    1024, 963, 910, 862, 819, 780, 744, 712, 682, 655, 630, 606, 585, 564, 546, 528,
];

/// 按帧距离比例 `numerator / denominator` 缩放运动向量
///
/// `denominator` 必须在 `1..=MAX_FRAME_DISTANCE` 内, 由上游码流校验保证.
pub fn get_mv_projection(mv: MotionVector, numerator: i32, denominator: i32) -> MotionVector {
    debug_assert!(denominator > 0 && denominator <= MAX_FRAME_DISTANCE);
    let numerator = clip3(numerator, -MAX_FRAME_DISTANCE, MAX_FRAME_DISTANCE);
    let division = PROJECTION_MV_DIVISION_LOOKUP[denominator as usize];
    let scale = |v: i16| {
        clip3(
            right_shift_with_rounding_signed(i32::from(v) * numerator * division, 14),
            -PROJECTION_MV_CLAMP,
            PROJECTION_MV_CLAMP,
        ) as i16
    };
    MotionVector::new(scale(mv.row), scale(mv.column))
}

/// 由投影分量计算 8x8 单元坐标的位移, `delta / 64` 向零取整
#[inline]
pub fn project(value: i32, delta: i16, dst_sign: i32) -> i32 {
    value + apply_sign(i32::from(delta) / 64, dst_sign)
}

/// 按帧头精度设置降低运动向量精度
pub fn lower_mv_precision(header: &FrameHeader, mv: MotionVector) -> MotionVector {
    lower_mv_precision_with(header.allow_high_precision_mv, header.force_integer_mv, mv)
}

pub fn lower_mv_precision_with(
    allow_high_precision_mv: bool,
    force_integer_mv: bool,
    mv: MotionVector,
) -> MotionVector {
    if allow_high_precision_mv {
        return mv;
    }
    let lower = |v: i16| -> i16 {
        if force_integer_mv {
            let value = (i32::from(v).abs() + 3) & !7;
            let sign = i32::from(v >> 15);
            apply_sign(value, sign) as i16
        } else if v & 1 != 0 {
            // 奇数分量向零移动一步
            v - ((v >> 15) | 1)
        } else {
            v
        }
    };
    MotionVector::new(lower(mv.row), lower(mv.column))
}
