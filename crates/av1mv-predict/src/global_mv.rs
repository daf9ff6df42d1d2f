//! 全局运动向量基线.

use av1mv_core::global_motion::WARPED_MODEL_PRECISION_BITS;
use av1mv_core::math::right_shift_with_rounding_signed;
use av1mv_core::{GlobalMotionType, MotionVector};

use crate::block::Block;
use crate::projection::lower_mv_precision;

/// 计算块第 `index` 个参考方向的全局运动向量
///
/// - 帧内参考或恒等变换: 零向量
/// - 平移: 参数右移到 1/8 像素精度后降精度
/// - 旋转缩放/仿射: 在块中心采样点处求值, 低精度路径额外降精度
pub fn setup_global_mv(block: &Block<'_>, index: usize) -> MotionVector {
    let header = block.header();
    let reference = block.reference_frame(index);
    if !reference.is_inter() {
        return MotionVector::ZERO;
    }
    let gm = header.global_motion(reference);
    match gm.kind {
        GlobalMotionType::Identity => MotionVector::ZERO,
        GlobalMotionType::Translation => {
            let shift = WARPED_MODEL_PRECISION_BITS - 3;
            let mv = MotionVector::new(
                (gm.params[0] >> shift) as i16,
                (gm.params[1] >> shift) as i16,
            );
            lower_mv_precision(header, mv)
        }
        GlobalMotionType::RotZoom | GlobalMotionType::Affine => {
            let unit = 1i32 << WARPED_MODEL_PRECISION_BITS;
            let x = 4 * block.column4x4 + block.width() / 2 - 1;
            let y = 4 * block.row4x4 + block.height() / 2 - 1;
            let p = &gm.params;
            let xc = (p[2] - unit)
                .wrapping_mul(x)
                .wrapping_add(p[3].wrapping_mul(y))
                .wrapping_add(p[0]);
            let yc = p[4]
                .wrapping_mul(x)
                .wrapping_add((p[5] - unit).wrapping_mul(y))
                .wrapping_add(p[1]);
            if header.allow_high_precision_mv {
                let shift = WARPED_MODEL_PRECISION_BITS - 3;
                MotionVector::new(
                    right_shift_with_rounding_signed(yc, shift) as i16,
                    right_shift_with_rounding_signed(xc, shift) as i16,
                )
            } else {
                let shift = WARPED_MODEL_PRECISION_BITS - 2;
                let mv = MotionVector::new(
                    (2 * right_shift_with_rounding_signed(yc, shift)) as i16,
                    (2 * right_shift_with_rounding_signed(xc, shift)) as i16,
                );
                lower_mv_precision(header, mv)
            }
        }
    }
}
