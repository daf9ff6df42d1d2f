//! 定点运算辅助函数.

/// 带舍入的有符号右移: 对绝对值舍入后恢复符号
#[inline]
pub fn right_shift_with_rounding_signed(value: i32, bits: u32) -> i32 {
    debug_assert!(bits > 0);
    let round = 1i32 << (bits - 1);
    if value >= 0 {
        (value + round) >> bits
    } else {
        -((-value + round) >> bits)
    }
}

/// 按符号掩码取反: `sign` 为 0 时原样返回, 为 -1 时取反
#[inline]
pub fn apply_sign(value: i32, sign: i32) -> i32 {
    debug_assert!(sign == 0 || sign == -1);
    (value ^ sign) - sign
}

/// 两个 order hint 之间的带符号相对距离
///
/// `shift_bits` 为 `32 - order_hint_bits`, order hint 关闭时为 0 (此时两者都为 0).
#[inline]
pub fn get_relative_distance(a: u32, b: u32, shift_bits: u32) -> i32 {
    let diff = a.wrapping_sub(b) as i32;
    if shift_bits == 0 {
        return diff;
    }
    diff.wrapping_shl(shift_bits) >> shift_bits
}

#[inline]
pub fn clip3(value: i32, low: i32, high: i32) -> i32 {
    value.clamp(low, high)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_shift_rounding_symmetric() {
        assert_eq!(right_shift_with_rounding_signed(5, 1), 3);
        assert_eq!(right_shift_with_rounding_signed(-5, 1), -3);
        assert_eq!(right_shift_with_rounding_signed(4, 3), 1);
        assert_eq!(right_shift_with_rounding_signed(-3, 3), 0);
    }

    #[test]
    fn test_apply_sign() {
        assert_eq!(apply_sign(7, 0), 7);
        assert_eq!(apply_sign(7, -1), -7);
        assert_eq!(apply_sign(-2, -1), 2);
    }

    #[test]
    fn test_relative_distance_wraps() {
        // 7 位 order hint: 1 与 127 相距 +2
        let shift = 32 - 7;
        assert_eq!(get_relative_distance(1, 127, shift), 2);
        assert_eq!(get_relative_distance(127, 1, shift), -2);
        assert_eq!(get_relative_distance(10, 6, shift), 4);
        assert_eq!(get_relative_distance(0, 0, 0), 0);
    }
}
