//! 运动向量类型.
//!
//! 分量单位为 1/8 像素, 行在前列在后.

use std::fmt;

/// 无效运动向量的行分量取值 (时域运动场中的哨兵)
pub const INVALID_MV_VALUE: i16 = i16::MIN;

/// 单向运动向量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct MotionVector {
    /// 垂直分量 (1/8 像素)
    pub row: i16,
    /// 水平分量 (1/8 像素)
    pub column: i16,
}

impl MotionVector {
    /// 零向量
    pub const ZERO: Self = Self { row: 0, column: 0 };

    /// 时域运动场中 "该位置没有投影" 的哨兵
    pub const INVALID: Self = Self {
        row: INVALID_MV_VALUE,
        column: INVALID_MV_VALUE,
    };

    pub const fn new(row: i16, column: i16) -> Self {
        Self { row, column }
    }

    /// 是否为无效哨兵 (只比较行分量)
    pub const fn is_invalid(self) -> bool {
        self.row == INVALID_MV_VALUE
    }

    /// 两个分量同时取反
    pub const fn negated(self) -> Self {
        Self {
            row: self.row.wrapping_neg(),
            column: self.column.wrapping_neg(),
        }
    }

    /// 以数组形式访问分量: [行, 列]
    pub const fn components(self) -> [i16; 2] {
        [self.row, self.column]
    }

    pub const fn from_components(c: [i16; 2]) -> Self {
        Self {
            row: c[0],
            column: c[1],
        }
    }

    /// 与另一向量逐分量差值绝对值的最大值
    pub fn max_abs_difference(self, other: Self) -> i32 {
        let dr = (i32::from(self.row) - i32::from(other.row)).abs();
        let dc = (i32::from(self.column) - i32::from(other.column)).abs();
        dr.max(dc)
    }
}

impl fmt::Display for MotionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

/// 复合 (双参考) 运动向量, `mv[0]` 对应第一参考帧, `mv[1]` 对应第二参考帧
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CompoundMotionVector {
    pub mv: [MotionVector; 2],
}

impl CompoundMotionVector {
    pub const ZERO: Self = Self {
        mv: [MotionVector::ZERO; 2],
    };

    pub const fn new(first: MotionVector, second: MotionVector) -> Self {
        Self {
            mv: [first, second],
        }
    }

    /// 单参考块只使用第一个分量
    pub const fn single(mv: MotionVector) -> Self {
        Self {
            mv: [mv, MotionVector::ZERO],
        }
    }
}

impl fmt::Display for CompoundMotionVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.mv[0], self.mv[1])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_sentinel_checks_row_only() {
        assert!(MotionVector::INVALID.is_invalid());
        assert!(MotionVector::new(INVALID_MV_VALUE, 4).is_invalid());
        assert!(!MotionVector::new(4, INVALID_MV_VALUE).is_invalid());
    }

    #[test]
    fn test_max_abs_difference() {
        let a = MotionVector::new(-10, 3);
        let b = MotionVector::new(6, 1);
        assert_eq!(a.max_abs_difference(b), 16);
    }

    #[test]
    fn test_display() {
        let mv = CompoundMotionVector::new(MotionVector::new(1, -2), MotionVector::new(3, 4));
        assert_eq!(mv.to_string(), "[(1, -2) (3, 4)]");
    }
}
