//! 熵解码上下文推导.

/// 由匹配统计计算 `(new_mv, reference_mv)` 上下文
///
/// `nearest_matches` 为前两次空间扫描 (上方行, 左侧列) 的匹配数,
/// `total_matches` 为全部扫描结束后的匹配数, 两者都在 `0..=2` 内.
pub fn compute_contexts(
    found_new_mv: bool,
    nearest_matches: u32,
    total_matches: u32,
) -> (i32, i32) {
    debug_assert!(nearest_matches <= 2 && total_matches <= 2);
    let found_new_mv = i32::from(found_new_mv);
    let total = total_matches as i32;
    match nearest_matches {
        0 => (total.min(1), total),
        1 => (3 - found_new_mv, 2 + total),
        _ => (5 - found_new_mv, 5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_table() {
        assert_eq!(compute_contexts(false, 0, 0), (0, 0));
        assert_eq!(compute_contexts(true, 0, 2), (1, 2));
        assert_eq!(compute_contexts(true, 1, 1), (2, 3));
        assert_eq!(compute_contexts(false, 1, 2), (3, 4));
        assert_eq!(compute_contexts(false, 2, 2), (5, 5));
        assert_eq!(compute_contexts(true, 2, 2), (4, 5));
    }
}
