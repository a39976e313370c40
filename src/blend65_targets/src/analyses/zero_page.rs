//! Zero-page placement scoring. High scores want one of the 142 precious
//! bytes; the allocator makes the final call.

/// 0-100 priority from access patterns. Each term is clamped before the
/// final cap so no single signal swamps the rest.
pub fn zero_page_priority(
    access_count: u32,
    loop_depth: u32,
    hot_path_accesses: u32,
    is_byte: bool,
    is_loop_counter: bool,
) -> u8 {
    let accesses = (1.5 * access_count as f64).min(30.0);
    let depth = (8.0 * loop_depth as f64).min(25.0);
    let hot = (2.0 * hot_path_accesses as f64).min(20.0);
    let byte_bonus = if is_byte { 10.0 } else { 0.0 };
    let counter_bonus = if is_loop_counter { 15.0 } else { 0.0 };
    let score = accesses + depth + hot + byte_bonus + counter_bonus;
    score.round().min(100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_variable_scores_zero() {
        assert_eq!(zero_page_priority(0, 0, 0, false, false), 0);
    }

    #[test]
    fn each_term_is_clamped() {
        // 1000 accesses clamp to 30, depth 10 clamps to 25, hot clamps to 20.
        assert_eq!(zero_page_priority(1000, 10, 1000, false, false), 75);
    }

    #[test]
    fn hot_byte_loop_counter_maxes_out() {
        assert_eq!(zero_page_priority(1000, 10, 1000, true, true), 100);
    }

    #[test]
    fn fractional_scores_round() {
        // 1.5 * 1 access = 1.5 -> rounds to 2.
        assert_eq!(zero_page_priority(1, 0, 0, false, false), 2);
    }
}
