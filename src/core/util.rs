use ahash::RandomState;
use std::collections::{HashMap as StdHashMap, HashSet as StdHashSet};

pub type HashMap<K, V> = StdHashMap<K, V, RandomState>;
pub type HashSet<K> = StdHashSet<K, RandomState>;

/// `ternary!(cond, true_case, false_case)`
#[macro_export]
macro_rules! ternary {
    ($condition: expr, $_true: expr, $_false: expr) => {
        if $condition { $_true } else { $_false }
    };
}

/// Clamp a viewport offset into `[0, max(0, total - visible)]` after applying
/// `delta`.
pub fn clamp_offset(
    current: usize,
    delta: i32,
    total: usize,
    visible: usize,
) -> usize {
    let max = total.saturating_sub(visible) as i64;
    (current as i64 + delta as i64).clamp(0, max) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_offset_stays_in_range() {
        for total in 0..24 {
            for delta in -30..30 {
                for current in 0..16 {
                    let offset = clamp_offset(current, delta, total, 8);
                    assert!(offset <= total.saturating_sub(8));
                }
            }
        }
    }

    #[test]
    fn clamp_offset_handles_fewer_tracks_than_visible() {
        assert_eq!(clamp_offset(0, 1, 3, 8), 0);
        assert_eq!(clamp_offset(0, -1, 3, 8), 0);
    }
}
