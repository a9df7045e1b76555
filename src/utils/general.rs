// src/utils/general.rs

/// Inclusive running sum: entry `i` is `counts[0] + .. + counts[i]`.
pub fn prefix_sum(counts: &[i64]) -> Vec<i64> {
    counts
        .iter()
        .scan(0i64, |acc, &n| {
            *acc += n;
            Some(*acc)
        })
        .collect()
}
