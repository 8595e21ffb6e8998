//! Small numeric helpers with explicit tie rules.
//!
//! Every aggregate used by the pipeline goes through here so that the same
//! input always yields the same outline.

use std::collections::BTreeMap;

/// Round half-to-even ("banker's rounding").
pub fn round_half_even(value: f32) -> f32 {
    value.round_ties_even()
}

/// Median of `values`; the mean of the two middle values for an even count.
///
/// Returns `None` for an empty slice. NaNs sort last and are not filtered.
pub fn median(values: &[f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f32::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Most frequent value; ties resolve to the smaller value.
pub fn mode(values: &[i64]) -> Option<i64> {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for v in values {
        *counts.entry(*v).or_insert(0) += 1;
    }
    // BTreeMap iterates ascending, so the first maximum is the smallest value.
    counts
        .into_iter()
        .fold(None, |best: Option<(i64, usize)>, (value, count)| match best {
            Some((_, best_count)) if best_count >= count => best,
            _ => Some((value, count)),
        })
        .map(|(value, _)| value)
}
