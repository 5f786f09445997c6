//! Latency statistics over a finite set of duration samples.
//!
//! Functions take the caller's slice by reference; ordering work happens on a
//! sorted copy, so the input order is never changed.

use crate::model::LatencyStats;

fn sorted_copy(samples: &[f64]) -> Vec<f64> {
    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

/// Median of the samples: middle element, or the mean of the two middle
/// elements for an even count.
pub fn median(samples: &[f64]) -> Option<f64> {
    median_of_sorted(&sorted_copy(samples))
}

fn median_of_sorted(sorted: &[f64]) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let middle = n / 2;
    if n % 2 == 0 {
        Some((sorted[middle - 1] + sorted[middle]) / 2.0)
    } else {
        Some(sorted[middle])
    }
}

/// Nearest-rank percentile over an ascending-sorted slice.
///
/// The index is `floor(len * p)`, clamped to the last element so that
/// `p = 1.0` returns the maximum. `p` is clamped into `[0, 1]`; NaN is
/// treated as `0`.
pub fn percentile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
    let idx = ((sorted.len() as f64) * p).floor() as usize;
    sorted.get(idx.min(sorted.len() - 1)).copied()
}

pub fn mean(samples: &[f64]) -> Option<f64> {
    if samples.is_empty() {
        return None;
    }
    Some(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Smallest sample, i.e. the first element in ascending order.
pub fn min(samples: &[f64]) -> Option<f64> {
    samples.iter().copied().min_by(|a, b| a.total_cmp(b))
}

/// Largest sample, i.e. the last element in ascending order.
pub fn max(samples: &[f64]) -> Option<f64> {
    samples.iter().copied().max_by(|a, b| a.total_cmp(b))
}

/// Compute the full latency summary (mean, median, min, max, p95, p99).
/// Returns `None` when there are no samples.
pub fn compute_latency_stats(samples: &[f64]) -> Option<LatencyStats> {
    if samples.is_empty() {
        return None;
    }
    let sorted = sorted_copy(samples);
    Some(LatencyStats {
        mean_ms: mean(&sorted)?,
        median_ms: median_of_sorted(&sorted)?,
        min_ms: *sorted.first()?,
        max_ms: *sorted.last()?,
        p95_ms: percentile(&sorted, 0.95)?,
        p99_ms: percentile(&sorted, 0.99)?,
    })
}
