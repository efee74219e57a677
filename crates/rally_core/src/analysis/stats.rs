//! # Robust Statistics
//!
//! Small, allocation-light helpers shared by the tempo engine and its
//! summaries: clamping, median, linear-interpolation percentile and
//! median absolute deviation (MAD).
//!
//! All functions return `None` on empty input instead of a sentinel, so a
//! caller can always tell "measured" from "could not be measured".

use serde::{Deserialize, Serialize};

/// Bound `value` into `[lo, hi]`.
///
/// Idempotent: `clamp(clamp(x)) == clamp(x)`.
pub fn clamp(value: f64, lo: f64, hi: f64) -> f64 {
    if value < lo {
        lo
    } else if value > hi {
        hi
    } else {
        value
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut s = values.to_vec();
    s.sort_by(|a, b| a.total_cmp(b));
    s
}

fn median_of_sorted(s: &[f64]) -> Option<f64> {
    let n = s.len();
    if n == 0 {
        return None;
    }
    let mid = n / 2;
    if n % 2 == 1 {
        Some(s[mid])
    } else {
        Some((s[mid - 1] + s[mid]) / 2.0)
    }
}

fn percentile_of_sorted(s: &[f64], q: f64) -> Option<f64> {
    let n = s.len();
    if n == 0 {
        return None;
    }
    if q <= 0.0 {
        return Some(s[0]);
    }
    if q >= 100.0 {
        return Some(s[n - 1]);
    }
    let rank = (q / 100.0) * (n - 1) as f64;
    let low = rank.floor() as usize;
    let high = (low + 1).min(n - 1);
    let weight = rank - low as f64;
    Some(s[low] * (1.0 - weight) + s[high] * weight)
}

pub fn median(values: &[f64]) -> Option<f64> {
    median_of_sorted(&sorted(values))
}

/// Linear-interpolation percentile, `q` in [0, 100].
///
/// # Examples
/// ```
/// use rally_core::analysis::stats::percentile;
///
/// let v = [1.0, 2.0, 3.0, 4.0, 5.0];
/// assert_eq!(percentile(&v, 50.0), Some(3.0));
/// assert!((percentile(&v, 10.0).unwrap() - 1.4).abs() < 1e-9);
/// assert_eq!(percentile(&[], 90.0), None);
/// ```
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    percentile_of_sorted(&sorted(values), q)
}

/// Median absolute deviation around `center` (or the median when `None`).
pub fn median_absolute_deviation(values: &[f64], center: Option<f64>) -> Option<f64> {
    let m = match center {
        Some(c) => c,
        None => median(values)?,
    };
    let deviations: Vec<f64> = values.iter().map(|v| (v - m).abs()).collect();
    median(&deviations)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation.
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let var = values.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / values.len() as f64;
    Some(var.sqrt())
}

/// Least-squares slope of `values` against their index.
pub fn index_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n == 0 {
        return None;
    }
    let mean_x = (n - 1) as f64 / 2.0;
    let mean_y = mean(values)?;
    let mut num = 0.0;
    let mut denom = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        num += dx * (y - mean_y);
        denom += dx * dx;
    }
    if denom == 0.0 {
        Some(0.0)
    } else {
        Some(num / denom)
    }
}

/// Robust summary of one group of response times.
///
/// `p10`/`p90` are `None` when the group is too small to be trusted as a
/// threshold source; `count`, `median` and MAD are kept for transparency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComboStatistic {
    pub count: usize,
    pub median: f64,
    pub p10: Option<f64>,
    pub p90: Option<f64>,
    pub median_absolute_deviation: f64,
}

impl ComboStatistic {
    /// Summarize a non-empty group. Returns `None` for an empty slice.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let s = sorted(values);
        let med = median_of_sorted(&s)?;
        let deviations: Vec<f64> = s.iter().map(|v| (v - med).abs()).collect();
        let mad = median(&deviations)?;
        Some(Self {
            count: s.len(),
            median: med,
            p10: percentile_of_sorted(&s, 10.0),
            p90: percentile_of_sorted(&s, 90.0),
            median_absolute_deviation: mad,
        })
    }

    /// Null out the thresholds when `count < min_count`.
    pub fn require_count(mut self, min_count: usize) -> Self {
        if self.count < min_count {
            self.p10 = None;
            self.p90 = None;
        }
        self
    }

    /// `(fast, slow)` thresholds, if this statistic is usable.
    pub fn thresholds(&self) -> Option<(f64, f64)> {
        match (self.p10, self.p90) {
            (Some(p10), Some(p90)) => Some((p10, p90)),
            _ => None,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.thresholds().is_some()
    }

    /// `(value - median) / MAD`, undefined when MAD is zero.
    pub fn robust_z(&self, value: f64) -> Option<f64> {
        if self.median_absolute_deviation == 0.0 || !self.median_absolute_deviation.is_finite() {
            return None;
        }
        Some((value - self.median) / self.median_absolute_deviation)
    }
}
