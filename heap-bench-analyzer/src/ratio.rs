//! Frequency analysis of `(numerator/denominator)` observations.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::parser::RatioRecord;

/// Ratio used as a map key, ordered with `f64::total_cmp`.
#[derive(Debug, Clone, Copy)]
struct RatioKey(f64);

impl PartialEq for RatioKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for RatioKey {}

impl PartialOrd for RatioKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RatioKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// One histogram bin; `end` is exclusive except for the last bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Accumulated ratio observations.
///
/// Observations with a zero denominator are counted as discarded and touch
/// nothing else.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatioFrequency {
    frequencies: BTreeMap<RatioKey, usize>,
    values: Vec<f64>,
    total_numerator: i128,
    total_denominator: i128,
    discarded: usize,
}

impl RatioFrequency {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = RatioRecord>) -> Self {
        let mut freq = Self::new();
        for record in records {
            freq.push(record);
        }
        freq
    }

    pub fn push(&mut self, record: RatioRecord) {
        if record.denominator == 0 {
            tracing::trace!(numerator = record.numerator, "discarding zero-denominator ratio");
            self.discarded += 1;
            return;
        }

        let mut ratio = record.numerator as f64 / record.denominator as f64;
        // 0/-n would otherwise be a separate key from 0/n
        if ratio == 0.0 {
            ratio = 0.0;
        }

        *self.frequencies.entry(RatioKey(ratio)).or_default() += 1;
        self.values.push(ratio);
        self.total_numerator += i128::from(record.numerator);
        self.total_denominator += i128::from(record.denominator);
    }

    /// `(ratio, occurrences)` in ascending ratio order.
    pub fn frequencies(&self) -> impl Iterator<Item = (f64, usize)> + '_ {
        self.frequencies.iter().map(|(k, count)| (k.0, *count))
    }

    /// Accepted ratios in arrival order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn accepted(&self) -> usize {
        self.values.len()
    }

    pub fn discarded(&self) -> usize {
        self.discarded
    }

    /// Sum of accepted numerators; wide enough that `i64` inputs never overflow.
    pub fn total_numerator(&self) -> i128 {
        self.total_numerator
    }

    pub fn total_denominator(&self) -> i128 {
        self.total_denominator
    }

    /// Σnumerator / Σdenominator over accepted observations.
    pub fn grand_ratio(&self) -> Option<f64> {
        (self.total_denominator != 0)
            .then(|| self.total_numerator as f64 / self.total_denominator as f64)
    }

    /// Equal-width histogram of the accepted ratios over `[min, max]`.
    ///
    /// When every value is identical the range widens to `[v - 0.5, v + 0.5]`.
    pub fn histogram(&self, bins: usize) -> Vec<HistogramBin> {
        if bins == 0 || self.values.is_empty() {
            return Vec::new();
        }

        let mut lo = self.values.iter().copied().fold(f64::INFINITY, f64::min);
        let mut hi = self.values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if lo == hi {
            lo -= 0.5;
            hi += 0.5;
        }
        let width = (hi - lo) / bins as f64;

        let mut histogram: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                start: lo + width * i as f64,
                end: if i + 1 == bins {
                    hi
                } else {
                    lo + width * (i + 1) as f64
                },
                count: 0,
            })
            .collect();

        for &value in &self.values {
            let idx = (((value - lo) / width) as usize).min(bins - 1);
            histogram[idx].count += 1;
        }

        histogram
    }
}
