//! Reduce a group of trial measurements to a central value and a dispersion.

use miette::Diagnostic;
use thiserror::Error;

/// Reducing an empty group is a logic error upstream: groups without
/// observations are never materialized by the aggregator.
#[derive(Error, Debug, Diagnostic, Clone, Copy, PartialEq, Eq)]
#[error("attempted to reduce an empty measurement group")]
#[diagnostic(
    code(heap_bench::stats::empty_group),
    help("this is a bug: absent (benchmark, variant, key) groups must be skipped, not reduced")
)]
pub struct EmptyGroup;

/// Central value and dispersion of one measurement group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// `sorted[len / 2]`
    pub central: i64,
    /// Population standard deviation, truncated toward zero
    pub dispersion: i64,
}

/// The element at index `len / 2` of the sorted values.
///
/// For even lengths this picks the upper of the two middle elements rather
/// than averaging them: `[1, 2, 3, 4]` gives `3`.
pub fn median(values: &[i64]) -> Result<i64, EmptyGroup> {
    if values.is_empty() {
        return Err(EmptyGroup);
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    Ok(sorted[sorted.len() / 2])
}

/// Standard deviation with divisor N.
pub fn population_std_dev(values: &[i64]) -> Result<f64, EmptyGroup> {
    if values.is_empty() {
        return Err(EmptyGroup);
    }
    let n = values.len() as f64;
    let sum: i128 = values.iter().map(|&v| v as i128).sum();
    let mean = sum as f64 / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    Ok(variance.sqrt())
}

pub fn reduce(values: &[i64]) -> Result<Summary, EmptyGroup> {
    Ok(Summary {
        central: median(values)?,
        dispersion: population_std_dev(values)?.trunc() as i64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_picks_index_half_len() {
        assert_eq!(median(&[1, 2, 3, 4]), Ok(3));
        assert_eq!(median(&[4, 1, 3, 2]), Ok(3));
        assert_eq!(median(&[5]), Ok(5));
        assert_eq!(median(&[9, 1, 5]), Ok(5));
        assert_eq!(median(&[10, 10, 1, 1]), Ok(10));
    }

    #[test]
    fn test_population_std_dev() {
        let sd = population_std_dev(&[2, 4, 4, 4, 5, 5, 7, 9]).unwrap();
        assert!((sd - 2.0).abs() < 1e-12);

        // divisor N, not N-1: sample std dev of [1, 3] would be 1.414...
        let sd = population_std_dev(&[1, 3]).unwrap();
        assert!((sd - 1.0).abs() < 1e-12);

        assert_eq!(population_std_dev(&[42]).unwrap(), 0.0);
    }

    #[test]
    fn test_reduce_truncates_dispersion() {
        // mean 2.5, variance 1.25, std dev 1.118...
        assert_eq!(
            reduce(&[1, 2, 3, 4]),
            Ok(Summary {
                central: 3,
                dispersion: 1
            })
        );
        // std dev 3.266... truncates to 3
        assert_eq!(reduce(&[1, 5, 9]).map(|s| s.dispersion), Ok(3));
        assert_eq!(reduce(&[0, 0, 7]).map(|s| s.dispersion), Ok(3));
        assert_eq!(reduce(&[100, 107]).map(|s| s.dispersion), Ok(3));
    }

    #[test]
    fn test_reduce_empty_group() {
        assert_eq!(reduce(&[]), Err(EmptyGroup));
        assert_eq!(median(&[]), Err(EmptyGroup));
        assert_eq!(population_std_dev(&[]), Err(EmptyGroup));
    }

    #[test]
    fn test_reduce_is_order_insensitive() {
        let values = [700, 512, 649, 703, 598, 512, 820];
        let expected = reduce(&values).unwrap();

        let mut rotated = values;
        for _ in 0..values.len() {
            rotated.rotate_left(1);
            assert_eq!(reduce(&rotated).unwrap(), expected);
        }

        let mut reversed = values;
        reversed.reverse();
        assert_eq!(reduce(&reversed).unwrap(), expected);
    }

    #[test]
    fn test_reduce_large_values_do_not_overflow() {
        let values = [i64::MAX, i64::MAX, i64::MAX];
        assert_eq!(reduce(&values).map(|s| s.central), Ok(i64::MAX));
    }
}
