//! Compare variants at one key relative to a reference variant.

use std::collections::BTreeMap;

/// One variant's standing at one key.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPoint {
    pub variant: String,
    /// Central value the ratio was computed from
    pub value: i64,
    /// `value / reference`; `None` when the reference value is zero
    pub ratio: Option<f64>,
    /// Whether `value` is the smallest at this key (ties are all flagged)
    pub is_minimum: bool,
}

/// Normalize the central values of every variant present at one key.
///
/// The reference is the first variant of `order` that has a value; variants
/// missing from `values` are skipped, and variants missing from `order` are
/// ignored. The output follows `order`.
pub fn normalize(values: &BTreeMap<String, i64>, order: &[&str]) -> Vec<NormalizedPoint> {
    let present: Vec<(&str, i64)> = order
        .iter()
        .filter_map(|variant| values.get(*variant).map(|v| (*variant, *v)))
        .collect();

    let Some(&(_, reference)) = present.first() else {
        return Vec::new();
    };
    let minimum = present.iter().map(|(_, v)| *v).min().unwrap_or(reference);

    present
        .into_iter()
        .map(|(variant, value)| NormalizedPoint {
            variant: variant.to_string(),
            value,
            ratio: (reference != 0).then(|| value as f64 / reference as f64),
            is_minimum: value == minimum,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, i64)]) -> BTreeMap<String, i64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn ratio_of(points: &[NormalizedPoint], variant: &str) -> Option<f64> {
        points
            .iter()
            .find(|p| p.variant == variant)
            .and_then(|p| p.ratio)
    }

    #[test]
    fn test_tied_minimum_is_flagged_on_every_variant() {
        let points = normalize(&values(&[("A", 10), ("B", 7), ("C", 7)]), &["A", "B", "C"]);

        assert_eq!(points.len(), 3);
        assert!(!points[0].is_minimum);
        assert!(points[1].is_minimum);
        assert!(points[2].is_minimum);

        assert!((ratio_of(&points, "A").unwrap() - 1.0).abs() < 1e-12);
        assert!((ratio_of(&points, "B").unwrap() - 0.7).abs() < 1e-12);
        assert!((ratio_of(&points, "C").unwrap() - 0.7).abs() < 1e-12);
        assert_eq!(format!("{:.2}", ratio_of(&points, "B").unwrap()), "0.70");
    }

    #[test]
    fn test_reference_follows_order_not_value_or_name() {
        let v = values(&[("alpha", 50), ("zeta", 100)]);

        let points = normalize(&v, &["zeta", "alpha"]);
        assert_eq!(points[0].variant, "zeta");
        assert_eq!(points[0].ratio, Some(1.0));
        assert_eq!(points[1].ratio, Some(0.5));
        assert!(points[1].is_minimum);

        let points = normalize(&v, &["alpha", "zeta"]);
        assert_eq!(points[0].variant, "alpha");
        assert_eq!(points[1].ratio, Some(2.0));
    }

    #[test]
    fn test_missing_reference_falls_to_next_present_variant() {
        let v = values(&[("fhb", 300), ("phb", 150)]);
        let points = normalize(&v, &["hhb", "uhhb", "fhb", "phb"]);

        let variants: Vec<_> = points.iter().map(|p| p.variant.as_str()).collect();
        assert_eq!(variants, vec!["fhb", "phb"]);
        assert_eq!(points[0].ratio, Some(1.0));
        assert_eq!(points[1].ratio, Some(0.5));
    }

    #[test]
    fn test_zero_reference_has_no_ratio() {
        let points = normalize(&values(&[("a", 0), ("b", 5)]), &["a", "b"]);
        assert_eq!(points[0].ratio, None);
        assert_eq!(points[1].ratio, None);
        assert!(points[0].is_minimum);
        assert!(!points[1].is_minimum);
    }

    #[test]
    fn test_nothing_present() {
        assert!(normalize(&values(&[("x", 1)]), &["a", "b"]).is_empty());
        assert!(normalize(&BTreeMap::new(), &["a"]).is_empty());
    }
}
