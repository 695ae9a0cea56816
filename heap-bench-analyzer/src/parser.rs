//! Parse heap benchmark logs.
//!
//! Three line shapes are understood:
//!
//! - general: `n=1024 hhb_sort=500 phb_sort=700 ...`, one line per trial run,
//!   the leading `n=` token giving the input size for the whole line
//! - road-network: `hhb_dijkstra_nyc=812 hhb_prim_nyc=301 ...`, the location
//!   taking the place of the input size
//! - ratio: `<anything> (3/4).`, only the trailing `(num/den)` token matters
//!
//! Malformed lines are fatal. Records for variants outside the catalog are
//! dropped silently once the token itself has been validated.

use heap_bench_defs::Catalog;

use crate::error::{LineError, LogError, LogErrorKind};

/// The independent variable of a benchmark.
///
/// Sizes sort numerically and before every location.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupKey {
    Size(u64),
    Location(String),
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupKey::Size(n) => write!(f, "{n}"),
            GroupKey::Location(l) => write!(f, "{l}"),
        }
    }
}

/// One measurement from one `name=value` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementRecord {
    pub variant: String,
    pub benchmark: String,
    pub key: GroupKey,
    pub value: i64,
}

/// A `(numerator/denominator)` observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatioRecord {
    pub numerator: i64,
    pub denominator: i64,
}

/// Which grammar a log follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogShape {
    General,
    RoadNetwork,
    Ratio,
}

/// Result of parsing one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine {
    Measurements(Vec<MeasurementRecord>),
    /// `None` for blank lines
    Ratio(Option<RatioRecord>),
}

/// Parse one line according to `shape`.
pub fn parse_line(line: &str, shape: LogShape, catalog: &Catalog) -> Result<ParsedLine, LineError> {
    match shape {
        LogShape::General => parse_general_line(line, catalog).map(ParsedLine::Measurements),
        LogShape::RoadNetwork => parse_road_line(line, catalog).map(ParsedLine::Measurements),
        LogShape::Ratio => parse_ratio_line(line).map(ParsedLine::Ratio),
    }
}

/// Split `name=value`, failing if there is no `=`.
fn split_assignment<'a>(line: &str, token: &'a str) -> Result<(&'a str, &'a str), LineError> {
    token
        .split_once('=')
        .ok_or_else(|| LineError::new(LogErrorKind::MalformedRecordName, line, token))
}

/// Name segments become output file names: non-empty, no path separators,
/// never `.` or `..`.
fn is_plain_segment(segment: &str) -> bool {
    !segment.is_empty() && segment != "." && segment != ".." && !segment.contains(['/', '\\'])
}

fn parse_value(line: &str, token: &str, value: &str) -> Result<i64, LineError> {
    value
        .trim()
        .parse()
        .map_err(|_| LineError::new(LogErrorKind::InvalidMeasurementValue, line, token))
}

/// Parse a general log line: `n=<size>` followed by `<variant>_<benchmark>=<value>` tokens.
pub fn parse_general_line(
    line: &str,
    catalog: &Catalog,
) -> Result<Vec<MeasurementRecord>, LineError> {
    let mut tokens = line.split_whitespace();
    let Some(size_token) = tokens.next() else {
        return Ok(Vec::new());
    };

    let (key, size) = split_assignment(line, size_token)?;
    if key != "n" {
        return Err(LineError::new(
            LogErrorKind::MalformedRecordName,
            line,
            size_token,
        ));
    }
    let size: u64 = size
        .trim()
        .parse()
        .map_err(|_| LineError::new(LogErrorKind::InvalidMeasurementValue, line, size_token))?;

    let mut records = Vec::new();
    for token in tokens {
        let (name, value) = split_assignment(line, token)?;

        // variant is the first segment, the benchmark is everything after it
        let (variant, benchmark) = name
            .split_once('_')
            .filter(|(v, b)| is_plain_segment(v) && is_plain_segment(b))
            .ok_or_else(|| LineError::new(LogErrorKind::MalformedRecordName, line, token))?;

        let value = parse_value(line, token, value)?;

        if !catalog.contains(variant) {
            tracing::trace!(variant, benchmark, "skipping unrecognized variant");
            continue;
        }

        records.push(MeasurementRecord {
            variant: variant.to_string(),
            benchmark: benchmark.to_string(),
            key: GroupKey::Size(size),
            value,
        });
    }

    Ok(records)
}

/// Parse a road-network log line: `<variant>_<benchmark>_<location>=<value>` tokens.
pub fn parse_road_line(
    line: &str,
    catalog: &Catalog,
) -> Result<Vec<MeasurementRecord>, LineError> {
    let mut records = Vec::new();
    for token in line.split_whitespace() {
        let (name, value) = split_assignment(line, token)?;

        let parts: Vec<&str> = name.split('_').collect();
        let [variant, benchmark, location] = parts[..] else {
            return Err(LineError::new(
                LogErrorKind::MalformedRecordName,
                line,
                token,
            ));
        };
        if ![variant, benchmark, location].into_iter().all(is_plain_segment) {
            return Err(LineError::new(
                LogErrorKind::MalformedRecordName,
                line,
                token,
            ));
        }

        let value = parse_value(line, token, value)?;

        if !catalog.contains(variant) {
            tracing::trace!(variant, benchmark, location, "skipping unrecognized variant");
            continue;
        }

        records.push(MeasurementRecord {
            variant: variant.to_string(),
            benchmark: benchmark.to_string(),
            key: GroupKey::Location(location.to_string()),
            value,
        });
    }

    Ok(records)
}

/// Parse the trailing `(num/den)` token of a ratio line.
///
/// One trailing character after the closing parenthesis (usually `.`) is
/// tolerated. Zero denominators parse fine; discarding them is the
/// aggregator's job.
pub fn parse_ratio_line(line: &str) -> Result<Option<RatioRecord>, LineError> {
    let Some(token) = line.split_whitespace().last() else {
        return Ok(None);
    };
    let malformed = || LineError::new(LogErrorKind::MalformedRatioToken, line, token);

    let inner = token.strip_prefix('(').ok_or_else(malformed)?;
    let inner = match inner.strip_suffix(')') {
        Some(inner) => inner,
        None => {
            let mut chars = inner.chars();
            chars.next_back();
            chars.as_str().strip_suffix(')').ok_or_else(malformed)?
        }
    };
    let (numerator, denominator) = inner.split_once('/').ok_or_else(malformed)?;

    Ok(Some(RatioRecord {
        numerator: parse_value(line, token, numerator)?,
        denominator: parse_value(line, token, denominator)?,
    }))
}

/// Parse a whole general or road-network log, failing on the first bad line.
pub fn parse_measurements(
    file: &str,
    text: &str,
    shape: LogShape,
    catalog: &Catalog,
) -> Result<Vec<MeasurementRecord>, LogError> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match parse_line(line, shape, catalog) {
            Ok(ParsedLine::Measurements(parsed)) => records.extend(parsed),
            Ok(ParsedLine::Ratio(_)) => {}
            Err(err) => return Err(LogError::new(file, idx + 1, line, err)),
        }
    }
    tracing::debug!(file, records = records.len(), ?shape, "parsed log");
    Ok(records)
}

/// Parse a whole ratio log, failing on the first bad line.
pub fn parse_ratios(file: &str, text: &str) -> Result<Vec<RatioRecord>, LogError> {
    let mut records = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        match parse_ratio_line(line) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(err) => return Err(LogError::new(file, idx + 1, line, err)),
        }
    }
    tracing::debug!(file, records = records.len(), "parsed ratio log");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog::with_keys(&["hhb", "phb", "fhb", "uhhb"])
    }

    #[test]
    fn test_parse_general_line() {
        let records =
            parse_general_line("n=1024 hhb_sort=500 phb_sort=700 zzz_sort=999", &catalog())
                .unwrap();
        assert_eq!(
            records,
            vec![
                MeasurementRecord {
                    variant: "hhb".to_string(),
                    benchmark: "sort".to_string(),
                    key: GroupKey::Size(1024),
                    value: 500,
                },
                MeasurementRecord {
                    variant: "phb".to_string(),
                    benchmark: "sort".to_string(),
                    key: GroupKey::Size(1024),
                    value: 700,
                },
            ]
        );
    }

    #[test]
    fn test_parse_general_line_rejoins_benchmark_name() {
        let records = parse_general_line(
            "n=4096 uhhb_dijkstra_sparse=31 uhhb_prim_dense=77 ",
            &catalog(),
        )
        .unwrap();
        let benchmarks: Vec<_> = records.iter().map(|r| r.benchmark.as_str()).collect();
        assert_eq!(benchmarks, vec!["dijkstra_sparse", "prim_dense"]);
        assert!(records.iter().all(|r| r.key == GroupKey::Size(4096)));
    }

    #[test]
    fn test_parse_general_line_blank() {
        assert_eq!(parse_general_line("   ", &catalog()), Ok(vec![]));
        assert_eq!(parse_general_line("", &catalog()), Ok(vec![]));
    }

    #[test]
    fn test_parse_general_line_size_only() {
        assert_eq!(parse_general_line("n=8", &catalog()), Ok(vec![]));
    }

    #[test]
    fn test_parse_general_line_errors() {
        let err = parse_general_line("n=1024 hhb_sort=fast", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::InvalidMeasurementValue);
        assert_eq!(err.token, "hhb_sort=fast");
        assert_eq!(err.offset, 7);

        let err = parse_general_line("n=big hhb_sort=1", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::InvalidMeasurementValue);
        assert_eq!(err.token, "n=big");

        let err = parse_general_line("size=1 hhb_sort=1", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);

        let err = parse_general_line("hhb_sort=1 phb_sort=2", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);
        assert_eq!(err.token, "hhb_sort=1");

        let err = parse_general_line("n=1 hhbsort=1", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);

        let err = parse_general_line("n=1 hhb_sort", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);
    }

    #[test]
    fn test_unrecognized_variant_is_still_validated() {
        let err = parse_general_line("n=1 zzz_sort=oops", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::InvalidMeasurementValue);
    }

    #[test]
    fn test_parse_road_line() {
        let records = parse_road_line(
            "hhb_dijkstra_nyc=812 rhb_dijkstra_nyc=900 phb_prim_bay=301",
            &catalog(),
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].variant, "hhb");
        assert_eq!(records[0].benchmark, "dijkstra");
        assert_eq!(records[0].key, GroupKey::Location("nyc".to_string()));
        assert_eq!(records[0].value, 812);
        assert_eq!(records[1].key, GroupKey::Location("bay".to_string()));
    }

    #[test]
    fn test_parse_road_line_requires_three_segments() {
        let err = parse_road_line("hhb_dijkstra=812", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);

        let err = parse_road_line("hhb_dijkstra_sparse_nyc=812", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);

        let err = parse_road_line("hhb__nyc=812", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);

        let err = parse_road_line("hhb_prim_nyc=1.5", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::InvalidMeasurementValue);
    }

    #[test]
    fn test_path_syntax_in_names_is_rejected() {
        for line in ["n=1 hhb_../x=1", "n=1 hhb_sort/x=1", "n=1 hhb_..=1", "n=1 zzz_a\\b=1"] {
            let err = parse_general_line(line, &catalog()).unwrap_err();
            assert_eq!(err.kind, LogErrorKind::MalformedRecordName, "{line}");
        }

        let err = parse_road_line("hhb_dijkstra_../x=1", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);
        let err = parse_road_line("hhb_._nyc=1", &catalog()).unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);

        assert_eq!(parse_general_line("n=1 hhb_sort.v2=1", &catalog()).unwrap().len(), 1);
    }

    #[test]
    fn test_parse_ratio_line() {
        assert_eq!(
            parse_ratio_line("trial result (3/4)."),
            Ok(Some(RatioRecord {
                numerator: 3,
                denominator: 4
            }))
        );
        assert_eq!(
            parse_ratio_line("ranked links (12/40)"),
            Ok(Some(RatioRecord {
                numerator: 12,
                denominator: 40
            }))
        );
        assert_eq!(
            parse_ratio_line("trial result (5/0)."),
            Ok(Some(RatioRecord {
                numerator: 5,
                denominator: 0
            }))
        );
        assert_eq!(parse_ratio_line("  "), Ok(None));
    }

    #[test]
    fn test_parse_ratio_line_errors() {
        for line in ["trial result 3/4.", "trial (3-4).", "trial (3/4", "(3/4)..", "x ()"] {
            let err = parse_ratio_line(line).unwrap_err();
            assert_eq!(
                err.kind,
                LogErrorKind::MalformedRatioToken,
                "line {line:?} should be malformed"
            );
        }

        let err = parse_ratio_line("trial (a/4).").unwrap_err();
        assert_eq!(err.kind, LogErrorKind::InvalidMeasurementValue);
        assert_eq!(err.token, "(a/4).");
        assert_eq!(err.offset, 6);
    }

    #[test]
    fn test_parse_measurements_reports_line_number() {
        let text = "n=2 hhb_sort=1\nn=4 hhb_sort=2\nn=8 hhb_sort=x\n";
        let err = parse_measurements("benchmark_output_3", text, LogShape::General, &catalog())
            .unwrap_err();
        assert_eq!(err.line_no, 3);
        assert_eq!(err.file, "benchmark_output_3");
        assert_eq!(err.token, "hhb_sort=x");
    }

    #[test]
    fn test_parse_line_dispatch() {
        let parsed = parse_line("(1/2).", LogShape::Ratio, &catalog()).unwrap();
        assert_eq!(
            parsed,
            ParsedLine::Ratio(Some(RatioRecord {
                numerator: 1,
                denominator: 2
            }))
        );
        let parsed = parse_line("fhb_prim_rome=9", LogShape::RoadNetwork, &catalog()).unwrap();
        assert!(matches!(parsed, ParsedLine::Measurements(r) if r.len() == 1));
    }

    #[test]
    fn test_parse_ratios_skips_blank_lines() {
        let text = "a (1/2).\n\nb (3/0).\n";
        let records = parse_ratios("freq", text).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].denominator, 0);
    }
}
