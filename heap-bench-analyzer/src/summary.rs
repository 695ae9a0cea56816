//! `summary.json`: the reduced and normalized points in machine-readable form.
//!
//! Maps are `IndexMap`s so the JSON keeps report order (catalog order for
//! benchmarks and variants) rather than alphabetical order.

use std::path::PathBuf;

use facet::Facet;
use indexmap::IndexMap;

use crate::error::AnalyzeError;
use crate::instructions::TraceComparison;
use crate::ratio::RatioFrequency;
use crate::report::{GeneralReport, RoadReport};
use crate::sink::{HISTOGRAM_BINS, ReportSink, write_output};
use crate::stats::Summary;

pub const SUMMARY_FILE: &str = "summary.json";
pub const SUMMARY_SCHEMA: &str = "heap-bench-summary-v1";

/// Top-level `summary.json` structure.
#[derive(Debug, Clone, Facet)]
pub struct SummaryJson {
    /// Schema version identifier
    pub schema: String,

    /// RFC 3339 timestamp of the run
    pub generated_at: String,

    /// Benchmark name -> chart and table data
    pub benchmarks: IndexMap<String, BenchmarkSummary>,

    /// Benchmark name -> location -> variant -> bar
    pub roads: IndexMap<String, IndexMap<String, IndexMap<String, BarSummary>>>,

    /// Ratio frequencies, when a ratio log was analyzed
    pub ratios: Option<RatioSummary>,

    /// Operation -> up/down instruction summaries
    pub instructions: IndexMap<String, TraceSummary>,
}

/// Central value and dispersion of one group.
#[derive(Debug, Clone, Copy, Facet)]
pub struct StatSummary {
    pub central: i64,
    pub dispersion: i64,
}

impl From<Summary> for StatSummary {
    fn from(s: Summary) -> Self {
        Self {
            central: s.central,
            dispersion: s.dispersion,
        }
    }
}

#[derive(Debug, Clone, Facet)]
pub struct BenchmarkSummary {
    pub x_label: String,

    /// Variant -> points, ascending by x
    pub series: IndexMap<String, Vec<PointSummary>>,

    /// Comparison table rows; absent for chart-only benchmarks
    pub table: Option<Vec<RowSummary>>,
}

#[derive(Debug, Clone, Facet)]
pub struct PointSummary {
    pub x: f64,
    pub size: u64,
    pub central: i64,
    pub dispersion: i64,
}

#[derive(Debug, Clone, Facet)]
pub struct RowSummary {
    pub label: String,
    pub x: f64,

    /// Variant -> normalized cell; variants without data are omitted
    pub cells: IndexMap<String, CellSummary>,
}

#[derive(Debug, Clone, Facet)]
pub struct CellSummary {
    pub value: i64,
    pub ratio: Option<f64>,
    pub is_minimum: bool,
}

#[derive(Debug, Clone, Facet)]
pub struct BarSummary {
    pub central: i64,
    pub dispersion: i64,
    pub ratio: Option<f64>,
    pub is_minimum: bool,
}

#[derive(Debug, Clone, Facet)]
pub struct RatioSummary {
    pub accepted: usize,
    pub discarded: usize,
    pub total_numerator: i128,
    pub total_denominator: i128,
    pub grand_ratio: Option<f64>,
    pub frequencies: Vec<FrequencySummary>,
    pub histogram: Vec<BinSummary>,
}

#[derive(Debug, Clone, Facet)]
pub struct FrequencySummary {
    pub ratio: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Facet)]
pub struct BinSummary {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

#[derive(Debug, Clone, Facet)]
pub struct TraceSummary {
    pub up: Option<StatSummary>,
    pub down: Option<StatSummary>,
    pub up_counts: Vec<i64>,
    pub down_counts: Vec<i64>,
}

impl SummaryJson {
    pub fn new(generated_at: impl Into<String>) -> Self {
        Self {
            schema: SUMMARY_SCHEMA.to_string(),
            generated_at: generated_at.into(),
            benchmarks: IndexMap::new(),
            roads: IndexMap::new(),
            ratios: None,
            instructions: IndexMap::new(),
        }
    }
}

/// Builds a [`SummaryJson`] and writes it to `summary.json` on finish.
pub struct JsonSink {
    out_dir: PathBuf,
    summary: SummaryJson,
}

impl JsonSink {
    pub fn new(out_dir: impl Into<PathBuf>, generated_at: impl Into<String>) -> Self {
        Self {
            out_dir: out_dir.into(),
            summary: SummaryJson::new(generated_at),
        }
    }

    pub fn summary(&self) -> &SummaryJson {
        &self.summary
    }
}

impl ReportSink for JsonSink {
    fn name(&self) -> &'static str {
        "json"
    }

    fn general(&mut self, report: &GeneralReport) -> Result<(), AnalyzeError> {
        let series = report
            .series
            .iter()
            .map(|s| {
                let points = s
                    .points
                    .iter()
                    .map(|p| PointSummary {
                        x: p.x,
                        size: p.size,
                        central: p.summary.central,
                        dispersion: p.summary.dispersion,
                    })
                    .collect();
                (s.variant.key.clone(), points)
            })
            .collect();

        let table = report.table.as_ref().map(|rows| {
            rows.iter()
                .map(|row| RowSummary {
                    label: row.label.clone(),
                    x: row.x,
                    cells: row
                        .cells
                        .iter()
                        .flatten()
                        .map(|cell| {
                            (
                                cell.variant.clone(),
                                CellSummary {
                                    value: cell.value,
                                    ratio: cell.ratio,
                                    is_minimum: cell.is_minimum,
                                },
                            )
                        })
                        .collect(),
                })
                .collect()
        });

        self.summary.benchmarks.insert(
            report.benchmark.clone(),
            BenchmarkSummary {
                x_label: report.x_label.to_string(),
                series,
                table,
            },
        );
        Ok(())
    }

    fn roads(&mut self, reports: &[RoadReport]) -> Result<(), AnalyzeError> {
        for report in reports {
            let bars = report
                .bars
                .iter()
                .map(|bar| {
                    (
                        bar.variant.key.clone(),
                        BarSummary {
                            central: bar.summary.central,
                            dispersion: bar.summary.dispersion,
                            ratio: bar.ratio,
                            is_minimum: bar.is_minimum,
                        },
                    )
                })
                .collect();
            self.summary
                .roads
                .entry(report.benchmark.clone())
                .or_default()
                .insert(report.location.clone(), bars);
        }
        Ok(())
    }

    fn ratios(&mut self, freq: &RatioFrequency) -> Result<(), AnalyzeError> {
        self.summary.ratios = Some(RatioSummary {
            accepted: freq.accepted(),
            discarded: freq.discarded(),
            total_numerator: freq.total_numerator(),
            total_denominator: freq.total_denominator(),
            grand_ratio: freq.grand_ratio(),
            frequencies: freq
                .frequencies()
                .map(|(ratio, count)| FrequencySummary { ratio, count })
                .collect(),
            histogram: freq
                .histogram(HISTOGRAM_BINS)
                .into_iter()
                .map(|bin| BinSummary {
                    start: bin.start,
                    end: bin.end,
                    count: bin.count,
                })
                .collect(),
        });
        Ok(())
    }

    fn instructions(&mut self, traces: &[TraceComparison]) -> Result<(), AnalyzeError> {
        for trace in traces {
            self.summary.instructions.insert(
                trace.operation.clone(),
                TraceSummary {
                    up: trace.up_summary.map(StatSummary::from),
                    down: trace.down_summary.map(StatSummary::from),
                    up_counts: trace.up.clone(),
                    down_counts: trace.down.clone(),
                },
            );
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<PathBuf>, AnalyzeError> {
        let json = facet_json::to_string_pretty(&self.summary).map_err(|e| AnalyzeError::Report {
            what: SUMMARY_FILE.to_string(),
            message: e.to_string(),
        })?;
        Ok(vec![write_output(&self.out_dir, SUMMARY_FILE, &json)?])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregationTable;
    use crate::parser::{GroupKey, MeasurementRecord, RatioRecord};
    use crate::report::Analysis;
    use crate::sink::emit;
    use heap_bench_defs::Catalog;

    fn record(variant: &str, benchmark: &str, key: GroupKey, value: i64) -> MeasurementRecord {
        MeasurementRecord {
            variant: variant.to_string(),
            benchmark: benchmark.to_string(),
            key,
            value,
        }
    }

    #[test]
    fn test_summary_keeps_report_order() {
        let table = AggregationTable::from_records([
            record("phb", "sort", GroupKey::Size(1024), 700),
            record("hhb", "sort", GroupKey::Size(1024), 500),
            record("fhb", "compression", GroupKey::Size(64), 9),
            record("hhb", "prim", GroupKey::Location("rome".to_string()), 4),
            record("hhb", "prim", GroupKey::Location("nyc".to_string()), 5),
        ]);
        let mut analysis = Analysis::from_table(&table, &Catalog::default()).unwrap();
        analysis.ratios = Some(RatioFrequency::from_records([RatioRecord {
            numerator: 1,
            denominator: 2,
        }]));

        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonSink::new(dir.path(), "2026-01-01T00:00:00+00:00");
        let written = emit(&analysis, &mut sink).unwrap();
        assert_eq!(written, vec![dir.path().join(SUMMARY_FILE)]);

        let summary = sink.summary();
        assert_eq!(summary.schema, SUMMARY_SCHEMA);
        let benchmarks: Vec<_> = summary.benchmarks.keys().map(String::as_str).collect();
        assert_eq!(benchmarks, vec!["sort", "compression"]);

        let sort = &summary.benchmarks["sort"];
        let variants: Vec<_> = sort.series.keys().map(String::as_str).collect();
        assert_eq!(variants, vec!["hhb", "phb"]);
        let row = &sort.table.as_ref().unwrap()[0];
        assert_eq!(row.label, "2^10");
        assert_eq!(row.cells["phb"].ratio, Some(1.4));
        assert!(row.cells["hhb"].is_minimum);
        assert!(!row.cells.contains_key("fhb"));

        let locations: Vec<_> = summary.roads["prim"].keys().map(String::as_str).collect();
        assert_eq!(locations, vec!["nyc", "rome"]);

        let ratios = summary.ratios.as_ref().unwrap();
        assert_eq!(ratios.accepted, 1);
        assert_eq!(ratios.histogram.len(), HISTOGRAM_BINS);
    }

    #[test]
    fn test_summary_file_is_json() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = JsonSink::new(dir.path(), "2026-01-01T00:00:00+00:00");
        let written = emit(&Analysis::default(), &mut sink).unwrap();

        let text = std::fs::read_to_string(&written[0]).unwrap();
        assert!(text.contains("\"schema\""));
        assert!(text.contains(SUMMARY_SCHEMA));
        assert!(text.contains("2026-01-01T00:00:00+00:00"));
    }
}
