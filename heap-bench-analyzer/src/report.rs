//! Report model: the charts and tables derived from an aggregation table,
//! independent of how they end up rendered.

use std::collections::{BTreeMap, BTreeSet};

use heap_bench_defs::{Catalog, VariantDef, is_graph_benchmark};

use crate::aggregate::AggregationTable;
use crate::instructions::TraceComparison;
use crate::normalize::{NormalizedPoint, normalize};
use crate::parser::GroupKey;
use crate::ratio::RatioFrequency;
use crate::stats::{EmptyGroup, Summary, reduce};

/// One reduced point of a variant's series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    /// Plotted x value: the input size, or |V| = size / 8 for graph benchmarks
    pub x: f64,
    /// Input size as logged
    pub size: u64,
    pub summary: Summary,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub variant: VariantDef,
    pub points: Vec<SeriesPoint>,
}

/// One row of a comparison table; `cells` line up with [`GeneralReport::columns`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub x: f64,
    pub label: String,
    pub cells: Vec<Option<NormalizedPoint>>,
}

/// Chart and table for one size-keyed benchmark.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneralReport {
    pub benchmark: String,
    /// `|V|` for graph benchmarks, `N` otherwise
    pub x_label: &'static str,
    /// Variants with data, in catalog order
    pub series: Vec<Series>,
    /// Every catalog variant, in catalog order
    pub columns: Vec<VariantDef>,
    /// `None` for chart-only benchmarks
    pub table: Option<Vec<TableRow>>,
}

/// One bar of a road-network chart.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadBar {
    pub variant: VariantDef,
    pub summary: Summary,
    pub ratio: Option<f64>,
    pub is_minimum: bool,
}

/// Bar chart for one (benchmark, location) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct RoadReport {
    pub benchmark: String,
    pub location: String,
    pub bars: Vec<RoadBar>,
}

/// Everything a sink gets to render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    pub general: Vec<GeneralReport>,
    pub roads: Vec<RoadReport>,
    pub ratios: Option<RatioFrequency>,
    pub traces: Vec<TraceComparison>,
}

impl Analysis {
    /// Build the general and road reports; ratios and traces are attached by the caller.
    pub fn from_table(table: &AggregationTable, catalog: &Catalog) -> Result<Self, EmptyGroup> {
        Ok(Self {
            general: build_general_reports(table, catalog)?,
            roads: build_road_reports(table, catalog)?,
            ratios: None,
            traces: Vec::new(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.general.is_empty()
            && self.roads.is_empty()
            && self.ratios.is_none()
            && self.traces.is_empty()
    }
}

/// Label of a table row: `2^k` for powers of two, the plain number otherwise.
pub fn row_label(x: f64) -> String {
    if x >= 1.0 && x.fract() == 0.0 && x < u64::MAX as f64 {
        let n = x as u64;
        if n.is_power_of_two() {
            return format!("2^{}", n.trailing_zeros());
        }
        return n.to_string();
    }
    format!("{x}")
}

fn x_value(benchmark: &str, size: u64) -> f64 {
    if is_graph_benchmark(benchmark) {
        size as f64 / 8.0
    } else {
        size as f64
    }
}

/// Build the report for one benchmark, or `None` if it has no size-keyed data.
pub fn build_general_report(
    table: &AggregationTable,
    catalog: &Catalog,
    benchmark: &str,
) -> Result<Option<GeneralReport>, EmptyGroup> {
    let mut series = Vec::new();
    let mut centrals: BTreeMap<u64, BTreeMap<String, i64>> = BTreeMap::new();

    for variant in catalog.variants() {
        let Some(groups) = table.groups(benchmark, &variant.key) else {
            continue;
        };
        let mut points = Vec::new();
        for (key, values) in groups {
            let GroupKey::Size(size) = key else {
                continue;
            };
            let summary = reduce(values)?;
            centrals
                .entry(*size)
                .or_default()
                .insert(variant.key.clone(), summary.central);
            points.push(SeriesPoint {
                x: x_value(benchmark, *size),
                size: *size,
                summary,
            });
        }
        if !points.is_empty() {
            series.push(Series {
                variant: variant.clone(),
                points,
            });
        }
    }

    if series.is_empty() {
        return Ok(None);
    }

    let table_rows = catalog.has_table(benchmark).then(|| {
        let order = catalog.order();
        centrals
            .iter()
            .map(|(size, values)| {
                let points = normalize(values, &order);
                let x = x_value(benchmark, *size);
                TableRow {
                    x,
                    label: row_label(x),
                    cells: catalog
                        .variants()
                        .iter()
                        .map(|v| points.iter().find(|p| p.variant == v.key).cloned())
                        .collect(),
                }
            })
            .collect()
    });

    Ok(Some(GeneralReport {
        benchmark: benchmark.to_string(),
        x_label: if is_graph_benchmark(benchmark) { "|V|" } else { "N" },
        series,
        columns: catalog.variants().to_vec(),
        table: table_rows,
    }))
}

/// Reports for the catalog benchmarks in catalog order, then for any other
/// size-keyed benchmark in the data, alphabetically.
pub fn build_general_reports(
    table: &AggregationTable,
    catalog: &Catalog,
) -> Result<Vec<GeneralReport>, EmptyGroup> {
    let mut reports = Vec::new();

    for benchmark in catalog.benchmarks() {
        match build_general_report(table, catalog, benchmark)? {
            Some(report) => reports.push(report),
            None => tracing::warn!(benchmark = %benchmark, "no measurements for benchmark"),
        }
    }

    for benchmark in table.benchmarks() {
        if catalog.benchmarks().iter().any(|b| b == benchmark) {
            continue;
        }
        if let Some(report) = build_general_report(table, catalog, benchmark)? {
            tracing::debug!(benchmark, "reporting benchmark missing from the catalog");
            reports.push(report);
        }
    }

    Ok(reports)
}

fn build_road_report(
    table: &AggregationTable,
    catalog: &Catalog,
    benchmark: &str,
    location: &str,
) -> Result<Option<RoadReport>, EmptyGroup> {
    let key = GroupKey::Location(location.to_string());

    let mut summaries = Vec::new();
    for variant in catalog.variants() {
        if let Some(values) = table.values(benchmark, &variant.key, &key) {
            summaries.push((variant, reduce(values)?));
        }
    }
    if summaries.is_empty() {
        return Ok(None);
    }

    let centrals: BTreeMap<String, i64> = summaries
        .iter()
        .map(|(v, s)| (v.key.clone(), s.central))
        .collect();
    let points = normalize(&centrals, &catalog.order());

    let bars = summaries
        .into_iter()
        .zip(points)
        .map(|((variant, summary), point)| RoadBar {
            variant: variant.clone(),
            summary,
            ratio: point.ratio,
            is_minimum: point.is_minimum,
        })
        .collect();

    Ok(Some(RoadReport {
        benchmark: benchmark.to_string(),
        location: location.to_string(),
        bars,
    }))
}

/// One report per (benchmark, location): benchmarks alphabetically, locations
/// in catalog order and then any others alphabetically.
pub fn build_road_reports(
    table: &AggregationTable,
    catalog: &Catalog,
) -> Result<Vec<RoadReport>, EmptyGroup> {
    let mut reports = Vec::new();

    for benchmark in table.benchmarks() {
        let present: BTreeSet<&str> = table
            .keys(benchmark)
            .into_iter()
            .filter_map(|key| match key {
                GroupKey::Location(location) => Some(location.as_str()),
                GroupKey::Size(_) => None,
            })
            .collect();
        if present.is_empty() {
            continue;
        }

        let known = catalog
            .locations()
            .iter()
            .map(String::as_str)
            .filter(|l| present.contains(l));
        let unknown = present
            .iter()
            .copied()
            .filter(|l| !catalog.locations().iter().any(|c| c == l));

        for location in known.chain(unknown) {
            if let Some(report) = build_road_report(table, catalog, benchmark, location)? {
                reports.push(report);
            }
        }
    }

    Ok(reports)
}
