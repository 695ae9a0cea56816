//! Log discovery and the parse → aggregate → reduce → normalize run.

use std::path::{Path, PathBuf};

use heap_bench_defs::Catalog;

use crate::aggregate::AggregationTable;
use crate::error::AnalyzeError;
use crate::instructions::{TraceComparison, compare, parse_trace};
use crate::parser::{LogShape, parse_measurements, parse_ratios};
use crate::ratio::RatioFrequency;
use crate::report::Analysis;

/// Prefix shared by every benchmark log.
pub const LOG_PREFIX: &str = "benchmark_output_";

/// Suffix marking a road-network log.
pub const ROADS_SUFFIX: &str = "roads";

/// A discovered benchmark log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    pub path: PathBuf,
    pub shape: LogShape,
}

/// What to analyze.
#[derive(Debug, Clone)]
pub struct Inputs {
    /// Directory holding the `benchmark_output_*` logs
    pub dir: PathBuf,
    pub catalog: Catalog,
    pub ratios: Option<PathBuf>,
    /// `(up, down)` instruction traces
    pub traces: Option<(PathBuf, PathBuf)>,
}

/// Classify a file name, or `None` if it is not a benchmark log.
pub fn classify(name: &str) -> Option<LogShape> {
    if !name.starts_with(LOG_PREFIX) {
        return None;
    }
    if name.ends_with(ROADS_SUFFIX) {
        Some(LogShape::RoadNetwork)
    } else {
        Some(LogShape::General)
    }
}

/// Find every benchmark log directly inside `dir`, sorted by file name.
pub fn discover_logs(dir: &Path) -> Result<Vec<LogFile>, AnalyzeError> {
    let mut logs = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(AnalyzeError::io(dir))? {
        let entry = entry.map_err(AnalyzeError::io(dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(shape) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(classify)
        else {
            continue;
        };
        logs.push(LogFile { path, shape });
    }
    logs.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    tracing::debug!(dir = %dir.display(), logs = logs.len(), "discovered logs");
    Ok(logs)
}

fn read(path: &Path) -> Result<String, AnalyzeError> {
    std::fs::read_to_string(path).map_err(AnalyzeError::io(path))
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Parse every log into one table. The first malformed line aborts.
pub fn load_table(logs: &[LogFile], catalog: &Catalog) -> Result<AggregationTable, AnalyzeError> {
    let mut table = AggregationTable::new();
    for log in logs {
        let text = read(&log.path)?;
        let records = parse_measurements(&display_name(&log.path), &text, log.shape, catalog)?;
        table.extend(records);
    }
    tracing::info!(
        logs = logs.len(),
        records = table.record_count(),
        "aggregated measurements"
    );
    Ok(table)
}

pub fn load_ratios(path: &Path) -> Result<RatioFrequency, AnalyzeError> {
    let text = read(path)?;
    let freq = RatioFrequency::from_records(parse_ratios(&display_name(path), &text)?);
    tracing::info!(
        accepted = freq.accepted(),
        discarded = freq.discarded(),
        "analyzed ratios"
    );
    Ok(freq)
}

pub fn load_traces(up: &Path, down: &Path) -> Result<Vec<TraceComparison>, AnalyzeError> {
    let up_series = parse_trace(&display_name(up), &read(up)?)?;
    let down_series = parse_trace(&display_name(down), &read(down)?)?;
    Ok(compare(up_series, down_series))
}

/// Run the whole analysis. Nothing is written here; output is left to sinks.
pub fn analyze(inputs: &Inputs) -> Result<Analysis, AnalyzeError> {
    let logs = discover_logs(&inputs.dir)?;
    if logs.is_empty() && inputs.ratios.is_none() && inputs.traces.is_none() {
        return Err(AnalyzeError::Usage(format!(
            "no {LOG_PREFIX}* logs found in {}",
            inputs.dir.display()
        )));
    }

    let table = load_table(&logs, &inputs.catalog)?;
    let mut analysis = Analysis::from_table(&table, &inputs.catalog)?;

    if let Some(path) = &inputs.ratios {
        analysis.ratios = Some(load_ratios(path)?);
    }
    if let Some((up, down)) = &inputs.traces {
        analysis.traces = load_traces(up, down)?;
    }

    Ok(analysis)
}
