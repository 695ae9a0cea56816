//! Output backends for a finished [`Analysis`].

use std::path::{Component, Path, PathBuf};

use crate::error::AnalyzeError;
use crate::instructions::TraceComparison;
use crate::ratio::RatioFrequency;
use crate::report::{Analysis, GeneralReport, RoadReport};

/// Number of histogram bins used for ratio frequencies.
pub const HISTOGRAM_BINS: usize = 25;

/// A consumer of the report model that writes one kind of artifact.
///
/// Sinks are fed every part of an [`Analysis`] through [`emit`] and write
/// their files in `finish`, returning the paths written.
pub trait ReportSink {
    /// Short name used in log events.
    fn name(&self) -> &'static str;

    fn general(&mut self, _report: &GeneralReport) -> Result<(), AnalyzeError> {
        Ok(())
    }

    fn roads(&mut self, _reports: &[RoadReport]) -> Result<(), AnalyzeError> {
        Ok(())
    }

    fn ratios(&mut self, _freq: &RatioFrequency) -> Result<(), AnalyzeError> {
        Ok(())
    }

    fn instructions(&mut self, _traces: &[TraceComparison]) -> Result<(), AnalyzeError> {
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<PathBuf>, AnalyzeError>;
}

/// Feed `analysis` to `sink` and let it write its output.
pub fn emit(analysis: &Analysis, sink: &mut dyn ReportSink) -> Result<Vec<PathBuf>, AnalyzeError> {
    for report in &analysis.general {
        sink.general(report)?;
    }
    if !analysis.roads.is_empty() {
        sink.roads(&analysis.roads)?;
    }
    if let Some(freq) = &analysis.ratios {
        sink.ratios(freq)?;
    }
    if !analysis.traces.is_empty() {
        sink.instructions(&analysis.traces)?;
    }

    let written = sink.finish()?;
    tracing::info!(sink = sink.name(), files = written.len(), "sink finished");
    Ok(written)
}

/// Whether `name` is a single file name that stays inside its directory.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !name.contains(['/', '\\'])
}

/// Write `contents` to `dir/name`, creating `dir` if needed.
///
/// `name` must be a plain file name; anything that would escape `dir` is refused.
pub(crate) fn write_output(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, AnalyzeError> {
    if !is_plain_file_name(name) {
        return Err(AnalyzeError::Report {
            what: name.to_string(),
            message: "output name is not a plain file name".to_string(),
        });
    }
    std::fs::create_dir_all(dir).map_err(AnalyzeError::io(dir))?;
    let path = dir.join(name);
    std::fs::write(&path, contents).map_err(AnalyzeError::io(&path))?;
    tracing::debug!(path = %path.display(), bytes = contents.len(), "wrote output");
    Ok(path)
}

/// Ratio with two decimals, `-` when undefined.
pub(crate) fn format_ratio(ratio: Option<f64>) -> String {
    ratio
        .map(|r| format!("{r:.2}"))
        .unwrap_or_else(|| "-".to_string())
}
