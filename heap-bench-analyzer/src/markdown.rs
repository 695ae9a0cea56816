//! `RESULTS.md`: comparison tables, road summaries, ratio and instruction summaries.

use std::fmt::Write as _;
use std::path::PathBuf;

use crate::error::AnalyzeError;
use crate::instructions::{DOWN_LABEL, TraceComparison, UP_LABEL};
use crate::ratio::RatioFrequency;
use crate::report::{GeneralReport, RoadReport};
use crate::sink::{ReportSink, format_ratio, write_output};
use crate::stats::Summary;

pub const RESULTS_FILE: &str = "RESULTS.md";

/// Collects Markdown for every report and writes it to `RESULTS.md` on finish.
pub struct MarkdownSink {
    out_dir: PathBuf,
    md: String,
}

impl MarkdownSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            md: String::from("# Heap Benchmark Results\n\n"),
        }
    }

    /// The document built so far.
    pub fn markdown(&self) -> &str {
        &self.md
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn bold_if(text: String, emphasize: bool) -> String {
    if emphasize { format!("**{text}**") } else { text }
}

fn separator(columns: usize) -> String {
    format!("|{}\n", "---|".repeat(columns))
}

fn format_summary(summary: Option<Summary>) -> String {
    summary
        .map(|s| format!("{} ± {}", s.central, s.dispersion))
        .unwrap_or_else(|| "-".to_string())
}

impl ReportSink for MarkdownSink {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn general(&mut self, report: &GeneralReport) -> Result<(), AnalyzeError> {
        let Some(rows) = &report.table else {
            tracing::trace!(benchmark = %report.benchmark, "chart-only benchmark, no table");
            return Ok(());
        };

        let md = &mut self.md;
        let _ = writeln!(md, "## {}\n", report.benchmark);

        md.push_str("| ");
        md.push_str(&escape_cell(report.x_label));
        for column in &report.columns {
            let _ = write!(md, " | {}", escape_cell(&column.short));
        }
        md.push_str(" |\n");
        md.push_str(&separator(report.columns.len() + 1));

        for row in rows {
            let _ = write!(md, "| {}", row.label);
            for cell in &row.cells {
                let text = match cell {
                    Some(point) => bold_if(
                        format_ratio(point.ratio),
                        point.is_minimum && point.ratio.is_some(),
                    ),
                    None => "-".to_string(),
                };
                let _ = write!(md, " | {text}");
            }
            md.push_str(" |\n");
        }
        md.push('\n');
        Ok(())
    }

    fn roads(&mut self, reports: &[RoadReport]) -> Result<(), AnalyzeError> {
        let md = &mut self.md;
        md.push_str("## Road networks\n\n");

        for report in reports {
            let _ = writeln!(md, "### {} ({})\n", report.benchmark, report.location);
            md.push_str("| Variant | Median | Std dev | Ratio |\n");
            md.push_str(&separator(4));
            for bar in &report.bars {
                let _ = writeln!(
                    md,
                    "| {} | {} | {} | {} |",
                    escape_cell(&bar.variant.label),
                    bold_if(bar.summary.central.to_string(), bar.is_minimum),
                    bar.summary.dispersion,
                    format_ratio(bar.ratio),
                );
            }
            md.push('\n');
        }
        Ok(())
    }

    fn ratios(&mut self, freq: &RatioFrequency) -> Result<(), AnalyzeError> {
        let md = &mut self.md;
        md.push_str("## Ratio frequencies\n\n");
        md.push_str("| Ratio | Count |\n");
        md.push_str(&separator(2));
        for (ratio, count) in freq.frequencies() {
            let _ = writeln!(md, "| {ratio:.4} | {count} |");
        }
        md.push('\n');

        let _ = writeln!(md, "- accepted: {}", freq.accepted());
        let _ = writeln!(md, "- discarded (zero denominator): {}", freq.discarded());
        let _ = write!(
            md,
            "- totals: {} / {}",
            freq.total_numerator(),
            freq.total_denominator()
        );
        if let Some(grand) = freq.grand_ratio() {
            let _ = write!(md, " = {grand:.4}");
        }
        md.push_str("\n\n");
        Ok(())
    }

    fn instructions(&mut self, traces: &[TraceComparison]) -> Result<(), AnalyzeError> {
        let md = &mut self.md;
        md.push_str("## Instruction counts\n\n");
        let _ = writeln!(md, "| Operation | {UP_LABEL} | {DOWN_LABEL} |");
        md.push_str(&separator(3));
        for trace in traces {
            let _ = writeln!(
                md,
                "| {} | {} | {} |",
                trace.operation,
                format_summary(trace.up_summary),
                format_summary(trace.down_summary),
            );
        }
        md.push('\n');
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<PathBuf>, AnalyzeError> {
        Ok(vec![write_output(&self.out_dir, RESULTS_FILE, &self.md)?])
    }
}
