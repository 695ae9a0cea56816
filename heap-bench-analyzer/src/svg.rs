//! Standalone SVG charts, one file per chart.

use std::path::PathBuf;

use heap_bench_defs::Marker;
use maud::{Markup, html};

use crate::error::AnalyzeError;
use crate::instructions::{DOWN_LABEL, TraceComparison, UP_LABEL};
use crate::ratio::RatioFrequency;
use crate::report::{GeneralReport, RoadBar, RoadReport};
use crate::sink::{HISTOGRAM_BINS, ReportSink, write_output};

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 400.0;
const LEFT: f64 = 70.0;
const RIGHT: f64 = 20.0;
const TOP: f64 = 30.0;
const BOTTOM: f64 = 50.0;

const PALETTE: &[&str] = &[
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
];

const BAR_COLOR: &str = "red";
const MIN_BAR_COLOR: &str = "blue";
const TIME_LABEL: &str = "Time (in μs)";

fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

fn px(v: f64) -> String {
    format!("{v:.1}")
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 || v.abs() >= 100.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

/// Linear mapping from data coordinates onto a pixel range.
#[derive(Debug, Clone, Copy)]
struct Axis {
    min: f64,
    max: f64,
    from: f64,
    to: f64,
}

impl Axis {
    fn new(min: f64, max: f64, from: f64, to: f64) -> Self {
        let (min, max) = if min.is_finite() && max.is_finite() && max > min {
            (min, max)
        } else if min.is_finite() {
            (min, min + 1.0)
        } else {
            (0.0, 1.0)
        };
        Self { min, max, from, to }
    }

    fn horizontal(min: f64, max: f64) -> Self {
        Self::new(min, max, LEFT, WIDTH - RIGHT)
    }

    /// Vertical axis from zero up to a little above `max`.
    fn vertical(max: f64) -> Self {
        let top = if max > 0.0 { max * 1.05 } else { 1.0 };
        Self::new(0.0, top, HEIGHT - BOTTOM, TOP)
    }

    fn map(&self, v: f64) -> f64 {
        self.from + (v - self.min) / (self.max - self.min) * (self.to - self.from)
    }

    fn ticks(&self, count: usize) -> Vec<(f64, String)> {
        (0..=count)
            .map(|i| {
                let v = self.min + (self.max - self.min) * i as f64 / count as f64;
                (self.map(v), format_value(v))
            })
            .collect()
    }
}

struct LegendItem<'a> {
    label: &'a str,
    color: &'a str,
    marker: Option<Marker>,
}

fn points_attr(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{},{}", px(*x), px(*y)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn polygon(points: &[(f64, f64)], color: &str) -> Markup {
    html! {
        polygon points=(points_attr(points)) fill=(color) {}
    }
}

fn marker(kind: Marker, x: f64, y: f64, color: &str) -> Markup {
    let r = 3.0;
    match kind {
        Marker::Square => html! {
            rect x=(px(x - r)) y=(px(y - r)) width=(px(2.0 * r)) height=(px(2.0 * r)) fill=(color) {}
        },
        Marker::Circle => html! {
            circle cx=(px(x)) cy=(px(y)) r=(px(r)) fill=(color) {}
        },
        Marker::TriangleUp => polygon(&[(x, y - r), (x + r, y + r), (x - r, y + r)], color),
        Marker::TriangleDown => polygon(&[(x - r, y - r), (x + r, y - r), (x, y + r)], color),
        Marker::Diamond => polygon(&[(x, y - r), (x + r, y), (x, y + r), (x - r, y)], color),
    }
}

fn legend(items: &[LegendItem<'_>]) -> Markup {
    let x = LEFT + 12.0;
    html! {
        g.legend {
            @for (i, item) in items.iter().enumerate() {
                @let y = TOP + 12.0 + 16.0 * i as f64;
                line x1=(px(x)) y1=(px(y)) x2=(px(x + 20.0)) y2=(px(y)) stroke=(item.color) {}
                @if let Some(kind) = item.marker {
                    (marker(kind, x + 10.0, y, item.color))
                }
                text x=(px(x + 26.0)) y=(px(y + 4.0)) { (item.label) }
            }
        }
    }
}

struct Frame<'a> {
    title: &'a str,
    x_label: &'a str,
    y_label: &'a str,
    x_ticks: Vec<(f64, String)>,
    y_ticks: Vec<(f64, String)>,
}

impl Frame<'_> {
    fn render(&self, body: Markup) -> Markup {
        let (x0, x1) = (LEFT, WIDTH - RIGHT);
        let (y0, y1) = (HEIGHT - BOTTOM, TOP);
        html! {
            svg xmlns="http://www.w3.org/2000/svg" width=(px(WIDTH)) height=(px(HEIGHT))
                viewBox=(format!("0 0 {WIDTH} {HEIGHT}")) font-family="sans-serif" font-size="11" {
                rect width="100%" height="100%" fill="white" {}
                text x=(px(WIDTH / 2.0)) y="18" text-anchor="middle" font-size="13" { (self.title) }

                line x1=(px(x0)) y1=(px(y0)) x2=(px(x1)) y2=(px(y0)) stroke="black" {}
                line x1=(px(x0)) y1=(px(y0)) x2=(px(x0)) y2=(px(y1)) stroke="black" {}

                @for (pos, label) in &self.x_ticks {
                    line x1=(px(*pos)) y1=(px(y0)) x2=(px(*pos)) y2=(px(y0 + 4.0)) stroke="black" {}
                    text x=(px(*pos)) y=(px(y0 + 16.0)) text-anchor="middle" { (label) }
                }
                @for (pos, label) in &self.y_ticks {
                    line x1=(px(x0 - 4.0)) y1=(px(*pos)) x2=(px(x0)) y2=(px(*pos)) stroke="black" {}
                    text x=(px(x0 - 6.0)) y=(px(*pos + 4.0)) text-anchor="end" { (label) }
                }

                text x=(px((x0 + x1) / 2.0)) y=(px(HEIGHT - 10.0)) text-anchor="middle" { (self.x_label) }
                text transform=(format!("translate(16 {}) rotate(-90)", px((y0 + y1) / 2.0)))
                    text-anchor="middle" { (self.y_label) }

                (body)
            }
        }
    }
}

/// Median per size for every variant, on a log2 x axis.
pub fn line_chart(report: &GeneralReport) -> Markup {
    let log_xs = report
        .series
        .iter()
        .flat_map(|s| &s.points)
        .filter(|p| p.x > 0.0)
        .map(|p| p.x.log2());
    let (lo, hi) = log_xs.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    let top = report
        .series
        .iter()
        .flat_map(|s| &s.points)
        .map(|p| p.summary.central as f64)
        .fold(0.0, f64::max);

    let x_axis = Axis::horizontal(lo, hi);
    let y_axis = Axis::vertical(top);

    let first = x_axis.min.floor() as i64;
    let last = x_axis.max.ceil() as i64;
    let step = ((last - first) / 10).max(1) as usize;
    let x_ticks = (first..=last)
        .step_by(step)
        .map(|k| k as f64)
        .filter(|k| *k >= x_axis.min && *k <= x_axis.max)
        .map(|k| (x_axis.map(k), format!("2^{k}")))
        .collect();

    let items: Vec<LegendItem<'_>> = report
        .series
        .iter()
        .enumerate()
        .map(|(i, s)| LegendItem {
            label: &s.variant.label,
            color: color(i),
            marker: Some(s.variant.marker),
        })
        .collect();

    let body = html! {
        @for (i, series) in report.series.iter().enumerate() {
            @let points: Vec<(f64, f64)> = series
                .points
                .iter()
                .filter(|p| p.x > 0.0)
                .map(|p| (x_axis.map(p.x.log2()), y_axis.map(p.summary.central as f64)))
                .collect();
            polyline points=(points_attr(&points)) fill="none" stroke=(color(i)) stroke-width="0.75" {}
            @for (x, y) in &points {
                (marker(series.variant.marker, *x, *y, color(i)))
            }
        }
        (legend(&items))
    };

    Frame {
        title: &report.benchmark,
        x_label: report.x_label,
        y_label: TIME_LABEL,
        x_ticks,
        y_ticks: y_axis.ticks(5),
    }
    .render(body)
}

/// `(low, high)` ends of a bar's error bar, in `f64` so extreme values cannot overflow.
fn error_bar(bar: &RoadBar) -> (f64, f64) {
    let central = bar.summary.central as f64;
    let dispersion = bar.summary.dispersion as f64;
    (central - dispersion, central + dispersion)
}

/// One bar per variant with a dispersion error bar; minimum bars in blue.
pub fn bar_chart(report: &RoadReport) -> Markup {
    let slot = (WIDTH - RIGHT - LEFT) / report.bars.len().max(1) as f64;
    let top = report
        .bars
        .iter()
        .map(|b| error_bar(b).1)
        .fold(0.0, f64::max);
    let y_axis = Axis::vertical(top);
    let base = y_axis.map(0.0);

    let x_ticks = report
        .bars
        .iter()
        .enumerate()
        .map(|(i, b)| (LEFT + slot * (i as f64 + 0.5), b.variant.label.clone()))
        .collect();

    let body = html! {
        @for (i, bar) in report.bars.iter().enumerate() {
            @let center = LEFT + slot * (i as f64 + 0.5);
            @let value = y_axis.map(bar.summary.central as f64);
            @let (low, high) = error_bar(bar);
            @let low = y_axis.map(low);
            @let high = y_axis.map(high);
            rect.bar x=(px(center - slot * 0.3)) y=(px(value.min(base))) width=(px(slot * 0.6))
                height=(px((base - value).abs()))
                fill=(if bar.is_minimum { MIN_BAR_COLOR } else { BAR_COLOR }) {}
            line x1=(px(center)) y1=(px(low)) x2=(px(center)) y2=(px(high)) stroke="black" {}
            line x1=(px(center - 4.0)) y1=(px(high)) x2=(px(center + 4.0)) y2=(px(high)) stroke="black" {}
            line x1=(px(center - 4.0)) y1=(px(low)) x2=(px(center + 4.0)) y2=(px(low)) stroke="black" {}
        }
    };

    Frame {
        title: &format!("{} ({})", report.benchmark, report.location),
        x_label: "Heap Variant",
        y_label: TIME_LABEL,
        x_ticks,
        y_ticks: y_axis.ticks(5),
    }
    .render(body)
}

/// Histogram of accepted ratios.
pub fn histogram_chart(freq: &RatioFrequency) -> Markup {
    let bins = freq.histogram(HISTOGRAM_BINS);
    let (lo, hi) = match (bins.first(), bins.last()) {
        (Some(first), Some(last)) => (first.start, last.end),
        _ => (0.0, 1.0),
    };
    let x_axis = Axis::horizontal(lo, hi);
    let y_axis = Axis::vertical(bins.iter().map(|b| b.count).max().unwrap_or(0) as f64);
    let base = y_axis.map(0.0);

    let body = html! {
        @for bin in &bins {
            @let x = x_axis.map(bin.start);
            @let y = y_axis.map(bin.count as f64);
            rect.bar x=(px(x)) y=(px(y)) width=(px(x_axis.map(bin.end) - x)) height=(px(base - y))
                fill=(color(0)) stroke="white" stroke-width="0.5" {}
        }
    };

    Frame {
        title: "Ratio frequencies",
        x_label: "Ratio",
        y_label: "Count",
        x_ticks: x_axis.ticks(5),
        y_ticks: y_axis.ticks(5),
    }
    .render(body)
}

/// Instruction counts per call, rank going up versus coming down.
pub fn trace_chart(trace: &TraceComparison) -> Markup {
    let len = trace.up.len().max(trace.down.len());
    let top = trace
        .up
        .iter()
        .chain(&trace.down)
        .copied()
        .max()
        .unwrap_or(0) as f64;
    let x_axis = Axis::horizontal(0.0, len.saturating_sub(1) as f64);
    let y_axis = Axis::vertical(top);

    let to_points = |counts: &[i64]| -> Vec<(f64, f64)> {
        counts
            .iter()
            .enumerate()
            .map(|(i, c)| (x_axis.map(i as f64), y_axis.map(*c as f64)))
            .collect()
    };
    let up = to_points(trace.up.as_slice());
    let down = to_points(trace.down.as_slice());

    let items = [
        LegendItem {
            label: UP_LABEL,
            color: color(0),
            marker: None,
        },
        LegendItem {
            label: DOWN_LABEL,
            color: color(1),
            marker: None,
        },
    ];

    let body = html! {
        polyline points=(points_attr(&up)) fill="none" stroke=(color(0)) {}
        polyline points=(points_attr(&down)) fill="none" stroke=(color(1)) {}
        (legend(&items))
    };

    Frame {
        title: &trace.operation,
        x_label: "Call",
        y_label: "Instructions",
        x_ticks: x_axis.ticks(5),
        y_ticks: y_axis.ticks(5),
    }
    .render(body)
}

/// Renders every report into its own SVG file.
pub struct SvgSink {
    out_dir: PathBuf,
    charts: Vec<(String, String)>,
}

impl SvgSink {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            charts: Vec::new(),
        }
    }

    /// `(file name, svg)` of every chart rendered so far.
    pub fn charts(&self) -> &[(String, String)] {
        &self.charts
    }

    fn push(&mut self, name: String, chart: Markup) {
        tracing::trace!(chart = %name, "rendered chart");
        self.charts.push((name, chart.into_string()));
    }
}

impl ReportSink for SvgSink {
    fn name(&self) -> &'static str {
        "svg"
    }

    fn general(&mut self, report: &GeneralReport) -> Result<(), AnalyzeError> {
        self.push(format!("{}.svg", report.benchmark), line_chart(report));
        Ok(())
    }

    fn roads(&mut self, reports: &[RoadReport]) -> Result<(), AnalyzeError> {
        for report in reports {
            self.push(
                format!("{}_{}.svg", report.benchmark, report.location),
                bar_chart(report),
            );
        }
        Ok(())
    }

    fn ratios(&mut self, freq: &RatioFrequency) -> Result<(), AnalyzeError> {
        self.push("freq.svg".to_string(), histogram_chart(freq));
        Ok(())
    }

    fn instructions(&mut self, traces: &[TraceComparison]) -> Result<(), AnalyzeError> {
        for trace in traces {
            self.push(
                format!("instructions_{}.svg", trace.operation),
                trace_chart(trace),
            );
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<Vec<PathBuf>, AnalyzeError> {
        self.charts
            .iter()
            .map(|(name, svg)| write_output(&self.out_dir, name, svg))
            .collect()
    }
}
