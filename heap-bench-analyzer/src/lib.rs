//! Heap benchmark analyzer: parse benchmark logs, reduce each group of trials
//! to a median and a standard deviation, compare heap variants against a
//! reference, and render the results as Markdown, SVG and JSON.

pub mod aggregate;
pub mod error;
pub mod instructions;
pub mod markdown;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod ratio;
pub mod report;
pub mod sink;
pub mod stats;
pub mod summary;
pub mod svg;

pub use aggregate::AggregationTable;
pub use error::{AnalyzeError, LogError, LogErrorKind};
pub use markdown::MarkdownSink;
pub use pipeline::{Inputs, analyze};
pub use report::Analysis;
pub use sink::{ReportSink, emit};
pub use summary::JsonSink;
pub use svg::SvgSink;
