//! Error types for log parsing, reduction and report emission.

use heap_bench_defs::CatalogError;
use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use std::path::PathBuf;
use thiserror::Error;

use crate::stats::EmptyGroup;

/// What went wrong with a single log token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogErrorKind {
    /// The value of a `name=value` token (or a ratio component) is not an integer
    InvalidMeasurementValue,
    /// A record name does not split into the segments the log shape expects
    MalformedRecordName,
    /// The trailing token of a ratio line is not `(int/int)`
    MalformedRatioToken,
}

impl LogErrorKind {
    fn code(self) -> &'static str {
        match self {
            LogErrorKind::InvalidMeasurementValue => "heap_bench::log::invalid_value",
            LogErrorKind::MalformedRecordName => "heap_bench::log::malformed_name",
            LogErrorKind::MalformedRatioToken => "heap_bench::log::malformed_ratio",
        }
    }

    fn help(self) -> &'static str {
        match self {
            LogErrorKind::InvalidMeasurementValue => "measurements must be integers",
            LogErrorKind::MalformedRecordName => {
                "general logs use `n=<int> <variant>_<benchmark>=<int> ...`, \
                 road logs use `<variant>_<benchmark>_<location>=<int> ...`"
            }
            LogErrorKind::MalformedRatioToken => {
                "the last token of a ratio line must look like `(3/4)` or `(3/4).`"
            }
        }
    }
}

impl std::fmt::Display for LogErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogErrorKind::InvalidMeasurementValue => write!(f, "invalid measurement value"),
            LogErrorKind::MalformedRecordName => write!(f, "malformed record name"),
            LogErrorKind::MalformedRatioToken => write!(f, "malformed ratio token"),
        }
    }
}

/// A token-level failure inside one line, before the file and line number are known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineError {
    pub kind: LogErrorKind,
    /// Byte offset of the token within the line
    pub offset: usize,
    pub token: String,
}

impl LineError {
    pub(crate) fn new(kind: LogErrorKind, line: &str, token: &str) -> Self {
        Self {
            kind,
            offset: offset_in(line, token),
            token: token.to_string(),
        }
    }
}

/// Byte offset of `part` within `whole`; `part` must be a subslice of `whole`.
pub(crate) fn offset_in(whole: &str, part: &str) -> usize {
    (part.as_ptr() as usize)
        .saturating_sub(whole.as_ptr() as usize)
        .min(whole.len())
}

/// A fatal log error, located by file, line and token.
#[derive(Debug)]
pub struct LogError {
    pub kind: LogErrorKind,
    pub file: String,
    /// 1-based line number
    pub line_no: usize,
    pub token: String,
    src: NamedSource<String>,
    span: SourceSpan,
}

impl LogError {
    pub fn new(file: &str, line_no: usize, line: &str, err: LineError) -> Self {
        Self {
            kind: err.kind,
            file: file.to_string(),
            line_no,
            span: (err.offset, err.token.len()).into(),
            token: err.token,
            src: NamedSource::new(format!("{file}:{line_no}"), line.to_string()),
        }
    }
}

impl std::fmt::Display for LogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}: `{}`",
            self.kind, self.file, self.line_no, self.token
        )
    }
}

impl std::error::Error for LogError {}

impl Diagnostic for LogError {
    fn code<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(self.kind.code()))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn std::fmt::Display + 'a>> {
        Some(Box::new(self.kind.help()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&self.src)
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        Some(Box::new(std::iter::once(LabeledSpan::new(
            Some(self.kind.to_string()),
            self.span.offset(),
            self.span.len(),
        ))))
    }
}

/// Top-level error for a `heap-bench` run. Every variant aborts the run.
#[derive(Error, Debug, Diagnostic)]
pub enum AnalyzeError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    EmptyGroup(#[from] EmptyGroup),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Catalog(#[from] CatalogError),

    #[error("I/O error on {}", path.display())]
    #[diagnostic(code(heap_bench::io))]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not render {what}: {message}")]
    #[diagnostic(code(heap_bench::report))]
    Report { what: String, message: String },

    #[error("{0}")]
    #[diagnostic(code(heap_bench::usage))]
    Usage(String),
}

impl AnalyzeError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| AnalyzeError::Io { path, source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_error_points_at_token() {
        let line = "n=16 hhb_sort=12x phb_sort=3";
        let token = &line[5..17];
        let err = LogError::new(
            "benchmark_output_1",
            7,
            line,
            LineError::new(LogErrorKind::InvalidMeasurementValue, line, token),
        );
        assert_eq!(err.span.offset(), 5);
        assert_eq!(err.span.len(), "hhb_sort=12x".len());
        assert_eq!(
            err.to_string(),
            "invalid measurement value at benchmark_output_1:7: `hhb_sort=12x`"
        );
        assert_eq!(
            err.code().map(|c| c.to_string()).as_deref(),
            Some("heap_bench::log::invalid_value")
        );
    }

    #[test]
    fn test_offset_in_foreign_slice_is_clamped() {
        let other = String::from("unrelated");
        assert!(offset_in("abc", &other) <= 3);
    }
}
