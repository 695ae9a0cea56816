//! Per-operation instruction traces, measured once with ranks growing from 0
//! to max-rank ("up") and once shrinking back ("down").
//!
//! Each line is `<a>,<b>,<count>,<count>,...,` and describes one heap
//! operation, in the order of [`OPERATIONS`]. The first two fields are run
//! metadata and the field after the trailing comma is empty.

use crate::error::{LineError, LogError, LogErrorKind};
use crate::stats::{Summary, reduce};

/// Operation measured by each line of a trace, by line position.
pub const OPERATIONS: &[&str] = &["push", "find_min", "delete_min", "empty", "decrease_key"];

pub const UP_LABEL: &str = "0 to max-rank";
pub const DOWN_LABEL: &str = "max-rank to 0";

/// One operation's instruction counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionSeries {
    pub operation: String,
    pub counts: Vec<i64>,
}

/// Up and down traces of the same operation side by side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceComparison {
    pub operation: String,
    pub up: Vec<i64>,
    pub down: Vec<i64>,
    pub up_summary: Option<Summary>,
    pub down_summary: Option<Summary>,
}

fn operation_name(index: usize) -> String {
    OPERATIONS
        .get(index)
        .map(|s| s.to_string())
        .unwrap_or_else(|| format!("op{index}"))
}

fn parse_trace_line(line: &str) -> Result<Vec<i64>, LineError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 3 {
        return Err(LineError::new(
            LogErrorKind::MalformedRecordName,
            line,
            line.trim(),
        ));
    }

    fields[2..fields.len() - 1]
        .iter()
        .map(|field| {
            field
                .trim()
                .parse()
                .map_err(|_| LineError::new(LogErrorKind::InvalidMeasurementValue, line, field))
        })
        .collect()
}

/// Parse a whole trace file; blank lines are skipped and do not consume an operation slot.
pub fn parse_trace(file: &str, text: &str) -> Result<Vec<InstructionSeries>, LogError> {
    let mut series = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let counts = parse_trace_line(line).map_err(|err| LogError::new(file, idx + 1, line, err))?;
        series.push(InstructionSeries {
            operation: operation_name(series.len()),
            counts,
        });
    }
    tracing::debug!(file, operations = series.len(), "parsed instruction trace");
    Ok(series)
}

fn summarize(counts: &[i64]) -> Option<Summary> {
    if counts.is_empty() {
        return None;
    }
    reduce(counts).ok()
}

/// Pair up and down series by position; extra series on either side are dropped.
pub fn compare(up: Vec<InstructionSeries>, down: Vec<InstructionSeries>) -> Vec<TraceComparison> {
    if up.len() != down.len() {
        tracing::warn!(
            up = up.len(),
            down = down.len(),
            "instruction traces have different operation counts"
        );
    }
    up.into_iter()
        .zip(down)
        .map(|(up, down)| TraceComparison {
            up_summary: summarize(&up.counts),
            down_summary: summarize(&down.counts),
            operation: up.operation,
            up: up.counts,
            down: down.counts,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trace() {
        let text = "0,comp,10,12,14,\n0,comp,3,3,\n\n0,comp,\n";
        let series = parse_trace("up_ins_comp_measure", text).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series[0].operation, "push");
        assert_eq!(series[0].counts, vec![10, 12, 14]);
        assert_eq!(series[1].operation, "find_min");
        assert_eq!(series[1].counts, vec![3, 3]);
        assert_eq!(series[2].operation, "delete_min");
        assert!(series[2].counts.is_empty());
    }

    #[test]
    fn test_trailing_field_is_always_dropped() {
        let series = parse_trace("t", "a,b,1,2,3").unwrap();
        assert_eq!(series[0].counts, vec![1, 2]);
    }

    #[test]
    fn test_parse_trace_errors() {
        let err = parse_trace("t", "a,b,1,x,\n").unwrap_err();
        assert_eq!(err.kind, LogErrorKind::InvalidMeasurementValue);
        assert_eq!(err.token, "x");

        let err = parse_trace("t", "1,2,3,\njunk\n").unwrap_err();
        assert_eq!(err.kind, LogErrorKind::MalformedRecordName);
        assert_eq!(err.line_no, 2);
    }

    #[test]
    fn test_operation_names_past_known_list() {
        let text = "a,b,1,\n".repeat(6);
        let series = parse_trace("t", &text).unwrap();
        assert_eq!(series[4].operation, "decrease_key");
        assert_eq!(series[5].operation, "op5");
    }

    #[test]
    fn test_compare_pairs_by_position() {
        let up = parse_trace("up", "a,b,1,2,3,\na,b,5,\n").unwrap();
        let down = parse_trace("down", "a,b,3,2,1,\n").unwrap();
        let cmp = compare(up, down);

        assert_eq!(cmp.len(), 1);
        assert_eq!(cmp[0].operation, "push");
        assert_eq!(cmp[0].up, vec![1, 2, 3]);
        assert_eq!(cmp[0].down, vec![3, 2, 1]);
        assert_eq!(cmp[0].up_summary.map(|s| s.central), Some(2));
        assert_eq!(cmp[0].down_summary, cmp[0].up_summary);
    }

    #[test]
    fn test_empty_series_has_no_summary() {
        let up = parse_trace("up", "a,b,\n").unwrap();
        let down = parse_trace("down", "a,b,7,\n").unwrap();
        let cmp = compare(up, down);
        assert_eq!(cmp[0].up_summary, None);
        assert_eq!(cmp[0].down_summary.map(|s| s.central), Some(7));
    }
}
