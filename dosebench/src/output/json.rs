use anyhow::Context as _;
use serde::Serialize;
use std::io::Write as _;
use std::sync::Arc;

use dosebench_core::{ComparisonTable, Invocation, ProgressUpdate, Summary};

use super::OutputFormatter;

pub(crate) struct JsonOutput;

impl OutputFormatter for JsonOutput {
    fn print_header(&self, target: &str, runs: usize) {
        emit_json_line(&JsonHeaderLine {
            kind: "header",
            target,
            runs,
        });
    }

    fn progress(&self) -> Option<dosebench_core::ProgressFn> {
        Some(Arc::new(move |u: &ProgressUpdate<'_>| {
            emit_json_line(&build_sample_line(u));
        }))
    }

    fn print_single(&self, target: &str, invocation: &Invocation) {
        emit_json_line(&build_single_line(target, invocation));
    }

    fn print_summary(&self, target: &str, summary: &Summary) -> anyhow::Result<()> {
        let line = JsonSummaryLine {
            kind: "summary",
            target,
            stats: JsonStats::from(summary),
        };
        write_json_line(&mut std::io::stdout().lock(), &line).context("write summary to stdout")
    }

    fn print_no_summary(&self, err: &dosebench_core::Error) {
        emit_json_line(&JsonNoSummaryLine {
            kind: "no_summary",
            target: err.target(),
            reason: err.to_string(),
        });
    }

    fn print_comparison_target(&self, target: &str, index: usize, total: usize) {
        emit_json_line(&JsonComparisonTargetLine {
            kind: "comparison_target",
            target,
            index,
            total,
        });
    }

    fn print_comparison(&self, table: &ComparisonTable, runs: usize) -> anyhow::Result<()> {
        write_json_line(&mut std::io::stdout().lock(), &build_comparison_line(table, runs))
            .context("write comparison to stdout")
    }
}

#[derive(Debug, Serialize)]
struct JsonHeaderLine<'a> {
    kind: &'static str,
    target: &'a str,
    runs: usize,
}

#[derive(Debug, Serialize)]
struct JsonSampleLine<'a> {
    kind: &'static str,
    target: &'a str,
    index: usize,
    total: usize,
    elapsed_secs: f64,
    outcome: String,
    detail: String,
}

#[derive(Debug, Serialize)]
struct JsonSingleLine<'a> {
    kind: &'static str,
    target: &'a str,
    elapsed_secs: f64,
    outcome: String,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct JsonStats {
    sample_count: usize,
    success_count: usize,
    mean_secs: f64,
    min_secs: f64,
    max_secs: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    std_dev_secs: Option<f64>,
    throughput_per_sec: f64,
}

impl From<&Summary> for JsonStats {
    fn from(s: &Summary) -> Self {
        Self {
            sample_count: s.sample_count,
            success_count: s.success_count,
            mean_secs: s.mean_secs,
            min_secs: s.min_secs,
            max_secs: s.max_secs,
            std_dev_secs: s.std_dev_secs,
            throughput_per_sec: s.throughput_per_sec,
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonSummaryLine<'a> {
    kind: &'static str,
    target: &'a str,
    #[serde(flatten)]
    stats: JsonStats,
}

#[derive(Debug, Serialize)]
struct JsonNoSummaryLine<'a> {
    kind: &'static str,
    target: &'a str,
    reason: String,
}

#[derive(Debug, Serialize)]
struct JsonComparisonTargetLine<'a> {
    kind: &'static str,
    target: &'a str,
    index: usize,
    total: usize,
}

#[derive(Debug, Serialize)]
struct JsonComparisonRow<'a> {
    target: &'a str,
    #[serde(flatten)]
    stats: JsonStats,
}

#[derive(Debug, Serialize)]
struct JsonSkipped<'a> {
    target: &'a str,
    reason: String,
}

#[derive(Debug, Serialize)]
struct JsonComparisonLine<'a> {
    kind: &'static str,
    runs: usize,
    rows: Vec<JsonComparisonRow<'a>>,
    skipped: Vec<JsonSkipped<'a>>,
}

fn build_sample_line<'a>(u: &ProgressUpdate<'a>) -> JsonSampleLine<'a> {
    JsonSampleLine {
        kind: "sample",
        target: u.target,
        index: u.index,
        total: u.total,
        elapsed_secs: u.sample.elapsed_secs(),
        outcome: u.sample.outcome.kind().to_string(),
        detail: u.sample.outcome.to_string(),
    }
}

fn build_single_line<'a>(target: &'a str, invocation: &Invocation) -> JsonSingleLine<'a> {
    JsonSingleLine {
        kind: "single",
        target,
        elapsed_secs: invocation.elapsed.as_secs_f64(),
        outcome: invocation.outcome.kind().to_string(),
        detail: invocation.outcome.to_string(),
        output: invocation.output_bytes().and_then(output_value),
    }
}

/// JSON output is embedded as-is; anything else becomes a string.
fn output_value(bytes: &[u8]) -> Option<serde_json::Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(serde_json::Value::String(
            String::from_utf8_lossy(bytes).trim_end().to_string(),
        )),
    }
}

fn build_comparison_line(table: &ComparisonTable, runs: usize) -> JsonComparisonLine<'_> {
    JsonComparisonLine {
        kind: "comparison",
        runs,
        rows: table
            .rows()
            .iter()
            .map(|r| JsonComparisonRow {
                target: &r.label,
                stats: JsonStats::from(&r.summary),
            })
            .collect(),
        skipped: table
            .skipped()
            .iter()
            .map(|(label, err)| JsonSkipped {
                target: label,
                reason: err.to_string(),
            })
            .collect(),
    }
}

fn write_json_line<W: std::io::Write, T: Serialize>(w: &mut W, line: &T) -> std::io::Result<()> {
    serde_json::to_writer(&mut *w, line)?;
    writeln!(w)?;
    w.flush()
}

/// Best effort: progress lines are dropped if stdout is gone.
fn emit_json_line<T: Serialize>(line: &T) {
    let _ = write_json_line(&mut std::io::stdout().lock(), line);
}
