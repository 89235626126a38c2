use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context as _;

use dosebench_core::{ComparisonTable, Invocation, ProgressUpdate, Summary};

mod format;
mod progress;

use format::{format_outcome, format_rate, format_secs};
use progress::HumanProgress;

use super::OutputFormatter;

pub(crate) struct HumanReadableOutput {
    progress: Arc<HumanProgress>,
}

impl HumanReadableOutput {
    pub(crate) fn new() -> Self {
        Self {
            progress: Arc::new(HumanProgress::new()),
        }
    }
}

impl Drop for HumanReadableOutput {
    fn drop(&mut self) {
        self.progress.finish();
    }
}

impl OutputFormatter for HumanReadableOutput {
    fn print_header(&self, target: &str, runs: usize) {
        println!("target: {target}");
        if runs == 1 {
            println!("runs: 1 (showing output)");
        } else {
            println!("runs: {runs}");
        }
        println!();
    }

    fn progress(&self) -> Option<dosebench_core::ProgressFn> {
        let progress = self.progress.clone();
        Some(Arc::new(move |u: &ProgressUpdate<'_>| {
            let line = format!(
                "run {}/{}: {} {}",
                u.index,
                u.total,
                format_secs(u.sample.elapsed_secs()),
                format_outcome(&u.sample.outcome)
            );
            progress.record(u.target, u.index, u.total, &line);
        }))
    }

    fn print_single(&self, _target: &str, invocation: &Invocation) {
        if let Some(output) = invocation.display_output() {
            if invocation.outcome.is_success() {
                println!("output:\n{output}\n");
            } else {
                println!("error output:\n{output}\n");
            }
        }
        println!(
            "elapsed: {} {}",
            format_secs(invocation.elapsed.as_secs_f64()),
            format_outcome(&invocation.outcome)
        );
    }

    fn print_summary(&self, target: &str, summary: &Summary) -> anyhow::Result<()> {
        self.progress.finish();
        write_block(&mut std::io::stdout().lock(), &render_summary(target, summary))
            .context("write summary to stdout")
    }

    fn print_no_summary(&self, err: &dosebench_core::Error) {
        self.progress.finish();
        eprintln!("no runs to analyze for {}: {err}", err.target());
    }

    fn print_comparison_target(&self, target: &str, index: usize, total: usize) {
        println!("[{index}/{total}] {target}");
    }

    fn print_comparison(&self, table: &ComparisonTable, runs: usize) -> anyhow::Result<()> {
        self.progress.finish();
        write_block(&mut std::io::stdout().lock(), &render_comparison(table, runs))
            .context("write comparison to stdout")
    }
}

fn write_block(w: &mut impl std::io::Write, text: &str) -> std::io::Result<()> {
    w.write_all(text.as_bytes())?;
    w.flush()
}

fn render_summary(target: &str, summary: &Summary) -> String {
    let mut out = String::new();
    writeln!(out, "\nsummary: {target}").ok();
    writeln!(out, "  runs: {}", summary.successful_label()).ok();
    writeln!(out, "  mean: {}", format_secs(summary.mean_secs)).ok();
    writeln!(out, "  min: {}", format_secs(summary.min_secs)).ok();
    writeln!(out, "  max: {}", format_secs(summary.max_secs)).ok();
    if let Some(sd) = summary.std_dev_secs {
        writeln!(out, "  std_dev: {}", format_secs(sd)).ok();
    }
    writeln!(
        out,
        "  rps: {} req/s",
        format_rate(summary.throughput_per_sec)
    )
    .ok();
    out.push('\n');
    out
}

fn render_comparison(table: &ComparisonTable, runs: usize) -> String {
    let mut out = String::new();

    if table.is_empty() {
        out.push_str("comparison: no target produced results\n");
    } else {
        writeln!(out, "comparison ({runs} runs each, fastest first)").ok();
        let width = table
            .rows()
            .iter()
            .map(|r| r.label.len())
            .max()
            .unwrap_or_default();
        for row in table.rows() {
            writeln!(
                out,
                "  {:<width$}  mean={}  {}",
                row.label,
                format_secs(row.summary.mean_secs),
                row.summary.successful_label()
            )
            .ok();
        }
    }

    if !table.skipped().is_empty() {
        out.push_str("skipped\n");
        for (label, err) in table.skipped() {
            writeln!(out, "  {label}: {err}").ok();
        }
    }

    out
}
