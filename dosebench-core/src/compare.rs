use crate::error::Error;
use crate::invoker::Invoker;
use crate::run_loop::{ProgressFn, RunLoop};
use crate::stats::Summary;

/// Operation paths compared when the caller does not pick any.
pub const DEFAULT_COMPARE_PATHS: [&str; 4] = ["/start", "/iob", "/meal", "/health"];

#[derive(Debug, Clone, PartialEq)]
pub struct ComparisonRow {
    pub label: String,
    pub summary: Summary,
}

/// Summaries ranked by ascending mean latency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonTable {
    rows: Vec<ComparisonRow>,
    skipped: Vec<(String, Error)>,
}

impl ComparisonTable {
    pub fn rows(&self) -> &[ComparisonRow] {
        &self.rows
    }

    /// Candidates that produced no summary, in the order they ran.
    pub fn skipped(&self) -> &[(String, Error)] {
        &self.skipped
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn fastest(&self) -> Option<&ComparisonRow> {
        self.rows.first()
    }

    fn push(&mut self, label: String, result: Result<Summary, Error>) {
        match result {
            Ok(summary) => self.rows.push(ComparisonRow { label, summary }),
            Err(err) => self.skipped.push((label, err)),
        }
    }

    fn sort(&mut self) {
        // Stable: ties keep the order the candidates ran in.
        self.rows
            .sort_by(|a, b| a.summary.mean_secs.total_cmp(&b.summary.mean_secs));
    }
}

#[derive(Debug, Clone, Copy)]
pub enum CompareEvent<'a> {
    Started {
        label: &'a str,
        index: usize,
        total: usize,
    },
    Finished {
        label: &'a str,
        result: &'a Result<Summary, Error>,
    },
}

/// Runs one [`RunLoop`] per candidate, strictly one after another.
pub struct Comparator {
    samples: usize,
    progress: Option<ProgressFn>,
}

impl Comparator {
    pub fn new(samples: usize) -> Self {
        Self {
            samples,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Option<ProgressFn>) -> Self {
        self.progress = progress;
        self
    }

    pub async fn compare<I, F>(&self, candidates: Vec<I>, mut observe: F) -> ComparisonTable
    where
        I: Invoker,
        F: FnMut(CompareEvent<'_>),
    {
        let total = candidates.len();
        tracing::info!(candidates = total, samples = self.samples, "starting comparison");

        let mut table = ComparisonTable::default();
        for (i, invoker) in candidates.into_iter().enumerate() {
            let label = invoker.target().label();
            observe(CompareEvent::Started {
                label: &label,
                index: i + 1,
                total,
            });

            let run_loop = RunLoop::new(invoker).with_progress(self.progress.clone());
            let result = match run_loop.run(self.samples).await {
                Ok(run) => run.summary().ok_or(Error::NoSamples {
                    target: label.clone(),
                }),
                Err(err) => Err(err),
            };

            observe(CompareEvent::Finished {
                label: &label,
                result: &result,
            });
            table.push(label, result);
        }

        table.sort();
        table
    }
}
