use crate::cli::OutputFormat;

mod human;
mod json;

pub(crate) trait OutputFormatter: Send + Sync {
    fn print_header(&self, target: &str, runs: usize);
    fn progress(&self) -> Option<dosebench_core::ProgressFn>;
    fn print_single(&self, target: &str, invocation: &dosebench_core::Invocation);
    fn print_summary(&self, target: &str, summary: &dosebench_core::Summary) -> anyhow::Result<()>;
    fn print_no_summary(&self, err: &dosebench_core::Error);
    fn print_comparison_target(&self, target: &str, index: usize, total: usize);
    fn print_comparison(
        &self,
        table: &dosebench_core::ComparisonTable,
        runs: usize,
    ) -> anyhow::Result<()>;
}

pub(crate) fn formatter(format: OutputFormat) -> Box<dyn OutputFormatter> {
    match format {
        OutputFormat::HumanReadable => Box::new(human::HumanReadableOutput::new()),
        OutputFormat::Json => Box::new(json::JsonOutput),
    }
}
