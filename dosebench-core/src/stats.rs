use crate::outcome::Sample;

/// Descriptive statistics over a non-empty set of samples.
///
/// Failed samples count toward every latency figure: they still consumed wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub sample_count: usize,
    pub success_count: usize,
    pub mean_secs: f64,
    pub min_secs: f64,
    pub max_secs: f64,
    /// Sample standard deviation; `None` with fewer than two samples.
    pub std_dev_secs: Option<f64>,
    /// Sum of all elapsed times.
    pub total_secs: f64,
    /// Successful invocations per second of total elapsed time.
    pub throughput_per_sec: f64,
}

impl Summary {
    /// Returns `None` for an empty slice.
    #[must_use]
    pub fn from_samples(samples: &[Sample]) -> Option<Self> {
        let first = samples.first()?.elapsed_secs();

        let sample_count = samples.len();
        let success_count = samples.iter().filter(|s| s.outcome.is_success()).count();

        let mut total_secs = 0.0;
        let mut min_secs = first;
        let mut max_secs = first;
        for secs in samples.iter().map(Sample::elapsed_secs) {
            total_secs += secs;
            min_secs = min_secs.min(secs);
            max_secs = max_secs.max(secs);
        }

        // Rounding can push the mean of identical values just outside [min, max].
        let mean_secs = (total_secs / sample_count as f64).clamp(min_secs, max_secs);

        let std_dev_secs = (sample_count >= 2).then(|| {
            let sum_sq: f64 = samples
                .iter()
                .map(|s| (s.elapsed_secs() - mean_secs).powi(2))
                .sum();
            (sum_sq / (sample_count - 1) as f64).sqrt()
        });

        let throughput_per_sec = if total_secs > 0.0 {
            success_count as f64 / total_secs
        } else {
            0.0
        };

        Some(Self {
            sample_count,
            success_count,
            mean_secs,
            min_secs,
            max_secs,
            std_dev_secs,
            total_secs,
            throughput_per_sec,
        })
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.sample_count - self.success_count
    }

    /// `"X/Y successful"`.
    #[must_use]
    pub fn successful_label(&self) -> String {
        format!("{}/{} successful", self.success_count, self.sample_count)
    }
}
