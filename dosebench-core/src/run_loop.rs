use std::sync::Arc;

use crate::error::{Error, Result};
use crate::health::Health;
use crate::invoker::Invoker;
use crate::outcome::{Invocation, Sample};
use crate::stats::Summary;

/// Called after every recorded sample.
pub type ProgressFn = Arc<dyn Fn(&ProgressUpdate<'_>) + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct ProgressUpdate<'a> {
    pub target: &'a str,
    /// 1-based.
    pub index: usize,
    pub total: usize,
    pub sample: &'a Sample,
}

/// The ordered samples collected against one target.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    label: String,
    samples: Vec<Sample>,
}

impl Run {
    fn with_capacity(label: String, capacity: usize) -> Self {
        Self {
            label,
            samples: Vec::with_capacity(capacity),
        }
    }

    fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    #[must_use]
    pub fn summary(&self) -> Option<Summary> {
        Summary::from_samples(&self.samples)
    }
}

/// Drives sequential invocations of one target.
pub struct RunLoop<I> {
    invoker: I,
    progress: Option<ProgressFn>,
}

impl<I: Invoker> RunLoop<I> {
    pub fn new(invoker: I) -> Self {
        Self {
            invoker,
            progress: None,
        }
    }

    #[must_use]
    pub fn with_progress(mut self, progress: Option<ProgressFn>) -> Self {
        self.progress = progress;
        self
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// One invocation with its raw output; no health probe and no statistics.
    pub async fn run_once(&self) -> Result<Invocation> {
        let invocation = self.invoker.invoke().await;
        if invocation.outcome.is_fatal() {
            return Err(Error::TargetNotFound {
                target: self.invoker.target().label(),
                samples_taken: 0,
            });
        }
        Ok(invocation)
    }

    /// Exactly `samples` invocations, one after another.
    ///
    /// Failed invocations are recorded and the loop continues. A missing target stops the loop
    /// immediately and the partial run is discarded.
    pub async fn run(&self, samples: usize) -> Result<Run> {
        let label = self.invoker.target().label();
        if samples == 0 {
            return Err(Error::NoSamples { target: label });
        }

        if let Health::Unhealthy(reason) = self.invoker.preflight().await {
            return Err(Error::Unhealthy {
                target: label,
                reason,
            });
        }

        tracing::info!(%label, samples, "starting run");

        let mut run = Run::with_capacity(label, samples);
        for index in 1..=samples {
            let invocation = self.invoker.invoke().await;
            if invocation.outcome.is_fatal() {
                tracing::warn!(label = %run.label(), index, "target not found, stopping run");
                return Err(Error::TargetNotFound {
                    target: run.label,
                    samples_taken: run.samples.len(),
                });
            }

            let sample = invocation.sample();
            if let Some(progress) = &self.progress {
                progress(&ProgressUpdate {
                    target: &run.label,
                    index,
                    total: samples,
                    sample: &sample,
                });
            }
            run.push(sample);
        }

        Ok(run)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::outcome::InvocationOutcome;
    use crate::target::Target;

    /// Replays scripted outcomes; once the script runs out every call succeeds.
    pub(crate) struct ScriptedInvoker {
        target: Target,
        health: Health,
        script: Mutex<VecDeque<(u64, InvocationOutcome)>>,
        pub(crate) calls: AtomicUsize,
    }

    impl ScriptedInvoker {
        pub(crate) fn new(path: &str, script: Vec<(u64, InvocationOutcome)>) -> Self {
            Self {
                target: Target::http("http://svc", path),
                health: Health::Healthy,
                script: Mutex::new(script.into()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn unhealthy(mut self, reason: &str) -> Self {
            self.health = Health::Unhealthy(reason.to_string());
            self
        }
    }

    impl Invoker for ScriptedInvoker {
        fn target(&self) -> &Target {
            &self.target
        }

        async fn invoke(&self) -> Invocation {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self
                .script
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .pop_front();
            let (millis, outcome) = next.unwrap_or((10, InvocationOutcome::Success));
            Invocation {
                elapsed: Duration::from_millis(millis),
                outcome,
                output: None,
            }
        }

        async fn preflight(&self) -> Health {
            self.health.clone()
        }
    }

    #[tokio::test]
    async fn collects_exactly_n_samples_through_failures() {
        let invoker = ScriptedInvoker::new(
            "/start",
            vec![
                (100, InvocationOutcome::Success),
                (120, InvocationOutcome::Success),
                (110, InvocationOutcome::Success),
                (500, InvocationOutcome::HttpStatus(500)),
                (130, InvocationOutcome::Success),
            ],
        );

        let run = match RunLoop::new(invoker).run(5).await {
            Ok(run) => run,
            Err(err) => panic!("run failed: {err}"),
        };

        assert_eq!(run.len(), 5);
        assert_eq!(run.label(), "http://svc/start");
        assert_eq!(run.samples()[3].outcome, InvocationOutcome::HttpStatus(500));

        let Some(summary) = run.summary() else {
            panic!("expected a summary");
        };
        assert_eq!(summary.sample_count, 5);
        assert_eq!(summary.success_count, 4);
        assert!((summary.mean_secs - 0.192).abs() < 1e-9);
        assert!((summary.throughput_per_sec - 4.0 / 0.96).abs() < 1e-9);
    }

    #[tokio::test]
    async fn missing_target_stops_the_loop() {
        let invoker = ScriptedInvoker::new(
            "/start",
            vec![
                (10, InvocationOutcome::Success),
                (10, InvocationOutcome::NotFound),
            ],
        );
        let run_loop = RunLoop::new(invoker);

        let err = match run_loop.run(10).await {
            Ok(run) => panic!("expected an early stop, got {} samples", run.len()),
            Err(err) => err,
        };

        assert_eq!(
            err,
            Error::TargetNotFound {
                target: "http://svc/start".to_string(),
                samples_taken: 1,
            }
        );
        assert_eq!(run_loop.invoker().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unhealthy_target_takes_no_samples() {
        let invoker = ScriptedInvoker::new("/start", vec![]).unhealthy("HTTP 503");
        let run_loop = RunLoop::new(invoker);

        let err = match run_loop.run(3).await {
            Ok(_) => panic!("expected unhealthy error"),
            Err(err) => err,
        };

        assert!(matches!(err, Error::Unhealthy { .. }), "{err}");
        assert_eq!(run_loop.invoker().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn zero_samples_is_rejected() {
        let run_loop = RunLoop::new(ScriptedInvoker::new("/start", vec![]));
        assert!(matches!(
            run_loop.run(0).await,
            Err(Error::NoSamples { .. })
        ));
    }

    #[tokio::test]
    async fn progress_sees_every_sample_in_order() {
        let seen: Arc<Mutex<Vec<(usize, usize, InvocationOutcome)>>> = Arc::default();
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(move |u: &ProgressUpdate<'_>| {
            sink.lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner())
                .push((u.index, u.total, u.sample.outcome.clone()));
        });

        let invoker = ScriptedInvoker::new(
            "/iob",
            vec![
                (10, InvocationOutcome::Success),
                (20, InvocationOutcome::Timeout),
                (30, InvocationOutcome::Connection),
            ],
        );
        let run = RunLoop::new(invoker).with_progress(Some(progress)).run(3).await;
        assert!(run.is_ok());

        let seen = seen.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        assert_eq!(
            *seen,
            vec![
                (1, 3, InvocationOutcome::Success),
                (2, 3, InvocationOutcome::Timeout),
                (3, 3, InvocationOutcome::Connection),
            ]
        );
    }

    #[tokio::test]
    async fn single_run_returns_the_invocation() {
        let invoker = ScriptedInvoker::new("/meal", vec![(42, InvocationOutcome::ExitCode(2))]);
        let run_loop = RunLoop::new(invoker);

        let invocation = match run_loop.run_once().await {
            Ok(v) => v,
            Err(err) => panic!("run_once failed: {err}"),
        };
        assert_eq!(invocation.elapsed, Duration::from_millis(42));
        assert_eq!(invocation.outcome, InvocationOutcome::ExitCode(2));
    }

    #[tokio::test]
    async fn single_run_reports_missing_target() {
        let invoker = ScriptedInvoker::new("/meal", vec![(0, InvocationOutcome::NotFound)]);
        assert!(matches!(
            RunLoop::new(invoker).run_once().await,
            Err(Error::TargetNotFound { samples_taken: 0, .. })
        ));
    }
}
