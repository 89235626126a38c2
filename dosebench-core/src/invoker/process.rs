use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::process::Command;

use super::Invoker;
use crate::outcome::{Invocation, InvocationOutcome, RawOutput};
use crate::target::Target;

/// Launches a local executable with no arguments and waits for it to exit.
#[derive(Debug, Clone)]
pub struct ProcessInvoker {
    target: Target,
    path: PathBuf,
    timeout: Option<Duration>,
}

impl ProcessInvoker {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            target: Target::process(path.clone()),
            path,
            timeout: None,
        }
    }

    /// Kills the child and records a timeout once `timeout` elapses. Unbounded by default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    async fn spawn_and_wait(&self) -> std::io::Result<Option<Output>> {
        let mut cmd = Command::new(&self.path);
        cmd.stdin(Stdio::null()).kill_on_drop(true);

        match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, cmd.output()).await {
                Ok(res) => res.map(Some),
                Err(_) => Ok(None),
            },
            None => cmd.output().await.map(Some),
        }
    }
}

impl Invoker for ProcessInvoker {
    fn target(&self) -> &Target {
        &self.target
    }

    async fn invoke(&self) -> Invocation {
        let started = Instant::now();
        let result = self.spawn_and_wait().await;
        let elapsed = started.elapsed();

        let (outcome, output) = match result {
            Ok(Some(out)) => {
                let outcome = classify_exit(out.status);
                let output = RawOutput::Process {
                    stdout: Bytes::from(out.stdout),
                    stderr: Bytes::from(out.stderr),
                };
                (outcome, Some(output))
            }
            Ok(None) => (InvocationOutcome::Timeout, None),
            Err(err) if err.kind() == ErrorKind::NotFound => (InvocationOutcome::NotFound, None),
            Err(err) => (InvocationOutcome::Unexpected(err.to_string()), None),
        };

        tracing::debug!(
            path = %self.path.display(),
            elapsed_secs = elapsed.as_secs_f64(),
            %outcome,
            "process invocation finished"
        );

        Invocation {
            elapsed,
            outcome,
            output,
        }
    }
}

fn classify_exit(status: std::process::ExitStatus) -> InvocationOutcome {
    if status.success() {
        return InvocationOutcome::Success;
    }
    match status.code() {
        Some(code) => InvocationOutcome::ExitCode(code),
        None => InvocationOutcome::Unexpected(format!(
            "process terminated without an exit code ({status})"
        )),
    }
}
