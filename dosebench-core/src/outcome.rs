use std::fmt;
use std::time::Duration;

use bytes::Bytes;

/// How a single invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationOutcome {
    Success,
    /// The process exited with a non-zero code.
    ExitCode(i32),
    Timeout,
    /// The request never reached the server.
    Connection,
    /// The server answered with something other than 200.
    HttpStatus(u16),
    /// The target does not exist. Stops a run.
    NotFound,
    Unexpected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum OutcomeKind {
    Success,
    ExitCode,
    Timeout,
    Connection,
    HttpStatus,
    NotFound,
    Unexpected,
}

impl InvocationOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Fatal outcomes end a run instead of being recorded as a sample.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    #[must_use]
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Success => OutcomeKind::Success,
            Self::ExitCode(_) => OutcomeKind::ExitCode,
            Self::Timeout => OutcomeKind::Timeout,
            Self::Connection => OutcomeKind::Connection,
            Self::HttpStatus(_) => OutcomeKind::HttpStatus,
            Self::NotFound => OutcomeKind::NotFound,
            Self::Unexpected(_) => OutcomeKind::Unexpected,
        }
    }
}

impl fmt::Display for InvocationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("ok"),
            Self::ExitCode(code) => write!(f, "exit code {code}"),
            Self::Timeout => f.write_str("timeout"),
            Self::Connection => f.write_str("connection refused"),
            Self::HttpStatus(status) => write!(f, "HTTP {status}"),
            Self::NotFound => f.write_str("not found"),
            Self::Unexpected(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// One timed measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub elapsed: Duration,
    pub outcome: InvocationOutcome,
}

impl Sample {
    #[must_use]
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// What the target printed or returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawOutput {
    Process { stdout: Bytes, stderr: Bytes },
    Http { body: Bytes },
}

/// The result of a single invocation: a sample plus whatever the target produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub elapsed: Duration,
    pub outcome: InvocationOutcome,
    pub output: Option<RawOutput>,
}

impl Invocation {
    #[must_use]
    pub fn sample(&self) -> Sample {
        Sample {
            elapsed: self.elapsed,
            outcome: self.outcome.clone(),
        }
    }

    /// The output worth showing to a user: stdout for a successful process, stderr for a failed
    /// one, the body for HTTP.
    #[must_use]
    pub fn output_bytes(&self) -> Option<&[u8]> {
        let bytes = match self.output.as_ref()? {
            RawOutput::Process { stdout, .. } if self.outcome.is_success() => stdout,
            RawOutput::Process { stderr, .. } => stderr,
            RawOutput::Http { body } => body,
        };
        Some(bytes)
    }

    /// [`Self::output_bytes`] rendered for a terminal: JSON is pretty-printed, anything else is
    /// shown as text.
    #[must_use]
    pub fn display_output(&self) -> Option<String> {
        render_output(self.output_bytes()?)
    }
}

fn render_output(bytes: &[u8]) -> Option<String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(bytes)
        && let Ok(pretty) = serde_json::to_string_pretty(&value)
    {
        return Some(pretty);
    }

    Some(String::from_utf8_lossy(bytes).trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invocation(outcome: InvocationOutcome, output: RawOutput) -> Invocation {
        Invocation {
            elapsed: Duration::from_millis(5),
            outcome,
            output: Some(output),
        }
    }

    #[test]
    fn failure_subtypes_render_for_progress_lines() {
        assert_eq!(InvocationOutcome::Success.to_string(), "ok");
        assert_eq!(InvocationOutcome::ExitCode(3).to_string(), "exit code 3");
        assert_eq!(InvocationOutcome::HttpStatus(500).to_string(), "HTTP 500");
        assert_eq!(
            InvocationOutcome::Connection.to_string(),
            "connection refused"
        );
        assert_eq!(InvocationOutcome::Timeout.to_string(), "timeout");
    }

    #[test]
    fn only_not_found_is_fatal() {
        assert!(InvocationOutcome::NotFound.is_fatal());
        assert!(!InvocationOutcome::Timeout.is_fatal());
        assert!(!InvocationOutcome::Unexpected("boom".to_string()).is_fatal());
        assert_eq!(InvocationOutcome::HttpStatus(503).kind().to_string(), "http_status");
    }

    #[test]
    fn json_body_is_pretty_printed() {
        let inv = invocation(
            InvocationOutcome::Success,
            RawOutput::Http {
                body: Bytes::from_static(br#"{"iob":1.25}"#),
            },
        );
        assert_eq!(
            inv.display_output().as_deref(),
            Some("{\n  \"iob\": 1.25\n}")
        );
    }

    #[test]
    fn non_json_body_is_shown_raw() {
        let inv = invocation(
            InvocationOutcome::HttpStatus(500),
            RawOutput::Http {
                body: Bytes::from_static(b"dose calculation failed\n"),
            },
        );
        assert_eq!(
            inv.display_output().as_deref(),
            Some("dose calculation failed")
        );
    }

    #[test]
    fn process_output_follows_outcome() {
        let output = RawOutput::Process {
            stdout: Bytes::from_static(b"done\n"),
            stderr: Bytes::from_static(b"bad input\n"),
        };

        let ok = invocation(InvocationOutcome::Success, output.clone());
        assert_eq!(ok.display_output().as_deref(), Some("done"));

        let failed = invocation(InvocationOutcome::ExitCode(2), output);
        assert_eq!(failed.display_output().as_deref(), Some("bad input"));
    }

    #[test]
    fn blank_output_is_omitted() {
        let inv = invocation(
            InvocationOutcome::Success,
            RawOutput::Process {
                stdout: Bytes::from_static(b"\n  \n"),
                stderr: Bytes::new(),
            },
        );
        assert_eq!(inv.display_output(), None);
    }
}
