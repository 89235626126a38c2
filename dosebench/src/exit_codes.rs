#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,

    /// No summary could be produced: missing target, failed health check, or nothing to compare.
    NoSummary = 20,

    /// Invalid CLI/config input (bad flags, malformed numbers or durations, bad base URL).
    InvalidInput = 30,

    /// Internal/runtime error (IO errors, failed output).
    RuntimeError = 40,

    /// Interrupted by the user (Ctrl-C).
    Interrupted = 130,
}

impl ExitCode {
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    #[must_use]
    pub fn from_summary_available(available: bool) -> Self {
        if available {
            Self::Success
        } else {
            Self::NoSummary
        }
    }
}
