pub type Result<T> = std::result::Result<T, Error>;

/// Conditions that end a run without a summary. Messages leave the target out; callers print
/// it alongside.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("target not found (stopped after {samples_taken} sample(s))")]
    TargetNotFound { target: String, samples_taken: usize },

    #[error("{reason}")]
    Unhealthy { target: String, reason: String },

    #[error("no samples requested")]
    NoSamples { target: String },
}

impl Error {
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::TargetNotFound { target, .. }
            | Self::Unhealthy { target, .. }
            | Self::NoSamples { target } => target,
        }
    }
}
