use std::fmt;
use std::path::PathBuf;

/// The thing being benchmarked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// A local executable, launched with no arguments.
    Process { path: PathBuf },
    /// `GET {base_url}{path}`.
    Http { base_url: String, path: String },
}

impl Target {
    pub fn process(path: impl Into<PathBuf>) -> Self {
        Self::Process { path: path.into() }
    }

    /// Normalizes `base_url` (no trailing `/`) and `path` (leading `/`).
    pub fn http(base_url: &str, path: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{path}")
        };
        Self::Http { base_url, path }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Process { path } => path.display().to_string(),
            Self::Http { base_url, path } => format!("{base_url}{path}"),
        }
    }

    /// `{base}/health` for network targets.
    #[must_use]
    pub fn health_url(&self) -> Option<String> {
        match self {
            Self::Process { .. } => None,
            Self::Http { base_url, .. } => Some(format!("{base_url}/health")),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
