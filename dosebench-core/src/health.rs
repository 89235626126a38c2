use std::fmt;
use std::time::Duration;

use dosebench_http::{HttpClient, HttpRequest};

pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Healthy,
    Unhealthy(String),
    /// The target has nothing to probe (local executables).
    Skipped,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Healthy => f.write_str("healthy"),
            Self::Unhealthy(reason) => write!(f, "unhealthy: {reason}"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// A single bounded `GET` against a health path. Never fails: any error is folded into
/// [`Health::Unhealthy`].
#[derive(Debug, Clone)]
pub struct HealthProbe {
    client: HttpClient,
    url: String,
    timeout: Duration,
}

impl HealthProbe {
    pub fn new(client: HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub async fn check(&self) -> Health {
        let req = HttpRequest::get(&self.url).with_timeout(self.timeout);
        let health = match self.client.request(req).await {
            Ok(res) if res.status == 200 => Health::Healthy,
            Ok(res) => Health::Unhealthy(format!("health check failed (HTTP {})", res.status)),
            Err(err) => Health::Unhealthy(format!("health check failed: {err}")),
        };

        if let Health::Unhealthy(reason) = &health {
            tracing::warn!(url = %self.url, %reason, "target is not healthy");
        } else {
            tracing::debug!(url = %self.url, "target is healthy");
        }
        health
    }
}
