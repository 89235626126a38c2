use std::time::{Duration, Instant};

use dosebench_http::{Error as HttpError, HttpClient, HttpRequest};

use super::Invoker;
use crate::health::{DEFAULT_HEALTH_TIMEOUT, Health, HealthProbe};
use crate::outcome::{Invocation, InvocationOutcome, RawOutput};
use crate::target::Target;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues one bounded `GET {base}{path}` per invocation.
#[derive(Debug, Clone)]
pub struct HttpInvoker {
    client: HttpClient,
    target: Target,
    url: String,
    timeout: Duration,
    health_timeout: Duration,
}

impl HttpInvoker {
    pub fn new(client: HttpClient, base_url: &str, path: &str) -> Self {
        let target = Target::http(base_url, path);
        Self {
            client,
            url: target.label(),
            target,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Invoker for HttpInvoker {
    fn target(&self) -> &Target {
        &self.target
    }

    async fn invoke(&self) -> Invocation {
        let req = HttpRequest::get(&self.url).with_timeout(self.timeout);

        let started = Instant::now();
        let result = self.client.request(req).await;
        let elapsed = started.elapsed();

        let (outcome, output) = match result {
            Ok(res) => {
                let outcome = if res.status == 200 {
                    InvocationOutcome::Success
                } else {
                    InvocationOutcome::HttpStatus(res.status)
                };
                (outcome, Some(RawOutput::Http { body: res.body }))
            }
            Err(err) => (classify_error(&err), None),
        };

        tracing::debug!(
            url = %self.url,
            elapsed_secs = elapsed.as_secs_f64(),
            %outcome,
            "http invocation finished"
        );

        Invocation {
            elapsed,
            outcome,
            output,
        }
    }

    async fn preflight(&self) -> Health {
        let Some(url) = self.target.health_url() else {
            return Health::Skipped;
        };
        HealthProbe::new(self.client.clone(), url)
            .with_timeout(self.health_timeout)
            .check()
            .await
    }
}

fn classify_error(err: &HttpError) -> InvocationOutcome {
    match err {
        HttpError::Timeout(_) => InvocationOutcome::Timeout,
        err if err.is_connect() => InvocationOutcome::Connection,
        err => InvocationOutcome::Unexpected(err.to_string()),
    }
}
