//! Latency harness for the remote dosing service: time sequential invocations of a target
//! (a local executable or an HTTP endpoint), summarize them, and rank several endpoints.

mod compare;
mod error;
mod health;
mod invoker;
mod outcome;
mod run_loop;
mod stats;
mod target;

pub use compare::{
    CompareEvent, Comparator, ComparisonRow, ComparisonTable, DEFAULT_COMPARE_PATHS,
};
pub use dosebench_http::HttpClient;
pub use error::{Error, Result};
pub use health::{DEFAULT_HEALTH_TIMEOUT, Health, HealthProbe};
pub use invoker::{DEFAULT_REQUEST_TIMEOUT, HttpInvoker, Invoker, ProcessInvoker};
pub use outcome::{Invocation, InvocationOutcome, OutcomeKind, RawOutput, Sample};
pub use run_loop::{ProgressFn, ProgressUpdate, Run, RunLoop};
pub use stats::Summary;
pub use target::Target;
