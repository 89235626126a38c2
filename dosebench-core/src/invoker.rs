use std::future::Future;

use crate::health::Health;
use crate::outcome::Invocation;
use crate::target::Target;

mod http;
mod process;

pub use http::{DEFAULT_REQUEST_TIMEOUT, HttpInvoker};
pub use process::ProcessInvoker;

/// Performs exactly one unit of work against a target and times it.
///
/// Failures are reported through [`Invocation::outcome`], never as errors: every attempt yields
/// an elapsed time.
pub trait Invoker {
    fn target(&self) -> &Target;

    fn invoke(&self) -> impl Future<Output = Invocation> + Send;

    /// Pre-flight check run once before a multi-sample run.
    fn preflight(&self) -> impl Future<Output = Health> + Send {
        async { Health::Skipped }
    }
}
