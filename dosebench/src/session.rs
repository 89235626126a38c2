use anyhow::Context as _;

use dosebench_core::{
    CompareEvent, Comparator, DEFAULT_COMPARE_PATHS, HttpClient, HttpInvoker, Invoker,
    ProcessInvoker, RunLoop,
};

use crate::cli::{CompareArgs, ExecArgs, HttpArgs, RunOptions, ServiceArgs};
use crate::exit_codes::ExitCode;
use crate::output;
use crate::run_error::RunError;

pub async fn http(args: HttpArgs) -> Result<ExitCode, RunError> {
    let base_url = validate_base_url(&args.service.base_url)?;
    let invoker = http_invoker(HttpClient::default(), &base_url, &args.path, &args.service);
    drive(invoker, &args.run).await
}

pub async fn exec(args: ExecArgs) -> Result<ExitCode, RunError> {
    let mut invoker = ProcessInvoker::new(args.script);
    if let Some(timeout) = args.timeout {
        invoker = invoker.with_timeout(timeout);
    }
    drive(invoker, &args.run).await
}

pub async fn compare(args: CompareArgs) -> Result<ExitCode, RunError> {
    let base_url = validate_base_url(&args.service.base_url)?;
    let paths: Vec<String> = if args.paths.is_empty() {
        DEFAULT_COMPARE_PATHS.iter().map(|p| (*p).to_string()).collect()
    } else {
        args.paths
    };

    let client = HttpClient::default();
    let candidates: Vec<HttpInvoker> = paths
        .iter()
        .map(|path| http_invoker(client.clone(), &base_url, path, &args.service))
        .collect();

    let out = output::formatter(args.run.output);
    let progress = if args.run.no_progress {
        None
    } else {
        out.progress()
    };

    let mut print_err: Option<anyhow::Error> = None;
    let table = Comparator::new(args.run.runs)
        .with_progress(progress)
        .compare(candidates, |event| match event {
            CompareEvent::Started {
                label,
                index,
                total,
            } => out.print_comparison_target(label, index, total),
            CompareEvent::Finished { label, result } => match result {
                Ok(summary) => {
                    if let Err(err) = out.print_summary(label, summary)
                        && print_err.is_none()
                    {
                        print_err = Some(err);
                    }
                }
                Err(err) => out.print_no_summary(err),
            },
        })
        .await;

    if let Some(err) = print_err {
        return Err(RunError::RuntimeError(err));
    }

    out.print_comparison(&table, args.run.runs)?;
    Ok(ExitCode::from_summary_available(!table.is_empty()))
}

/// Header, then either the single invocation or the full run and its summary.
async fn drive<I: Invoker>(invoker: I, opts: &RunOptions) -> Result<ExitCode, RunError> {
    let out = output::formatter(opts.output);
    let label = invoker.target().label();
    tracing::debug!(%label, runs = opts.runs, "starting session");
    out.print_header(&label, opts.runs);

    let progress = if opts.no_progress {
        None
    } else {
        out.progress()
    };
    let run_loop = RunLoop::new(invoker).with_progress(progress);

    if opts.runs == 1 {
        return match run_loop.run_once().await {
            Ok(invocation) => {
                out.print_single(&label, &invocation);
                Ok(ExitCode::Success)
            }
            Err(err) => {
                out.print_no_summary(&err);
                Ok(ExitCode::NoSummary)
            }
        };
    }

    let summary = run_loop.run(opts.runs).await.and_then(|run| {
        run.summary().ok_or(dosebench_core::Error::NoSamples {
            target: label.clone(),
        })
    });

    match summary {
        Ok(summary) => {
            out.print_summary(&label, &summary)?;
            Ok(ExitCode::Success)
        }
        Err(err) => {
            out.print_no_summary(&err);
            Ok(ExitCode::NoSummary)
        }
    }
}

fn http_invoker(client: HttpClient, base_url: &str, path: &str, svc: &ServiceArgs) -> HttpInvoker {
    HttpInvoker::new(client, base_url, path)
        .with_timeout(svc.timeout)
        .with_health_timeout(svc.health_timeout)
}

/// Accepts `http(s)://host[:port]` with an optional trailing slash.
fn validate_base_url(raw: &str) -> Result<String, RunError> {
    let parsed = url::Url::parse(raw)
        .with_context(|| format!("invalid --base-url `{raw}`"))
        .map_err(RunError::InvalidInput)?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(RunError::InvalidInput(anyhow::anyhow!(
            "invalid --base-url `{raw}`: scheme must be http or https"
        )));
    }
    if parsed.host_str().is_none() {
        return Err(RunError::InvalidInput(anyhow::anyhow!(
            "invalid --base-url `{raw}`: missing host"
        )));
    }

    Ok(raw.trim_end_matches('/').to_string())
}
