use std::time::Duration;

use anyhow::Context as _;
use dosebench_core::{
    Comparator, DEFAULT_COMPARE_PATHS, Error, Health, HttpClient, HttpInvoker, InvocationOutcome,
    Invoker, RunLoop,
};
use dosebench_testserver::{
    PATH_DELAY, PATH_FAIL, PATH_IOB, PATH_START, TestServer, TestServerOptions,
};

fn invoker(server: &TestServer, path: &str) -> HttpInvoker {
    HttpInvoker::new(HttpClient::default(), server.base_url(), path)
}

#[tokio::test]
async fn healthy_target_yields_n_successful_samples() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let run = RunLoop::new(invoker(&server, PATH_START)).run(5).await?;
    let summary = run.summary().context("summary")?;

    anyhow::ensure!(run.len() == 5, "samples={}", run.len());
    anyhow::ensure!(summary.success_count == 5, "{summary:?}");
    anyhow::ensure!(summary.std_dev_secs.is_some());
    anyhow::ensure!(summary.throughput_per_sec > 0.0);
    anyhow::ensure!(server.stats().requests_total() == 5);
    anyhow::ensure!(server.stats().health_checks_total() == 1);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn server_errors_are_recorded_not_fatal() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let run = RunLoop::new(invoker(&server, PATH_FAIL)).run(3).await?;
    let summary = run.summary().context("summary")?;

    anyhow::ensure!(
        run.samples()
            .iter()
            .all(|s| s.outcome == InvocationOutcome::HttpStatus(500)),
        "{:?}",
        run.samples()
    );
    anyhow::ensure!(summary.success_count == 0);
    anyhow::ensure!(summary.throughput_per_sec == 0.0);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn unhealthy_target_produces_no_run() -> anyhow::Result<()> {
    let server = TestServer::start_with(TestServerOptions { healthy: false })
        .await
        .context("start test server")?;

    let err = match RunLoop::new(invoker(&server, PATH_START)).run(5).await {
        Ok(run) => anyhow::bail!("expected unhealthy error, got {} samples", run.len()),
        Err(err) => err,
    };

    anyhow::ensure!(
        matches!(&err, Error::Unhealthy { reason, .. } if reason.contains("503")),
        "unexpected error: {err}"
    );
    anyhow::ensure!(server.stats().requests_total() == 0);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn closed_port_is_a_connection_failure() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    let invoker = invoker(&server, PATH_START);
    server.shutdown().await;

    let health = invoker.preflight().await;
    anyhow::ensure!(matches!(health, Health::Unhealthy(_)), "{health}");

    let invocation = invoker.invoke().await;
    anyhow::ensure!(
        invocation.outcome == InvocationOutcome::Connection,
        "{:?}",
        invocation.outcome
    );
    anyhow::ensure!(invocation.output.is_none());
    Ok(())
}

#[tokio::test]
async fn slow_response_is_a_timeout() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let invoker = invoker(&server, &format!("{PATH_DELAY}?ms=2000"))
        .with_timeout(Duration::from_millis(100));
    let invocation = invoker.invoke().await;

    anyhow::ensure!(
        invocation.outcome == InvocationOutcome::Timeout,
        "{:?}",
        invocation.outcome
    );
    anyhow::ensure!(invocation.elapsed >= Duration::from_millis(100));
    anyhow::ensure!(invocation.elapsed < Duration::from_secs(2));

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn single_run_exposes_pretty_json_body() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let invocation = RunLoop::new(invoker(&server, PATH_IOB)).run_once().await?;
    let shown = invocation.display_output().context("output")?;

    anyhow::ensure!(invocation.outcome.is_success());
    anyhow::ensure!(shown.contains("\n  \"iob\": 1.25"), "{shown}");
    anyhow::ensure!(server.stats().health_checks_total() == 0);

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn comparison_covers_every_default_path() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;

    let candidates = DEFAULT_COMPARE_PATHS
        .iter()
        .map(|path| invoker(&server, path))
        .collect::<Vec<_>>();
    let table = Comparator::new(3).compare(candidates, |_| {}).await;

    anyhow::ensure!(table.rows().len() == DEFAULT_COMPARE_PATHS.len());
    anyhow::ensure!(table.skipped().is_empty());
    anyhow::ensure!(
        table
            .rows()
            .windows(2)
            .all(|w| w[0].summary.mean_secs <= w[1].summary.mean_secs)
    );

    server.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn comparison_against_unhealthy_service_is_empty() -> anyhow::Result<()> {
    let server = TestServer::start().await.context("start test server")?;
    server.set_healthy(false);

    let candidates = vec![invoker(&server, PATH_START), invoker(&server, PATH_IOB)];
    let table = Comparator::new(3).compare(candidates, |_| {}).await;

    anyhow::ensure!(table.is_empty());
    anyhow::ensure!(table.skipped().len() == 2);
    anyhow::ensure!(server.stats().requests_total() == 0);

    server.shutdown().await;
    Ok(())
}
