//! A local stand-in for the remote dosing service.
//!
//! Serves the same paths the harness benchmarks (`/health`, `/start`, `/iob`, `/meal`) plus a few
//! paths that misbehave on purpose so failure classification can be exercised end to end.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::{Duration, sleep};

pub const PATH_HEALTH: &str = "/health";
pub const PATH_START: &str = "/start";
pub const PATH_IOB: &str = "/iob";
pub const PATH_MEAL: &str = "/meal";
pub const PATH_PLAINTEXT: &str = "/plaintext";
pub const PATH_FAIL: &str = "/fail";
pub const PATH_DELAY: &str = "/delay";

#[derive(Debug, Clone, Default)]
pub struct TestServerStats {
    requests_total: Arc<AtomicU64>,
    health_checks_total: Arc<AtomicU64>,
}

impl TestServerStats {
    fn inc_requests_total(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    fn inc_health_checks_total(&self) {
        self.health_checks_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Requests served on operation paths (health checks are counted separately).
    pub fn requests_total(&self) -> u64 {
        self.requests_total.load(Ordering::Relaxed)
    }

    pub fn health_checks_total(&self) -> u64 {
        self.health_checks_total.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct TestServerOptions {
    /// When false, `/health` answers 503.
    pub healthy: bool,
}

impl Default for TestServerOptions {
    fn default() -> Self {
        Self { healthy: true }
    }
}

#[derive(Debug, Clone)]
struct AppState {
    stats: TestServerStats,
    healthy: Arc<AtomicBool>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StartResponse {
    patient_id: &'static str,
    temp_basal_rate: f64,
    duration_minutes: u32,
    reason: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct IobResponse {
    iob: f64,
    basal_iob: f64,
    bolus_iob: f64,
    activity: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MealResponse {
    carbs: u32,
    meal_cob: f64,
    suggested_bolus: f64,
}

#[derive(Debug, Deserialize)]
struct DelayQuery {
    ms: Option<u64>,
}

async fn handle_health(State(state): State<AppState>) -> (StatusCode, &'static str) {
    state.stats.inc_health_checks_total();
    if state.healthy.load(Ordering::Relaxed) {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "warming up")
    }
}

async fn handle_start(State(state): State<AppState>) -> Json<StartResponse> {
    state.stats.inc_requests_total();
    Json(StartResponse {
        patient_id: "example-patient",
        temp_basal_rate: 0.85,
        duration_minutes: 30,
        reason: "COB: 0, Dev: -12, BGI: -1.2, ISF: 50, CR: 10, Target: 100",
    })
}

async fn handle_iob(State(state): State<AppState>) -> Json<IobResponse> {
    state.stats.inc_requests_total();
    Json(IobResponse {
        iob: 1.25,
        basal_iob: 0.35,
        bolus_iob: 0.9,
        activity: 0.0125,
    })
}

async fn handle_meal(State(state): State<AppState>) -> Json<MealResponse> {
    state.stats.inc_requests_total();
    Json(MealResponse {
        carbs: 45,
        meal_cob: 32.5,
        suggested_bolus: 4.5,
    })
}

async fn handle_plaintext(State(state): State<AppState>) -> &'static str {
    state.stats.inc_requests_total();
    "Hello World!"
}

async fn handle_fail(State(state): State<AppState>) -> (StatusCode, &'static str) {
    state.stats.inc_requests_total();
    (StatusCode::INTERNAL_SERVER_ERROR, "dose calculation failed")
}

async fn handle_delay(
    State(state): State<AppState>,
    Query(query): Query<DelayQuery>,
) -> &'static str {
    state.stats.inc_requests_total();
    sleep(Duration::from_millis(query.ms.unwrap_or(50))).await;
    "delayed"
}

fn router(state: AppState) -> Router {
    Router::new()
        .route(PATH_HEALTH, get(handle_health))
        .route(PATH_START, get(handle_start))
        .route(PATH_IOB, get(handle_iob))
        .route(PATH_MEAL, get(handle_meal))
        .route(PATH_PLAINTEXT, get(handle_plaintext))
        .route(PATH_FAIL, get(handle_fail))
        .route(PATH_DELAY, get(handle_delay))
        .with_state(state)
}

pub struct TestServer {
    addr: SocketAddr,
    base_url: String,
    stats: TestServerStats,
    healthy: Arc<AtomicBool>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl TestServer {
    pub async fn start() -> std::io::Result<Self> {
        Self::start_with(TestServerOptions::default()).await
    }

    pub async fn start_with(options: TestServerOptions) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self::serve(listener, options))
    }

    /// Serves on an already bound listener.
    pub fn serve(listener: TcpListener, options: TestServerOptions) -> Self {
        let addr = listener
            .local_addr()
            .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 0)));

        let stats = TestServerStats::default();
        let healthy = Arc::new(AtomicBool::new(options.healthy));
        let app = router(AppState {
            stats: stats.clone(),
            healthy: healthy.clone(),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
            });
            let _ = serve.await;
        });

        Self {
            addr,
            base_url: format!("http://{addr}"),
            stats,
            healthy,
            shutdown_tx: Some(shutdown_tx),
            task: Some(task),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub fn stats(&self) -> &TestServerStats {
        &self.stats
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::Relaxed);
    }

    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if self.shutdown_tx.is_some()
            && let Some(task) = self.task.take()
        {
            task.abort();
        }
    }
}
