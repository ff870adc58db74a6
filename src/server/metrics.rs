use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use lazy_static::lazy_static;
use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::time::Duration;
use tracing::info;

/// Metric name prefix for all Vibezmaster metrics
const PREFIX: &str = "vibez";

lazy_static! {
    // Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // HTTP Request Metrics
    pub static ref HTTP_REQUESTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_http_requests_total"), "Total number of HTTP requests"),
        &["method", "path", "status"]
    ).expect("Failed to create http_requests_total metric");

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            format!("{PREFIX}_http_request_duration_seconds"),
            "HTTP request duration in seconds"
        )
        .buckets(vec![0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]),
        &["method", "path"]
    ).expect("Failed to create http_request_duration_seconds metric");

    // Authentication Metrics
    pub static ref AUTH_LOGIN_ATTEMPTS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_auth_login_attempts_total"), "Total login attempts"),
        &["status"]
    ).expect("Failed to create auth_login_attempts_total metric");

    // Evaluation Metrics
    pub static ref EVALUATIONS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_evaluations_total"), "Completed song evaluations"),
        &["outcome"]
    ).expect("Failed to create evaluations_total metric");

    pub static ref EVALUATION_FALLBACKS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(
            format!("{PREFIX}_evaluation_fallbacks_total"),
            "Evaluations substituted by the fallback report, by masked cause"
        ),
        &["cause"]
    ).expect("Failed to create evaluation_fallbacks_total metric");

    pub static ref EVALUATION_DURATION_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            format!("{PREFIX}_evaluation_duration_seconds"),
            "End-to-end song evaluation duration in seconds"
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0, 120.0])
    ).expect("Failed to create evaluation_duration_seconds metric");

    // Mint Metrics
    pub static ref MINT_RECORDS_TOTAL: CounterVec = CounterVec::new(
        Opts::new(format!("{PREFIX}_mint_records_total"), "Mint record submissions by result"),
        &["result"]
    ).expect("Failed to create mint_records_total metric");
}

/// Initialize all metrics and register them with the Prometheus registry
pub fn init_metrics() {
    // Register all metrics - ignore errors if already registered (for tests)
    let _ = REGISTRY.register(Box::new(HTTP_REQUESTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(HTTP_REQUEST_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(AUTH_LOGIN_ATTEMPTS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(EVALUATIONS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(EVALUATION_FALLBACKS_TOTAL.clone()));
    let _ = REGISTRY.register(Box::new(EVALUATION_DURATION_SECONDS.clone()));
    let _ = REGISTRY.register(Box::new(MINT_RECORDS_TOTAL.clone()));

    info!("Metrics system initialized successfully");
}

pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, &status.to_string()])
        .inc();
    HTTP_REQUEST_DURATION_SECONDS
        .with_label_values(&[method, path])
        .observe(duration.as_secs_f64());
}

pub fn record_login_attempt(success: bool) {
    let status = if success { "success" } else { "failure" };
    AUTH_LOGIN_ATTEMPTS_TOTAL.with_label_values(&[status]).inc();
}

pub fn record_evaluation(outcome: &str, duration: Duration) {
    EVALUATIONS_TOTAL.with_label_values(&[outcome]).inc();
    EVALUATION_DURATION_SECONDS.observe(duration.as_secs_f64());
}

pub fn record_evaluation_fallback(cause: &str) {
    EVALUATION_FALLBACKS_TOTAL.with_label_values(&[cause]).inc();
}

pub fn record_mint_result(result: &str) {
    MINT_RECORDS_TOTAL.with_label_values(&[result]).inc();
}

async fn metrics_handler() -> impl IntoResponse {
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (StatusCode::OK, buffer).into_response(),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to encode metrics: {}", err),
        )
            .into_response(),
    }
}

/// Serves `/metrics` on its own port for Prometheus scraping.
pub async fn run_metrics_server(port: u16) -> anyhow::Result<()> {
    let app = Router::new().route("/metrics", get(metrics_handler));
    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    info!("Metrics available at port {}!", port);
    axum::serve(listener, app).await?;
    Ok(())
}
