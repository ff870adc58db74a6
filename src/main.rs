use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vibezmaster_studio::chain::JsonRpcChainClient;
use vibezmaster_studio::config::{FileConfig, Secrets};
use vibezmaster_studio::evaluation::SongEvaluator;
use vibezmaster_studio::gemini::GeminiModel;
use vibezmaster_studio::server::{metrics, run_server, RequestsLoggingLevel, ServerConfig};
use vibezmaster_studio::user::SqliteUserStore;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite user database file.
    #[clap(value_parser = parse_path)]
    pub user_db: PathBuf,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Upper bound in bytes for song uploads.
    #[clap(long, default_value_t = 25 * 1024 * 1024)]
    pub max_upload_bytes: usize,

    /// Optional TOML config file; its values override CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    match s.to_lowercase().as_str() {
        "none" => Some(RequestsLoggingLevel::None),
        "path" => Some(RequestsLoggingLevel::Path),
        "headers" => Some(RequestsLoggingLevel::Headers),
        "body" => Some(RequestsLoggingLevel::Body),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .unwrap();

    let file_config = match &cli_args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let port = file_config.port.unwrap_or(cli_args.port);
    let metrics_port = file_config.metrics_port.unwrap_or(cli_args.metrics_port);
    let max_upload_bytes = file_config
        .max_upload_bytes
        .unwrap_or(cli_args.max_upload_bytes);
    let logging_level = file_config
        .logging_level
        .as_deref()
        .and_then(parse_logging_level)
        .unwrap_or(cli_args.logging_level);

    // Fail fast on missing secrets rather than at the first request
    let secrets = Secrets::from_env()?;

    info!("Opening SQLite user database at {:?}...", cli_args.user_db);
    let user_store = Arc::new(SqliteUserStore::new(&cli_args.user_db)?);

    info!("Initializing metrics...");
    metrics::init_metrics();
    tokio::spawn(async move {
        if let Err(err) = metrics::run_metrics_server(metrics_port).await {
            error!("Metrics server failed: {}", err);
        }
    });

    info!(model = %secrets.gemini_model, "Configuring evaluation model");
    let evaluator = Arc::new(SongEvaluator::new(Arc::new(GeminiModel::new(
        secrets.gemini_api_key.clone(),
        secrets.gemini_model.clone(),
    ))));

    let chain = Arc::new(JsonRpcChainClient::new(secrets.rpc_url.clone()));

    let config = ServerConfig {
        requests_logging_level: logging_level,
        port,
        max_upload_bytes,
    };

    info!("Ready to serve at port {}!", port);
    run_server(config, user_store, evaluator, chain).await
}
