use clap::Parser;
use repo_analyzer::{
    api::{create_app, AppState},
    error::Result,
    logging, Config,
};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "HTTP server for repository analysis", long_about = None)]
struct Args {
    /// Address to listen on, overrides ANALYZER_BIND_ADDR and the config file
    #[arg(short, long)]
    bind: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init(&args.log_level)?;

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    let bind_addr = config.bind_addr.clone();

    info!("repo-analyzer server starting");
    info!("Ollama endpoint: {} (model {})", config.ollama.host, config.ollama.model);
    info!("Ingest strategy: {}", config.ingest.strategy);

    let app = create_app(AppState::new(config)?);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Server listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}
