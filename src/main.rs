use clap::Parser;
use repo_analyzer::{
    error::Result,
    logging, AnalysisRequest, Analyzer, Config, OllamaClient,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about = "Analyse one repository and print the suggestions as JSON", long_about = None)]
struct Cli {
    /// Repository URL (https://github.com/owner/repo, any git remote, or file://)
    #[arg(short, long)]
    url: String,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Include the repository health report in the output
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level)?;

    let mut config = Config::load(cli.config.as_deref())?;
    // The caller already owns this machine's disk.
    config.ingest.allow_local_paths = true;
    if cli.health {
        config.report_health = true;
    }

    let model = Arc::new(OllamaClient::new(&config)?);
    let analyzer = Analyzer::new(Arc::new(config), model);

    info!("Analysing {}", cli.url);
    let result = analyzer.analyze(&AnalysisRequest { repo_url: cli.url }).await?;

    let json = serde_json::to_string_pretty(&result)?;
    println!("{}", json);
    Ok(())
}
