use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // Logs go to stderr so rendered output on stdout stays clean.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    if let Ok(path) = dotenv() {
        debug!("Loaded environment from {:?}", path);
    }
    let cli = tvshelf::app::Cli::parse();
    tvshelf::app::run(cli).await
}
