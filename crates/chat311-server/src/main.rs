//! Chat311 - Web form that turns citizen complaints into service requests.

use chat311_server::config::AppConfig;
use chat311_server::secrets::Secrets;
use chat311_server::{start_server, ServerError};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Command-line options
#[derive(Parser, Debug)]
#[command(name = "chat311")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, env = "CHAT311_CONFIG")]
    config: Option<PathBuf>,

    /// Secrets file (TOML); falls back to environment variables
    #[arg(long, env = "CHAT311_SECRETS", default_value = ".chat311/secrets.toml")]
    secrets: PathBuf,

    /// Append every request to this CSV file
    #[arg(long, env = "CHAT311_CSV_OUTPUT")]
    csv_output: Option<PathBuf>,

    /// Bind address
    #[arg(long, env = "CHAT311_BIND")]
    bind: Option<String>,

    /// Bind port
    #[arg(short, long, env = "CHAT311_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };

    // Command-line flags override the file
    if let Some(path) = cli.csv_output {
        config.storage.csv_output = Some(path);
    }
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }
    if let Some(port) = cli.port {
        config.server.bind_port = port;
    }

    let required = Secrets::required_keys(&config);
    let secrets = Secrets::load(&cli.secrets, &required);

    start_server(config, secrets).await
}
