use anyhow::Result;
use clap::Parser;
use parrot_http::api::{AppState, ParrotServer};
use parrot_http::config::{Config, ConfigSource};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "parrot-http",
    about = "HTTP request-capture and mock-response server",
    version
)]
struct Args {
    /// Path to a YAML configuration file (defaults to ./config.yaml if present)
    #[arg(short, long, env = "PARROT_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overrides the configuration
    #[arg(short, long)]
    port: Option<u16>,

    /// Default response status code, overrides the configuration
    #[arg(short, long)]
    response_code: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (mut config, source) = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(code) = args.response_code {
        config.response_code = code;
    }

    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &source {
        ConfigSource::File(path) => info!("Loaded configuration from {}", path.display()),
        ConfigSource::Defaults => {
            info!("Configuration file not found, using defaults and environment variables")
        }
    }

    config.validate()?;
    info!(
        "Default response code {}, store TTL {}s, store keys from {:?}",
        config.response_code, config.store_ttl_seconds, config.store_key_request_headers
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let server = ParrotServer::bind(addr, AppState::new(config)).await?;
    server
        .run_until(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
}
